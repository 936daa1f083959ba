use crate::config::REQUEST_TIMEOUT;
use crate::err::Fault;
use crate::http::request::{Request, RequestError};
use crate::http::response::Framing;
use crate::tcp;
use bytes::Bytes;
use futures::FutureExt;
use http::{Method, Response, StatusCode};
use std::future::Future;
use std::io;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering::Relaxed};
use std::sync::Arc;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

pub mod request;
pub mod response;

static ACTIVE: AtomicUsize = AtomicUsize::new(0);

/// Accept connections forever, serving one request per connection on its own task.
///
/// Connections share nothing but `state`. Whatever happens while reading or
/// handling a request (an error or a panic) is answered with a 500 on that
/// connection alone.
pub async fn serve<S, F>(
    mut listener: TcpListener,
    framing: Framing,
    state: S,
    handle_req: F,
) -> Result<(), io::Error>
where
    S: Send + Sync + 'static,
    F: for<'s> ServiceFn<'s, Request, S, Result<Response<Bytes>, Fault>> + Copy + Send + 'static,
{
    let state = Arc::new(state);

    loop {
        let stream = tcp::accept(&mut listener).await?;

        let state = Arc::clone(&state);
        log::debug!("Spawning ({} active)", ACTIVE.fetch_add(1, Relaxed) + 1);
        tokio::spawn(async move {
            let done = serve_connection(stream, framing, &*state, handle_req).await;
            let active = ACTIVE.fetch_sub(1, Relaxed) - 1;
            match done {
                Ok(()) => log::debug!("Closing ({} active)", active),
                Err(e) => log::debug!("Closing ({} active): {}", active, e),
            }
        });
    }
}

/// Run a single request/response cycle. The socket is dropped, and therefore
/// closed, on every return path.
async fn serve_connection<S, F>(
    mut stream: TcpStream,
    framing: Framing,
    state: &S,
    handle_req: F,
) -> Result<(), io::Error>
where
    F: for<'s> ServiceFn<'s, Request, S, Result<Response<Bytes>, Fault>>,
{
    let (reader, mut writer) = stream.split();
    let mut reader = BufReader::new(reader);

    let outcome = AssertUnwindSafe(async {
        let req = match timeout(REQUEST_TIMEOUT, request::read(&mut reader)).await {
            Ok(req) => req?,
            Err(_) => return Err(Fault::from(RequestError::Timeout)),
        };
        log::debug!("{}", req);
        let omit_body = req.method == Some(Method::HEAD);
        let resp = handle_req(req, state).await?;
        Ok((resp, omit_body))
    })
    .catch_unwind()
    .await;

    let (resp, omit_body) = match outcome {
        Ok(Ok(done)) => done,
        Ok(Err(fault)) => (internal_error(&fault), false),
        Err(panic) => (internal_error(&Fault::from_panic(panic)), false),
    };

    response::write(&mut writer, &resp, framing, omit_body).await?;
    writer.shutdown().await
}

fn internal_error(fault: &Fault) -> Response<Bytes> {
    log::error!("[internal error] {}: {}", fault.kind(), fault);
    let mut resp = Response::new(Bytes::new());
    *resp.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    resp
}

// Work around the lack of HKT bounds.
// Because the future will borrow from the state argument, we need to write bounds like this:
// ```
// where
//     F: for<'s> FnOnce(Request, &'s S) -> Fut<'s>
//     Fut<'s>: Future<Output = R> + 's
// ```
// Which can't currently be done. Instead, factor both bounds out to a dedicated trait,
// which is implemented for all matching functions.
pub trait ServiceFn<'s, T, S, R>
where
    Self: FnOnce(T, &'s S) -> Self::Fut,
    Self::Fut: Future<Output = R> + Send + 's,
    S: 's,
{
    type Fut;
}

impl<'s, T, S, R, F, Fut> ServiceFn<'s, T, S, R> for F
where
    F: FnOnce(T, &'s S) -> Fut,
    Fut: Future<Output = R> + Send + 's,
    S: 's,
{
    type Fut = Fut;
}
