use bytes::Bytes;
use http::{header, Response, StatusCode};
use std::io;
use tokio::io::{AsyncWrite, AsyncWriteExt};

pub const APPLICATION_JSON: &str = "application/json";

/// How responses are framed on the wire, fixed for the lifetime of the server.
#[derive(Clone, Copy, Debug)]
pub struct Framing {
    /// Send `Access-Control-Allow-Origin: *` with every response
    pub cors: bool,
}

impl Default for Framing {
    fn default() -> Self {
        Self { cors: true }
    }
}

pub fn reason(status: StatusCode) -> &'static str {
    match status {
        StatusCode::OK => "OK",
        StatusCode::CREATED => "Created",
        StatusCode::NO_CONTENT => "No Content",
        StatusCode::NOT_FOUND => "Not Found",
        StatusCode::INTERNAL_SERVER_ERROR => "Internal Server Error",
        StatusCode::NOT_IMPLEMENTED => "Not Implemented",
        _ => status.canonical_reason().unwrap_or(""),
    }
}

/// Encode the status line and header block, including the terminating blank line.
///
/// `Content-Length` always reflects the full body, even when the body itself
/// won't be sent (HEAD). A `Content-Type` set by the handler is kept; otherwise
/// a non-empty body is labelled as json.
pub fn encode_head(resp: &Response<Bytes>, framing: Framing) -> Vec<u8> {
    let status = resp.status();
    let body = resp.body();
    let mut head = format!("HTTP/1.1 {} {}\r\n", status.as_u16(), reason(status)).into_bytes();

    let mut line = |name: &str, value: &[u8]| {
        head.extend_from_slice(name.as_bytes());
        head.extend_from_slice(b": ");
        head.extend_from_slice(value);
        head.extend_from_slice(b"\r\n");
    };

    match resp.headers().get(header::CONTENT_TYPE) {
        Some(content_type) => line("Content-Type", content_type.as_bytes()),
        None if !body.is_empty() => line("Content-Type", APPLICATION_JSON.as_bytes()),
        None => {}
    }
    for (name, value) in resp.headers() {
        if name == header::CONTENT_TYPE
            || name == header::CONTENT_LENGTH
            || name == header::CONNECTION
            || name == header::ACCESS_CONTROL_ALLOW_ORIGIN
        {
            continue;
        }
        line(name.as_str(), value.as_bytes());
    }
    line("Content-Length", body.len().to_string().as_bytes());
    if framing.cors {
        line("Access-Control-Allow-Origin", b"*");
    }
    line("Connection", b"close");

    head.extend_from_slice(b"\r\n");
    head
}

pub async fn write<W>(
    stream: &mut W,
    resp: &Response<Bytes>,
    framing: Framing,
    omit_body: bool,
) -> Result<(), io::Error>
where
    W: AsyncWrite + Unpin,
{
    stream.write_all(&encode_head(resp, framing)).await?;
    if !omit_body {
        stream.write_all(resp.body()).await?;
    }
    stream.flush().await
}
