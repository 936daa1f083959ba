use crate::err::Fault;
use crate::http::request::Request;
use crate::path;
use crate::store::lock::PathLocks;
use bytes::Bytes;
use http::{Method, Response, StatusCode};
use std::path::{Path, PathBuf};
use tokio::fs;

mod collection;
mod files;
mod lock;
mod mime;
mod patch;

pub struct State {
    root: PathBuf,
    locks: PathLocks,
}

impl State {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            locks: PathLocks::default(),
        }
    }
}

pub async fn respond_to_request(req: Request, state: &State) -> Result<Response<Bytes>, Fault> {
    let path = path::resolve(&state.root, &req.target);
    match req.method {
        Some(Method::GET) => files::get(&req, &path, false).await,
        Some(Method::HEAD) => files::get(&req, &path, true).await,
        Some(Method::PUT) => files::put(&req, &path).await,
        Some(Method::POST) => collection::post(&req, &path, &state.locks).await,
        Some(Method::PATCH) => patch::patch(&req, &path, &state.locks).await,
        Some(Method::DELETE) => files::delete(&req, &path).await,
        _ => {
            log::warn!("{} {} -> [not implemented]", req.verb, req.target);
            Ok(json(StatusCode::NOT_IMPLEMENTED, "\"not implemented\""))
        }
    }
}

fn json(status: StatusCode, body: impl Into<Bytes>) -> Response<Bytes> {
    let mut resp = Response::new(body.into());
    *resp.status_mut() = status;
    resp
}

fn empty(status: StatusCode) -> Response<Bytes> {
    json(status, Bytes::new())
}

enum Kind {
    File,
    Dir,
    Missing,
}

/// Anything that can't be stat'ed (including paths that run through a file) counts as missing.
async fn kind(path: &Path) -> Kind {
    match fs::metadata(path).await {
        Ok(meta) if meta.is_file() => Kind::File,
        Ok(meta) if meta.is_dir() => Kind::Dir,
        Ok(_) => Kind::Missing,
        Err(e) => {
            log::trace!("stat {} failed: {}", path.display(), e);
            Kind::Missing
        }
    }
}
