use crate::err::Fault;
use crate::http::request::Request;
use crate::store::{collection, empty, json, kind, mime, Kind};
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderValue, Response, StatusCode};
use std::io;
use std::path::Path;
use tokio::fs;

/// Serve a file, or a directory as a json array of its collection entries.
/// For HEAD the full response is still built; the caller drops the body.
pub async fn get(req: &Request, path: &Path, head: bool) -> Result<Response<Bytes>, Fault> {
    match kind(path).await {
        Kind::File => {
            let contents = fs::read(path).await?;
            log::info!("{} {} -> [found {} bytes]", req.verb, req.target, contents.len());
            let mut resp = Response::new(Bytes::from(contents));
            resp.headers_mut().insert(
                CONTENT_TYPE,
                HeaderValue::from_static(mime::content_type(path)),
            );
            Ok(resp)
        }
        Kind::Dir => {
            let (count, listing) = collection::concat_json(path).await?;
            log::info!("{} {} -> [listing {} entries]", req.verb, req.target, count);
            Ok(json(StatusCode::OK, listing))
        }
        Kind::Missing => {
            log::info!("{} {} -> [not found]", req.verb, req.target);
            let message = if head { "" } else { "\"File not found\"" };
            Ok(json(StatusCode::NOT_FOUND, message))
        }
    }
}

pub async fn put(req: &Request, path: &Path) -> Result<Response<Bytes>, Fault> {
    write_to_path(path, &req.body).await?;
    log::info!("{} {} -> [wrote {} bytes]", req.verb, req.target, req.body.len());
    Ok(json(StatusCode::OK, "\"Success\""))
}

pub async fn delete(req: &Request, path: &Path) -> Result<Response<Bytes>, Fault> {
    match kind(path).await {
        Kind::File => match fs::remove_file(path).await {
            Ok(()) => log::info!("{} {} -> [deleted]", req.verb, req.target),
            // raced with another delete
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::info!("{} {} -> [already gone]", req.verb, req.target)
            }
            Err(e) => return Err(e.into()),
        },
        Kind::Dir | Kind::Missing => {
            log::info!("{} {} -> [nothing to delete]", req.verb, req.target)
        }
    }
    Ok(empty(StatusCode::NO_CONTENT))
}

/// Write `data` to `path`, creating any missing parent directories first.
pub async fn write_to_path(path: &Path, data: &[u8]) -> Result<(), io::Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, data).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::request::Headers;
    use http::Method;
    use tempfile::tempdir;

    fn request(method: Method, body: &'static str) -> Request {
        Request {
            verb: method.to_string(),
            method: Some(method),
            target: "/test".to_owned(),
            version: "HTTP/1.1".to_owned(),
            headers: Headers::default(),
            body: Bytes::from_static(body.as_bytes()),
        }
    }

    #[tokio::test]
    async fn put_creates_parents_and_overwrites() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a/b/c.txt");

        let resp = put(&request(Method::PUT, "first"), &path).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first");

        put(&request(Method::PUT, "second"), &path).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
    }

    #[tokio::test]
    async fn get_reports_missing_paths() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nope.txt");

        let resp = get(&request(Method::GET, ""), &path, false).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(&resp.body()[..], b"\"File not found\"");

        let resp = get(&request(Method::HEAD, ""), &path, true).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert!(resp.body().is_empty());
    }

    #[tokio::test]
    async fn paths_through_files_are_missing() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("file"), "x").unwrap();
        let path = dir.path().join("file/child");

        let resp = get(&request(Method::GET, ""), &path, false).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = delete(&request(Method::DELETE, ""), &path).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn delete_leaves_directories_alone() {
        let dir = tempdir().unwrap();
        let sub = dir.path().join("sub");
        std::fs::create_dir(&sub).unwrap();

        let resp = delete(&request(Method::DELETE, ""), &sub).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert!(sub.is_dir());
    }
}
