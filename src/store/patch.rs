use crate::err::Fault;
use crate::http::request::Request;
use crate::store::files::write_to_path;
use crate::store::lock::PathLocks;
use crate::store::{json, kind, Kind};
use bytes::Bytes;
use http::{Response, StatusCode};
use serde_json::{Map, Value};
use std::path::Path;
use tokio::fs;

/// Merge the body into the json document at `path`, or write it as-is if there is no such file.
pub async fn patch(req: &Request, path: &Path, locks: &PathLocks) -> Result<Response<Bytes>, Fault> {
    let _guard = locks.lock(path).await;

    match kind(path).await {
        Kind::File => {
            let current = fs::read(path).await?;
            let merged = merge_json(&current, &req.body)?;
            write_to_path(path, &merged).await?;
            log::info!("{} {} -> [merged {} bytes]", req.verb, req.target, req.body.len());
        }
        Kind::Dir | Kind::Missing => {
            write_to_path(path, &req.body).await?;
            log::info!("{} {} -> [wrote {} bytes]", req.verb, req.target, req.body.len());
        }
    }

    Ok(json(StatusCode::OK, "\"Success\""))
}

fn merge_json(current: &[u8], patch: &[u8]) -> Result<Vec<u8>, Fault> {
    let Value::Object(patch) = serde_json::from_slice(patch)? else {
        return Err(Fault::NotAnObject("patch body"));
    };
    let Value::Object(mut current) = serde_json::from_slice(current)? else {
        return Err(Fault::NotAnObject("stored document"));
    };
    merge(&mut current, patch);
    Ok(serde_json::to_vec(&current)?)
}

/// Apply `patch` to `target` key by key. Objects present on both sides are merged
/// recursively, a null removes the key, and anything else replaces the old value.
pub fn merge(target: &mut Map<String, Value>, patch: Map<String, Value>) {
    for (key, value) in patch {
        match value {
            Value::Null => {
                target.remove(&key);
            }
            Value::Object(nested) => match target.get_mut(&key) {
                Some(Value::Object(existing)) => merge(existing, nested),
                _ => {
                    target.insert(key, Value::Object(nested));
                }
            },
            value => {
                target.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn merged(current: Value, patch: Value) -> Value {
        let (Value::Object(mut current), Value::Object(patch)) = (current, patch) else {
            panic!("objects only");
        };
        merge(&mut current, patch);
        Value::Object(current)
    }

    #[test]
    fn merges_nested_objects() {
        assert_eq!(
            merged(
                json!({"base": 3, "nested": {"a": 1, "c": 3}}),
                json!({"nested": {"a": null, "b": 2}}),
            ),
            json!({"base": 3, "nested": {"c": 3, "b": 2}})
        );
    }

    #[test]
    fn replaces_non_objects() {
        assert_eq!(
            merged(
                json!({"list": [1, 2], "scalar": {"was": "object"}, "keep": true}),
                json!({"list": [3], "scalar": 5, "new": {"x": null}}),
            ),
            json!({"list": [3], "scalar": 5, "keep": true, "new": {"x": null}})
        );
    }

    #[test]
    fn null_removes_keys() {
        assert_eq!(
            merged(json!({"a": 1, "b": {"c": 1}}), json!({"a": null, "b": null, "z": null})),
            json!({})
        );
    }

    #[test]
    fn top_level_values_must_be_objects() {
        assert!(matches!(
            merge_json(b"{}", b"[1]"),
            Err(Fault::NotAnObject("patch body"))
        ));
        assert!(matches!(
            merge_json(b"[1]", b"{}"),
            Err(Fault::NotAnObject("stored document"))
        ));
        assert!(matches!(merge_json(b"{}", b"{oops"), Err(Fault::Json(_))));
    }

    #[tokio::test]
    async fn patches_files_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        std::fs::write(&path, "{\"base\":3,\"nested\":{\"a\":1,\"c\":3}}").unwrap();
        let req = Request {
            verb: "PATCH".to_owned(),
            method: Some(http::Method::PATCH),
            target: "/doc.json".to_owned(),
            version: "HTTP/1.1".to_owned(),
            headers: Default::default(),
            body: Bytes::from_static(b"{\"nested\":{\"a\":null,\"b\":2}}"),
        };

        let resp = patch(&req, &path, &PathLocks::default()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let stored: Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(stored, json!({"base": 3, "nested": {"c": 3, "b": 2}}));
    }
}
