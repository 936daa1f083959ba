use crate::err::Fault;
use crate::http::request::Request;
use crate::store::json;
use crate::store::lock::PathLocks;
use bytes::Bytes;
use http::{Response, StatusCode};
use std::ffi::{OsStr, OsString};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

/// A `*.json` file directly inside a collection directory.
struct Entry {
    path: PathBuf,
    name: OsString,
    /// Set when the file stem is a number
    id: Option<u64>,
}

/// Store the body as a new entry of the collection at `path`, creating the
/// directory if needed.
pub async fn post(req: &Request, path: &Path, locks: &PathLocks) -> Result<Response<Bytes>, Fault> {
    let _guard = locks.lock(path).await;

    fs::create_dir_all(path).await?;
    let id = next_id(path).await?;
    fs::write(path.join(format!("{}.json", id)), &req.body).await?;

    log::info!("{} {} -> [created {}]", req.verb, req.target, id);
    Ok(json(StatusCode::CREATED, format!("{{\"id\":{}}}", id)))
}

/// One more than the largest numeric entry id, or 1 for a collection without any.
/// Gaps are never filled, but deleting the largest entry frees its id again.
pub async fn next_id(dir: &Path) -> Result<u64, io::Error> {
    let max = entries(dir).await?.into_iter().filter_map(|e| e.id).max();
    match max {
        None => Ok(1),
        Some(max) => max
            .checked_add(1)
            .ok_or_else(|| io::Error::other("collection ids exhausted")),
    }
}

/// Join the raw contents of every entry into a json array, without parsing them.
/// Entries are ordered by id, then by name for non-numeric entries; blank files are skipped.
pub async fn concat_json(dir: &Path) -> Result<(usize, Bytes), io::Error> {
    let mut entries = entries(dir).await?;
    entries.sort_by(|a, b| {
        (a.id.is_none(), a.id, &a.name).cmp(&(b.id.is_none(), b.id, &b.name))
    });

    let mut count = 0;
    let mut out = vec![b'['];
    for entry in entries {
        let contents = fs::read(&entry.path).await?;
        if contents.iter().all(u8::is_ascii_whitespace) {
            log::debug!("skipping blank entry {}", entry.path.display());
            continue;
        }
        if count > 0 {
            out.push(b',');
        }
        out.extend_from_slice(&contents);
        count += 1;
    }
    out.push(b']');

    Ok((count, Bytes::from(out)))
}

async fn entries(dir: &Path) -> Result<Vec<Entry>, io::Error> {
    let mut entries = Vec::new();
    let mut read_dir = fs::read_dir(dir).await?;
    while let Some(entry) = read_dir.next_entry().await? {
        let path = entry.path();
        if path.extension().map_or(true, |ext| ext != OsStr::new("json")) {
            continue;
        }
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let id = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .and_then(|stem| stem.parse().ok());
        entries.push(Entry {
            name: entry.file_name(),
            path,
            id,
        });
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use tempfile::tempdir;

    #[tokio::test]
    async fn ids_start_at_one() {
        let dir = tempdir().unwrap();
        assert_eq!(next_id(dir.path()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn ids_follow_the_largest_entry() {
        let dir = tempdir().unwrap();
        for name in ["1.json", "7.json", "3.json", "99.txt", "abc.json"] {
            std::fs::write(dir.path().join(name), "{}").unwrap();
        }
        std::fs::create_dir(dir.path().join("50.json")).unwrap();
        assert_eq!(next_id(dir.path()).await.unwrap(), 8);

        // gaps left by deletes are not filled
        std::fs::remove_file(dir.path().join("3.json")).unwrap();
        assert_eq!(next_id(dir.path()).await.unwrap(), 8);
    }

    #[tokio::test]
    async fn concatenates_entries_in_order() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("10.json"), "{\"n\":10}").unwrap();
        std::fs::write(dir.path().join("9.json"), "{\"n\":9}").unwrap();
        std::fs::write(dir.path().join("named.json"), "\"named\"").unwrap();
        std::fs::write(dir.path().join("blank.json"), " \n").unwrap();
        std::fs::write(dir.path().join("other.txt"), "ignored").unwrap();

        let (count, listing) = concat_json(dir.path()).await.unwrap();
        assert_eq!(count, 3);
        assert_eq!(&listing[..], b"[{\"n\":9},{\"n\":10},\"named\"]");
        let parsed: Value = serde_json::from_slice(&listing).unwrap();
        assert_eq!(parsed, json!([{"n": 9}, {"n": 10}, "named"]));
    }

    #[tokio::test]
    async fn empty_collections_are_empty_arrays() {
        let dir = tempdir().unwrap();
        let (count, listing) = concat_json(dir.path()).await.unwrap();
        assert_eq!(count, 0);
        assert_eq!(&listing[..], b"[]");
    }
}
