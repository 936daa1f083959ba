use std::path::{Component, Path, PathBuf};

/// Map a request target onto a path under `root`.
///
/// Only the path component of the target is used. It is percent-decoded and then
/// normalized lexically: empty and `.` segments are dropped, and `..` removes the
/// previous segment, or does nothing if there is none. The result can therefore
/// never ascend above `root`. The filesystem is not consulted.
pub fn resolve(root: &Path, target: &str) -> PathBuf {
    let decoded = urlencoding::decode_binary(path_component(target).as_bytes());
    let decoded = String::from_utf8_lossy(&decoded);

    let mut clean = Vec::new();
    for segment in decoded.split('/') {
        // a segment may still carry platform separators or prefixes (e.g. `..\..` on windows)
        for component in Path::new(segment).components() {
            match component {
                Component::Normal(part) => clean.push(part),
                Component::ParentDir => {
                    clean.pop();
                }
                Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            }
        }
    }

    let mut path = root.to_path_buf();
    path.extend(clean);
    path
}

/// Strip the scheme and authority of an absolute-form target, then the query and fragment.
fn path_component(target: &str) -> &str {
    let path = if target.starts_with('/') {
        target
    } else {
        match target.split_once("://") {
            Some((_scheme, rest)) => rest.find('/').map_or("/", |i| &rest[i..]),
            None => target,
        }
    };
    let end = path.find(['?', '#']).unwrap_or(path.len());
    &path[..end]
}
