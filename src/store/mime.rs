use std::path::Path;

const CONTENT_TYPES: &[(&str, &str)] = &[
    ("json", "application/json"),
    ("bmp", "image/bmp"),
    ("gif", "image/gif"),
    ("jpg", "image/jpeg"),
    ("png", "image/png"),
    ("css", "text/css"),
    ("html", "text/html"),
    ("txt", "text/plain"),
    ("xml", "text/xml"),
];

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

pub fn content_type(path: &Path) -> &'static str {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| {
            CONTENT_TYPES
                .iter()
                .find(|(known, _)| known.eq_ignore_ascii_case(ext))
        })
        .map_or(DEFAULT_CONTENT_TYPE, |&(_, content_type)| content_type)
}
