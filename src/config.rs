use std::time::Duration;

pub const DEFAULT_PORT: u16 = 4444;

/// Longest request line or header line accepted, excluding the line terminator.
pub const MAX_LINE_LEN: usize = 8 * 1024;
pub const MAX_HEADERS: usize = 100;
pub const MAX_BODY_LEN: u64 = 64 * 1024 * 1024;

/// Time allowed for a client to send the full request (head and body).
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
