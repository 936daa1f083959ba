use crate::config::{MAX_BODY_LEN, MAX_HEADERS, MAX_LINE_LEN};
use bytes::Bytes;
use http::Method;
use std::fmt::{self, Display};
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("error reading request: {0}")]
    Io(#[from] io::Error),
    #[error("connection closed before the request was complete")]
    Truncated,
    #[error("request line or header longer than {max} bytes", max = MAX_LINE_LEN)]
    LineTooLong,
    #[error("more than {max} headers", max = MAX_HEADERS)]
    TooManyHeaders,
    #[error("malformed request line {0:?}")]
    MalformedRequestLine(String),
    #[error("invalid content length {0:?}")]
    InvalidContentLength(String),
    #[error("body of {0} bytes exceeds the limit of {max} bytes", max = MAX_BODY_LEN)]
    BodyTooLarge(u64),
    #[error("timed out waiting for the request")]
    Timeout,
}

/// Header fields in arrival order. Names keep the case they were received in,
/// but are compared case-insensitively; a repeated name replaces the earlier value.
#[derive(Debug, Default, Clone)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    pub fn insert(&mut self, name: String, value: String) {
        match self
            .0
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(&name))
        {
            Some(existing) => *existing = (name, value),
            None => self.0.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

#[derive(Debug)]
pub struct Request {
    /// The method token as sent, upper-cased
    pub verb: String,
    /// `None` if `verb` isn't a valid method token; such requests are still dispatched
    pub method: Option<Method>,
    pub target: String,
    /// Empty when the request line has no version
    pub version: String,
    pub headers: Headers,
    pub body: Bytes,
}

impl Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.verb, self.target)?;
        if !self.version.is_empty() {
            write!(f, " {}", self.version)?;
        }
        Ok(())
    }
}

/// Read one request: the request line, the header block, and a body of exactly
/// `Content-Length` bytes if that header is present.
///
/// The version may be missing from the request line; the method and target may not.
pub async fn read<R>(stream: &mut R) -> Result<Request, RequestError>
where
    R: AsyncBufRead + Unpin,
{
    let line = read_line(stream).await?.ok_or(RequestError::Truncated)?;
    let (method, target, version) = {
        let mut parts = line.split_ascii_whitespace();
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(method), Some(target), version, None) => {
                (method, target, version.unwrap_or_default())
            }
            _ => return Err(RequestError::MalformedRequestLine(line.clone())),
        }
    };
    let verb = method.to_ascii_uppercase();
    let method = Method::from_bytes(verb.as_bytes()).ok();
    let target = target.to_owned();
    let version = version.to_owned();

    let mut headers = Headers::default();
    loop {
        let line = read_line(stream).await?.ok_or(RequestError::Truncated)?;
        if line.is_empty() {
            break;
        }
        if headers.len() >= MAX_HEADERS {
            return Err(RequestError::TooManyHeaders);
        }
        let (name, value) = line.split_once(": ").unwrap_or((line.as_str(), ""));
        headers.insert(name.to_owned(), value.trim().to_owned());
    }

    let body = match headers.get("Content-Length") {
        None => Bytes::new(),
        Some(len) => {
            let len = len
                .parse::<u64>()
                .map_err(|_| RequestError::InvalidContentLength(len.to_owned()))?;
            if len > MAX_BODY_LEN {
                return Err(RequestError::BodyTooLarge(len));
            }
            let mut body = vec![0; len as usize];
            stream.read_exact(&mut body).await.map_err(|e| match e.kind() {
                io::ErrorKind::UnexpectedEof => RequestError::Truncated,
                _ => RequestError::Io(e),
            })?;
            Bytes::from(body)
        }
    };

    Ok(Request {
        verb,
        method,
        target,
        version,
        headers,
        body,
    })
}

/// Read a line terminated by CRLF (a bare LF is tolerated), without the terminator.
/// Returns `None` if the stream is already at EOF.
async fn read_line<R>(stream: &mut R) -> Result<Option<String>, RequestError>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let limit = MAX_LINE_LEN as u64 + 2;
    let n = (&mut *stream).take(limit).read_until(b'\n', &mut buf).await?;
    if n == 0 {
        return Ok(None);
    }
    if buf.last() != Some(&b'\n') {
        return Err(if n as u64 == limit {
            RequestError::LineTooLong
        } else {
            RequestError::Truncated
        });
    }
    buf.pop();
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }
    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}
