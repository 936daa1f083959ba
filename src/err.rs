use crate::http::request::RequestError;
use std::any::Any;
use std::fmt::{self, Debug, Display};
use std::io;

pub type Error = Box<dyn std::error::Error + Send + Sync + 'static>;

pub struct DisplayError(Error);

impl Debug for DisplayError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl<T: Into<Error>> From<T> for DisplayError {
    fn from(display: T) -> Self {
        DisplayError(display.into())
    }
}

/// Anything that goes wrong while reading or handling a single request.
/// Every variant is answered with a 500 and never outlives its connection.
#[derive(Debug, thiserror::Error)]
pub enum Fault {
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("{0} is not a json object")]
    NotAnObject(&'static str),
    #[error("{0}")]
    Panic(String),
}

impl Fault {
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = match payload.downcast::<String>() {
            Ok(s) => *s,
            Err(payload) => match payload.downcast::<&'static str>() {
                Ok(s) => (*s).to_owned(),
                Err(_) => "non-string panic payload".to_owned(),
            },
        };
        Fault::Panic(message)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Fault::Request(_) => "RequestError",
            Fault::Io(_) => "IoError",
            Fault::Json(_) => "JsonError",
            Fault::NotAnObject(_) => "NotAnObject",
            Fault::Panic(_) => "Panic",
        }
    }
}

pub trait IoErrorExt {
    fn applies_to(&self) -> AppliesTo;
}

impl IoErrorExt for io::Error {
    fn applies_to(&self) -> AppliesTo {
        match self.kind() {
            io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset => AppliesTo::Connection,
            _ => AppliesTo::Listener,
        }
    }
}

pub enum AppliesTo {
    Connection,
    Listener,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic;

    #[test]
    fn panic_payloads_become_messages() {
        let payload = panic::catch_unwind(|| panic!("boom!")).unwrap_err();
        assert_eq!(Fault::from_panic(payload).to_string(), "boom!");

        let id = 7;
        let payload = panic::catch_unwind(|| panic!("boom {}", id)).unwrap_err();
        assert_eq!(Fault::from_panic(payload).to_string(), "boom 7");

        let payload = panic::catch_unwind(|| panic::panic_any(42u8)).unwrap_err();
        assert_eq!(Fault::from_panic(payload).kind(), "Panic");
    }

    #[test]
    fn connection_errors_do_not_stop_the_listener() {
        let reset = io::Error::from(io::ErrorKind::ConnectionReset);
        assert!(matches!(reset.applies_to(), AppliesTo::Connection));

        let other = io::Error::from(io::ErrorKind::PermissionDenied);
        assert!(matches!(other.applies_to(), AppliesTo::Listener));
    }
}
