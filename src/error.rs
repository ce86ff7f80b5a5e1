use std::fmt;

use thiserror::Error;

/// The transport failures an adapter can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Timeout,
    Tls,
    Connection,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match *self {
            ErrorKind::Timeout => "request timed out",
            ErrorKind::Tls => "TLS error",
            ErrorKind::Connection => "connection error",
        };
        f.write_str(kind)
    }
}

/// The request never produced a well-formed response. `message` is the
/// engine's diagnostic text, unmodified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    kind: ErrorKind,
    message: String,
}

impl TransportError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        TransportError {
            kind,
            message: message.into(),
        }
    }

    pub fn timeout() -> Self {
        TransportError::new(ErrorKind::Timeout, "")
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.kind, self.message)
        }
    }
}

impl std::error::Error for TransportError {}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The engine could not apply the options it was given.
    #[error("engine rejected the request options")]
    Engine(#[source] anyhow::Error),

    #[error("adapter registry: {0}")]
    Registry(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// The transport failure kind, if this is one.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Error::Transport(err) => Some(err.kind()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_the_engine_message() {
        let err = TransportError::new(ErrorKind::Connection, "Could not resolve host");
        assert_eq!(err.to_string(), "connection error: Could not resolve host");
        assert_eq!(TransportError::timeout().to_string(), "request timed out");

        let err: Error = err.into();
        assert_eq!(err.kind(), Some(ErrorKind::Connection));
        assert_eq!(Error::Config("x".into()).kind(), None);
    }
}
