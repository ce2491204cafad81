//! Error types for connection establishment

use crate::connection::NetKind;
use std::io;
use thiserror::Error;

/// Convenience result alias
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while establishing a connection
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or inconsistent configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Network-level failure while dialing the server
    #[error(transparent)]
    Dial(#[from] DialError),

    /// The supplied context was cancelled by the caller
    #[error("operation cancelled")]
    Cancelled,

    /// The supplied context's deadline passed
    #[error("context deadline exceeded")]
    DeadlineExceeded,

    /// TLS handshake failed after the raw connection was established
    #[error("tls handshake: {0}")]
    Tls(#[source] io::Error),

    /// I/O error outside the dial path
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Whether this error was caused by a dial timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Dial(e) if e.is_timeout())
    }
}

/// A failed network operation, carrying the operation context callers
/// pattern-match on: operation ("dial"), network kind, address, and cause.
///
/// Renders as `dial <net> <addr>: <cause>`, e.g.
/// `dial tcp 1.1.1.1:1234: i/o timeout`.
#[derive(Debug, Error)]
#[error("dial {net} {addr}: {kind}")]
pub struct DialError {
    /// Network kind the dial was attempted on
    pub net: NetKind,
    /// Address the dial was attempted against
    pub addr: String,
    /// Underlying cause
    #[source]
    pub kind: DialErrorKind,
}

/// Cause of a dial failure
#[derive(Debug, Error)]
pub enum DialErrorKind {
    /// The effective deadline expired before the connection was established
    #[error("i/o timeout")]
    Timeout,

    /// The underlying transport error, forwarded unchanged so callers can
    /// inspect its kind (refused, unreachable, resolution failure, ...)
    #[error("{0}")]
    Io(#[from] io::Error),
}

impl DialError {
    /// Dial aborted by deadline expiry
    pub fn timeout(net: NetKind, addr: impl Into<String>) -> Self {
        Self {
            net,
            addr: addr.into(),
            kind: DialErrorKind::Timeout,
        }
    }

    /// Dial failed with a transport-level error
    pub fn io(net: NetKind, addr: impl Into<String>, err: io::Error) -> Self {
        Self {
            net,
            addr: addr.into(),
            kind: DialErrorKind::Io(err),
        }
    }

    /// Whether the dial failed because the effective deadline expired
    pub fn is_timeout(&self) -> bool {
        match &self.kind {
            DialErrorKind::Timeout => true,
            DialErrorKind::Io(e) => e.kind() == io::ErrorKind::TimedOut,
        }
    }

    /// The underlying I/O error, if the cause was not a deadline expiry
    pub fn io_error(&self) -> Option<&io::Error> {
        match &self.kind {
            DialErrorKind::Timeout => None,
            DialErrorKind::Io(e) => Some(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dial_timeout_message() {
        let err = DialError::timeout(NetKind::Tcp, "1.1.1.1:1234");
        assert_eq!(err.to_string(), "dial tcp 1.1.1.1:1234: i/o timeout");
        assert!(err.is_timeout());
    }

    #[test]
    fn test_dial_io_message() {
        let err = DialError::io(
            NetKind::Unix,
            "/var/run/mysqld/mysqld.sock",
            io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused"),
        );
        assert_eq!(
            err.to_string(),
            "dial unix /var/run/mysqld/mysqld.sock: connection refused"
        );
        assert!(!err.is_timeout());
        assert_eq!(
            err.io_error().map(|e| e.kind()),
            Some(io::ErrorKind::ConnectionRefused)
        );
    }

    #[test]
    fn test_dial_io_timeout_kind_classifies_as_timeout() {
        let err = DialError::io(
            NetKind::Tcp,
            "localhost:3306",
            io::Error::new(io::ErrorKind::TimedOut, "i/o timeout"),
        );
        assert!(err.is_timeout());
    }

    #[test]
    fn test_error_source_chain() {
        use std::error::Error as _;

        let err = Error::from(DialError::io(
            NetKind::Tcp,
            "localhost:3306",
            io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused"),
        ));
        assert!(err.source().is_some());
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_cancelled_distinct_from_timeout() {
        assert!(!Error::Cancelled.is_timeout());
        assert_eq!(Error::Cancelled.to_string(), "operation cancelled");
    }
}
