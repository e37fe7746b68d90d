//! Error Classification
//!
//! Decides whether a failed attempt may be retried by matching the error's
//! code or message against a configured list of retryable markers.

use std::borrow::Cow;
use std::io;

use crate::error::OperationError;

// == Classify ==
/// What the retry executor needs to know about an operation error.
pub trait Classify {
    /// Machine-readable code such as `ECONNRESET`, if the error carries one.
    fn code(&self) -> Option<&str> {
        None
    }

    /// Human-readable description searched for retryable markers.
    fn message(&self) -> Cow<'_, str>;
}

/// An error is retryable when its code equals one of `retryable`, or its
/// message contains one of them.
pub fn is_retryable<E: Classify + ?Sized>(error: &E, retryable: &[String]) -> bool {
    if retryable.is_empty() {
        return false;
    }

    if let Some(code) = error.code() {
        if retryable.iter().any(|marker| marker == code) {
            return true;
        }
    }

    let message = error.message();
    retryable
        .iter()
        .any(|marker| !marker.is_empty() && message.contains(marker.as_str()))
}

impl Classify for OperationError {
    fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    fn message(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.message.as_str())
    }
}

impl Classify for io::Error {
    fn code(&self) -> Option<&str> {
        io_error_code(self)
    }

    fn message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }
}

impl Classify for anyhow::Error {
    /// First code found walking the cause chain.
    fn code(&self) -> Option<&str> {
        self.chain().find_map(|cause| {
            if let Some(err) = cause.downcast_ref::<OperationError>() {
                return err.code.as_deref();
            }
            cause.downcast_ref::<io::Error>().and_then(io_error_code)
        })
    }

    fn message(&self) -> Cow<'_, str> {
        Cow::Owned(format!("{:#}", self))
    }
}

impl Classify for String {
    fn message(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.as_str())
    }
}

impl Classify for &str {
    fn message(&self) -> Cow<'_, str> {
        Cow::Borrowed(*self)
    }
}

/// Maps network-related io error kinds onto errno-style codes.
fn io_error_code(err: &io::Error) -> Option<&'static str> {
    match err.kind() {
        io::ErrorKind::ConnectionReset => Some("ECONNRESET"),
        io::ErrorKind::TimedOut => Some("ETIMEDOUT"),
        io::ErrorKind::ConnectionRefused => Some("ECONNREFUSED"),
        io::ErrorKind::ConnectionAborted => Some("ECONNABORTED"),
        io::ErrorKind::NotConnected => Some("ENOTCONN"),
        io::ErrorKind::BrokenPipe => Some("EPIPE"),
        io::ErrorKind::AddrNotAvailable => Some("EADDRNOTAVAIL"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    fn defaults() -> Vec<String> {
        ["ECONNRESET", "ETIMEDOUT", "ECONNREFUSED", "EHOSTUNREACH"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_matches_code() {
        let err = OperationError::with_code("ECONNRESET", "socket hang up");
        assert!(is_retryable(&err, &defaults()));
    }

    #[test]
    fn test_matches_message_substring() {
        let err = OperationError::new("connect EHOSTUNREACH 10.0.0.1:8545");
        assert!(is_retryable(&err, &defaults()));
    }

    #[test]
    fn test_unrelated_error_is_not_retryable() {
        let err = OperationError::with_code("EINVAL", "invalid argument");
        assert!(!is_retryable(&err, &defaults()));
    }

    #[test]
    fn test_empty_list_retries_nothing() {
        let err = OperationError::with_code("ECONNRESET", "reset");
        assert!(!is_retryable(&err, &[]));
    }

    #[test]
    fn test_io_error_kinds() {
        let reset = io::Error::new(io::ErrorKind::ConnectionReset, "peer reset");
        let denied = io::Error::new(io::ErrorKind::PermissionDenied, "denied");

        assert_eq!(reset.code(), Some("ECONNRESET"));
        assert!(is_retryable(&reset, &defaults()));
        assert!(!is_retryable(&denied, &defaults()));
    }

    #[test]
    fn test_anyhow_searches_cause_chain() {
        let result: Result<(), io::Error> =
            Err(io::Error::new(io::ErrorKind::TimedOut, "read timed out"));
        let err = result.context("fetching block 42").unwrap_err();

        assert_eq!(Classify::code(&err), Some("ETIMEDOUT"));
        assert!(is_retryable(&err, &defaults()));
    }

    #[test]
    fn test_anyhow_message_includes_chain() {
        let err = anyhow::anyhow!("ECONNREFUSED").context("calling rpc");
        assert!(Classify::code(&err).is_none());
        assert!(is_retryable(&err, &defaults()));
    }

    #[test]
    fn test_plain_strings() {
        assert!(is_retryable(&"read ETIMEDOUT", &defaults()));
        assert!(!is_retryable(&"nope".to_string(), &defaults()));
    }
}
