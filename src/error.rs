use std::fmt;
use std::io;

#[derive(Debug)]
pub enum Error {
    Http(reqwest::Error),
    Json(serde_json::Error),
    Io(io::Error),
    Rejected { result: String, body: String },
    InvalidValue { key: String, value: String },
    Config(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Http(e) => write!(f, "HTTP error: {e}"),
            Error::Json(e) => write!(f, "JSON error: {e}"),
            Error::Io(e) => write!(f, "IO error: {e}"),
            Error::Rejected { result, body } => {
                write!(f, "device rejected request (result {result}): {body}")
            }
            Error::InvalidValue { key, value } => {
                write!(f, "invalid numeric value for {key}: {value:?}")
            }
            Error::Config(msg) => write!(f, "config error: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Http(e) => Some(e),
            Error::Json(e) => Some(e),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Http(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e)
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Coarse category of a failed exchange with the device, used to pick the
/// log level and message. None of these are fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Peer closed the connection mid-request; the device is usually busy.
    ConnectionReset,
    /// Nothing listening at the configured address.
    ConnectionRefused,
    Timeout,
    /// The device answered with a `result` other than `"OK"`.
    Rejected,
    Other,
}

impl FailureKind {
    pub fn of(err: &Error) -> Self {
        match err {
            Error::Rejected { .. } => FailureKind::Rejected,
            Error::Http(e) => {
                if e.is_timeout() {
                    return FailureKind::Timeout;
                }
                match io_kind(e) {
                    Some(io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionAborted) => {
                        FailureKind::ConnectionReset
                    }
                    Some(io::ErrorKind::ConnectionRefused) => FailureKind::ConnectionRefused,
                    Some(io::ErrorKind::TimedOut) => FailureKind::Timeout,
                    _ if e.is_connect() => FailureKind::ConnectionRefused,
                    _ => FailureKind::Other,
                }
            }
            Error::Io(e) => match e.kind() {
                io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionAborted => {
                    FailureKind::ConnectionReset
                }
                io::ErrorKind::ConnectionRefused => FailureKind::ConnectionRefused,
                io::ErrorKind::TimedOut => FailureKind::Timeout,
                _ => FailureKind::Other,
            },
            _ => FailureKind::Other,
        }
    }

    /// Transient failures are logged as warnings, the rest as errors.
    pub fn is_transient(&self) -> bool {
        matches!(self, FailureKind::ConnectionReset | FailureKind::Timeout)
    }
}

fn io_kind(err: &(dyn std::error::Error + 'static)) -> Option<io::ErrorKind> {
    let mut source = Some(err);
    while let Some(e) = source {
        if let Some(io_err) = e.downcast_ref::<io::Error>() {
            return Some(io_err.kind());
        }
        source = e.source();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_is_not_transient() {
        let err = Error::Rejected {
            result: "ERROR".to_string(),
            body: "{}".to_string(),
        };
        assert_eq!(FailureKind::of(&err), FailureKind::Rejected);
        assert!(!FailureKind::of(&err).is_transient());
    }

    #[test]
    fn io_errors_classified_by_kind() {
        let reset = Error::Io(io::Error::from(io::ErrorKind::ConnectionReset));
        assert_eq!(FailureKind::of(&reset), FailureKind::ConnectionReset);
        assert!(FailureKind::of(&reset).is_transient());

        let refused = Error::Io(io::Error::from(io::ErrorKind::ConnectionRefused));
        assert_eq!(FailureKind::of(&refused), FailureKind::ConnectionRefused);

        let timed_out = Error::Io(io::Error::from(io::ErrorKind::TimedOut));
        assert_eq!(FailureKind::of(&timed_out), FailureKind::Timeout);

        let other = Error::Io(io::Error::other("boom"));
        assert_eq!(FailureKind::of(&other), FailureKind::Other);
    }

    #[test]
    fn display_invalid_value() {
        let err = Error::InvalidValue {
            key: "C1_T1_setpoint".to_string(),
            value: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "invalid numeric value for C1_T1_setpoint: \"abc\"");
    }
}
