//! Error types shared by handlers, the chain engine and route registration.
//!
//! Handlers return [`Error`], which covers three kinds of failure:
//!
//! - **Handler errors** ([`Error::Other`]): any error a handler produces, wrapped in
//!   `anyhow::Error`.
//! - **Structured HTTP errors** ([`Error::Http`]): an error that carries a status code,
//!   such as the 404 raised by [`crate::router::not_found_handler`].
//! - **Recovered panics** ([`Error::Panic`]): produced only by
//!   [`crate::fault::protect`] and [`crate::fault::panic_handler`].
//!
//! Registration failures are reported separately as [`RouteError`], since they happen
//! during setup and never reach a handler chain.

use std::fmt;

use http::StatusCode;

use crate::fault::{PanicLocation, RecoveredPanic};

/// Result type returned by handlers and [`crate::Context::next`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// An error carrying an HTTP status code.
///
/// The message defaults to the canonical reason phrase of the status
/// (`"Not Found"` for 404).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpError {
    status: StatusCode,
    message: String,
}

impl HttpError {
    /// Create an error whose message is the canonical reason of `status`.
    pub fn new(status: StatusCode) -> Self {
        let message = status
            .canonical_reason()
            .map(str::to_string)
            .unwrap_or_else(|| status.as_str().to_string());
        Self { status, message }
    }

    pub fn with_message(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for HttpError {}

/// Error returned by handlers and propagated through the chain.
#[derive(Debug)]
pub enum Error {
    /// Structured error with a status code
    Http(HttpError),
    /// A panic converted into an error by a protected call
    Panic(RecoveredPanic),
    /// Any other handler failure
    Other(anyhow::Error),
}

impl Error {
    /// Build a handler error from a plain message.
    pub fn msg<M>(message: M) -> Self
    where
        M: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        Error::Other(anyhow::Error::msg(message))
    }

    /// Shorthand for `Error::Http(HttpError::new(status))`.
    pub fn status(status: StatusCode) -> Self {
        Error::Http(HttpError::new(status))
    }

    /// Status code carried by a structured HTTP error.
    #[must_use]
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            Error::Http(e) => Some(e.status_code()),
            _ => None,
        }
    }

    /// Source location of a recovered panic.
    #[must_use]
    pub fn location(&self) -> Option<&PanicLocation> {
        match self {
            Error::Panic(p) => p.location(),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_panic(&self) -> bool {
        matches!(self, Error::Panic(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Http(e) => e.fmt(f),
            Error::Panic(p) => p.fmt(f),
            Error::Other(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Http(e) => Some(e),
            Error::Panic(p) => Some(p),
            Error::Other(e) => Some(e.as_ref()),
        }
    }
}

impl From<HttpError> for Error {
    fn from(value: HttpError) -> Self {
        Error::Http(value)
    }
}

impl From<RecoveredPanic> for Error {
    fn from(value: RecoveredPanic) -> Self {
        Error::Panic(value)
    }
}

impl From<anyhow::Error> for Error {
    fn from(value: anyhow::Error) -> Self {
        Error::Other(value)
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::Other(value.into())
    }
}

impl From<StatusCode> for Error {
    fn from(value: StatusCode) -> Self {
        Error::status(value)
    }
}

/// Route registration error
///
/// Returned by the registration APIs on [`crate::Mux`], [`crate::RouteGroup`]
/// and [`crate::RouteMut`] when a route cannot be added.
#[derive(Debug)]
pub enum RouteError {
    /// A `<name:regex>` constraint failed to compile
    InvalidPattern {
        /// The full route path being registered
        pattern: String,
        /// The regex compilation failure
        source: regex::Error,
    },
    /// A method outside the supported set was requested
    UnsupportedMethod(String),
    /// A method list contained no methods
    EmptyMethodList,
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteError::InvalidPattern { pattern, source } => {
                write!(f, "invalid route pattern '{}': {}", pattern, source)
            }
            RouteError::UnsupportedMethod(method) => {
                write!(f, "unsupported HTTP method '{}'", method)
            }
            RouteError::EmptyMethodList => write!(f, "no HTTP methods given"),
        }
    }
}

impl std::error::Error for RouteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RouteError::InvalidPattern { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_default_message() {
        let err = HttpError::new(StatusCode::NOT_FOUND);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Not Found");
    }

    #[test]
    fn test_error_status_code() {
        let err: Error = StatusCode::FORBIDDEN.into();
        assert_eq!(err.status_code(), Some(StatusCode::FORBIDDEN));
        assert_eq!(Error::msg("boom").status_code(), None);
        assert_eq!(Error::msg("boom").to_string(), "boom");
    }

    #[test]
    fn test_route_error_display() {
        let err = RouteError::UnsupportedMethod("BREW".to_string());
        assert_eq!(err.to_string(), "unsupported HTTP method 'BREW'");
    }
}
