//! Panic recovery and terminal error reporting.
//!
//! The chain engine never catches panics. Recovery is opt-in and composes by
//! chain position:
//!
//! - [`panic_handler`] runs the rest of the chain inside [`protect`] and turns
//!   a panic into [`crate::Error::Panic`]
//! - [`error_handler`] turns any error returned by the rest of the chain into
//!   a `500` plain-text response
//!
//! Placed as `[error_handler, panic_handler, ..]`, a panicking handler yields a
//! 500 response with the panic message and both middlewares log a fault record.
//!
//! ## Fault logs
//!
//! Both middlewares report through [`FaultLog`]:
//!
//! - [`TracingLog`] emits a structured `tracing` error event
//! - any `Fn(&str)` closure receives the rendered record, e.g.
//!   `panic recovered: xyz at src/api.rs:10:5 (request_id=01H.. method=GET path=/users)`

mod handlers;
mod protect;

use std::backtrace::Backtrace;
use std::fmt;

use http::Method;
use tracing::error;

use crate::context::Context;
use crate::error::Error;
use crate::ids::RequestId;

pub use handlers::{error_handler, panic_handler};
pub use protect::{protect, PanicLocation, RecoveredPanic};

/// What a fault record reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// A panic converted by [`panic_handler`]
    Panic,
    /// An error answered by [`error_handler`]
    Error,
}

impl FaultKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            FaultKind::Panic => "panic recovered",
            FaultKind::Error => "request failed",
        }
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One fault, with the request it happened in.
#[derive(Debug)]
pub struct Fault<'a> {
    pub kind: FaultKind,
    pub error: &'a Error,
    pub request_id: RequestId,
    pub method: &'a Method,
    pub path: &'a str,
}

impl<'a> Fault<'a> {
    pub(crate) fn new(kind: FaultKind, ctx: &'a Context, error: &'a Error) -> Self {
        Self {
            kind,
            error,
            request_id: ctx.request_id(),
            method: ctx.method(),
            path: ctx.path(),
        }
    }

    /// Message of the underlying error.
    #[must_use]
    pub fn message(&self) -> String {
        self.error.to_string()
    }

    #[must_use]
    pub fn location(&self) -> Option<&'a PanicLocation> {
        self.error.location()
    }

    #[must_use]
    pub fn backtrace(&self) -> Option<&'a Backtrace> {
        match self.error {
            Error::Panic(p) => p.backtrace(),
            _ => None,
        }
    }
}

impl fmt::Display for Fault<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.error)?;
        if let Some(location) = self.location() {
            write!(f, " at {location}")?;
        }
        write!(
            f,
            " (request_id={} method={} path={})",
            self.request_id, self.method, self.path
        )?;
        if let Some(backtrace) = self.backtrace() {
            write!(f, "\n{backtrace}")?;
        }
        Ok(())
    }
}

/// Destination for fault records.
pub trait FaultLog: Send + Sync {
    fn log(&self, fault: &Fault<'_>);
}

impl<F> FaultLog for F
where
    F: Fn(&str) + Send + Sync,
{
    fn log(&self, fault: &Fault<'_>) {
        self(&fault.to_string());
    }
}

/// Fault log that emits `tracing` error events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog;

impl FaultLog for TracingLog {
    fn log(&self, fault: &Fault<'_>) {
        let location = fault.location().map(ToString::to_string);
        error!(
            kind = fault.kind.as_str(),
            request_id = %fault.request_id,
            method = %fault.method,
            path = %fault.path,
            location = location.as_deref().unwrap_or(""),
            status = fault.error.status_code().map(|s| s.as_u16()),
            error = %fault.error,
            "Request fault"
        );
        if let Some(backtrace) = fault.backtrace() {
            error!(request_id = %fault.request_id, "{backtrace}");
        }
    }
}
