//! Per-request execution state and the handler chain engine.
//!
//! A [`Context`] owns one request, its response buffer and the handler chain
//! the router resolved for it. The chain is driven with an explicit cursor:
//!
//! ```rust
//! use brrtmux::{handler, Context};
//!
//! let chain = vec![
//!     handler(|ctx: &mut Context| {
//!         ctx.response_mut().write_str("1.");
//!         ctx.next()?;
//!         ctx.response_mut().write_str("3.");
//!         Ok(())
//!     }),
//!     handler(|ctx: &mut Context| {
//!         ctx.response_mut().write_str("2.");
//!         Ok(())
//!     }),
//! ];
//!
//! let mut ctx = Context::new(http::Request::default(), chain);
//! ctx.next().unwrap();
//! assert_eq!(ctx.response().body_string(), "1.2.3.");
//! ```
//!
//! Errors travel back up as `Result` values. Panics are never caught here;
//! recovery is opt-in through [`crate::fault::panic_handler`].

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use http::Method;

use crate::error::Result;
use crate::ids::RequestId;
use crate::response::Response;
use crate::router::ParamVec;
use crate::writer::{Data, DataWriter, DefaultDataWriter};

/// Request type carried by a [`Context`]
pub type Request = http::Request<Vec<u8>>;

/// A unit of request processing.
pub type Handler = Arc<dyn Fn(&mut Context) -> Result<()> + Send + Sync>;

/// Ordered handler sequence shared between routes and contexts.
pub type Chain = Arc<[Handler]>;

/// Wrap a closure as a [`Handler`].
pub fn handler<F>(f: F) -> Handler
where
    F: Fn(&mut Context) -> Result<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Header consulted for an incoming request id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

fn request_id_of(request: &Request) -> RequestId {
    RequestId::from_header_or_new(
        request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok()),
    )
}

/// Per-request execution unit.
pub struct Context {
    chain: Chain,
    cursor: usize,
    request: Request,
    response: Response,
    params: ParamVec,
    data: HashMap<String, Box<dyn Any + Send + Sync>>,
    request_id: RequestId,
    allowed: Vec<Method>,
    writer: Arc<dyn DataWriter>,
}

impl Context {
    /// Create a context over `request` with the cursor at the start of `chain`.
    pub fn new(request: Request, chain: impl Into<Chain>) -> Self {
        let request_id = request_id_of(&request);
        Self {
            chain: chain.into(),
            cursor: 0,
            request,
            response: Response::new(),
            params: ParamVec::new(),
            data: HashMap::new(),
            request_id,
            allowed: Vec::new(),
            writer: Arc::new(DefaultDataWriter),
        }
    }

    /// Replace the data writer used by [`Context::write`].
    #[must_use]
    pub fn with_writer(mut self, writer: Arc<dyn DataWriter>) -> Self {
        self.writer = writer;
        self
    }

    /// Run the handler at the cursor.
    ///
    /// The cursor advances before the handler is invoked, so a handler that
    /// calls `next()` again continues with the following one. Past the end of
    /// the chain this returns `Ok(())` without doing anything.
    pub fn next(&mut self) -> Result<()> {
        let Some(current) = self.chain.get(self.cursor).map(Arc::clone) else {
            return Ok(());
        };
        self.cursor += 1;
        current(self)
    }

    /// Skip every handler that has not run yet.
    pub fn abort(&mut self) {
        self.cursor = self.chain.len();
    }

    /// Whether the cursor has reached the end of the chain.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.cursor >= self.chain.len()
    }

    /// Recycle this context for another request.
    ///
    /// The chain, cursor, params, data, allowed methods and response are
    /// cleared. The data writer is kept.
    pub fn reset(&mut self, request: Request) {
        self.request_id = request_id_of(&request);
        self.request = request;
        self.chain = Arc::from(Vec::<Handler>::new());
        self.cursor = 0;
        self.response.reset();
        self.params.clear();
        self.data.clear();
        self.allowed.clear();
    }

    /// Bind a resolved chain and its parameters, rewinding the cursor.
    pub(crate) fn bind(&mut self, chain: Chain, params: ParamVec) {
        self.chain = chain;
        self.cursor = 0;
        self.params = params;
    }

    pub(crate) fn set_allowed_methods(&mut self, allowed: Vec<Method>) {
        self.allowed = allowed;
    }

    pub(crate) fn set_writer(&mut self, writer: Arc<dyn DataWriter>) {
        self.writer = writer;
    }

    /// Methods whose routes match this path, recorded when no route matched
    /// the request's own method.
    #[must_use]
    pub fn allowed_methods(&self) -> &[Method] {
        &self.allowed
    }

    /// Number of handlers in the bound chain.
    #[must_use]
    pub fn chain_len(&self) -> usize {
        self.chain.len()
    }

    /// Get a path parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn params(&self) -> &ParamVec {
        &self.params
    }

    /// Store a per-request value under `key`, replacing any previous value.
    pub fn set<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.data.insert(key.into(), Box::new(value));
    }

    /// Fetch a per-request value stored with [`Context::set`].
    ///
    /// Returns `None` when the key is missing or holds a different type.
    #[must_use]
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.data.get(key).and_then(|v| v.downcast_ref::<T>())
    }

    #[must_use]
    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn request_mut(&mut self) -> &mut Request {
        &mut self.request
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        self.request.method()
    }

    #[must_use]
    pub fn path(&self) -> &str {
        self.request.uri().path()
    }

    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    #[must_use]
    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn response_mut(&mut self) -> &mut Response {
        &mut self.response
    }

    /// Consume the context, keeping only the response.
    #[must_use]
    pub fn into_response(self) -> Response {
        self.response
    }

    /// Write `data` into the response body through the context's data writer.
    pub fn write(&mut self, data: impl Into<Data>) -> Result<()> {
        let writer = Arc::clone(&self.writer);
        writer.write(&mut self.response, data.into())
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("method", self.request.method())
            .field("path", &self.request.uri().path())
            .field("request_id", &self.request_id)
            .field("cursor", &self.cursor)
            .field("handlers", &self.chain.len())
            .field("params", &self.params)
            .finish()
    }
}
