use std::collections::HashMap;
use std::sync::Arc;

use http::header::{HeaderValue, ALLOW};
use http::{Method, StatusCode};
use serde_json::Value;
use tracing::debug;

use super::route::{Route, RouteId};
use super::store::{ParamVec, Store, StoreMatch};
use super::METHODS;
use crate::context::{Chain, Context, Handler, Request};
use crate::error::{Error, HttpError, Result};
use crate::response::Response;
use crate::writer::DataWriter;

/// Frozen, read-only routing table produced by [`crate::Mux::into_router`].
///
/// `Router` is `Send + Sync`; share it behind an `Arc` or publish it through
/// a [`crate::SharedRouter`].
pub struct Router {
    routes: Vec<Route>,
    registered: Vec<RouteId>,
    named: HashMap<String, RouteId>,
    stores: HashMap<Method, Box<dyn Store>>,
    not_found: Chain,
    writer: Arc<dyn DataWriter>,
}

impl Router {
    pub(crate) fn from_parts(
        routes: Vec<Route>,
        registered: Vec<RouteId>,
        named: HashMap<String, RouteId>,
        stores: HashMap<Method, Box<dyn Store>>,
        not_found: Chain,
        writer: Arc<dyn DataWriter>,
    ) -> Self {
        Self {
            routes,
            registered,
            named,
            stores,
            not_found,
            writer,
        }
    }

    /// Create a context over an explicit chain, using this router's data writer.
    pub fn new_context(&self, request: Request, handlers: impl Into<Chain>) -> Context {
        Context::new(request, handlers).with_writer(Arc::clone(&self.writer))
    }

    /// Resolve `path` in the store for `method`.
    #[must_use]
    pub fn find(&self, method: &Method, path: &str) -> Option<StoreMatch> {
        self.stores.get(method)?.find(path)
    }

    /// Methods other than `method` whose stores match `path`, in canonical order.
    #[must_use]
    pub fn allowed_methods(&self, method: &Method, path: &str) -> Vec<Method> {
        METHODS
            .iter()
            .filter(|m| *m != method)
            .filter(|m| self.find(m, path).is_some())
            .cloned()
            .collect()
    }

    /// Match the context's request and drive the resulting chain.
    ///
    /// When nothing matches, the methods that would match are recorded on
    /// the context and the not-found chain runs instead. The result of the
    /// outermost `next()` is returned unchanged.
    pub fn serve(&self, ctx: &mut Context) -> Result<()> {
        let method = ctx.method().clone();
        let path = ctx.path().to_string();
        ctx.set_writer(Arc::clone(&self.writer));

        match self.find(&method, &path) {
            Some(found) => {
                debug!(
                    request_id = %ctx.request_id(),
                    method = %method,
                    path = %path,
                    handlers = found.chain.len(),
                    path_params = ?found.params,
                    "Route matched"
                );
                ctx.bind(found.chain, found.params);
            }
            None => {
                let allowed = self.allowed_methods(&method, &path);
                debug!(
                    request_id = %ctx.request_id(),
                    method = %method,
                    path = %path,
                    allowed = ?allowed,
                    "No route matched"
                );
                ctx.set_allowed_methods(allowed);
                ctx.bind(Arc::clone(&self.not_found), ParamVec::new());
            }
        }
        ctx.next()
    }

    /// Serve `request` with a fresh context.
    pub fn handle(&self, request: Request) -> (Response, Result<()>) {
        let mut ctx = self.new_context(request, Vec::<Handler>::new());
        let result = self.serve(&mut ctx);
        (ctx.into_response(), result)
    }

    /// Registered routes in registration order.
    pub fn routes(&self) -> impl Iterator<Item = &Route> + '_ {
        self.registered.iter().map(|id| &self.routes[id.0])
    }

    /// Look up a named route.
    #[must_use]
    pub fn route(&self, name: &str) -> Option<&Route> {
        self.named.get(name).map(|id| &self.routes[id.0])
    }

    /// Build the URL of a named route; see [`Route::url`].
    #[must_use]
    pub fn url(&self, name: &str, pairs: &[Value]) -> Option<String> {
        self.route(name).map(|r| r.url(pairs))
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.registered.len())
            .field("named", &self.named.len())
            .field("not_found_handlers", &self.not_found.len())
            .finish()
    }
}

/// Answer a request whose path matches under other methods.
///
/// Sets `Allow` to those methods plus `OPTIONS` and stops the chain. The
/// status is `405 Method Not Allowed`, or `200 OK` for an `OPTIONS` request.
/// Without any other matching method it passes to the next handler.
pub fn method_not_allowed_handler(ctx: &mut Context) -> Result<()> {
    if ctx.allowed_methods().is_empty() {
        return ctx.next();
    }

    let allowed: Vec<&str> = METHODS
        .iter()
        .filter(|m| **m == Method::OPTIONS || ctx.allowed_methods().contains(m))
        .map(Method::as_str)
        .collect();
    let allow = HeaderValue::from_str(&allowed.join(", "))
        .map_err(|e| Error::msg(format!("invalid Allow header: {e}")))?;

    let status = if ctx.method() == Method::OPTIONS {
        StatusCode::OK
    } else {
        StatusCode::METHOD_NOT_ALLOWED
    };
    let res = ctx.response_mut();
    res.headers_mut().insert(ALLOW, allow);
    res.set_status(status);
    ctx.abort();
    Ok(())
}

/// Fail with a `404 Not Found` [`HttpError`].
pub fn not_found_handler(_ctx: &mut Context) -> Result<()> {
    Err(HttpError::new(StatusCode::NOT_FOUND).into())
}
