use std::sync::Arc;

use arc_swap::ArcSwap;

use super::serve::Router;
use crate::context::Request;
use crate::error::Result;
use crate::response::Response;

/// A [`Router`] that can be replaced while requests are being served.
///
/// Readers load the current snapshot without locking; [`SharedRouter::publish`]
/// swaps in a complete new table. A snapshot is never mutated in place, so a
/// request that already loaded one finishes against it.
///
/// ```rust
/// use brrtmux::{handler, Context, Mux, SharedRouter};
///
/// let shared = SharedRouter::new(Mux::new().into_router());
/// let (_, result) = shared.handle(http::Request::get("/ping").body(Vec::new()).unwrap());
/// assert_eq!(result.unwrap_err().status_code(), Some(http::StatusCode::NOT_FOUND));
///
/// let mut mux = Mux::new();
/// mux.get("/ping", [handler(|ctx: &mut Context| ctx.write("pong"))]).unwrap();
/// shared.publish(mux.into_router());
///
/// let (res, _) = shared.handle(http::Request::get("/ping").body(Vec::new()).unwrap());
/// assert_eq!(res.body_string(), "pong");
/// ```
pub struct SharedRouter {
    current: ArcSwap<Router>,
}

impl SharedRouter {
    #[must_use]
    pub fn new(router: Router) -> Self {
        Self {
            current: ArcSwap::from_pointee(router),
        }
    }

    /// Current snapshot.
    #[must_use]
    pub fn load(&self) -> Arc<Router> {
        self.current.load_full()
    }

    /// Replace the routing table, returning the previous snapshot.
    pub fn publish(&self, router: Router) -> Arc<Router> {
        let previous = self.current.swap(Arc::new(router));
        tracing::info!(
            routes_count = self.current.load().routes().count(),
            "Routing table published"
        );
        previous
    }

    /// Serve `request` against the current snapshot.
    pub fn handle(&self, request: Request) -> (Response, Result<()>) {
        self.current.load().handle(request)
    }
}

impl From<Router> for SharedRouter {
    fn from(router: Router) -> Self {
        Self::new(router)
    }
}
