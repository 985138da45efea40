//! # brrtmux
//!
//! **brrtmux** is a named-route HTTP multiplexer: it maps a `(method, path)`
//! pair to an ordered chain of handlers, drives that chain with explicit
//! continuation, and builds reverse URLs from named, parameterized routes.
//!
//! ## Overview
//!
//! The crate covers the routing and middleware-dispatch core of an HTTP
//! server. It does not listen on sockets: a transport hands it an
//! `http::Request<Vec<u8>>` and writes back the buffered [`Response`].
//!
//! ## Architecture
//!
//! - **[`router`]** - Path patterns, per-method stores, route groups, the setup-phase
//!   [`Mux`] and the frozen [`Router`]
//! - **[`context`]** - The per-request [`Context`] and its cursor-driven chain engine
//! - **[`fault`]** - Opt-in panic recovery ([`fault::panic_handler`]) and terminal
//!   error reporting ([`fault::error_handler`])
//! - **[`writer`]** - Default response-body serialization
//! - **[`manifest`]** - TOML route manifests used by the `brrtmux` CLI
//! - **[`config`]** / **[`logging`]** - Environment-driven configuration and `tracing` setup
//!
//! ### Request Handling Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Transport
//!     participant Router
//!     participant Store as Store<br/>(per method)
//!     participant Ctx as Context
//!     participant Chain as Handler chain
//!
//!     Transport->>Router: serve(ctx)
//!     Router->>Store: find("/users/42")
//!     alt Route matched
//!         Store-->>Router: chain + params {id: "42"}
//!     else No route
//!         Router->>Router: record allowed methods
//!         Router->>Router: use not-found chain
//!     end
//!     Router->>Ctx: bind(chain, params)
//!     Router->>Ctx: next()
//!     Ctx->>Chain: handler[0](ctx)
//!     Chain->>Ctx: next()
//!     Ctx->>Chain: handler[1](ctx)
//!     Chain-->>Ctx: Result
//!     Ctx-->>Router: Result
//!     Router-->>Transport: Result (Response stays in ctx)
//! ```
//!
//! ### Key Architectural Patterns
//!
//! 1. **Two phases**: routes are registered through `&mut Mux`, then frozen into an
//!    immutable, `Send + Sync` [`Router`]
//! 2. **Explicit continuation**: a handler runs the rest of the chain by calling
//!    [`Context::next`] and sees its result
//! 3. **Inherited middleware**: groups prepend their handlers to every route created
//!    through them, outermost group first
//! 4. **Recovery by position**: panics are only caught where a [`fault::panic_handler`]
//!    sits in the chain
//!
//! ## Quick Start
//!
//! ```rust
//! use brrtmux::fault::{error_handler, panic_handler, TracingLog};
//! use brrtmux::{handler, url, Context, Mux};
//!
//! let mut mux = Mux::new();
//! mux.use_middleware([error_handler(TracingLog), panic_handler(TracingLog)]);
//!
//! let mut api = mux.group("/api", []);
//! api.get(
//!     "/users/<id:\\d+>",
//!     [handler(|ctx: &mut Context| {
//!         let id = ctx.param("id").unwrap_or_default().to_string();
//!         ctx.write(format!("user {id}"))
//!     })],
//! )
//! .unwrap()
//! .name("user");
//!
//! let router = mux.into_router();
//! let (res, result) = router.handle(http::Request::get("/api/users/7").body(Vec::new()).unwrap());
//! assert!(result.is_ok());
//! assert_eq!(res.body_string(), "user 7");
//!
//! let user = router.route("user").unwrap();
//! assert_eq!(url!(user, "id", 8), "/api/users/8");
//! ```

pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod fault;
pub mod ids;
pub mod logging;
pub mod manifest;
pub mod response;
pub mod router;
pub mod writer;

pub use context::{handler, Chain, Context, Handler, Request};
pub use error::{Error, HttpError, Result, RouteError};
pub use ids::RequestId;
pub use response::Response;
pub use router::{Mux, Route, RouteGroup, RouteMut, Router, SharedRouter, Store, METHODS};
pub use writer::{Data, DataWriter, DefaultDataWriter};

#[doc(hidden)]
pub mod __private {
    pub use serde_json;
}
