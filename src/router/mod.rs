//! # Router Module
//!
//! Path matching, route registration and request dispatch.
//!
//! ## Overview
//!
//! Routing happens in two phases:
//!
//! 1. **Setup**: a [`Mux`] collects routes through `&mut` borrows. Routes are
//!    created directly on the mux or through nested [`RouteGroup`]s that add
//!    a path prefix and inherited middleware. Each route's pattern is compiled
//!    into the [`Store`] of its HTTP method.
//!
//! 2. **Serving**: [`Mux::into_router`] freezes the table into a read-only
//!    [`Router`]. For every request it picks the store for the method,
//!    matches the path and drives the resulting handler chain in a
//!    [`crate::Context`].
//!
//! ## Path patterns
//!
//! | Pattern            | Matches                                      |
//! |--------------------|----------------------------------------------|
//! | `/users`           | the literal segment                          |
//! | `/users/<id>`      | any one non-empty segment, captured as `id`  |
//! | `/users/<id:\d+>`  | one segment matching the anchored regex      |
//! | `/files/<n>.<ext>` | composite segment, both parts captured       |
//! | `/static/*`        | the remainder of the path, including nothing |
//!
//! At each segment a literal wins over a constrained parameter, which wins
//! over a plain parameter, which wins over the wildcard.
//!
//! ## Not found and method not allowed
//!
//! A request that matches no route runs the not-found chain: global
//! middleware followed by [`method_not_allowed_handler`] and
//! [`not_found_handler`] unless replaced with [`Mux::not_found`].

mod group;
mod mux;
mod pattern;
mod radix;
mod route;
mod serve;
mod shared;
mod store;

use http::Method;

pub use group::{parse_methods, RouteGroup, RouteMut};
pub use mux::Mux;
pub use pattern::build_url_template;
pub use radix::RadixStore;
pub use route::{Route, RouteId};
pub use serve::{method_not_allowed_handler, not_found_handler, Router};
pub use shared::SharedRouter;
pub use store::{ParamVec, Store, StoreMatch, MAX_INLINE_PARAMS};

/// Every method a route can be bound to, in canonical order.
pub static METHODS: [Method; 9] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::CONNECT,
    Method::HEAD,
    Method::OPTIONS,
    Method::TRACE,
];
