use std::sync::Arc;

use http::Method;
use serde_json::Value;
use smallvec::{smallvec, SmallVec};

use super::mux::Mux;
use super::route::{Route, RouteId};
use super::METHODS;
use crate::context::Handler;
use crate::error::RouteError;

/// Prefix and inherited handlers shared by the routes of one group.
///
/// Routes keep the scope that was current when they were created, so
/// middleware added to a group later never reaches them.
#[derive(Default)]
pub(crate) struct GroupScope {
    pub(crate) prefix: String,
    pub(crate) handlers: Vec<Handler>,
}

impl GroupScope {
    /// Nested scope: prefixes concatenate, parent handlers run first.
    pub(crate) fn child(&self, prefix: &str, handlers: impl IntoIterator<Item = Handler>) -> Self {
        let mut inherited = self.handlers.clone();
        inherited.extend(handlers);
        Self {
            prefix: format!("{}{}", self.prefix, prefix),
            handlers: inherited,
        }
    }

    /// Same prefix with more handlers appended.
    pub(crate) fn extended(&self, handlers: impl IntoIterator<Item = Handler>) -> Self {
        self.child("", handlers)
    }
}

/// Parse a comma-separated method list such as `"GET,POST"`.
///
/// Names are trimmed and matched case-insensitively against [`METHODS`].
pub fn parse_methods(list: &str) -> Result<Vec<Method>, RouteError> {
    let mut methods = Vec::new();
    for raw in list.split(',') {
        let name = raw.trim();
        if name.is_empty() {
            continue;
        }
        let upper = name.to_ascii_uppercase();
        let method = METHODS
            .iter()
            .find(|m| m.as_str() == upper)
            .ok_or_else(|| RouteError::UnsupportedMethod(name.to_string()))?;
        methods.push(method.clone());
    }
    if methods.is_empty() {
        return Err(RouteError::EmptyMethodList);
    }
    Ok(methods)
}

/// Generates `verb(path, handlers)` registration methods for types with a
/// `register(path, methods, handlers)` helper.
macro_rules! path_binders {
    ($($fn_name:ident => $method:ident),* $(,)?) => {
        $(
            #[doc = concat!("Register a `", stringify!($method), "` route for `path`.")]
            pub fn $fn_name(
                &mut self,
                path: &str,
                handlers: impl IntoIterator<Item = Handler>,
            ) -> Result<RouteMut<'_>, RouteError> {
                self.register(path, &[Method::$method], handlers.into_iter().collect())
            }
        )*

        /// Register `path` under every method in a comma-separated list.
        pub fn to(
            &mut self,
            methods: &str,
            path: &str,
            handlers: impl IntoIterator<Item = Handler>,
        ) -> Result<RouteMut<'_>, RouteError> {
            let methods = parse_methods(methods)?;
            self.register(path, &methods, handlers.into_iter().collect())
        }

        /// Register `path` under all supported methods.
        pub fn any(
            &mut self,
            path: &str,
            handlers: impl IntoIterator<Item = Handler>,
        ) -> Result<RouteMut<'_>, RouteError> {
            self.register(path, &METHODS, handlers.into_iter().collect())
        }
    };
}

pub(crate) use path_binders;

/// A path prefix plus inherited handlers, used to register routes.
///
/// ```rust
/// use brrtmux::{handler, Context, Mux};
///
/// let auth = handler(|ctx: &mut Context| ctx.next());
/// let list = handler(|ctx: &mut Context| ctx.write("users"));
///
/// let mut mux = Mux::new();
/// let mut admin = mux.group("/admin", [auth]);
/// admin.get("/users", [list]).unwrap().name("admin.users");
///
/// let router = mux.into_router();
/// assert_eq!(router.url("admin.users", &[]).as_deref(), Some("/admin/users"));
/// ```
pub struct RouteGroup<'m> {
    mux: &'m mut Mux,
    scope: Arc<GroupScope>,
}

impl<'m> RouteGroup<'m> {
    pub(crate) fn new(mux: &'m mut Mux, scope: Arc<GroupScope>) -> Self {
        Self { mux, scope }
    }

    /// Effective prefix, including every ancestor's.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.scope.prefix
    }

    /// Number of inherited handlers routes created now will start with.
    #[must_use]
    pub fn handler_count(&self) -> usize {
        self.scope.handlers.len()
    }

    /// Create a nested group.
    pub fn group(
        &mut self,
        prefix: &str,
        handlers: impl IntoIterator<Item = Handler>,
    ) -> RouteGroup<'_> {
        let scope = Arc::new(self.scope.child(prefix, handlers));
        RouteGroup::new(self.mux, scope)
    }

    /// Append handlers for routes created from now on.
    pub fn use_middleware(&mut self, handlers: impl IntoIterator<Item = Handler>) {
        self.scope = Arc::new(self.scope.extended(handlers));
    }

    /// Create an unbound route; bind it with one of the [`RouteMut`] verbs.
    pub fn route(&mut self, path: &str) -> RouteMut<'_> {
        let id = self.mux.create_route(Arc::clone(&self.scope), path);
        RouteMut::new(self.mux, smallvec![id])
    }

    fn register(
        &mut self,
        path: &str,
        methods: &[Method],
        handlers: Vec<Handler>,
    ) -> Result<RouteMut<'_>, RouteError> {
        self.mux
            .register_in(Arc::clone(&self.scope), path, methods, handlers)
    }

    path_binders! {
        get => GET,
        post => POST,
        put => PUT,
        patch => PATCH,
        delete => DELETE,
        connect => CONNECT,
        head => HEAD,
        options => OPTIONS,
        trace => TRACE,
    }
}

/// Handle on one or more routes created by a single registration call.
///
/// Binding an unbound route binds it in place. Binding an already bound
/// route creates a sibling with the same path and group for the new method,
/// and the returned handle points at the sibling:
///
/// ```rust
/// use brrtmux::Mux;
///
/// let mut mux = Mux::new();
/// mux.get("/orders", [])
///     .unwrap()
///     .tag("GET orders")
///     .post([])
///     .unwrap()
///     .tag("POST orders");
///
/// let lines: Vec<String> = mux.routes().map(|r| r.to_string()).collect();
/// assert_eq!(lines, ["GET /orders", "POST /orders"]);
/// ```
pub struct RouteMut<'m> {
    mux: &'m mut Mux,
    ids: SmallVec<[RouteId; 2]>,
}

macro_rules! route_binders {
    ($($fn_name:ident => $method:ident),* $(,)?) => {
        $(
            #[doc = concat!("Bind this route to `", stringify!($method), "`.")]
            pub fn $fn_name(
                self,
                handlers: impl IntoIterator<Item = Handler>,
            ) -> Result<Self, RouteError> {
                self.bind(&[Method::$method], handlers.into_iter().collect())
            }
        )*
    };
}

impl<'m> RouteMut<'m> {
    pub(crate) fn new(mux: &'m mut Mux, ids: SmallVec<[RouteId; 2]>) -> Self {
        Self { mux, ids }
    }

    fn first(&self) -> RouteId {
        self.ids.first().copied().unwrap_or(RouteId(0))
    }

    /// The first route behind this handle.
    #[must_use]
    pub fn route(&self) -> &Route {
        self.mux.route_by_id(self.first())
    }

    #[must_use]
    pub fn id(&self) -> RouteId {
        self.first()
    }

    /// Every route behind this handle, one per bound method.
    #[must_use]
    pub fn ids(&self) -> &[RouteId] {
        &self.ids
    }

    /// Name the routes and register the name with the mux (last write wins).
    pub fn name(self, name: impl Into<String>) -> Self {
        let name = name.into();
        let first = self.first();
        for id in &self.ids {
            self.mux.route_mut(*id).name.clone_from(&name);
        }
        self.mux.insert_name(name, first);
        self
    }

    /// Append a tag to every route behind this handle.
    pub fn tag(self, value: impl Into<Value>) -> Self {
        let value = value.into();
        for id in &self.ids {
            self.mux.route_mut(*id).tags.push(value.clone());
        }
        self
    }

    #[must_use]
    pub fn tags(&self) -> &[Value] {
        self.route().tags()
    }

    /// Build a URL from the route's template; see [`Route::url`].
    #[must_use]
    pub fn url(&self, pairs: &[Value]) -> String {
        self.route().url(pairs)
    }

    /// Bind under every method in a comma-separated list.
    pub fn to(
        self,
        methods: &str,
        handlers: impl IntoIterator<Item = Handler>,
    ) -> Result<Self, RouteError> {
        let methods = parse_methods(methods)?;
        self.bind(&methods, handlers.into_iter().collect())
    }

    /// Bind under all supported methods.
    pub fn any(self, handlers: impl IntoIterator<Item = Handler>) -> Result<Self, RouteError> {
        self.bind(&METHODS, handlers.into_iter().collect())
    }

    fn bind(self, methods: &[Method], handlers: Vec<Handler>) -> Result<Self, RouteError> {
        let source = self.first();
        let ids = self.mux.bind_all(source, methods, &handlers)?;
        Ok(Self { mux: self.mux, ids })
    }

    route_binders! {
        get => GET,
        post => POST,
        put => PUT,
        patch => PATCH,
        delete => DELETE,
        connect => CONNECT,
        head => HEAD,
        options => OPTIONS,
        trace => TRACE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_methods() {
        assert_eq!(
            parse_methods("GET, post").unwrap(),
            vec![Method::GET, Method::POST]
        );
        assert!(matches!(
            parse_methods("GET,BREW"),
            Err(RouteError::UnsupportedMethod(m)) if m == "BREW"
        ));
        assert!(matches!(parse_methods(" , "), Err(RouteError::EmptyMethodList)));
    }

    #[test]
    fn test_scope_nesting() {
        let noop = crate::context::handler(|_: &mut crate::Context| Ok(()));
        let root = GroupScope::default();
        let admin = root.child("/admin", [Arc::clone(&noop)]);
        let users = admin.child("/users", [Arc::clone(&noop)]);
        assert_eq!(users.prefix, "/admin/users");
        assert_eq!(users.handlers.len(), 2);
        assert_eq!(admin.extended([noop]).handlers.len(), 2);
    }
}
