use std::collections::HashMap;
use std::sync::Arc;

use http::Method;
use serde_json::Value;
use smallvec::SmallVec;
use tracing::{info, warn};

use super::group::{parse_methods, path_binders, GroupScope, RouteGroup, RouteMut};
use super::pattern;
use super::radix::RadixStore;
use super::route::{Route, RouteId};
use super::serve::{method_not_allowed_handler, not_found_handler, Router};
use super::store::Store;
use super::METHODS;
use crate::config::RouterConfig;
use crate::context::{handler, Chain, Handler};
use crate::error::RouteError;
use crate::writer::{DataWriter, DefaultDataWriter};

/// Setup-phase route registry.
///
/// Routes are registered through `&mut` borrows, directly or through
/// [`RouteGroup`]s, and the finished table is frozen with
/// [`Mux::into_router`]. One store is kept per HTTP method, created on first
/// use unless one was installed with [`Mux::set_store`].
///
/// ```rust
/// use brrtmux::{handler, Context, Mux};
///
/// let mut mux = Mux::new();
/// mux.get("/users/<id:\\d+>", [handler(|ctx: &mut Context| {
///     let id = ctx.param("id").unwrap_or_default().to_string();
///     ctx.write(id)
/// })])
/// .unwrap()
/// .name("user");
///
/// let router = mux.into_router();
/// let (res, result) = router.handle(
///     http::Request::get("/users/42").body(Vec::new()).unwrap(),
/// );
/// assert!(result.is_ok());
/// assert_eq!(res.body_string(), "42");
/// ```
pub struct Mux {
    config: RouterConfig,
    routes: Vec<Route>,
    registered: Vec<RouteId>,
    named: HashMap<String, RouteId>,
    stores: HashMap<Method, Box<dyn Store>>,
    root: Arc<GroupScope>,
    not_found: Option<Vec<Handler>>,
    writer: Arc<dyn DataWriter>,
}

impl Default for Mux {
    fn default() -> Self {
        Self::new()
    }
}

impl Mux {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: RouterConfig::default(),
            routes: Vec::new(),
            registered: Vec::new(),
            named: HashMap::new(),
            stores: HashMap::new(),
            root: Arc::new(GroupScope::default()),
            not_found: None,
            writer: Arc::new(DefaultDataWriter),
        }
    }

    /// Replace the configuration. Stores already created keep their settings.
    #[must_use]
    pub fn with_config(mut self, config: RouterConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Install the store used for `method`, replacing any existing one.
    pub fn set_store(&mut self, method: Method, store: Box<dyn Store>) {
        self.stores.insert(method, store);
    }

    /// Store for `method`, if one has been created or installed.
    #[must_use]
    pub fn store(&self, method: &Method) -> Option<&dyn Store> {
        self.stores.get(method).map(|s| s.as_ref())
    }

    /// Registration count of the store for `method` (0 when it has none).
    #[must_use]
    pub fn store_count(&self, method: &Method) -> usize {
        self.store(method).map_or(0, |s| s.count())
    }

    /// Replace the writer behind [`crate::Context::write`] for every context the router creates.
    pub fn set_data_writer(&mut self, writer: Arc<dyn DataWriter>) {
        self.writer = writer;
    }

    /// Append global middleware.
    ///
    /// It applies to routes registered afterwards and to the not-found chain.
    pub fn use_middleware(&mut self, handlers: impl IntoIterator<Item = Handler>) {
        self.root = Arc::new(self.root.extended(handlers));
    }

    /// Replace the handlers run when no route matches.
    ///
    /// Defaults to [`method_not_allowed_handler`] followed by [`not_found_handler`].
    pub fn not_found(&mut self, handlers: impl IntoIterator<Item = Handler>) {
        self.not_found = Some(handlers.into_iter().collect());
    }

    /// Create a top-level group.
    pub fn group(
        &mut self,
        prefix: &str,
        handlers: impl IntoIterator<Item = Handler>,
    ) -> RouteGroup<'_> {
        let scope = Arc::new(self.root.child(prefix, handlers));
        RouteGroup::new(self, scope)
    }

    /// Create an unbound route at the top level.
    pub fn route(&mut self, path: &str) -> RouteMut<'_> {
        let id = self.create_route(Arc::clone(&self.root), path);
        RouteMut::new(self, smallvec::smallvec![id])
    }

    fn register(
        &mut self,
        path: &str,
        methods: &[Method],
        handlers: Vec<Handler>,
    ) -> Result<RouteMut<'_>, RouteError> {
        let scope = Arc::clone(&self.root);
        self.register_in(scope, path, methods, handlers)
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

    /// Registered routes in registration order.
    pub fn routes(&self) -> impl Iterator<Item = &Route> + '_ {
        self.registered.iter().map(|id| &self.routes[id.0])
    }

    /// Look up a named route.
    #[must_use]
    pub fn named_route(&self, name: &str) -> Option<&Route> {
        self.named.get(name).map(|id| &self.routes[id.0])
    }

    /// Build the URL of a named route; see [`Route::url`].
    #[must_use]
    pub fn url(&self, name: &str, pairs: &[Value]) -> Option<String> {
        self.named_route(name).map(|r| r.url(pairs))
    }

    /// Freeze the registry into a read-only [`Router`].
    #[must_use]
    pub fn into_router(self) -> Router {
        let mut not_found: Vec<Handler> = self.root.handlers.clone();
        match self.not_found {
            Some(handlers) => not_found.extend(handlers),
            None => {
                not_found.push(handler(method_not_allowed_handler));
                not_found.push(handler(not_found_handler));
            }
        }

        let mut methods: Vec<&str> = self.stores.keys().map(Method::as_str).collect();
        methods.sort_unstable();
        info!(
            routes_count = self.registered.len(),
            named_count = self.named.len(),
            methods = ?methods,
            "Routing table frozen"
        );
        if self.config.log_routes {
            for id in &self.registered {
                let route = &self.routes[id.0];
                info!(
                    method = %route.method.as_ref().map_or("-", Method::as_str),
                    path = %route.full_path,
                    name = %route.name,
                    template = %route.template,
                    handlers = route.handlers.len(),
                    "Route"
                );
            }
        }

        Router::from_parts(
            self.routes,
            self.registered,
            self.named,
            self.stores,
            Arc::from(not_found),
            self.writer,
        )
    }

    pub(crate) fn create_route(&mut self, scope: Arc<GroupScope>, path: &str) -> RouteId {
        let id = RouteId(self.routes.len());
        self.routes.push(Route::new(scope, path));
        id
    }

    pub(crate) fn route_by_id(&self, id: RouteId) -> &Route {
        &self.routes[id.0]
    }

    pub(crate) fn route_mut(&mut self, id: RouteId) -> &mut Route {
        &mut self.routes[id.0]
    }

    pub(crate) fn insert_name(&mut self, name: String, id: RouteId) {
        if let Some(previous) = self.named.insert(name.clone(), id) {
            if previous != id {
                let previous = &self.routes[previous.0];
                warn!(
                    name = %name,
                    previous = %previous,
                    route = %self.routes[id.0],
                    "Duplicate route name, replacing earlier route"
                );
            }
        }
    }

    /// Create a route under `scope` and bind it to each of `methods`.
    pub(crate) fn register_in(
        &mut self,
        scope: Arc<GroupScope>,
        path: &str,
        methods: &[Method],
        handlers: Vec<Handler>,
    ) -> Result<RouteMut<'_>, RouteError> {
        if methods.is_empty() {
            return Err(RouteError::EmptyMethodList);
        }
        if let Some(method) = methods.iter().find(|m| !METHODS.contains(*m)) {
            return Err(RouteError::UnsupportedMethod(method.to_string()));
        }
        pattern::compile(&format!("{}{}", scope.prefix, path))?;

        let id = self.create_route(scope, path);
        match self.bind_all(id, methods, &handlers) {
            Ok(ids) => Ok(RouteMut::new(self, ids)),
            Err(err) => {
                // A custom store may still refuse the pattern.
                if self.routes[id.0].method.is_none() && id.0 + 1 == self.routes.len() {
                    self.routes.pop();
                }
                Err(err)
            }
        }
    }

    /// Bind `source` (or siblings of it, once bound) to each method in turn.
    pub(crate) fn bind_all(
        &mut self,
        source: RouteId,
        methods: &[Method],
        handlers: &[Handler],
    ) -> Result<SmallVec<[RouteId; 2]>, RouteError> {
        if methods.is_empty() {
            return Err(RouteError::EmptyMethodList);
        }
        let mut ids = SmallVec::new();
        for method in methods {
            ids.push(self.bind(source, method, handlers)?);
        }
        Ok(ids)
    }

    fn bind(
        &mut self,
        source: RouteId,
        method: &Method,
        handlers: &[Handler],
    ) -> Result<RouteId, RouteError> {
        if !METHODS.contains(method) {
            return Err(RouteError::UnsupportedMethod(method.to_string()));
        }

        let route = &self.routes[source.0];
        let chain: Chain = route
            .scope
            .handlers
            .iter()
            .chain(handlers)
            .map(Arc::clone)
            .collect::<Vec<_>>()
            .into();
        let full_path = route.full_path.clone();
        let sibling = route.method.is_some().then(|| route.sibling());

        let unescape = self.config.unescape_params;
        let store = self
            .stores
            .entry(method.clone())
            .or_insert_with(|| Box::new(RadixStore::with_unescape(unescape)) as Box<dyn Store>);
        let count = store.add(&full_path, Arc::clone(&chain))?;

        let id = match sibling {
            Some(route) => {
                self.routes.push(route);
                RouteId(self.routes.len() - 1)
            }
            None => source,
        };
        let route = &mut self.routes[id.0];
        route.method = Some(method.clone());
        route.handlers = chain;
        self.registered.push(id);

        info!(
            method = %method,
            path = %full_path,
            handlers = self.routes[id.0].handlers.len(),
            store_count = count,
            "Route registered"
        );
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_registration_leaves_no_route() {
        let mut mux = Mux::new();
        assert!(mux.get("/users/<id:(>", []).is_err());
        assert!(mux.to("GET,BREW", "/coffee", []).is_err());
        assert!(mux.routes.is_empty());
        assert!(mux.registered.is_empty());
        assert_eq!(mux.store_count(&Method::GET), 0);

        mux.get("/users/<id:\\d+>", []).unwrap();
        assert_eq!(mux.routes.len(), 1);
    }
}
