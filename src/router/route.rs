use std::fmt;
use std::sync::Arc;

use http::Method;
use serde_json::Value;

use super::group::GroupScope;
use super::pattern::build_url_template;
use crate::context::{Chain, Handler};

/// Index of a route inside its registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteId(pub(crate) usize);

impl RouteId {
    #[must_use]
    pub fn index(&self) -> usize {
        self.0
    }
}

/// One registered (method, path) entry.
///
/// Routes are created by a [`crate::RouteGroup`] and stay in their registry
/// for its whole life. Only the name, tags and handler chain change after
/// creation, through [`crate::RouteMut`].
#[derive(Clone)]
pub struct Route {
    pub(crate) scope: Arc<GroupScope>,
    pub(crate) method: Option<Method>,
    pub(crate) path: String,
    pub(crate) full_path: String,
    pub(crate) template: String,
    pub(crate) name: String,
    pub(crate) tags: Vec<Value>,
    pub(crate) handlers: Chain,
}

impl Route {
    /// Create an unbound route under `scope`.
    pub(crate) fn new(scope: Arc<GroupScope>, path: &str) -> Self {
        let full_path = format!("{}{}", scope.prefix, path);
        let template = build_url_template(&full_path);
        Self {
            scope,
            method: None,
            path: path.to_string(),
            full_path,
            template,
            name: String::new(),
            tags: Vec::new(),
            handlers: Arc::from(Vec::<Handler>::new()),
        }
    }

    /// A fresh unbound route with the same scope and path.
    pub(crate) fn sibling(&self) -> Self {
        Self {
            scope: Arc::clone(&self.scope),
            method: None,
            path: self.path.clone(),
            full_path: self.full_path.clone(),
            template: self.template.clone(),
            name: String::new(),
            tags: Vec::new(),
            handlers: Arc::from(Vec::<Handler>::new()),
        }
    }

    /// Method this route is bound to; `None` until a binder is called.
    #[must_use]
    pub fn method(&self) -> Option<&Method> {
        self.method.as_ref()
    }

    /// Path as given at registration, without the group prefix.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Group prefix followed by the registration path.
    #[must_use]
    pub fn full_path(&self) -> &str {
        &self.full_path
    }

    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Route name; empty when unnamed.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn tags(&self) -> &[Value] {
        &self.tags
    }

    /// Full handler chain: inherited group handlers, then the binding handlers.
    #[must_use]
    pub fn handlers(&self) -> &Chain {
        &self.handlers
    }

    /// Build a URL from the route's template.
    ///
    /// `pairs` is a flat key/value sequence. Each `<key>` placeholder is
    /// replaced by its percent-escaped value; an odd trailing key gets the
    /// empty string. Placeholders without a value stay as they are, and keys
    /// without a placeholder are ignored. The result is not checked against
    /// the route's pattern.
    ///
    /// See also the [`url!`](crate::url) macro.
    #[must_use]
    pub fn url(&self, pairs: &[Value]) -> String {
        fill_template(&self.template, pairs)
    }
}

pub(crate) fn fill_template(template: &str, pairs: &[Value]) -> String {
    let mut url = template.to_string();
    for pair in pairs.chunks(2) {
        let [key, rest @ ..] = pair else {
            continue;
        };
        let value = rest.first().map(value_text).unwrap_or_default();
        let placeholder = format!("<{}>", value_text(key));
        // Once replaced, a repeated key finds nothing left to substitute.
        url = url.replace(&placeholder, &urlencoding::encode(&value));
    }
    url
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.method {
            Some(method) => write!(f, "{} {}", method, self.full_path),
            None => write!(f, "- {}", self.full_path),
        }
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("full_path", &self.full_path)
            .field("template", &self.template)
            .field("name", &self.name)
            .field("tags", &self.tags)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

/// Build a URL from anything with a `url(&[Value])` method, accepting mixed
/// literal types.
///
/// ```rust
/// use brrtmux::{url, Mux};
///
/// let mut mux = Mux::new();
/// let route = mux.get("/users/<id:\\d+>/<action>", []).unwrap();
/// assert_eq!(url!(route, "id", 123, "action", "edit"), "/users/123/edit");
/// ```
#[macro_export]
macro_rules! url {
    ($route:expr $(, $part:expr)* $(,)?) => {
        $route.url(&[$($crate::__private::serde_json::Value::from($part)),*])
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scoped(prefix: &str, path: &str) -> Route {
        let scope = Arc::new(GroupScope {
            prefix: prefix.to_string(),
            handlers: Vec::new(),
        });
        Route::new(scope, path)
    }

    #[test]
    fn test_new_route_paths() {
        let route = scoped("/admin", "/users/<id:\\d+>/*");
        assert_eq!(route.path(), "/users/<id:\\d+>/*");
        assert_eq!(route.full_path(), "/admin/users/<id:\\d+>/*");
        assert_eq!(route.template(), "/admin/users/<id>/");
        assert_eq!(route.name(), "");
        assert!(route.method().is_none());
    }

    #[test]
    fn test_url_value_rendering() {
        let route = scoped("", "/<a>/<b>/<c>/<d>");
        assert_eq!(
            route.url(&[
                json!("a"),
                json!(1.5),
                json!("b"),
                json!(true),
                json!("c"),
                json!(null),
                json!("d"),
                json!("x y")
            ]),
            "/1.5/true//x%20y"
        );
    }

    #[test]
    fn test_url_first_occurrence_wins() {
        let route = scoped("", "/<id>");
        assert_eq!(route.url(&[json!("id"), json!(1), json!("id"), json!(2)]), "/1");
    }

    #[test]
    fn test_display() {
        let mut route = scoped("/admin", "/users");
        assert_eq!(route.to_string(), "- /admin/users");
        route.method = Some(Method::POST);
        assert_eq!(route.to_string(), "POST /admin/users");
    }
}
