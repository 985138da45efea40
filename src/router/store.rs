use std::sync::Arc;

use smallvec::SmallVec;

use crate::context::Chain;
use crate::error::RouteError;

/// Maximum number of path parameters before heap allocation.
/// Most routes have ≤4 path params (e.g., /users/<id>/posts/<post_id>).
pub const MAX_INLINE_PARAMS: usize = 8;

/// Parameter storage for the match path.
///
/// Names are `Arc<str>` shared with the compiled pattern; values are
/// per-request data taken from the URL.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Result of resolving a path against a [`Store`]
#[derive(Clone)]
pub struct StoreMatch {
    /// Handler chain registered for the matched pattern
    pub chain: Chain,
    /// Captured parameters in path order
    pub params: ParamVec,
}

impl StoreMatch {
    /// Get a captured parameter by name
    ///
    /// Uses "last write wins" semantics when a name occurs more than once.
    #[inline]
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

impl std::fmt::Debug for StoreMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreMatch")
            .field("handlers", &self.chain.len())
            .field("params", &self.params)
            .finish()
    }
}

/// Per-method route matcher.
///
/// The [`crate::Mux`] owns one store per HTTP method and fills it during setup;
/// the frozen [`crate::Router`] only calls [`Store::find`]. Alternate
/// implementations (an instrumented test double, a different matching
/// strategy) can be installed with [`crate::Mux::set_store`].
pub trait Store: Send + Sync {
    /// Compile `pattern`, store it with `chain` and return the running registration count.
    ///
    /// The count grows by one on every successful call, including duplicates.
    fn add(&mut self, pattern: &str, chain: Chain) -> Result<usize, RouteError>;

    /// Resolve a request path to its chain and captured parameters.
    fn find(&self, path: &str) -> Option<StoreMatch>;

    /// Number of successful [`Store::add`] calls.
    fn count(&self) -> usize;
}
