//! Radix tree store for per-method route matching
//!
//! Patterns are split into segments and inserted into a tree where:
//! - Each node represents a path segment
//! - Static segments (e.g., `users`) match exactly
//! - Parameter segments (e.g., `<id>`, `<id:\d+>`) match one segment
//! - A trailing wildcard (`*`) matches whatever remains
//! - Handler chains are stored at terminal nodes
//!
//! ## Precedence
//!
//! At every position the search tries, in order:
//!
//! 1. static children (exact segment match)
//! 2. constrained and composite parameter children, in registration order
//! 3. plain parameter children, in registration order
//! 4. the wildcard
//!
//! A failed branch backtracks and discards the parameters it captured, so
//! `/users/new` beats `/users/<id>` while `/users/42` still reaches `<id>`.
//!
//! Static segments and parameters both see the percent-decoded request
//! segment when decoding is on. A trailing wildcard needs the separator in
//! front of it: `/static/*` matches `/static/` and `/static/css/app.css`,
//! never the bare `/static`.
//!
//! ## Example
//!
//! ```rust
//! use brrtmux::router::{RadixStore, Store};
//! use brrtmux::Handler;
//! use std::sync::Arc;
//!
//! let mut store = RadixStore::new();
//! store.add("/users/<id:\\d+>", Arc::from(Vec::<Handler>::new())).unwrap();
//!
//! let found = store.find("/users/42").unwrap();
//! assert_eq!(found.param("id"), Some("42"));
//! assert!(store.find("/users/abc").is_none());
//! ```

use std::borrow::Cow;

use super::pattern::{self, ParamMatcher, Segment};
use super::store::{ParamVec, Store, StoreMatch};
use crate::context::Chain;
use crate::error::RouteError;

/// Node in the radix tree
#[derive(Clone, Default)]
struct RadixNode {
    /// The literal segment this node represents (static children only)
    segment: String,
    /// Matcher for parameter children
    matcher: Option<ParamMatcher>,
    /// Chain stored when a pattern ends at this node
    chain: Option<Chain>,
    /// Chain stored for a trailing wildcard below this node
    wildcard: Option<Chain>,
    /// Child nodes for literal segments
    children: Vec<RadixNode>,
    /// Child nodes for parameter segments, constrained ones first
    param_children: Vec<RadixNode>,
}

impl RadixNode {
    fn new_static(segment: &str) -> Self {
        Self {
            segment: segment.to_string(),
            ..Self::default()
        }
    }

    fn new_param(matcher: ParamMatcher) -> Self {
        Self {
            matcher: Some(matcher),
            ..Self::default()
        }
    }

    /// Insert a chain at the end of `segments`, replacing any chain already there.
    fn insert(&mut self, segments: &[Segment], chain: Chain) {
        let Some((segment, remaining)) = segments.split_first() else {
            self.chain = Some(chain);
            return;
        };

        match segment {
            Segment::Wildcard => {
                self.wildcard = Some(chain);
            }
            Segment::Static(literal) => {
                if let Some(child) = self.children.iter_mut().find(|c| &c.segment == literal) {
                    child.insert(remaining, chain);
                    return;
                }
                let mut child = RadixNode::new_static(literal);
                child.insert(remaining, chain);
                self.children.push(child);
            }
            Segment::Param(matcher) => {
                // Reuse a child with the same source text; different names get their own node.
                if let Some(child) = self
                    .param_children
                    .iter_mut()
                    .find(|c| c.matcher.as_ref().map(|m| m.key.as_str()) == Some(&matcher.key))
                {
                    child.insert(remaining, chain);
                    return;
                }
                let constrained = matcher.is_constrained();
                let mut child = RadixNode::new_param(matcher.clone());
                child.insert(remaining, chain);
                if constrained {
                    let at = self
                        .param_children
                        .iter()
                        .position(|c| c.matcher.as_ref().is_some_and(|m| !m.is_constrained()))
                        .unwrap_or(self.param_children.len());
                    self.param_children.insert(at, child);
                } else {
                    self.param_children.push(child);
                }
            }
        }
    }

    /// Search for a chain matching `segments`, capturing parameters on the way.
    fn search(&self, segments: &[&str], unescape: bool, params: &mut ParamVec) -> Option<Chain> {
        let Some((segment, remaining)) = segments.split_first() else {
            return self.chain.clone();
        };

        let value = decode(segment, unescape);
        for child in &self.children {
            if child.segment == value {
                if let Some(chain) = child.search(remaining, unescape, params) {
                    return Some(chain);
                }
            }
        }

        if !self.param_children.is_empty() {
            for param_child in &self.param_children {
                let Some(matcher) = &param_child.matcher else {
                    continue;
                };
                let mark = params.len();
                if matcher.capture(&value, params) {
                    if let Some(chain) = param_child.search(remaining, unescape, params) {
                        return Some(chain);
                    }
                    // Backtrack: drop what this branch captured
                    params.truncate(mark);
                }
            }
        }

        self.wildcard.clone()
    }
}

fn decode(segment: &str, unescape: bool) -> Cow<'_, str> {
    if !unescape {
        return Cow::Borrowed(segment);
    }
    urlencoding::decode(segment).unwrap_or(Cow::Borrowed(segment))
}

/// Split a request path into segments the same way patterns are split.
fn request_segments(path: &str) -> Vec<&str> {
    let path = path.strip_prefix('/').unwrap_or(path);
    path.split('/').collect()
}

/// Radix tree-based [`Store`], the default for every method.
///
/// Duplicate patterns replace the earlier chain (last write wins) while the
/// registration count still grows by one.
#[derive(Clone)]
pub struct RadixStore {
    root: RadixNode,
    count: usize,
    unescape: bool,
}

impl Default for RadixStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RadixStore {
    /// Create an empty store that percent-decodes captured parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::with_unescape(true)
    }

    /// Create an empty store, choosing whether captured parameters are percent-decoded.
    #[must_use]
    pub fn with_unescape(unescape: bool) -> Self {
        Self {
            root: RadixNode::default(),
            count: 0,
            unescape,
        }
    }
}

impl Store for RadixStore {
    fn add(&mut self, pattern: &str, chain: Chain) -> Result<usize, RouteError> {
        let segments = pattern::compile(pattern)?;
        self.root.insert(&segments, chain);
        self.count += 1;
        Ok(self.count)
    }

    fn find(&self, path: &str) -> Option<StoreMatch> {
        let segments = request_segments(path);
        let mut params = ParamVec::new();
        let chain = self.root.search(&segments, self.unescape, &mut params)?;
        Some(StoreMatch { chain, params })
    }

    fn count(&self) -> usize {
        self.count
    }
}
