//! TOML route manifests.
//!
//! A manifest describes a routing table without handler code:
//!
//! ```toml
//! prefix = "/api"
//!
//! [[routes]]
//! methods = "GET"
//! path = "/users/<id:\\d+>"
//! name = "user"
//! tags = ["users"]
//!
//! [[routes]]
//! methods = "GET,POST"
//! path = "/users"
//! ```
//!
//! [`RouteManifest::apply`] registers every entry on a [`Mux`], asking a
//! factory for each entry's handlers.

use std::path::Path;

use anyhow::Context as _;
use serde::Deserialize;

use crate::context::Handler;
use crate::error::RouteError;
use crate::router::{Mux, RouteId};

/// One `[[routes]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteEntry {
    /// Comma-separated method list, e.g. `"GET,POST"`
    pub methods: String,
    pub path: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteManifest {
    /// Group prefix applied to every entry
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub routes: Vec<RouteEntry>,
}

impl RouteManifest {
    /// Read and parse a manifest file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read route manifest: {}", path.display()))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse route manifest: {}", path.display()))
    }

    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        let manifest: RouteManifest = toml::from_str(contents)?;
        Ok(manifest)
    }

    /// Register every entry on `mux` under the manifest prefix.
    ///
    /// `factory` supplies the handlers for each entry. Returns the ids of the
    /// bound routes, one per (entry, method), in registration order. Stops at
    /// the first entry that fails to register.
    pub fn apply<F>(&self, mux: &mut Mux, factory: F) -> Result<Vec<RouteId>, RouteError>
    where
        F: Fn(&RouteEntry) -> Vec<Handler>,
    {
        let mut group = mux.group(self.prefix.as_deref().unwrap_or(""), []);
        let mut ids = Vec::new();
        for entry in &self.routes {
            let mut route = group.to(&entry.methods, &entry.path, factory(entry))?;
            if let Some(name) = &entry.name {
                route = route.name(name.as_str());
            }
            for tag in &entry.tags {
                route = route.tag(tag.as_str());
            }
            ids.extend_from_slice(route.ids());
        }
        Ok(ids)
    }
}
