//! # Router Configuration
//!
//! Environment-driven switches for the routing core.
//!
//! ## Environment Variables
//!
//! ### `BRRTMUX_UNESCAPE_PARAMS`
//!
//! Whether captured path parameters are percent-decoded by the default
//! store (`/tags/rust%20lang` captures `rust lang`). Regex constraints are
//! tested against the decoded value.
//!
//! Default: `true`
//!
//! ### `BRRTMUX_LOG_ROUTES`
//!
//! Log every route at `info` level when the routing table is frozen.
//!
//! Default: `false`
//!
//! Booleans accept `1/0`, `true/false`, `yes/no` and `on/off`; anything else
//! falls back to the default.
//!
//! ## Usage
//!
//! ```rust
//! use brrtmux::config::RouterConfig;
//! use brrtmux::Mux;
//!
//! let mux = Mux::new().with_config(RouterConfig::from_env());
//! ```

use std::env;

pub const ENV_UNESCAPE_PARAMS: &str = "BRRTMUX_UNESCAPE_PARAMS";
pub const ENV_LOG_ROUTES: &str = "BRRTMUX_LOG_ROUTES";

/// Routing configuration used by [`crate::Mux`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouterConfig {
    /// Percent-decode captured path parameters (default: true)
    pub unescape_params: bool,
    /// Log every route when the table is frozen (default: false)
    pub log_routes: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            unescape_params: true,
            log_routes: false,
        }
    }
}

impl RouterConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            unescape_params: lookup(ENV_UNESCAPE_PARAMS)
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.unescape_params),
            log_routes: lookup(ENV_LOG_ROUTES)
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.log_routes),
        }
    }
}

/// Parse a boolean switch value.
#[must_use]
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        assert_eq!(RouterConfig::from_lookup(lookup(&[])), RouterConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = RouterConfig::from_lookup(lookup(&[
            (ENV_UNESCAPE_PARAMS, "off"),
            (ENV_LOG_ROUTES, "1"),
        ]));
        assert!(!config.unescape_params);
        assert!(config.log_routes);
    }

    #[test]
    fn test_invalid_value_keeps_default() {
        let config = RouterConfig::from_lookup(lookup(&[(ENV_UNESCAPE_PARAMS, "maybe")]));
        assert!(config.unescape_params);
        assert_eq!(parse_bool(" Yes "), Some(true));
    }
}
