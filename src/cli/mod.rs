//! # CLI Module
//!
//! Command-line inspection of TOML route manifests (see [`crate::manifest`]).
//!
//! ## Commands
//!
//! ### `routes`
//!
//! Print the routing table, one line per bound route with its name and URL template:
//!
//! ```bash
//! brrtmux routes --manifest routes.toml
//! ```
//!
//! ### `match`
//!
//! Dispatch a synthetic request and print the outcome:
//!
//! ```bash
//! brrtmux match --manifest routes.toml GET /api/users/42
//! ```
//!
//! ### `url`
//!
//! Build the URL of a named route from key/value pairs:
//!
//! ```bash
//! brrtmux url --manifest routes.toml user id 42
//! ```
//!
//! ## Usage from Code
//!
//! ```rust,ignore
//! use brrtmux::cli::run_cli;
//!
//! run_cli()?;
//! ```

mod commands;

#[cfg(test)]
mod tests;

pub use commands::{execute, run_cli, Cli, Commands};
