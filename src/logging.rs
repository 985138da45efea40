//! Structured logging setup.
//!
//! The library itself only emits `tracing` events. Binaries (and tests that
//! want output) install a subscriber with [`init_logging_with_config`]:
//!
//! - `BRRTMUX_LOG_LEVEL`: trace/debug/info/warn/error (default `info`)
//! - `BRRTMUX_LOG_FORMAT`: `json` or `pretty` (default `json`)
//! - `BRRTMUX_LOG_INCLUDE_LOCATION`: add file and line to events (default `false`)
//! - `BRRTMUX_LOG_TARGET_FILTER`: extra comma-separated filter directives,
//!   e.g. `brrtmux::router=debug`
//! - `BRRTMUX_LOG_ASYNC`: write through a non-blocking worker (default `false`)
//!
//! `RUST_LOG`, when set, takes precedence over `BRRTMUX_LOG_LEVEL`.

use std::env;

use anyhow::{Context, Result};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::parse_bool;

/// Log format: JSON for production, pretty-print for development
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Log level: trace/debug/info/warn/error
    pub log_level: String,
    pub format: LogFormat,
    /// Include file:line location (dev only)
    pub include_location: bool,
    /// Extra filter directives (comma-separated)
    pub target_filter: Option<String>,
    /// Write through a non-blocking background worker
    pub async_logging: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            format: LogFormat::Json,
            include_location: false,
            target_filter: None,
            async_logging: false,
        }
    }
}

impl LogConfig {
    /// Parse configuration from environment variables with defaults
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Parse configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let flag = |key: &str, default: bool| {
            lookup(key)
                .and_then(|v| parse_bool(&v))
                .unwrap_or(default)
        };
        Self {
            log_level: lookup("BRRTMUX_LOG_LEVEL").unwrap_or(defaults.log_level),
            format: lookup("BRRTMUX_LOG_FORMAT")
                .map(|v| LogFormat::parse(&v))
                .unwrap_or(defaults.format),
            include_location: flag("BRRTMUX_LOG_INCLUDE_LOCATION", defaults.include_location),
            target_filter: lookup("BRRTMUX_LOG_TARGET_FILTER").filter(|v| !v.trim().is_empty()),
            async_logging: flag("BRRTMUX_LOG_ASYNC", defaults.async_logging),
        }
    }

    /// Configuration for local development: debug level, pretty output, locations.
    #[must_use]
    pub fn default_dev() -> Self {
        Self {
            log_level: "debug".to_string(),
            format: LogFormat::Pretty,
            include_location: true,
            target_filter: None,
            async_logging: false,
        }
    }

    /// Level parsed from `log_level`, falling back to `INFO`.
    #[must_use]
    pub fn level(&self) -> Level {
        match self.log_level.trim().to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

/// Build the event filter for `config`.
///
/// Invalid entries in `target_filter` are rejected.
pub fn build_filter(config: &LogConfig) -> Result<EnvFilter> {
    let mut filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level().as_str()));

    if let Some(target_filter) = &config.target_filter {
        for directive in target_filter.split(',').map(str::trim) {
            if directive.is_empty() {
                continue;
            }
            let parsed: Directive = directive
                .parse()
                .with_context(|| format!("Invalid log filter directive: {directive}"))?;
            filter = filter.add_directive(parsed);
        }
    }
    Ok(filter)
}

/// Keeps the background writer alive; drop it at exit to flush pending events.
#[derive(Debug)]
#[must_use = "dropping the guard stops the background log writer"]
pub struct LoggingGuard {
    _worker: Option<WorkerGuard>,
}

/// Initialize the global subscriber from the environment.
pub fn init_logging() -> Result<LoggingGuard> {
    init_logging_with_config(&LogConfig::from_env())
}

/// Initialize the global subscriber.
///
/// ```no_run
/// use brrtmux::logging::{init_logging_with_config, LogConfig};
///
/// let _guard = init_logging_with_config(&LogConfig::default_dev())
///     .expect("Failed to initialize logging");
/// ```
pub fn init_logging_with_config(config: &LogConfig) -> Result<LoggingGuard> {
    let filter = build_filter(config)?;

    let (writer, worker) = if config.async_logging {
        let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());
        (BoxMakeWriter::new(writer), Some(guard))
    } else {
        (BoxMakeWriter::new(std::io::stdout), None)
    };

    let fmt_layer = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(writer)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_target(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(writer)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(LoggingGuard { _worker: worker })
}
