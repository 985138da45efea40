use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context as _};
use clap::{Parser, Subcommand};
use http::header::ALLOW;
use http::{Method, StatusCode};
use serde_json::{Map, Value};

use crate::context::{handler, Context, Handler};
use crate::logging::{init_logging_with_config, LogConfig};
use crate::manifest::{RouteEntry, RouteManifest};
use crate::router::{Mux, Router};

/// Command-line interface for brrtmux
#[derive(Parser)]
#[command(name = "brrtmux")]
#[command(about = "Inspect brrtmux route manifests", long_about = None)]
pub struct Cli {
    /// Log level for routing events (trace/debug/info/warn/error)
    #[arg(long, global = true, env = "BRRTMUX_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Print the routing table built from a manifest
    Routes {
        /// Path to the TOML route manifest
        #[arg(short, long)]
        manifest: PathBuf,
    },
    /// Dispatch a synthetic request and print the matched route or the failure
    Match {
        #[arg(short, long)]
        manifest: PathBuf,

        /// HTTP method, case-insensitive
        method: String,

        /// Request path, e.g. /api/users/42
        path: String,
    },
    /// Print the URL of a named route
    Url {
        #[arg(short, long)]
        manifest: PathBuf,

        /// Route name
        name: String,

        /// Alternating parameter names and values
        pairs: Vec<String>,
    },
}

/// Parse the process arguments, set up logging and run the command on stdout.
pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut log_config = LogConfig::from_env();
    log_config.log_level.clone_from(&cli.log_level);
    let _guard = init_logging_with_config(&log_config)?;

    let stdout = std::io::stdout();
    execute(&cli, &mut stdout.lock())
}

/// Run a parsed command, writing its report to `out`.
pub fn execute(cli: &Cli, out: &mut impl Write) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Routes { manifest } => {
            let router = load_router(manifest)?;
            for route in router.routes() {
                let name = if route.name().is_empty() { "-" } else { route.name() };
                writeln!(out, "{route}\t{name}\t{}", route.template())?;
            }
        }
        Commands::Match {
            manifest,
            method,
            path,
        } => {
            let router = load_router(manifest)?;
            let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
                .with_context(|| format!("Invalid HTTP method: {method}"))?;
            let request = http::Request::builder()
                .method(method)
                .uri(path.as_str())
                .body(Vec::new())
                .with_context(|| format!("Invalid request path: {path}"))?;

            let (response, result) = router.handle(request);
            match result {
                Ok(()) => {
                    writeln!(out, "{}", response.status())?;
                    if let Some(allow) = response.header(ALLOW.as_str()) {
                        writeln!(out, "Allow: {allow}")?;
                    }
                    if !response.body().is_empty() {
                        writeln!(out, "{}", response.body_string())?;
                    }
                }
                Err(err) => match err.status_code() {
                    Some(status) => writeln!(out, "{status}")?,
                    None => return Err(anyhow!("{err}")),
                },
            }
        }
        Commands::Url {
            manifest,
            name,
            pairs,
        } => {
            let router = load_router(manifest)?;
            let pairs: Vec<Value> = pairs.iter().map(|p| Value::from(p.as_str())).collect();
            let Some(url) = router.url(name, &pairs) else {
                bail!("No route named {name}");
            };
            writeln!(out, "{url}")?;
        }
    }
    Ok(())
}

fn load_router(path: &Path) -> anyhow::Result<Router> {
    let manifest = RouteManifest::load(path)?;
    let prefix = manifest.prefix.clone().unwrap_or_default();

    let mut mux = Mux::new();
    manifest
        .apply(&mut mux, |entry| vec![describe_match(&prefix, entry)])
        .with_context(|| format!("Invalid route in manifest: {}", path.display()))?;
    Ok(mux.into_router())
}

/// Handler reporting which manifest entry answered and what it captured.
fn describe_match(prefix: &str, entry: &RouteEntry) -> Handler {
    let full_path = format!("{prefix}{}", entry.path);
    let name = entry.name.clone();
    handler(move |ctx: &mut Context| {
        let params: Map<String, Value> = ctx
            .params()
            .iter()
            .map(|(k, v)| (k.to_string(), Value::from(v.as_str())))
            .collect();
        let report = serde_json::json!({
            "route": format!("{} {}", ctx.method(), full_path),
            "name": name,
            "params": params,
        });
        ctx.response_mut().set_status(StatusCode::OK);
        ctx.write(report)
    })
}
