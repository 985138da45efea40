//! Unit tests for CLI commands

use std::io::Write as _;

use crate::cli::{execute, Cli, Commands};
use clap::Parser;

const MANIFEST: &str = r#"
prefix = "/api"

[[routes]]
methods = "GET"
path = "/users/<id:\\d+>"
name = "user"

[[routes]]
methods = "GET,POST"
path = "/users"
name = "users"
"#;

fn manifest_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(MANIFEST.as_bytes()).unwrap();
    file
}

fn run(args: &[&str]) -> String {
    let cli = Cli::try_parse_from(args).unwrap();
    let mut out = Vec::new();
    execute(&cli, &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn test_match_command_parses() {
    let cli = Cli::try_parse_from(["brrtmux", "match", "--manifest", "r.toml", "get", "/x"]).unwrap();
    match cli.command {
        Commands::Match { method, path, .. } => {
            assert_eq!(method, "get");
            assert_eq!(path, "/x");
        }
        _ => panic!("Expected Match command"),
    }
}

#[test]
fn test_routes_lists_table() {
    let file = manifest_file();
    let path = file.path().to_str().unwrap();
    let out = run(&["brrtmux", "routes", "--manifest", path]);
    assert_eq!(
        out,
        "GET /api/users/<id:\\d+>\tuser\t/api/users/<id>\n\
         GET /api/users\tusers\t/api/users\n\
         POST /api/users\tusers\t/api/users\n"
    );
}

#[test]
fn test_match_reports_params() {
    let file = manifest_file();
    let path = file.path().to_str().unwrap();
    let out = run(&["brrtmux", "match", "--manifest", path, "get", "/api/users/42"]);
    let mut lines = out.lines();
    assert_eq!(lines.next(), Some("200 OK"));
    let report: serde_json::Value = serde_json::from_str(lines.next().unwrap()).unwrap();
    assert_eq!(report["route"], "GET /api/users/<id:\\d+>");
    assert_eq!(report["name"], "user");
    assert_eq!(report["params"]["id"], "42");
}

#[test]
fn test_match_reports_not_found_and_not_allowed() {
    let file = manifest_file();
    let path = file.path().to_str().unwrap();
    let out = run(&["brrtmux", "match", "--manifest", path, "GET", "/nope"]);
    assert_eq!(out, "404 Not Found\n");

    let out = run(&["brrtmux", "match", "--manifest", path, "DELETE", "/api/users"]);
    assert_eq!(out, "405 Method Not Allowed\nAllow: GET, POST, OPTIONS\n");
}

#[test]
fn test_url_command() {
    let file = manifest_file();
    let path = file.path().to_str().unwrap();
    let out = run(&["brrtmux", "url", "--manifest", path, "user", "id", "7"]);
    assert_eq!(out, "/api/users/7\n");

    let cli = Cli::try_parse_from(["brrtmux", "url", "--manifest", path, "missing"]).unwrap();
    assert!(execute(&cli, &mut Vec::<u8>::new()).is_err());
}
