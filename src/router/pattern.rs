//! Route pattern compilation and URL templating.
//!
//! A pattern is split on `/` into segments (a `/` inside `<...>` does not split).
//! Each segment compiles to one of:
//!
//! - a literal (`users`)
//! - a named parameter (`<id>`) matching one non-empty segment
//! - a constrained parameter (`<id:\d+>`) whose whole segment must match the regex
//! - a composite segment mixing literals and parameters (`file.<ext>`, `<a:\d+><b>`)
//! - a trailing wildcard (`*`) matching the rest of the path without a capture
//!
//! An unterminated `<name` is treated as a literal.

use std::sync::Arc;

use regex::Regex;

use super::ParamVec;
use crate::error::RouteError;

/// A single compiled segment of a route pattern.
#[derive(Debug, Clone)]
pub(crate) enum Segment {
    Static(String),
    Param(ParamMatcher),
    Wildcard,
}

/// Matcher for a parameterized segment.
#[derive(Debug, Clone)]
pub(crate) struct ParamMatcher {
    /// Source text of the segment; identical sources share a tree node
    pub(crate) key: String,
    pub(crate) kind: ParamKind,
}

#[derive(Debug, Clone)]
pub(crate) enum ParamKind {
    /// `<name>`
    Any { name: Arc<str> },
    /// `<name:regex>`
    Constrained { name: Arc<str>, regex: Regex },
    /// Literals and parameters mixed inside one segment
    Composite {
        regex: Regex,
        names: Vec<Arc<str>>,
    },
}

impl ParamMatcher {
    /// Whether this matcher restricts the values it accepts.
    pub(crate) fn is_constrained(&self) -> bool {
        !matches!(self.kind, ParamKind::Any { .. })
    }

    /// Try to match `value` (one decoded path segment), pushing captures on success.
    pub(crate) fn capture(&self, value: &str, out: &mut ParamVec) -> bool {
        if value.is_empty() {
            return false;
        }
        match &self.kind {
            ParamKind::Any { name } => {
                out.push((Arc::clone(name), value.to_string()));
                true
            }
            ParamKind::Constrained { name, regex } => {
                if regex.is_match(value) {
                    out.push((Arc::clone(name), value.to_string()));
                    true
                } else {
                    false
                }
            }
            ParamKind::Composite { regex, names } => {
                let Some(caps) = regex.captures(value) else {
                    return false;
                };
                for (idx, name) in names.iter().enumerate() {
                    let captured = caps
                        .name(&format!("p{idx}"))
                        .map(|m| m.as_str())
                        .unwrap_or_default();
                    out.push((Arc::clone(name), captured.to_string()));
                }
                true
            }
        }
    }
}

/// Piece of a raw segment: literal text or a `<...>` placeholder body.
enum Piece<'a> {
    Literal(&'a str),
    Placeholder(&'a str),
}

/// Split a raw segment into literal and placeholder pieces.
fn pieces(segment: &str) -> Vec<Piece<'_>> {
    let mut out = Vec::new();
    let mut rest = segment;
    while let Some(open) = rest.find('<') {
        let Some(close) = rest[open..].find('>') else {
            break;
        };
        let close = open + close;
        if open > 0 {
            out.push(Piece::Literal(&rest[..open]));
        }
        out.push(Piece::Placeholder(&rest[open + 1..close]));
        rest = &rest[close + 1..];
    }
    if !rest.is_empty() {
        out.push(Piece::Literal(rest));
    }
    out
}

/// Split a placeholder body `name:regex` into its name and optional constraint.
fn split_placeholder(body: &str) -> (&str, Option<&str>) {
    match body.find(':') {
        Some(idx) => (&body[..idx], Some(&body[idx + 1..])),
        None => (body, None),
    }
}

/// Split a path into raw segments, keeping `/` inside `<...>` intact.
pub(crate) fn split_raw(path: &str) -> Vec<&str> {
    let path = path.strip_prefix('/').unwrap_or(path);
    let bytes = path.as_bytes();
    let mut segments = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'<' => {
                // Skip to the closing bracket; an unterminated one is a literal.
                if let Some(close) = path[i..].find('>') {
                    i += close;
                }
            }
            b'/' => {
                segments.push(&path[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    segments.push(&path[start..]);
    segments
}

fn compile_regex(pattern: &str, source: &str) -> Result<Regex, RouteError> {
    Regex::new(source).map_err(|e| RouteError::InvalidPattern {
        pattern: pattern.to_string(),
        source: e,
    })
}

/// Compile a full route path into segments.
pub(crate) fn compile(pattern: &str) -> Result<Vec<Segment>, RouteError> {
    let raw = split_raw(pattern);
    let last = raw.len().saturating_sub(1);
    let mut segments = Vec::with_capacity(raw.len());

    for (idx, segment) in raw.iter().enumerate() {
        if *segment == "*" && idx == last {
            segments.push(Segment::Wildcard);
            continue;
        }

        let parts = pieces(segment);
        let placeholders = parts
            .iter()
            .filter(|p| matches!(p, Piece::Placeholder(_)))
            .count();

        if placeholders == 0 {
            segments.push(Segment::Static((*segment).to_string()));
            continue;
        }

        if let [Piece::Placeholder(body)] = parts.as_slice() {
            let (name, constraint) = split_placeholder(body);
            let name: Arc<str> = Arc::from(name);
            let kind = match constraint {
                Some(re) => ParamKind::Constrained {
                    name,
                    regex: compile_regex(pattern, &format!("^(?:{re})$"))?,
                },
                None => ParamKind::Any { name },
            };
            segments.push(Segment::Param(ParamMatcher {
                key: (*segment).to_string(),
                kind,
            }));
            continue;
        }

        let mut source = String::from("^");
        let mut names = Vec::with_capacity(placeholders);
        for part in &parts {
            match part {
                Piece::Literal(text) => source.push_str(&regex::escape(text)),
                Piece::Placeholder(body) => {
                    let (name, constraint) = split_placeholder(body);
                    let idx = names.len();
                    let inner = constraint.unwrap_or(".+?");
                    source.push_str(&format!("(?P<p{idx}>{inner})"));
                    names.push(Arc::from(name));
                }
            }
        }
        source.push('$');
        segments.push(Segment::Param(ParamMatcher {
            key: (*segment).to_string(),
            kind: ParamKind::Composite {
                regex: compile_regex(pattern, &source)?,
                names,
            },
        }));
    }

    Ok(segments)
}

/// Build the reverse-URL template for a route path.
///
/// `<name:regex>` becomes `<name>`, plain `<name>` is kept, and trailing `*`
/// characters are removed. An unterminated `<` is copied through unchanged.
#[must_use]
pub fn build_url_template(path: &str) -> String {
    let mut template = String::with_capacity(path.len());
    let mut rest = path;
    while let Some(open) = rest.find('<') {
        let Some(close) = rest[open..].find('>') else {
            break;
        };
        let close = open + close;
        let (name, _) = split_placeholder(&rest[open + 1..close]);
        template.push_str(&rest[..open]);
        template.push('<');
        template.push_str(name);
        template.push('>');
        rest = &rest[close + 1..];
    }
    template.push_str(rest);
    template.trim_end_matches('*').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(pattern: &str) -> Vec<&'static str> {
        compile(pattern)
            .unwrap()
            .iter()
            .map(|s| match s {
                Segment::Static(_) => "static",
                Segment::Wildcard => "wildcard",
                Segment::Param(p) => match p.kind {
                    ParamKind::Any { .. } => "param",
                    ParamKind::Constrained { .. } => "constrained",
                    ParamKind::Composite { .. } => "composite",
                },
            })
            .collect()
    }

    #[test]
    fn test_split_keeps_slash_inside_brackets() {
        assert_eq!(split_raw("/a/<p:x/y>/c"), vec!["a", "<p:x/y>", "c"]);
        assert_eq!(split_raw("/"), vec![""]);
        assert_eq!(split_raw("/users/"), vec!["users", ""]);
    }

    #[test]
    fn test_segment_kinds() {
        assert_eq!(
            kinds("/users/<id:\\d+>/<action>/*"),
            vec!["static", "constrained", "param", "wildcard"]
        );
        assert_eq!(kinds("/files/<name>.<ext>"), vec!["static", "composite"]);
        assert_eq!(kinds("/a/*/b"), vec!["static", "static", "static"]);
        assert_eq!(kinds("/bad/<id"), vec!["static", "static"]);
    }

    #[test]
    fn test_invalid_constraint() {
        let err = compile("/users/<id:[>").unwrap_err();
        assert!(matches!(err, RouteError::InvalidPattern { .. }));
    }

    #[test]
    fn test_composite_capture() {
        let segments = compile("/<id:\\d+><tail>").unwrap();
        let Segment::Param(matcher) = &segments[0] else {
            panic!("expected param segment");
        };
        let mut out = ParamVec::new();
        assert!(matcher.capture("42abc", &mut out));
        assert_eq!(out[0].1, "42");
        assert_eq!(out[1].1, "abc");
        assert!(!matcher.capture("abc", &mut ParamVec::new()));
    }

    #[test]
    fn test_constrained_is_anchored() {
        let segments = compile("/<id:\\d+>").unwrap();
        let Segment::Param(matcher) = &segments[0] else {
            panic!("expected param segment");
        };
        assert!(matcher.capture("123", &mut ParamVec::new()));
        assert!(!matcher.capture("123x", &mut ParamVec::new()));
    }

    #[test]
    fn test_build_url_template() {
        let cases = [
            ("", ""),
            ("/users", "/users"),
            ("<id>", "<id>"),
            ("<id", "<id"),
            ("/users/<id>", "/users/<id>"),
            ("/users/<id:\\d+>", "/users/<id>"),
            ("/users/<:\\d+>", "/users/<>"),
            ("/users/<id>/xyz", "/users/<id>/xyz"),
            ("/users/<id:\\d+>/xyz", "/users/<id>/xyz"),
            ("/users/<id:\\d+>/<test>", "/users/<id>/<test>"),
            ("/users/<id:\\d+>/<test>/", "/users/<id>/<test>/"),
            ("/users/<id:\\d+><test>", "/users/<id><test>"),
            ("/users/<id:\\d+><test>/", "/users/<id><test>/"),
            ("/users/<id:\\d+>/*", "/users/<id>/"),
        ];
        for (path, expected) in cases {
            assert_eq!(build_url_template(path), expected, "build_url_template({path})");
        }
    }
}
