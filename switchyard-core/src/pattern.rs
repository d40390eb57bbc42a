//! # Path Patterns
//!
//! Parses the patterns layers are registered under and matches concrete
//! request paths against them.
//!
//! # Syntax
//!
//! | Pattern | Meaning |
//! |---------|---------|
//! | `/greeting/formal` | literal segments |
//! | `/users/:id/posts/:post` | `:name` captures exactly one non-empty segment |
//! | `*` | any path of an external call, never an internal one |
//! | `Regex` | used verbatim externally, anchored (`^(?:…)$`) internally |
//!
//! Paths are normalized before comparison: trailing and repeated slashes are
//! dropped and `.` / `..` segments are resolved, so `/a/b/` and `/a//b` are
//! both `/a/b`.
//!
//! # Relative Calls
//!
//! A handler calling into the graph passes a path relative to its own path.
//! [`resolve_path`] joins the two; a leading `@/` escapes to the root instead.
//!
//! ```rust
//! use switchyard_core::resolve_path;
//!
//! assert_eq!(resolve_path("/greeting", "formal"), "/greeting/formal");
//! assert_eq!(resolve_path("/greeting/decide", "../formal"), "/greeting/formal");
//! assert_eq!(resolve_path("/greeting/decide", "@/search"), "/search");
//! ```

use crate::error::PatternError;
use regex::Regex;
use serde_json::Value;
use std::fmt;

/// Parameters extracted from a path or passed by a caller.
pub type Params = serde_json::Map<String, Value>;

/// Prefix marking a caller-supplied path as absolute from the root.
pub const ROOT_ESCAPE: &str = "@/";

/// The wildcard pattern.
pub const WILDCARD: &str = "*";

/// A compiled `:name` pattern.
#[derive(Debug, Clone)]
pub struct ParsedPattern {
    /// Anchored regex matching the whole normalized path.
    pub regex: Regex,
    /// Names of the dynamic segments, in capture order.
    pub param_names: Vec<String>,
}

/// Compile a `:name` pattern into an anchored regex and its parameter names.
pub fn parse_pattern(pattern: &str) -> Result<ParsedPattern, PatternError> {
    let (body, param_names) = pattern_body(pattern)?;
    let regex = Regex::new(&exact_source(&body))?;
    Ok(ParsedPattern { regex, param_names })
}

/// Extract dynamic parameters from `path` according to `pattern`.
///
/// Returns `None` if the path does not structurally match the pattern (or the
/// pattern is malformed). Literal patterns yield an empty map on a match.
pub fn extract_params(pattern: &str, path: &str) -> Option<Params> {
    let parsed = parse_pattern(pattern).ok()?;
    capture_params(&parsed.regex, &parsed.param_names, &normalize_path(path))
}

/// Normalize a path: leading slash, no trailing or repeated slashes, `.` and
/// `..` resolved. The root is `/`.
pub fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    format!("/{}", segments.join("/"))
}

/// Resolve a caller-supplied `target` against the `current` branch path.
///
/// `@/x` resolves to `/x`; anything else is joined onto `current`.
pub fn resolve_path(current: &str, target: &str) -> String {
    match target.strip_prefix(ROOT_ESCAPE) {
        Some(rest) => normalize_path(rest),
        None => normalize_path(&format!("{current}/{target}")),
    }
}

/// Join a mount prefix and a layer path.
pub fn join_paths(prefix: &str, path: &str) -> String {
    normalize_path(&format!("{prefix}/{path}"))
}

/// How a pattern is compared against a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// The whole path must match.
    Exact,
    /// The pattern must match a leading run of whole segments.
    Prefix,
}

#[derive(Debug, Clone)]
enum PatternKind {
    Wildcard,
    Path {
        normalized: String,
        exact: Regex,
        prefix: Regex,
        param_names: Vec<String>,
    },
    Regex {
        raw: Regex,
        anchored: Regex,
    },
}

/// A parsed layer pattern.
#[derive(Debug, Clone)]
pub struct PathPattern {
    kind: PatternKind,
}

impl PathPattern {
    /// Parse a string pattern (`*`, literal or `:name` segments).
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        if pattern.trim() == WILDCARD {
            return Ok(Self {
                kind: PatternKind::Wildcard,
            });
        }

        let (body, param_names) = pattern_body(pattern)?;
        let exact = Regex::new(&exact_source(&body))?;
        let prefix = Regex::new(&format!("^{body}(?:/.*)?$"))?;
        Ok(Self {
            kind: PatternKind::Path {
                normalized: normalize_path(pattern),
                exact,
                prefix,
                param_names,
            },
        })
    }

    /// Wrap a regular expression.
    pub fn from_regex(regex: Regex) -> Result<Self, PatternError> {
        let anchored = Regex::new(&format!("^(?:{})$", regex.as_str()))?;
        Ok(Self {
            kind: PatternKind::Regex {
                raw: regex,
                anchored,
            },
        })
    }

    /// The pattern as written (normalized for string patterns).
    pub fn as_str(&self) -> &str {
        match &self.kind {
            PatternKind::Wildcard => WILDCARD,
            PatternKind::Path { normalized, .. } => normalized,
            PatternKind::Regex { raw, .. } => raw.as_str(),
        }
    }

    /// Returns `true` for `*`.
    pub fn is_wildcard(&self) -> bool {
        matches!(self.kind, PatternKind::Wildcard)
    }

    /// Returns `true` for regex patterns.
    pub fn is_regex(&self) -> bool {
        matches!(self.kind, PatternKind::Regex { .. })
    }

    /// Names of the `:name` segments.
    pub fn param_names(&self) -> &[String] {
        match &self.kind {
            PatternKind::Path { param_names, .. } => param_names,
            _ => &[],
        }
    }

    /// Returns `true` if the pattern has dynamic segments.
    pub fn has_params(&self) -> bool {
        !self.param_names().is_empty()
    }

    /// Number of path segments the pattern spans.
    pub fn depth(&self) -> usize {
        match &self.kind {
            PatternKind::Wildcard => 0,
            PatternKind::Path { normalized, .. } => {
                normalized.split('/').filter(|s| !s.is_empty()).count()
            }
            PatternKind::Regex { raw, .. } => raw.as_str().matches('/').count(),
        }
    }

    /// Match a normalized path, returning the extracted parameters.
    ///
    /// The wildcard matches every path in [`MatchMode::Prefix`] and nothing in
    /// [`MatchMode::Exact`].
    pub fn matches(&self, path: &str, mode: MatchMode) -> Option<Params> {
        match (&self.kind, mode) {
            (PatternKind::Wildcard, MatchMode::Prefix) => Some(Params::new()),
            (PatternKind::Wildcard, MatchMode::Exact) => None,
            (
                PatternKind::Path {
                    exact, param_names, ..
                },
                MatchMode::Exact,
            ) => capture_params(exact, param_names, path),
            (
                PatternKind::Path {
                    prefix,
                    param_names,
                    ..
                },
                MatchMode::Prefix,
            ) => capture_params(prefix, param_names, path),
            (PatternKind::Regex { anchored, .. }, MatchMode::Exact) => named_captures(anchored, path),
            (PatternKind::Regex { raw, .. }, MatchMode::Prefix) => named_captures(raw, path),
        }
    }

    /// Re-root this pattern under a mount prefix.
    ///
    /// A wildcard becomes a prefix pattern for the mount point itself; regex
    /// patterns are prefixed with the escaped mount path.
    pub fn with_prefix(&self, prefix: &str) -> Result<Self, PatternError> {
        let prefix = normalize_path(prefix);
        match &self.kind {
            PatternKind::Wildcard => Self::parse(&prefix),
            PatternKind::Path { normalized, .. } => Self::parse(&join_paths(&prefix, normalized)),
            PatternKind::Regex { raw, .. } => {
                if prefix == "/" {
                    return Ok(self.clone());
                }
                let source = raw.as_str().strip_prefix('^').unwrap_or(raw.as_str());
                Self::from_regex(Regex::new(&format!("{}{}", regex::escape(&prefix), source))?)
            }
        }
    }

    /// Identity used to detect duplicate registrations.
    pub fn key(&self) -> String {
        match &self.kind {
            PatternKind::Regex { raw, .. } => format!("re:{}", raw.as_str()),
            _ => self.as_str().to_owned(),
        }
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PartialEq for PathPattern {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for PathPattern {}

/// Conversion into a [`PathPattern`] at registration time.
pub trait IntoPattern {
    /// Parse or wrap `self`.
    fn into_pattern(self) -> Result<PathPattern, PatternError>;
}

impl IntoPattern for PathPattern {
    fn into_pattern(self) -> Result<PathPattern, PatternError> {
        Ok(self)
    }
}

impl IntoPattern for &str {
    fn into_pattern(self) -> Result<PathPattern, PatternError> {
        PathPattern::parse(self)
    }
}

impl IntoPattern for String {
    fn into_pattern(self) -> Result<PathPattern, PatternError> {
        PathPattern::parse(&self)
    }
}

impl IntoPattern for &String {
    fn into_pattern(self) -> Result<PathPattern, PatternError> {
        PathPattern::parse(self)
    }
}

impl IntoPattern for Regex {
    fn into_pattern(self) -> Result<PathPattern, PatternError> {
        PathPattern::from_regex(self)
    }
}

// Internals

fn pattern_body(pattern: &str) -> Result<(String, Vec<String>), PatternError> {
    let normalized = normalize_path(pattern);
    let mut body = String::new();
    let mut param_names: Vec<String> = Vec::new();

    for segment in normalized.split('/').filter(|s| !s.is_empty()) {
        match segment.strip_prefix(':') {
            Some("") => return Err(PatternError::EmptyParamName(pattern.to_owned())),
            Some(name) => {
                if param_names.iter().any(|n| n == name) {
                    return Err(PatternError::DuplicateParam {
                        pattern: pattern.to_owned(),
                        name: name.to_owned(),
                    });
                }
                param_names.push(name.to_owned());
                body.push_str("/([^/]+)");
            }
            None => {
                body.push('/');
                body.push_str(&regex::escape(segment));
            }
        }
    }

    Ok((body, param_names))
}

fn exact_source(body: &str) -> String {
    if body.is_empty() {
        "^/$".to_owned()
    } else {
        format!("^{body}$")
    }
}

fn capture_params(regex: &Regex, names: &[String], path: &str) -> Option<Params> {
    let caps = regex.captures(path)?;
    let mut params = Params::new();
    for (index, name) in names.iter().enumerate() {
        if let Some(value) = caps.get(index + 1) {
            params.insert(name.clone(), Value::String(value.as_str().to_owned()));
        }
    }
    Some(params)
}

fn named_captures(regex: &Regex, path: &str) -> Option<Params> {
    let caps = regex.captures(path)?;
    let mut params = Params::new();
    for name in regex.capture_names().flatten() {
        if let Some(value) = caps.name(name) {
            params.insert(name.to_owned(), Value::String(value.as_str().to_owned()));
        }
    }
    Some(params)
}
