//! # Layer Registry
//!
//! The ordered collection of layers a router dispatches over, and the
//! specificity ranking that decides the order a matched chain runs in.
//!
//! # Matching
//!
//! | Kind | External call | Internal call |
//! |------|---------------|---------------|
//! | Middleware | segment-boundary prefix | exact |
//! | Agent | exact | exact |
//! | Tool | exact (`:name` captures) | exact (`:name` captures) |
//! | Regex pattern | unanchored | anchored |
//! | `*` | always | never |
//!
//! `:name` segments are captures only in tool patterns. In agent and
//! middleware patterns they are compared as literal text, so an agent at
//! `/a/:id` is never selected for `/a/b`.
//!
//! # Ranking
//!
//! Matched layers run in ascending order of
//! `depth*100 - dynamic_segments*10 - (regex ? 50 : 0) + (terminal ? 1 : 0)`;
//! the wildcard ranks below everything. The sort is stable, so equal scores
//! keep registration order.

use crate::handler::{DynHandler, ToolFactory};
use std::{fmt, sync::Arc};
use switchyard_core::{DynSchema, MatchMode, Params, PathPattern, PatternError, RegistrationError};

/// Score given to the wildcard pattern.
pub const WILDCARD_SCORE: i64 = -1_000;

/// What a layer is registered as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    /// Runs for a path and its descendants; usually calls `next`.
    Middleware,
    /// A terminal handler addressed by exact path.
    Agent,
    /// A terminal handler with a validated input schema.
    Tool,
}

impl LayerKind {
    /// Agents and tools are terminal.
    pub fn is_terminal(self) -> bool {
        !matches!(self, LayerKind::Middleware)
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LayerKind::Middleware => "middleware",
            LayerKind::Agent => "agent",
            LayerKind::Tool => "tool",
        })
    }
}

/// Tool metadata kept alongside a tool layer, used by `attach_tool`.
#[derive(Clone)]
pub(crate) enum ToolMeta {
    Static {
        schema: DynSchema,
        description: Option<String>,
    },
    Factory(Arc<dyn ToolFactory>),
}

/// One registered layer.
#[derive(Clone)]
pub struct Layer {
    pattern: PathPattern,
    kind: LayerKind,
    handler: Arc<dyn DynHandler>,
    tool: Option<ToolMeta>,
}

impl Layer {
    pub(crate) fn new(pattern: PathPattern, kind: LayerKind, handler: Arc<dyn DynHandler>) -> Self {
        Self {
            pattern,
            kind,
            handler,
            tool: None,
        }
    }

    pub(crate) fn with_tool(mut self, meta: ToolMeta) -> Self {
        self.tool = Some(meta);
        self
    }

    /// The pattern the layer was registered under.
    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    /// The layer kind.
    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    /// The layer handler.
    pub fn handler(&self) -> &Arc<dyn DynHandler> {
        &self.handler
    }

    pub(crate) fn tool(&self) -> Option<&ToolMeta> {
        self.tool.as_ref()
    }

    /// Ordering score of this layer.
    pub fn specificity(&self) -> i64 {
        specificity(&self.pattern, self.kind)
    }

    /// Match `path`, returning the params the pattern extracts.
    pub fn matches(&self, path: &str, internal: bool) -> Option<Params> {
        let mode = if internal {
            MatchMode::Exact
        } else if self.kind == LayerKind::Middleware
            || self.pattern.is_regex()
            || self.pattern.is_wildcard()
        {
            MatchMode::Prefix
        } else {
            MatchMode::Exact
        };
        if self.kind != LayerKind::Tool && self.pattern.has_params() {
            return literal_match(self.pattern.as_str(), path, mode);
        }
        self.pattern.matches(path, mode)
    }

    /// The same layer re-rooted under a mount prefix.
    pub(crate) fn with_prefix(&self, prefix: &str) -> Result<Self, PatternError> {
        Ok(Self {
            pattern: self.pattern.with_prefix(prefix)?,
            ..self.clone()
        })
    }
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer")
            .field("pattern", &self.pattern.as_str())
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

fn literal_match(pattern: &str, path: &str, mode: MatchMode) -> Option<Params> {
    let matched = path == pattern
        || (mode == MatchMode::Prefix
            && path
                .strip_prefix(pattern)
                .is_some_and(|rest| rest.starts_with('/')));
    matched.then(Params::new)
}

/// Ordering score of a pattern registered as `kind`. Lower runs first.
pub fn specificity(pattern: &PathPattern, kind: LayerKind) -> i64 {
    if pattern.is_wildcard() {
        return WILDCARD_SCORE;
    }
    let depth = i64::try_from(pattern.depth()).unwrap_or(i64::MAX / 200);
    let dynamic = i64::try_from(pattern.param_names().len()).unwrap_or(0);

    let mut score = depth * 100 - dynamic * 10;
    if pattern.is_regex() {
        score -= 50;
    }
    if kind.is_terminal() {
        score += 1;
    }
    score
}

/// A layer selected for a dispatch, with the params its pattern extracted.
#[derive(Debug, Clone)]
pub struct Matched {
    /// The layer.
    pub layer: Arc<Layer>,
    /// Params extracted from the path.
    pub params: Params,
}

/// Ordered collection of layers.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    layers: Vec<Arc<Layer>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a layer. A second tool under the same pattern is rejected.
    pub fn register(&mut self, layer: Layer) -> Result<(), RegistrationError> {
        if layer.kind == LayerKind::Tool {
            let key = layer.pattern.key();
            if self
                .tools()
                .any(|existing| existing.pattern.key() == key)
            {
                return Err(RegistrationError::DuplicateTool(layer.pattern.to_string()));
            }
        }
        self.layers.push(Arc::new(layer));
        Ok(())
    }

    /// Number of layers.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Layers in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Layer>> {
        self.layers.iter()
    }

    /// Tool layers in registration order.
    pub fn tools(&self) -> impl Iterator<Item = &Arc<Layer>> {
        self.layers
            .iter()
            .filter(|layer| layer.kind == LayerKind::Tool)
    }

    /// Every layer matching `path`, ranked from most general to most specific.
    pub fn match_path(&self, path: &str, internal: bool) -> Vec<Matched> {
        let mut matched: Vec<Matched> = self
            .layers
            .iter()
            .filter_map(|layer| {
                layer.matches(path, internal).map(|params| Matched {
                    layer: layer.clone(),
                    params,
                })
            })
            .collect();
        // `sort_by_key` is stable.
        matched.sort_by_key(|m| m.layer.specificity());
        matched
    }

    /// The first tool layer whose pattern exactly matches `path`.
    pub fn find_tool(&self, path: &str) -> Option<Matched> {
        self.tools().find_map(|layer| {
            layer.pattern.matches(path, MatchMode::Exact).map(|params| Matched {
                layer: layer.clone(),
                params,
            })
        })
    }
}
