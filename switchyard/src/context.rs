//! # Execution Context
//!
//! A [`Context`] is created for every branch of a request: once for the
//! external entry point (the root) and once per nested agent or tool call.
//! It is a cheap-to-clone handle; every layer of one chain sees the same
//! context, so a middleware that sets a param or a state entry makes it
//! visible to the layers after it.
//!
//! # Isolation
//!
//! Sub-contexts never share mutable data with their parent:
//!
//! | Field | Root | Sub-context |
//! |-------|------|-------------|
//! | `request_id` | fresh | inherited |
//! | `path` | request path | resolved call target |
//! | `params` | from [`RequestInit`] | from the caller |
//! | `messages` | from [`RequestInit`] | inherited |
//! | `state` | empty | deep copy of the parent's |
//! | `call_depth` | 0 | parent + 1 for agents, parent for tools |
//! | response sink, barrier | fresh | shared |

use crate::{barrier::Barrier, gateway::NextHandler, logger::Logger, router::RouterCore};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use switchyard_core::{Params, ResponseSink, normalize_path};
use switchyard_std::writer::StreamWriter;

/// Per-branch mutable state.
pub type State = serde_json::Map<String, Value>;

/// What an external caller supplies with a request.
#[derive(Debug, Clone, Default)]
pub struct RequestInit {
    /// Conversation history.
    pub messages: Vec<Value>,
    /// Initial params of the root branch.
    pub params: Params,
}

impl RequestInit {
    /// An empty request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the conversation history.
    pub fn with_messages(mut self, messages: Vec<Value>) -> Self {
        self.messages = messages;
        self
    }

    /// Append one message.
    pub fn with_message(mut self, message: Value) -> Self {
        self.messages.push(message);
        self
    }

    /// Set the root params.
    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }
}

/// The kind of a nested call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    /// Agent calls increase the call depth.
    Agent,
    /// Tool calls run at the caller's depth.
    Tool,
}

/// Execution context of one branch.
#[derive(Clone)]
pub struct Context {
    inner: Arc<Inner>,
}

struct Inner {
    request_id: String,
    path: String,
    call_depth: usize,
    params: Mutex<Params>,
    messages: Arc<[Value]>,
    state: Mutex<State>,
    logger: Logger,
    response: StreamWriter,
    barrier: Barrier,
    core: Arc<RouterCore>,
}

impl Context {
    /// Build the root context of a request.
    pub(crate) fn root(
        core: Arc<RouterCore>,
        path: &str,
        init: RequestInit,
        sink: Arc<dyn ResponseSink>,
        barrier: Barrier,
    ) -> Self {
        let request_id = core.ids.generate_id();
        let path = normalize_path(path);
        let logger = Logger::new(&request_id, &path, 0);
        let response = StreamWriter::new(sink, core.ids.clone());

        Self {
            inner: Arc::new(Inner {
                request_id,
                path,
                call_depth: 0,
                params: Mutex::new(init.params),
                messages: init.messages.into(),
                state: Mutex::new(State::new()),
                logger,
                response,
                barrier,
                core,
            }),
        }
    }

    /// Build an isolated context for a nested call to `path`.
    pub(crate) fn sub_context(&self, kind: CallKind, path: String, params: Params) -> Self {
        let call_depth = match kind {
            CallKind::Agent => self.inner.call_depth + 1,
            CallKind::Tool => self.inner.call_depth,
        };
        let logger = Logger::new(&self.inner.request_id, &path, call_depth);

        Self {
            inner: Arc::new(Inner {
                request_id: self.inner.request_id.clone(),
                path,
                call_depth,
                params: Mutex::new(params),
                messages: self.inner.messages.clone(),
                state: Mutex::new(self.state()),
                logger,
                response: self.inner.response.clone(),
                barrier: self.inner.barrier.clone(),
                core: self.inner.core.clone(),
            }),
        }
    }

    // ========================================================================
    // Identity
    // ========================================================================

    /// Identifier shared by every branch of the request.
    pub fn request_id(&self) -> &str {
        &self.inner.request_id
    }

    /// Normalized path of this branch.
    pub fn path(&self) -> &str {
        &self.inner.path
    }

    /// Nesting depth: 0 at the root, +1 per nested agent call.
    pub fn call_depth(&self) -> usize {
        self.inner.call_depth
    }

    /// The configured depth limit for nested agent calls.
    pub fn max_call_depth(&self) -> usize {
        self.inner.core.config.max_call_depth
    }

    // ========================================================================
    // Request
    // ========================================================================

    /// A snapshot of the params.
    pub fn params(&self) -> Params {
        self.params_lock().clone()
    }

    /// A single param.
    pub fn param(&self, name: &str) -> Option<Value> {
        self.params_lock().get(name).cloned()
    }

    /// A single param as a string slice, cloned.
    pub fn param_str(&self, name: &str) -> Option<String> {
        self.params_lock()
            .get(name)
            .and_then(Value::as_str)
            .map(str::to_owned)
    }

    /// Set a param for the rest of this chain.
    pub fn set_param(&self, name: impl Into<String>, value: Value) {
        self.params_lock().insert(name.into(), value);
    }

    /// Merge path-extracted params; path values win.
    pub(crate) fn merge_params(&self, path_params: Params) {
        if !path_params.is_empty() {
            self.params_lock().extend(path_params);
        }
    }

    /// Conversation history of the request.
    pub fn messages(&self) -> &[Value] {
        &self.inner.messages
    }

    // ========================================================================
    // State
    // ========================================================================

    /// A deep copy of this branch's state.
    pub fn state(&self) -> State {
        self.state_lock().clone()
    }

    /// A single state entry.
    pub fn get_state(&self, key: &str) -> Option<Value> {
        self.state_lock().get(key).cloned()
    }

    /// A single state entry, deserialized.
    pub fn get_state_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, serde_json::Error> {
        self.get_state(key).map(serde_json::from_value).transpose()
    }

    /// Set a state entry.
    pub fn set_state(&self, key: impl Into<String>, value: Value) {
        self.state_lock().insert(key.into(), value);
    }

    /// Mutate the state through a working copy.
    ///
    /// The copy replaces the state when `f` returns, so `f` may read this
    /// context freely. Entries set through the context while `f` runs are
    /// overwritten.
    pub fn update_state<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        let mut state = self.state();
        let result = f(&mut state);
        *self.state_lock() = state;
        result
    }

    // ========================================================================
    // Collaborators
    // ========================================================================

    /// Logger bound to this branch.
    pub fn logger(&self) -> &Logger {
        &self.inner.logger
    }

    /// Writer over the request's shared response sink.
    pub fn response(&self) -> &StreamWriter {
        &self.inner.response
    }

    /// Gateway for nested calls made from this branch.
    pub fn next(&self) -> NextHandler {
        NextHandler::new(self.clone())
    }

    pub(crate) fn barrier(&self) -> &Barrier {
        &self.inner.barrier
    }

    pub(crate) fn core(&self) -> &Arc<RouterCore> {
        &self.inner.core
    }

    fn params_lock(&self) -> MutexGuard<'_, Params> {
        self.inner
            .params
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn state_lock(&self) -> MutexGuard<'_, State> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("request_id", &self.inner.request_id)
            .field("path", &self.inner.path)
            .field("call_depth", &self.inner.call_depth)
            .field("params", &*self.params_lock())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::RouterBuilder;
    use serde_json::json;
    use switchyard_core::NullSink;

    fn root(path: &str) -> Context {
        let core = RouterBuilder::new().build().core().clone();
        Context::root(
            core,
            path,
            RequestInit::new().with_message(json!({"role": "user"})),
            Arc::new(NullSink),
            Barrier::new(),
        )
    }

    #[test]
    fn test_root_defaults() {
        let ctx = root("/chat/");
        assert_eq!(ctx.path(), "/chat");
        assert_eq!(ctx.call_depth(), 0);
        assert!(ctx.state().is_empty());
        assert_eq!(ctx.messages().len(), 1);
    }

    #[test]
    fn test_update_state_may_read_context() {
        let ctx = root("/counter");
        ctx.set_state("count", json!(1));

        let seen = ctx.update_state(|state| {
            let current = ctx.get_state("count");
            state.insert("count".into(), json!(2));
            current
        });

        assert_eq!(seen, Some(json!(1)));
        assert_eq!(ctx.get_state("count"), Some(json!(2)));
    }

    #[test]
    fn test_sub_context_isolates_state() {
        let parent = root("/a");
        parent.set_state("items", json!([1]));

        let child = parent.sub_context(CallKind::Agent, "/a/b".into(), Params::new());
        child.update_state(|state| {
            if let Some(Value::Array(items)) = state.get_mut("items") {
                items.push(json!(2));
            }
        });

        assert_eq!(parent.get_state("items"), Some(json!([1])));
        assert_eq!(child.get_state("items"), Some(json!([1, 2])));
        assert_eq!(child.request_id(), parent.request_id());
        assert_eq!(child.messages().len(), 1);
    }

    #[test]
    fn test_depth_by_call_kind() {
        let parent = root("/a");
        let agent = parent.sub_context(CallKind::Agent, "/b".into(), Params::new());
        let tool = agent.sub_context(CallKind::Tool, "/t".into(), Params::new());
        assert_eq!(agent.call_depth(), 1);
        assert_eq!(tool.call_depth(), 1);
    }

    #[test]
    fn test_path_params_win() {
        let ctx = root("/users/7");
        ctx.set_param("id", json!("caller"));
        ctx.set_param("extra", json!(true));

        let mut from_path = Params::new();
        from_path.insert("id".into(), json!("7"));
        ctx.merge_params(from_path);

        assert_eq!(ctx.param_str("id").as_deref(), Some("7"));
        assert_eq!(ctx.param("extra"), Some(json!(true)));
    }

    #[test]
    fn test_typed_state() {
        let ctx = root("/");
        ctx.set_state("count", json!(3));
        assert_eq!(ctx.get_state_as::<u32>("count").unwrap(), Some(3));
        assert_eq!(ctx.get_state_as::<u32>("missing").unwrap(), None);
    }
}
