//! Dispatcher: match, rank and run a chain for one branch.

use crate::{context::Context, handler::dispatch_layer, registry::Layer};
use futures::future::{BoxFuture, FutureExt};
use std::sync::Arc;
use switchyard_core::{CallResult, RouterError};
use tracing::Instrument;

/// Run every layer matching the branch path, most general first.
///
/// Internal calls (`internal == true`) only consider exact matches. Params
/// extracted by the most specific terminal layer are merged into the branch
/// params before the chain starts. The returned future is boxed because
/// handlers re-enter it through nested calls.
pub(crate) fn execute(ctx: Context, internal: bool) -> BoxFuture<'static, CallResult> {
    let span = ctx.logger().span().clone();

    async move {
        let path = ctx.path().to_owned();
        ctx.logger()
            .debug(format_args!("executing path (internal={internal})"));

        let matched = ctx.core().registry.match_path(&path, internal);
        if matched.is_empty() {
            ctx.logger()
                .error(format_args!("no agent or tool found for path: {path}"));
            return Err(RouterError::AgentNotFound { path });
        }

        let described: Vec<String> = matched
            .iter()
            .map(|m| format!("{} ({})", m.layer.pattern(), m.layer.kind()))
            .collect();
        ctx.logger().debug(format_args!(
            "found {} layers to run: [{}]",
            matched.len(),
            described.join(", ")
        ));

        if let Some(terminal) = matched
            .iter()
            .rev()
            .find(|m| m.layer.kind().is_terminal())
        {
            ctx.merge_params(terminal.params.clone());
        }

        let chain: Arc<[Arc<Layer>]> = matched.into_iter().map(|m| m.layer).collect();
        dispatch_layer(chain, 0, ctx).await
    }
    .instrument(span)
    .boxed()
}
