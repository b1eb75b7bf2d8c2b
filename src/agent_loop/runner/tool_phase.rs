use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::super::events::AgentEvent;
use super::super::types::{PendingToolUse, PendingToolUses};
use super::control::{append_message, canceled, interrupted, AgentEventEmitter};
use super::Step;
use crate::error::Result;
use crate::tools::{use_tool, InvokeOptions, ToolContext, ToolSet};
use crate::types::Message;

pub(super) struct ToolPhase<'a> {
    pub(super) tools: &'a ToolSet,
    pub(super) options: InvokeOptions,
    pub(super) ctx: &'a ToolContext,
    pub(super) emitter: &'a AgentEventEmitter,
    pub(super) cancel: &'a CancellationToken,
}

impl ToolPhase<'_> {
    /// Work through the batch in request order, one use at a time.
    ///
    /// Uses that already carry a result (from an earlier pass, a decline or
    /// an external resolution) are skipped. A gated use is checked before
    /// `ToolCallStart` is emitted, so each call starts once. A hard tool
    /// error is wrapped in [`LoopError::Interrupted`] with the batch so far.
    ///
    /// [`LoopError::Interrupted`]: crate::error::LoopError::Interrupted
    pub(super) async fn run(
        &self,
        mut pending: PendingToolUses,
        messages: &mut Vec<Message>,
    ) -> Result<Step> {
        for idx in 0..pending.uses.len() {
            if pending.uses[idx].is_resulted() {
                continue;
            }
            if self.cancel.is_cancelled() {
                return Err(canceled(messages, Some(pending)));
            }

            let tool_use = pending.uses[idx].clone();
            let tool = self.tools.get(&tool_use.tool_name);
            if tool.is_some_and(|t| t.require_approval()) && !tool_use.approved {
                return Ok(self.await_approval(tool_use, pending));
            }

            let definition = tool.map(|t| t.definition());
            self.emitter.emit(AgentEvent::ToolCallStart {
                tool: definition.clone(),
                tool_use: tool_use.clone(),
            });

            let outcome = match use_tool(self.tools, &tool_use, self.ctx, self.options).await {
                Ok(outcome) => outcome,
                Err(err) => return Err(interrupted(err, messages, pending)),
            };

            if self.ctx.take_suspended() {
                debug!(
                    tool_name = %tool_use.tool_name,
                    tool_use_id = %tool_use.tool_use_id,
                    "tool suspended the run"
                );
                self.emitter.emit(AgentEvent::Suspended { tool_use });
                return Ok(Step::Suspended(pending));
            }

            let Some(result) = outcome.into_tool_result(&tool_use.tool_use_id) else {
                return Ok(self.await_approval(tool_use, pending));
            };

            self.emitter.emit(AgentEvent::ToolCallEnd {
                tool: definition,
                tool_use: tool_use.clone(),
                result: result.clone(),
            });

            if self.ctx.is_cancelled() {
                if self.ctx.remember_tool_result_when_cancelled() {
                    pending.uses[idx].tool_result = Some(result);
                }
                pending.uses.truncate(idx + 1);
                debug!(
                    tool_name = %tool_use.tool_name,
                    tool_use_id = %tool_use.tool_use_id,
                    "tool cancelled the run"
                );
                self.flush(pending, messages);
                return Ok(Step::Done);
            }
            pending.uses[idx].tool_result = Some(result);
        }

        debug!(tool_uses = pending.uses.len(), "tool batch complete");
        self.flush(pending, messages);
        Ok(Step::AwaitModel)
    }

    fn await_approval(&self, tool_use: PendingToolUse, pending: PendingToolUses) -> Step {
        debug!(
            tool_name = %tool_use.tool_name,
            tool_use_id = %tool_use.tool_use_id,
            "waiting for approval"
        );
        self.emitter.emit(AgentEvent::ApprovalRequired { tool_use });
        Step::Suspended(pending)
    }

    fn flush(&self, pending: PendingToolUses, messages: &mut Vec<Message>) {
        for message in pending.into_messages() {
            append_message(self.emitter, messages, message);
        }
    }
}
