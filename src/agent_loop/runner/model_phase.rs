use std::time::Instant;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::super::compaction::keep_only;
use super::super::events::AgentEvent;
use super::super::types::PendingToolUses;
use super::control::{append_message, canceled, AgentEventEmitter};
use super::Step;
use crate::config::LoopConfig;
use crate::error::Result;
use crate::provider::{ModelProvider, ToolDefinition, TurnRequest};
use crate::tools::ToolContext;
use crate::types::{Attachment, GenerationData, Message, Role};

pub(super) struct ModelPhase<'a> {
    pub(super) provider: &'a dyn ModelProvider,
    pub(super) config: &'a LoopConfig,
    pub(super) definitions: &'a [ToolDefinition],
    pub(super) attachments: &'a [Attachment],
    pub(super) ctx: &'a ToolContext,
    pub(super) emitter: &'a AgentEventEmitter,
    pub(super) cancel: &'a CancellationToken,
}

impl ModelPhase<'_> {
    /// Ask the model for its next turn.
    ///
    /// A turn requesting tools is held as pending uses and folded into
    /// history once the batch settles; a final answer is appended directly.
    pub(super) async fn run(&self, messages: &mut Vec<Message>, turn_index: usize) -> Result<Step> {
        if self.cancel.is_cancelled() {
            return Err(canceled(messages, None));
        }

        let request_messages = match self.config.max_messages {
            Some(max) => keep_only(messages, max),
            None => messages.clone(),
        };
        let request = TurnRequest {
            messages: request_messages,
            tools: self.definitions.to_vec(),
            attachments: self.attachments.to_vec(),
        };

        self.emitter.emit(AgentEvent::MessageStart {
            role: Role::Assistant,
        });
        let started_at = Utc::now();
        let clock = Instant::now();
        let outcome = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            turn = self.provider.submit_turn(&request) => Some(turn),
        };
        let rewound = self.rewind_attachments();
        let Some(turn) = outcome else {
            return Err(canceled(messages, None));
        };
        let turn = turn?;
        rewound?;

        let duration_ms = u64::try_from(clock.elapsed().as_millis()).unwrap_or(u64::MAX);
        let generation = GenerationData::new(started_at, duration_ms, &turn.usage);
        self.ctx.set_text(&turn.text);
        debug!(
            turn = turn_index,
            tool_uses = turn.tool_uses.len(),
            stop_reason = %turn.stop_reason,
            duration_ms,
            "model turn received"
        );

        if turn.requests_tools() {
            return Ok(Step::ExecuteTools(PendingToolUses::from_turn(&turn, generation)));
        }
        let message = Message::assistant(turn.text).with_generation_data(generation);
        append_message(self.emitter, messages, message);
        Ok(Step::Done)
    }

    fn rewind_attachments(&self) -> Result<()> {
        for attachment in self.attachments {
            if let Err(err) = attachment.rewind() {
                warn!(attachment = attachment.name(), error = %err, "failed to rewind attachment");
                return Err(err.into());
            }
        }
        Ok(())
    }
}
