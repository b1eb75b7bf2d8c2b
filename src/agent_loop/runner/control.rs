use super::super::events::{AgentEvent, AgentEventSink};
use super::super::types::{AgentResult, PendingToolUses};
use crate::error::LoopError;
use crate::types::Message;

#[derive(Clone)]
pub(super) struct AgentEventEmitter {
    sink: Option<AgentEventSink>,
}

impl AgentEventEmitter {
    pub(super) fn new(sink: Option<AgentEventSink>) -> Self {
        Self { sink }
    }

    pub(super) fn emit(&self, event: AgentEvent) {
        if let Some(sink) = &self.sink {
            (sink)(event);
        }
    }
}

/// Append a message to history and announce it.
pub(super) fn append_message(
    emitter: &AgentEventEmitter,
    messages: &mut Vec<Message>,
    message: Message,
) {
    emitter.emit(AgentEvent::MessageEnd {
        message: message.clone(),
    });
    messages.push(message);
}

/// Cancellation error carrying everything appended so far.
pub(super) fn canceled(messages: &[Message], pending: Option<PendingToolUses>) -> LoopError {
    LoopError::Canceled {
        partial: Box::new(AgentResult {
            messages: messages.to_vec(),
            pending_tool_uses: pending,
        }),
    }
}

/// Wrap a hard tool error with the batch as it stood, so results of uses
/// that already ran are not lost.
pub(super) fn interrupted(
    source: LoopError,
    messages: &[Message],
    pending: PendingToolUses,
) -> LoopError {
    LoopError::Interrupted {
        source: Box::new(source),
        partial: Box::new(AgentResult {
            messages: messages.to_vec(),
            pending_tool_uses: Some(pending),
        }),
    }
}
