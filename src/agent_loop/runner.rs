//! Agent loop runner: alternates model turns and tool batches.

mod control;
mod model_phase;
mod tool_phase;

use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, Instrument};
use uuid::Uuid;

use super::approvals::ApprovalRequest;
use super::events::{AgentEvent, AgentEventSink};
use super::types::{AgentResult, AgentTask, PendingToolUses, RunId};
use crate::config::LoopConfig;
use crate::error::{LoopError, Result};
use crate::provider::ModelProvider;
use crate::tools::{ToolContext, ToolSet};

use control::AgentEventEmitter;
use model_phase::ModelPhase;
use tool_phase::ToolPhase;

/// Next transition of the loop state machine.
pub(super) enum Step {
    AwaitModel,
    ExecuteTools(PendingToolUses),
    Suspended(PendingToolUses),
    Done,
}

/// Drives one conversation against a provider.
///
/// An `Agent` holds no per-conversation state; one instance may serve many
/// concurrent runs, each with its own history and [`ToolContext`].
#[derive(Clone)]
pub struct Agent {
    provider: Arc<dyn ModelProvider>,
    config: LoopConfig,
    event_sink: Option<AgentEventSink>,
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("provider", &self.provider.provider_name())
            .field("config", &self.config)
            .field("event_sink", &self.event_sink.as_ref().map(|_| ".."))
            .finish()
    }
}

impl Agent {
    pub fn new(provider: Arc<dyn ModelProvider>) -> Self {
        Self {
            provider,
            config: LoopConfig::default(),
            event_sink: None,
        }
    }

    pub fn with_config(mut self, config: LoopConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_event_sink(mut self, sink: AgentEventSink) -> Self {
        self.event_sink = Some(sink);
        self
    }

    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    /// A context for a new run, seeded from this agent's configuration.
    pub fn new_context(&self) -> ToolContext {
        ToolContext::new(self.config.remember_tool_result_when_cancelled)
    }

    /// Run `task` until the model stops requesting tools, a tool cancels or
    /// suspends the run, or an approval gate is reached.
    ///
    /// Cancelling `cancel` yields [`LoopError::Canceled`] carrying a
    /// resumable snapshot of everything recorded so far.
    pub async fn run(
        &self,
        task: AgentTask,
        tools: &ToolSet,
        cancel: &CancellationToken,
    ) -> Result<AgentResult> {
        let ctx = self.new_context();
        self.run_with_context(task, tools, &ctx, cancel).await
    }

    /// Like [`Agent::run`] with a caller-owned context. Cancel and suspend
    /// flags are cleared before the run starts.
    pub async fn run_with_context(
        &self,
        task: AgentTask,
        tools: &ToolSet,
        ctx: &ToolContext,
        cancel: &CancellationToken,
    ) -> Result<AgentResult> {
        ctx.reset_flags();
        let run_id: RunId = Uuid::new_v4();
        let emitter = AgentEventEmitter::new(self.event_sink.clone());
        let span = tracing::debug_span!(
            "agent_run",
            %run_id,
            provider = self.provider.provider_name()
        );

        emitter.emit(AgentEvent::AgentStart { run_id });
        let result = self
            .drive(task, tools, ctx, &emitter, cancel)
            .instrument(span)
            .await;
        emitter.emit(AgentEvent::AgentEnd { run_id });
        result
    }

    async fn drive(
        &self,
        task: AgentTask,
        tools: &ToolSet,
        ctx: &ToolContext,
        emitter: &AgentEventEmitter,
        cancel: &CancellationToken,
    ) -> Result<AgentResult> {
        let AgentTask {
            mut messages,
            attachments,
            pending,
        } = task;
        let definitions = tools.definitions();
        let model_phase = ModelPhase {
            provider: self.provider.as_ref(),
            config: &self.config,
            definitions: &definitions,
            attachments: &attachments,
            ctx,
            emitter,
            cancel,
        };
        let tool_phase = ToolPhase {
            tools,
            options: self.config.invoke_options(),
            ctx,
            emitter,
            cancel,
        };

        let mut step = match pending {
            Some(pending) => {
                debug!(tool_uses = pending.uses.len(), "resuming pending tool uses");
                ctx.set_text(&pending.text);
                Step::ExecuteTools(pending)
            }
            None => Step::AwaitModel,
        };
        let mut turns = 0usize;

        loop {
            step = match step {
                Step::AwaitModel => {
                    if turns >= self.config.max_turns {
                        return Err(LoopError::TurnLimitExceeded {
                            max_turns: self.config.max_turns,
                        });
                    }
                    turns += 1;
                    model_phase.run(&mut messages, turns).await?
                }
                Step::ExecuteTools(pending) => tool_phase.run(pending, &mut messages).await?,
                Step::Suspended(pending) => {
                    debug!(turns, "run suspended");
                    return Ok(AgentResult {
                        messages,
                        pending_tool_uses: Some(pending),
                    });
                }
                Step::Done => {
                    debug!(turns, messages = messages.len(), "run complete");
                    return Ok(AgentResult::done(messages));
                }
            };
        }
    }

    /// Handle for the approval `result` is waiting on, or `None` if it is
    /// not waiting.
    pub fn approval_request<'a>(
        &'a self,
        result: AgentResult,
        tools: &'a ToolSet,
    ) -> Option<ApprovalRequest<'a>> {
        let pending = result.approvable()?.clone();
        Some(ApprovalRequest::new(self, tools, result, pending))
    }
}

/// Convenience: run a single prompt to completion.
pub async fn run_prompt(
    agent: &Agent,
    prompt: impl Into<String>,
    tools: &ToolSet,
) -> Result<AgentResult> {
    agent
        .run(AgentTask::new(prompt), tools, &CancellationToken::new())
        .await
}
