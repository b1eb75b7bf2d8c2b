//! Approval handles for gated tool uses.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::runner::Agent;
use super::types::{AgentResult, AgentTask, PendingToolUse};
use crate::error::Result;
use crate::tools::{ToolContext, ToolSet};
use crate::types::Attachment;

/// Caller's answer to a pending approval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum ApprovalDecision {
    Accept,
    Decline {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}

/// Short-lived handle bundling a pending approval with what is needed to
/// continue the run.
#[derive(Debug)]
pub struct ApprovalRequest<'a> {
    agent: &'a Agent,
    tools: &'a ToolSet,
    result: AgentResult,
    pending: PendingToolUse,
    context: ToolContext,
    attachments: Vec<Attachment>,
}

impl<'a> ApprovalRequest<'a> {
    pub(super) fn new(
        agent: &'a Agent,
        tools: &'a ToolSet,
        result: AgentResult,
        pending: PendingToolUse,
    ) -> Self {
        Self {
            agent,
            tools,
            result,
            pending,
            context: agent.new_context(),
            attachments: Vec::new(),
        }
    }

    /// Continue with a caller-owned context instead of a fresh one.
    pub fn with_context(mut self, context: ToolContext) -> Self {
        self.context = context;
        self
    }

    /// Attachments of the original task, resent on every turn after the
    /// approval.
    pub fn with_attachments(mut self, attachments: impl IntoIterator<Item = Attachment>) -> Self {
        self.attachments.extend(attachments);
        self
    }

    pub fn tool_name(&self) -> &str {
        &self.pending.tool_name
    }

    pub fn tool_use_id(&self) -> &str {
        &self.pending.tool_use_id
    }

    pub fn tool_input(&self) -> &Value {
        &self.pending.tool_input
    }

    pub fn pending(&self) -> &PendingToolUse {
        &self.pending
    }

    /// Approve the pending use and re-enter the loop.
    pub async fn approve_and_continue(mut self, cancel: &CancellationToken) -> Result<AgentResult> {
        self.result.approve()?;
        self.resume(cancel).await
    }

    /// Refuse the pending use and re-enter the loop; the model sees the refusal.
    pub async fn decline_and_continue(
        mut self,
        reason: impl Into<String>,
        cancel: &CancellationToken,
    ) -> Result<AgentResult> {
        self.result.decline(reason)?;
        self.resume(cancel).await
    }

    pub async fn respond(
        self,
        decision: ApprovalDecision,
        cancel: &CancellationToken,
    ) -> Result<AgentResult> {
        match decision {
            ApprovalDecision::Accept => self.approve_and_continue(cancel).await,
            ApprovalDecision::Decline { reason } => {
                self.decline_and_continue(reason.unwrap_or_default(), cancel)
                    .await
            }
        }
    }

    /// Give up the handle and keep the suspended result, e.g. to persist it.
    pub fn into_result(self) -> AgentResult {
        self.result
    }

    async fn resume(self, cancel: &CancellationToken) -> Result<AgentResult> {
        self.agent
            .run_with_context(
                AgentTask::resume(self.result).with_attachments(self.attachments),
                self.tools,
                &self.context,
                cancel,
            )
            .await
    }
}
