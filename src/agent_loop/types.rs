//! Core run types for the agent loop.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use strum::Display;
use uuid::Uuid;

use crate::error::{LoopError, Result};
use crate::provider::ModelTurn;
use crate::types::{Attachment, GenerationData, Message, Role, ToolCall, ToolResult, Usage};

/// Unique run identifier.
pub type RunId = Uuid;

/// Loop state machine states.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LoopState {
    AwaitingModelTurn,
    ExecutingPendingTools,
    Done,
    /// Returned to the caller with pending uses. Covers both an approval
    /// gate and a handler calling [`ToolContext::suspend`]; either way the
    /// first un-resulted use is [`AgentResult::approvable`].
    ///
    /// [`ToolContext::suspend`]: crate::tools::ToolContext::suspend
    SuspendedForApproval,
}

/// One outstanding tool request from the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingToolUse {
    pub tool_use_id: String,
    pub tool_name: String,
    #[serde(default)]
    pub tool_input: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_result: Option<ToolResult>,
    #[serde(default)]
    pub approved: bool,
}

impl PendingToolUse {
    pub fn new(tool_use_id: impl Into<String>, tool_name: impl Into<String>, tool_input: Value) -> Self {
        Self {
            tool_use_id: tool_use_id.into(),
            tool_name: tool_name.into(),
            tool_input,
            tool_result: None,
            approved: false,
        }
    }

    pub fn is_resulted(&self) -> bool {
        self.tool_result.is_some()
    }

    fn to_tool_call(&self) -> ToolCall {
        ToolCall {
            id: self.tool_use_id.clone(),
            name: self.tool_name.clone(),
            input: self.tool_input.clone(),
        }
    }
}

/// The assistant turn whose tool requests are being worked through.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingToolUses {
    pub role: Role,
    #[serde(default)]
    pub text: String,
    pub uses: Vec<PendingToolUse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_data: Option<GenerationData>,
}

impl PendingToolUses {
    pub(crate) fn from_turn(turn: &ModelTurn, generation_data: GenerationData) -> Self {
        Self {
            role: Role::Assistant,
            text: turn.text.clone(),
            uses: turn
                .tool_uses
                .iter()
                .map(|request| {
                    PendingToolUse::new(&request.id, &request.name, request.input.clone())
                })
                .collect(),
            generation_data: Some(generation_data),
        }
    }

    /// First use still waiting for a result.
    pub fn first_unresulted(&self) -> Option<&PendingToolUse> {
        self.uses.iter().find(|u| !u.is_resulted())
    }

    pub fn first_unresulted_mut(&mut self) -> Option<&mut PendingToolUse> {
        self.uses.iter_mut().find(|u| !u.is_resulted())
    }

    pub fn all_resulted(&self) -> bool {
        self.uses.iter().all(PendingToolUse::is_resulted)
    }

    /// Fold the batch into history: the assistant turn carrying the calls
    /// that have results, then one tool turn with those results.
    ///
    /// Uses without a result contribute neither a call nor a result, so the
    /// emitted pair never dangles. With no resulted uses only the assistant
    /// text is kept.
    pub(crate) fn into_messages(self) -> Vec<Message> {
        let (calls, results): (Vec<ToolCall>, Vec<ToolResult>) = self
            .uses
            .iter()
            .filter_map(|u| u.tool_result.clone().map(|r| (u.to_tool_call(), r)))
            .unzip();

        let mut assistant = if calls.is_empty() {
            Message::assistant(self.text)
        } else {
            Message::assistant_with_tool_calls(self.text, calls)
        };
        assistant.generation_data = self.generation_data;

        let mut messages = vec![assistant];
        if !results.is_empty() {
            messages.push(Message::tool_results(results));
        }
        messages
    }
}

/// Serializable snapshot returned to the caller.
///
/// With `pending_tool_uses` set, the value is a complete continuation: pass
/// it to [`AgentTask::resume`] with the same tools to pick up where the run
/// stopped, in this process or another.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AgentResult {
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_tool_uses: Option<PendingToolUses>,
}

impl AgentResult {
    pub fn done(messages: Vec<Message>) -> Self {
        Self {
            messages,
            pending_tool_uses: None,
        }
    }

    /// First pending use that has no result yet.
    pub fn approvable(&self) -> Option<&PendingToolUse> {
        self.pending_tool_uses
            .as_ref()
            .and_then(PendingToolUses::first_unresulted)
    }

    pub fn needs_approval_to_continue(&self) -> bool {
        self.approvable().is_some()
    }

    /// `SuspendedForApproval` whenever pending uses remain, whether a gate or
    /// a handler's `suspend()` stopped the run.
    pub fn state(&self) -> LoopState {
        if self.pending_tool_uses.is_some() {
            LoopState::SuspendedForApproval
        } else {
            LoopState::Done
        }
    }

    /// Approve the first un-resulted use. Approvals are granted strictly in
    /// request order.
    pub fn approve(&mut self) -> Result<&PendingToolUse> {
        let next = self.first_unresulted_mut()?;
        next.approved = true;
        Ok(next)
    }

    /// Refuse the first un-resulted use. The model receives an error result
    /// and the handler never runs.
    pub fn decline(&mut self, reason: impl Into<String>) -> Result<&PendingToolUse> {
        let reason = reason.into();
        let next = self.first_unresulted_mut()?;
        next.tool_result = Some(ToolResult::error(
            &next.tool_use_id,
            json!({ "error": "approval declined", "reason": reason }),
        ));
        Ok(next)
    }

    /// Supply the result of a suspended use from outside the loop.
    pub fn resolve(&mut self, tool_use_id: &str, output: Value) -> Result<()> {
        let pending = self
            .pending_tool_uses
            .as_mut()
            .ok_or_else(|| LoopError::InvalidState("result has no pending tool uses".into()))?;
        let target = pending
            .uses
            .iter_mut()
            .find(|u| u.tool_use_id == tool_use_id)
            .ok_or_else(|| {
                LoopError::InvalidState(format!("no pending tool use with id '{tool_use_id}'"))
            })?;
        if target.is_resulted() {
            return Err(LoopError::InvalidState(format!(
                "tool use '{tool_use_id}' already has a result"
            )));
        }
        target.tool_result = Some(ToolResult::success(tool_use_id, output));
        Ok(())
    }

    fn first_unresulted_mut(&mut self) -> Result<&mut PendingToolUse> {
        self.pending_tool_uses
            .as_mut()
            .and_then(PendingToolUses::first_unresulted_mut)
            .ok_or_else(|| LoopError::InvalidState("no tool use is awaiting approval".into()))
    }

    /// Text of the last assistant message.
    pub fn final_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
            .map(|m| m.text.as_str())
    }

    /// Token usage across every recorded generation, pending turn included.
    pub fn usage(&self) -> Usage {
        let mut total = Usage::default();
        let pending = self
            .pending_tool_uses
            .as_ref()
            .and_then(|p| p.generation_data.as_ref());
        for data in self
            .messages
            .iter()
            .filter_map(|m| m.generation_data.as_ref())
            .chain(pending)
        {
            total.merge(&data.usage());
        }
        total
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Input to one run of the loop.
#[derive(Debug, Clone, Default)]
pub struct AgentTask {
    pub messages: Vec<Message>,
    pub attachments: Vec<Attachment>,
    pub pending: Option<PendingToolUses>,
}

impl AgentTask {
    /// A fresh conversation starting with one user prompt.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self::from_messages(vec![Message::user(prompt)])
    }

    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self {
            messages,
            attachments: Vec::new(),
            pending: None,
        }
    }

    /// Continue a suspended or approval-pending result.
    ///
    /// Attachments are not part of the serialized result; re-attach them
    /// with [`AgentTask::with_attachments`].
    pub fn resume(result: AgentResult) -> Self {
        Self {
            messages: result.messages,
            attachments: Vec::new(),
            pending: result.pending_tool_uses,
        }
    }

    /// Prepend a system message.
    pub fn with_system(mut self, text: impl Into<String>) -> Self {
        self.messages.insert(0, Message::system(text));
        self
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub fn with_attachments(mut self, attachments: impl IntoIterator<Item = Attachment>) -> Self {
        self.attachments.extend(attachments);
        self
    }

    pub fn initial_state(&self) -> LoopState {
        match &self.pending {
            Some(_) => LoopState::ExecutingPendingTools,
            None => LoopState::AwaitingModelTurn,
        }
    }
}
