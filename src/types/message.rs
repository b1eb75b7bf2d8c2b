//! Conversation message model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::usage::Usage;

/// One turn of dialogue. Conversations are append-only sequences of these.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: Role,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_results: Vec<ToolResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_data: Option<GenerationData>,
}

impl Message {
    fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            tool_calls: Vec::new(),
            tool_results: Vec::new(),
            generation_data: None,
        }
    }

    /// Create a system message.
    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, text)
    }

    /// Create a user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    /// Create an assistant message.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }

    /// Create an assistant message that requested tools.
    pub fn assistant_with_tool_calls(text: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls,
            ..Self::new(Role::Assistant, text)
        }
    }

    /// Create the synthetic tool turn carrying a batch of results.
    pub fn tool_results(tool_results: Vec<ToolResult>) -> Self {
        Self {
            tool_results,
            ..Self::new(Role::Tool, String::new())
        }
    }

    pub fn with_generation_data(mut self, data: GenerationData) -> Self {
        self.generation_data = Some(data);
        self
    }

    /// Whether this message carries tool results.
    pub fn is_tool_result(&self) -> bool {
        self.role == Role::Tool || !self.tool_results.is_empty()
    }

    /// Ids of the tool calls raised by this message.
    pub fn tool_call_ids(&self) -> impl Iterator<Item = &str> {
        self.tool_calls.iter().map(|call| call.id.as_str())
    }

    /// Ids of the tool results answered by this message.
    pub fn tool_result_ids(&self) -> impl Iterator<Item = &str> {
        self.tool_results.iter().map(|result| result.tool_use_id.as_str())
    }
}

/// Conversation role.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A tool call issued by the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub input: serde_json::Value,
}

/// A tool result returned to the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolResult {
    pub tool_use_id: String,
    pub output: serde_json::Value,
    #[serde(default)]
    pub is_error: bool,
}

impl ToolResult {
    pub fn success(tool_use_id: impl Into<String>, output: serde_json::Value) -> Self {
        Self {
            tool_use_id: tool_use_id.into(),
            output,
            is_error: false,
        }
    }

    pub fn error(tool_use_id: impl Into<String>, output: serde_json::Value) -> Self {
        Self {
            tool_use_id: tool_use_id.into(),
            output,
            is_error: true,
        }
    }
}

/// Metadata recorded for a model generation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerationData {
    pub timestamp: DateTime<Utc>,
    pub duration_ms: u64,
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl GenerationData {
    pub fn new(timestamp: DateTime<Utc>, duration_ms: u64, usage: &Usage) -> Self {
        Self {
            timestamp,
            duration_ms,
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
        }
    }

    pub fn usage(&self) -> Usage {
        Usage {
            input_tokens: self.input_tokens,
            output_tokens: self.output_tokens,
        }
    }
}

/// Check that every tool result answers a call of the most recent preceding
/// message that carries tool calls.
pub fn validate_tool_pairing(messages: &[Message]) -> Result<(), String> {
    let mut open_calls: Option<(usize, Vec<&str>)> = None;
    for (idx, message) in messages.iter().enumerate() {
        if !message.tool_calls.is_empty() {
            open_calls = Some((idx, message.tool_call_ids().collect()));
        }
        if message.tool_results.is_empty() {
            continue;
        }
        let Some((call_idx, ids)) = &open_calls else {
            return Err(format!("message {idx} carries tool results with no preceding call"));
        };
        if let Some(orphan) = message.tool_result_ids().find(|id| !ids.contains(id)) {
            return Err(format!(
                "message {idx} answers '{orphan}', which message {call_idx} never called"
            ));
        }
    }
    Ok(())
}
