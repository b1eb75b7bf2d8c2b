//! Model provider adapter boundary.
//!
//! The loop depends only on [`ModelProvider`]. Each backend translates the
//! abstract history into its own wire format inside `submit_turn` and hands
//! back one reassembled [`ModelTurn`].

pub mod stream;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::types::{Attachment, Message, ToolCall, Usage};

pub use stream::{collect_turn, Streamed, StreamingModelProvider, TurnDelta};

/// Tool definition sent to the provider API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// One request to the model: history, offered tools, attached documents.
#[derive(Debug, Clone, Default)]
pub struct TurnRequest {
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDefinition>,
    pub attachments: Vec<Attachment>,
}

/// Why the model ended its turn.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StopReason {
    ToolUse,
    EndTurn,
    MaxTokens,
    StopSequence,
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolUseRequest {
    pub id: String,
    pub name: String,
    pub input: Value,
}

impl From<&ToolUseRequest> for ToolCall {
    fn from(request: &ToolUseRequest) -> Self {
        ToolCall {
            id: request.id.clone(),
            name: request.name.clone(),
            input: request.input.clone(),
        }
    }
}

/// One complete model turn.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelTurn {
    pub text: String,
    pub tool_uses: Vec<ToolUseRequest>,
    pub stop_reason: StopReason,
    pub usage: Usage,
}

impl ModelTurn {
    /// A final text answer.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tool_uses: Vec::new(),
            stop_reason: StopReason::EndTurn,
            usage: Usage::default(),
        }
    }

    /// A turn requesting tools, with optional leading text.
    pub fn tool_uses(text: impl Into<String>, tool_uses: Vec<ToolUseRequest>) -> Self {
        Self {
            text: text.into(),
            tool_uses,
            stop_reason: StopReason::ToolUse,
            usage: Usage::default(),
        }
    }

    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = usage;
        self
    }

    /// Whether the loop should execute tools before asking again.
    ///
    /// Decided by the presence of tool uses, not the stop signal, since some
    /// backends report `end_turn` alongside tool requests.
    pub fn requests_tools(&self) -> bool {
        !self.tool_uses.is_empty()
    }
}

/// Core trait implemented by all model providers.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Provider name (e.g., "anthropic", "openai"), used in errors and logs.
    fn provider_name(&self) -> &str;

    /// Submit the history and tool definitions; return one model turn.
    async fn submit_turn(&self, request: &TurnRequest) -> Result<ModelTurn>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stop_reason_uses_snake_case() {
        assert_eq!(StopReason::ToolUse.to_string(), "tool_use");
        assert_eq!(
            serde_json::to_value(StopReason::EndTurn).unwrap(),
            json!("end_turn")
        );
        assert_eq!("max_tokens".parse::<StopReason>().unwrap(), StopReason::MaxTokens);
    }

    #[test]
    fn requests_tools_follows_tool_uses() {
        let mut turn = ModelTurn::tool_uses(
            "",
            vec![ToolUseRequest {
                id: "1".into(),
                name: "f".into(),
                input: json!({}),
            }],
        );
        turn.stop_reason = StopReason::EndTurn;
        assert!(turn.requests_tools());
        assert!(!ModelTurn::text("done").requests_tools());
    }
}
