//! Observational events emitted by the agent loop.

use std::sync::Arc;

use serde::Serialize;

use super::types::{PendingToolUse, RunId};
use crate::provider::ToolDefinition;
use crate::types::{Message, Role, ToolResult};

/// Callback receiving [`AgentEvent`]s. Must not block.
pub type AgentEventSink = Arc<dyn Fn(AgentEvent) + Send + Sync>;

/// Events describing loop progress. They never influence control flow.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    // -- Lifecycle --
    AgentStart {
        run_id: RunId,
    },
    AgentEnd {
        run_id: RunId,
    },

    // -- Messages --
    /// A provider call is about to produce a message with this role.
    MessageStart {
        role: Role,
    },
    /// A message was appended to history.
    MessageEnd {
        message: Message,
    },

    // -- Tool execution --
    /// `tool` is `None` when the model named a tool that is not registered.
    ToolCallStart {
        tool: Option<ToolDefinition>,
        tool_use: PendingToolUse,
    },
    ToolCallEnd {
        tool: Option<ToolDefinition>,
        tool_use: PendingToolUse,
        result: ToolResult,
    },
    ApprovalRequired {
        tool_use: PendingToolUse,
    },
    Suspended {
        tool_use: PendingToolUse,
    },
}
