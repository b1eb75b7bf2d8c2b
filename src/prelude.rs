//! Convenience re-exports for common use.

pub use crate::agent_loop::{
    Agent, AgentEvent, AgentResult, AgentTask, ApprovalDecision, ApprovalRequest, LoopState,
    PendingToolUse, PendingToolUses,
};
pub use crate::config::LoopConfig;
pub use crate::error::{LoopError, Result};
pub use crate::provider::{ModelProvider, ModelTurn, StopReason, ToolUseRequest, TurnRequest};
pub use crate::tools::{BoundArguments, Tool, ToolContext, ToolParameters, ToolSet};
pub use crate::types::{Attachment, Message, Role, ToolCall, ToolResult, Usage};
pub use tokio_util::sync::CancellationToken;
