//! Tool invocation engine: resolve, gate, bind, run, classify.

use serde_json::Value;
use tracing::{debug, info, warn};

use super::arguments::bind_arguments;
use super::context::ToolContext;
use super::registry::ToolSet;
use crate::agent_loop::PendingToolUse;
use crate::error::{LoopError, Result};
use crate::types::ToolResult;

/// Result text returned to the model when it calls a tool that does not exist.
pub const UNKNOWN_TOOL_RESULT: &str = "unknown tool, do not call again";

/// Result text returned to the model when its input could not be bound.
pub const INVALID_INPUT_RESULT: &str = "failed";

/// Switches that turn hard errors into results the model can react to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InvokeOptions {
    pub ignore_unknown_tools: bool,
    pub ignore_invalid_schema: bool,
}

/// Classified result of running one pending tool use.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    /// Handler completed; `null` for handlers without output.
    Success(Value),
    /// Tool is approval-gated and the use is not approved. Nothing ran.
    ApprovalRequired,
    /// Sentinel for an unknown tool name.
    UnknownTool(Value),
    /// Sentinel for input that could not be bound.
    InvalidInput(Value),
}

impl ToolOutcome {
    /// Tool result to fold into history, or `None` when approval is pending.
    pub fn into_tool_result(self, tool_use_id: &str) -> Option<ToolResult> {
        match self {
            Self::Success(value) => Some(ToolResult::success(tool_use_id, value)),
            Self::UnknownTool(value) | Self::InvalidInput(value) => {
                Some(ToolResult::error(tool_use_id, value))
            }
            Self::ApprovalRequired => None,
        }
    }
}

/// Run one pending tool use against `tools`.
///
/// Resolution is an exact, case-sensitive name match. Approval is checked
/// before binding so a gated tool never has side effects until approved.
/// Handler errors other than schema problems propagate as
/// [`LoopError::ToolExecution`].
pub async fn use_tool(
    tools: &ToolSet,
    pending: &PendingToolUse,
    ctx: &ToolContext,
    options: InvokeOptions,
) -> Result<ToolOutcome> {
    let Some(tool) = tools.get(&pending.tool_name) else {
        if options.ignore_unknown_tools {
            warn!(
                tool_name = %pending.tool_name,
                tool_use_id = %pending.tool_use_id,
                "model requested unknown tool"
            );
            return Ok(ToolOutcome::UnknownTool(Value::String(
                UNKNOWN_TOOL_RESULT.to_string(),
            )));
        }
        return Err(LoopError::UnknownTool {
            name: pending.tool_name.clone(),
        });
    };

    if tool.require_approval() && !pending.approved {
        debug!(
            tool_name = %pending.tool_name,
            tool_use_id = %pending.tool_use_id,
            "tool requires approval"
        );
        return Ok(ToolOutcome::ApprovalRequired);
    }

    let args = match bind_arguments(tool.name(), tool.parameters(), &pending.tool_input, ctx) {
        Ok(args) => args,
        Err(err) => return schema_failure(err, pending, options),
    };

    if tool.log_inputs_and_outputs() {
        info!(
            tool_name = %pending.tool_name,
            tool_use_id = %pending.tool_use_id,
            input = %pending.tool_input,
            "invoking tool"
        );
    } else {
        debug!(
            tool_name = %pending.tool_name,
            tool_use_id = %pending.tool_use_id,
            "invoking tool"
        );
    }

    let output = match tool.invoke(args).await {
        Ok(output) => output,
        Err(err) if err.is_schema_problem() => return schema_failure(err, pending, options),
        Err(LoopError::ToolExecution { tool_name, message }) => {
            return Err(LoopError::ToolExecution { tool_name, message })
        }
        Err(err) => return Err(LoopError::tool(&pending.tool_name, err.to_string())),
    };

    if tool.log_inputs_and_outputs() {
        info!(
            tool_name = %pending.tool_name,
            tool_use_id = %pending.tool_use_id,
            output = %output,
            "tool completed"
        );
    }
    Ok(ToolOutcome::Success(output))
}

fn schema_failure(
    err: LoopError,
    pending: &PendingToolUse,
    options: InvokeOptions,
) -> Result<ToolOutcome> {
    if !options.ignore_invalid_schema {
        return Err(err);
    }
    warn!(
        tool_name = %pending.tool_name,
        tool_use_id = %pending.tool_use_id,
        error = %err,
        "tool input could not be bound"
    );
    Ok(ToolOutcome::InvalidInput(Value::String(
        INVALID_INPUT_RESULT.to_string(),
    )))
}
