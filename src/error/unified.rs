//! Error classification and recovery hints.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorCategory {
    UnknownTool,
    SchemaBinding,
    ToolExecution,
    Provider,
    Canceled,
    Limit,
    Configuration,
    Serialization,
    Io,
    Unknown,
}

/// Suggested recovery action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverySuggestion {
    /// Register the tool or enable `ignore_unknown_tools`.
    RegisterTool,
    /// Fix the tool's parameter schema or enable `ignore_invalid_schema`.
    CheckToolSchema,
    CheckToolImplementation,
    /// Resume from the snapshot carried by the error.
    ResumeFromSnapshot,
    RaiseTurnLimit,
    CheckConfiguration,
    /// Provider failures are never retried by the loop; the caller decides.
    RetryAtCaller,
    ContactSupport,
}
