//! Error types for toolloop.

pub mod unified;

pub use unified::{ErrorCategory, RecoverySuggestion};

use thiserror::Error;

use crate::agent_loop::AgentResult;

/// Primary error type for all toolloop operations.
#[derive(Error, Debug)]
pub enum LoopError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("Schema binding failed for tool {tool_name}: {message}")]
    SchemaBinding { tool_name: String, message: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Tool execution error: {tool_name} — {message}")]
    ToolExecution { tool_name: String, message: String },

    #[error("Provider error: {provider} — {message}")]
    Provider { provider: String, message: String },

    #[error("Run canceled")]
    Canceled { partial: Box<AgentResult> },

    /// A tool failed mid-batch. `partial` keeps the uses that already ran.
    #[error("Run interrupted: {source}")]
    Interrupted {
        source: Box<LoopError>,
        partial: Box<AgentResult>,
    },

    #[error("Tool loop exceeded max turns (max_turns={max_turns})")]
    TurnLimitExceeded { max_turns: usize },

    #[error("Invalid tool definition: {0}")]
    InvalidTool(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config file error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl LoopError {
    /// Create a provider error.
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a tool execution error.
    pub fn tool(tool_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolExecution {
            tool_name: tool_name.into(),
            message: message.into(),
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Interrupted { source, .. } => source.category(),
            Self::UnknownTool { .. } => ErrorCategory::UnknownTool,
            Self::SchemaBinding { .. } | Self::InvalidArgument(_) => ErrorCategory::SchemaBinding,
            Self::ToolExecution { .. } => ErrorCategory::ToolExecution,
            Self::Provider { .. } => ErrorCategory::Provider,
            Self::Canceled { .. } => ErrorCategory::Canceled,
            Self::TurnLimitExceeded { .. } => ErrorCategory::Limit,
            Self::Configuration(_) | Self::Toml(_) | Self::InvalidTool(_) => {
                ErrorCategory::Configuration
            }
            Self::Serialization(_) => ErrorCategory::Serialization,
            Self::Io(_) => ErrorCategory::Io,
            Self::InvalidState(_) => ErrorCategory::Unknown,
        }
    }

    /// Whether `ignore_invalid_schema` may turn this error into a sentinel result.
    pub fn is_schema_problem(&self) -> bool {
        self.category() == ErrorCategory::SchemaBinding
    }

    /// Resumable snapshot captured when the run was canceled.
    pub fn partial_result(&self) -> Option<&AgentResult> {
        match self {
            Self::Canceled { partial } | Self::Interrupted { partial, .. } => Some(partial),
            _ => None,
        }
    }

    /// The underlying error, looking through [`LoopError::Interrupted`].
    pub fn root(&self) -> &LoopError {
        match self {
            Self::Interrupted { source, .. } => source.root(),
            other => other,
        }
    }

    /// Suggest recovery actions.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self.category() {
            ErrorCategory::UnknownTool => RecoverySuggestion::RegisterTool,
            ErrorCategory::SchemaBinding => RecoverySuggestion::CheckToolSchema,
            ErrorCategory::ToolExecution => RecoverySuggestion::CheckToolImplementation,
            ErrorCategory::Provider => RecoverySuggestion::RetryAtCaller,
            ErrorCategory::Canceled => RecoverySuggestion::ResumeFromSnapshot,
            ErrorCategory::Limit => RecoverySuggestion::RaiseTurnLimit,
            ErrorCategory::Configuration => RecoverySuggestion::CheckConfiguration,
            _ => RecoverySuggestion::ContactSupport,
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, LoopError>;
