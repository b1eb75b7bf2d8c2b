//! Loop configuration (layered: code > env > config file > defaults).

use std::path::{Path, PathBuf};

use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::error::{LoopError, Result};
use crate::tools::InvokeOptions;

const ENV_IGNORE_UNKNOWN_TOOLS: &str = "TOOLLOOP_IGNORE_UNKNOWN_TOOLS";
const ENV_IGNORE_INVALID_SCHEMA: &str = "TOOLLOOP_IGNORE_INVALID_SCHEMA";
const ENV_REMEMBER_TOOL_RESULT: &str = "TOOLLOOP_REMEMBER_TOOL_RESULT_WHEN_CANCELLED";
const ENV_MAX_MESSAGES: &str = "TOOLLOOP_MAX_MESSAGES";
const ENV_MAX_TURNS: &str = "TOOLLOOP_MAX_TURNS";

/// Default bound on provider calls per run.
pub const DEFAULT_MAX_TURNS: usize = 25;

/// Behavior switches for one agent.
///
/// Resolution order for [`LoopConfig::load`]:
/// 1. Defaults
/// 2. `~/.toolloop/config.toml` if present
/// 3. `TOOLLOOP_*` environment variables (`.env` is loaded first)
///
/// Values set in code through the builder are not overridden.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    /// Answer unknown tool names with a sentinel result instead of failing.
    #[builder(default)]
    pub ignore_unknown_tools: bool,
    /// Answer unbindable input with a sentinel result instead of failing.
    #[builder(default)]
    pub ignore_invalid_schema: bool,
    /// Keep a cancelling tool's own result in history.
    #[builder(default = true)]
    pub remember_tool_result_when_cancelled: bool,
    /// Compact the request history to this many messages before each call.
    pub max_messages: Option<usize>,
    #[builder(default = DEFAULT_MAX_TURNS)]
    pub max_turns: usize,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            ignore_unknown_tools: false,
            ignore_invalid_schema: false,
            remember_tool_result_when_cancelled: true,
            max_messages: None,
            max_turns: DEFAULT_MAX_TURNS,
        }
    }
}

impl LoopConfig {
    /// Load defaults, then the user config file, then the environment.
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        let config = match Self::default_path() {
            Some(path) if path.is_file() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        config.apply_env()
    }

    /// Defaults overlaid with environment variables only.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::default().apply_env()
    }

    /// Parse a TOML document; absent keys keep their defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// `~/.toolloop/config.toml`, or `None` without a home directory.
    pub fn default_path() -> Option<PathBuf> {
        directories::UserDirs::new().map(|dirs| dirs.home_dir().join(".toolloop").join("config.toml"))
    }

    /// Overlay `TOOLLOOP_*` variables onto this configuration.
    pub fn apply_env(mut self) -> Result<Self> {
        if let Some(value) = env_bool(ENV_IGNORE_UNKNOWN_TOOLS)? {
            self.ignore_unknown_tools = value;
        }
        if let Some(value) = env_bool(ENV_IGNORE_INVALID_SCHEMA)? {
            self.ignore_invalid_schema = value;
        }
        if let Some(value) = env_bool(ENV_REMEMBER_TOOL_RESULT)? {
            self.remember_tool_result_when_cancelled = value;
        }
        if let Some(value) = env_usize(ENV_MAX_MESSAGES)? {
            self.max_messages = Some(value);
        }
        if let Some(value) = env_usize(ENV_MAX_TURNS)? {
            self.max_turns = value;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_turns == 0 {
            return Err(LoopError::Configuration(
                "max_turns must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Switches consumed by the invocation engine.
    pub fn invoke_options(&self) -> InvokeOptions {
        InvokeOptions {
            ignore_unknown_tools: self.ignore_unknown_tools,
            ignore_invalid_schema: self.ignore_invalid_schema,
        }
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_bool(name: &str) -> Result<Option<bool>> {
    let Some(raw) = env_value(name) else {
        return Ok(None);
    };
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => Err(LoopError::Configuration(format!(
            "{name} must be a boolean, got '{raw}'"
        ))),
    }
}

fn env_usize(name: &str) -> Result<Option<usize>> {
    let Some(raw) = env_value(name) else {
        return Ok(None);
    };
    raw.parse().map(Some).map_err(|_| {
        LoopError::Configuration(format!(
            "{name} must be a non-negative integer, got '{raw}'"
        ))
    })
}
