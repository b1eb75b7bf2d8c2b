//! Named tool registry for a run.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use regex::Regex;

use super::tool::Tool;
use crate::error::{LoopError, Result};
use crate::provider::ToolDefinition;

static TOOL_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_-]{1,64}$").expect("tool name validation regex must compile")
});

/// Immutable set of tools offered to the model.
///
/// Clones share the underlying tools, so one set can back many concurrent
/// runs.
#[derive(Debug, Clone, Default)]
pub struct ToolSet {
    tools: Vec<Arc<Tool>>,
    index: HashMap<String, usize>,
}

impl ToolSet {
    /// Build a registry, rejecting duplicate or malformed names.
    pub fn new(tools: impl IntoIterator<Item = Tool>) -> Result<Self> {
        let mut set = Self::default();
        for tool in tools {
            if !TOOL_NAME_RE.is_match(tool.name()) {
                return Err(LoopError::InvalidTool(format!(
                    "tool name '{}' must be 1-64 characters of [A-Za-z0-9_-]",
                    tool.name()
                )));
            }
            if set.index.contains_key(tool.name()) {
                return Err(LoopError::InvalidTool(format!(
                    "duplicate tool name '{}'",
                    tool.name()
                )));
            }
            set.index.insert(tool.name().to_string(), set.tools.len());
            set.tools.push(Arc::new(tool));
        }
        Ok(set)
    }

    /// Case-sensitive lookup.
    pub fn get(&self, name: &str) -> Option<&Arc<Tool>> {
        self.index.get(name).map(|&idx| &self.tools[idx])
    }

    /// Model-facing definitions in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|tool| tool.definition()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Tool>> {
        self.tools.iter()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
