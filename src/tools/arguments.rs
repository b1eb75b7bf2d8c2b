//! Binding structured tool input onto declared handler parameters.

use serde_json::{Map, Value};

use super::context::ToolContext;
use super::types::{ParameterKind, ToolParameters};
use super::validation::{check_value, json_type_name};
use crate::error::{LoopError, Result};

/// A single bound parameter value.
#[derive(Debug, Clone)]
pub enum BoundValue {
    Value(Value),
    Context(ToolContext),
}

/// Handler arguments in declared parameter order.
#[derive(Debug, Clone)]
pub struct BoundArguments {
    tool_name: String,
    values: Vec<(String, BoundValue)>,
}

/// Bind `input` to `params`.
///
/// Parameters are resolved in declared order, by name. Context parameters are
/// bound to `ctx` and never read from input. A missing optional parameter
/// takes its default (or null); a missing required parameter or a value of
/// the wrong type is a [`LoopError::SchemaBinding`]. Undeclared input keys are
/// ignored.
pub fn bind_arguments(
    tool_name: &str,
    params: &ToolParameters,
    input: &Value,
    ctx: &ToolContext,
) -> Result<BoundArguments> {
    let input = normalize_input(tool_name, input)?;
    let mut values = Vec::with_capacity(params.params().len());

    for spec in params.params() {
        if spec.kind == ParameterKind::Context {
            values.push((spec.name.clone(), BoundValue::Context(ctx.clone())));
            continue;
        }
        let bound = match input.get(&spec.name) {
            Some(Value::Null) if spec.nullable => Value::Null,
            Some(Value::Null) | None => {
                if spec.required {
                    return Err(binding_error(
                        tool_name,
                        format!("missing required parameter '{}'", spec.name),
                    ));
                }
                spec.default.clone().unwrap_or(Value::Null)
            }
            Some(value) => {
                check_value(spec, value).map_err(|message| binding_error(tool_name, message))?;
                value.clone()
            }
        };
        values.push((spec.name.clone(), BoundValue::Value(bound)));
    }

    Ok(BoundArguments {
        tool_name: tool_name.to_string(),
        values,
    })
}

/// Accept an object, null (no arguments), or a string holding a JSON object.
fn normalize_input(tool_name: &str, input: &Value) -> Result<Map<String, Value>> {
    match input {
        Value::Object(obj) => Ok(obj.clone()),
        Value::Null => Ok(Map::new()),
        Value::String(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Ok(Map::new());
            }
            match serde_json::from_str::<Value>(trimmed) {
                Ok(Value::Object(obj)) => Ok(obj),
                Ok(other) => Err(binding_error(
                    tool_name,
                    format!("expected object arguments, got {}", json_type_name(&other)),
                )),
                Err(e) => Err(binding_error(
                    tool_name,
                    format!("failed to parse arguments: {e}"),
                )),
            }
        }
        other => Err(binding_error(
            tool_name,
            format!("expected object arguments, got {}", json_type_name(other)),
        )),
    }
}

fn binding_error(tool_name: &str, message: String) -> LoopError {
    LoopError::SchemaBinding {
        tool_name: tool_name.to_string(),
        message,
    }
}

impl BoundArguments {
    /// Name of the tool these arguments were bound for.
    pub fn tool_name(&self) -> &str {
        &self.tool_name
    }

    /// Bound value at a declared position.
    pub fn positional(&self, index: usize) -> Option<&BoundValue> {
        self.values.get(index).map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get the raw JSON value of a parameter.
    pub fn raw(&self, key: &str) -> Option<&Value> {
        self.values.iter().find_map(|(name, value)| match value {
            BoundValue::Value(v) if name == key => Some(v),
            _ => None,
        })
    }

    /// The run's tool context, if the handler declared a context parameter.
    pub fn context(&self) -> Result<&ToolContext> {
        self.values
            .iter()
            .find_map(|(_, value)| match value {
                BoundValue::Context(ctx) => Some(ctx),
                BoundValue::Value(_) => None,
            })
            .ok_or_else(|| {
                LoopError::InvalidState(format!(
                    "tool '{}' did not declare a context parameter",
                    self.tool_name
                ))
            })
    }

    /// Get a string argument by key.
    pub fn get_str(&self, key: &str) -> Result<&str> {
        self.raw(key)
            .and_then(|v| v.as_str())
            .ok_or_else(|| LoopError::InvalidArgument(format!("Missing string argument: {key}")))
    }

    /// Get an optional string argument.
    pub fn get_str_opt(&self, key: &str) -> Option<&str> {
        self.raw(key).and_then(|v| v.as_str())
    }

    /// Get an integer argument.
    pub fn get_i64(&self, key: &str) -> Result<i64> {
        self.raw(key)
            .and_then(|v| v.as_i64())
            .ok_or_else(|| LoopError::InvalidArgument(format!("Missing integer argument: {key}")))
    }

    /// Get a float argument.
    pub fn get_f64(&self, key: &str) -> Result<f64> {
        self.raw(key)
            .and_then(|v| v.as_f64())
            .ok_or_else(|| LoopError::InvalidArgument(format!("Missing float argument: {key}")))
    }

    /// Get a boolean argument.
    pub fn get_bool(&self, key: &str) -> Result<bool> {
        self.raw(key)
            .and_then(|v| v.as_bool())
            .ok_or_else(|| LoopError::InvalidArgument(format!("Missing boolean argument: {key}")))
    }

    /// Get a nested object.
    pub fn get_object(&self, key: &str) -> Result<&Map<String, Value>> {
        self.raw(key)
            .and_then(|v| v.as_object())
            .ok_or_else(|| LoopError::InvalidArgument(format!("Missing object argument: {key}")))
    }

    /// Get an array argument.
    pub fn get_array(&self, key: &str) -> Result<&Vec<Value>> {
        self.raw(key)
            .and_then(|v| v.as_array())
            .ok_or_else(|| LoopError::InvalidArgument(format!("Missing array argument: {key}")))
    }

    /// Deserialize one argument into a typed value.
    pub fn get<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<T> {
        let value = self.raw(key).cloned().unwrap_or(Value::Null);
        serde_json::from_value(value).map_err(|e| {
            LoopError::InvalidArgument(format!("Failed to deserialize argument {key}: {e}"))
        })
    }

    /// All non-context arguments as a JSON object.
    pub fn to_value(&self) -> Value {
        let map: Map<String, Value> = self
            .values
            .iter()
            .filter_map(|(name, value)| match value {
                BoundValue::Value(v) => Some((name.clone(), v.clone())),
                BoundValue::Context(_) => None,
            })
            .collect();
        Value::Object(map)
    }

    /// Deserialize the entire arguments into a typed struct.
    pub fn deserialize<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.to_value()).map_err(|e| {
            LoopError::InvalidArgument(format!("Failed to deserialize arguments: {e}"))
        })
    }
}
