//! Type checks for bound tool arguments.

use serde_json::Value;

use super::types::{ParameterKind, ParameterSpec};

/// Check a present, non-null value against a declared parameter.
///
/// Returns `Err(message)` describing the first violation found. Nested
/// objects are checked recursively, including their required fields.
pub fn check_value(spec: &ParameterSpec, value: &Value) -> Result<(), String> {
    check_kind(&spec.name, &spec.kind, value)?;
    if let (Some(allowed), Some(text)) = (&spec.enum_values, value.as_str()) {
        if !allowed.iter().any(|v| v == text) {
            return Err(format!(
                "field '{}' must be one of [{}], got '{}'",
                spec.name,
                allowed.join(", "),
                text
            ));
        }
    }
    Ok(())
}

fn check_kind(path: &str, kind: &ParameterKind, value: &Value) -> Result<(), String> {
    match kind {
        ParameterKind::Any | ParameterKind::Context => Ok(()),
        ParameterKind::Array(items) => {
            let array = value
                .as_array()
                .ok_or_else(|| type_mismatch(path, "array", value))?;
            for (idx, item) in array.iter().enumerate() {
                check_kind(&format!("{path}[{idx}]"), items, item)?;
            }
            Ok(())
        }
        ParameterKind::Object(nested) => {
            let obj = value
                .as_object()
                .ok_or_else(|| type_mismatch(path, "object", value))?;
            for param in nested.params().iter().filter(|p| !p.is_context()) {
                let child = format!("{path}.{}", param.name);
                match obj.get(&param.name) {
                    Some(Value::Null) | None if param.required && !param.nullable => {
                        return Err(format!("missing required field '{child}'"));
                    }
                    Some(Value::Null) | None => {}
                    Some(v) => check_kind(&child, &param.kind, v)?,
                }
            }
            Ok(())
        }
        scalar => {
            let expected = scalar.type_tag().unwrap_or("any");
            if value_matches_type(value, expected) {
                Ok(())
            } else {
                Err(type_mismatch(path, expected, value))
            }
        }
    }
}

fn type_mismatch(path: &str, expected: &str, value: &Value) -> String {
    format!(
        "field '{}' expected type '{}', got {}",
        path,
        expected,
        json_type_name(value)
    )
}

fn value_matches_type(value: &Value, expected: &str) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        _ => true,
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
