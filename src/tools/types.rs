//! Parameter schema descriptors for tools.
//!
//! A [`ToolParameters`] value is resolved once when a tool is built. It drives
//! both the JSON-Schema-like document shown to the model and the binder that
//! maps the model's structured input onto the handler's declared parameters.

use serde_json::{json, Map, Value};

use crate::error::{LoopError, Result};

/// Declared type of a single parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterKind {
    String,
    Integer,
    Number,
    Boolean,
    /// Any JSON value.
    Any,
    Array(Box<ParameterKind>),
    Object(ToolParameters),
    /// Bound to the per-run [`ToolContext`](super::ToolContext), never read
    /// from input and never shown to the model.
    Context,
}

impl ParameterKind {
    /// JSON Schema type tag, or `None` for kinds without one.
    pub fn type_tag(&self) -> Option<&'static str> {
        match self {
            Self::String => Some("string"),
            Self::Integer => Some("integer"),
            Self::Number => Some("number"),
            Self::Boolean => Some("boolean"),
            Self::Array(_) => Some("array"),
            Self::Object(_) => Some("object"),
            Self::Any | Self::Context => None,
        }
    }
}

/// One declared parameter of a tool handler.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    pub name: String,
    pub kind: ParameterKind,
    pub description: String,
    pub required: bool,
    pub nullable: bool,
    pub default: Option<Value>,
    pub enum_values: Option<Vec<String>>,
}

impl ParameterSpec {
    pub fn new(
        name: impl Into<String>,
        kind: ParameterKind,
        description: impl Into<String>,
        required: bool,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            description: description.into(),
            required,
            nullable: false,
            default: None,
            enum_values: None,
        }
    }

    pub fn is_context(&self) -> bool {
        self.kind == ParameterKind::Context
    }

    fn to_property_schema(&self) -> Value {
        let mut prop = kind_schema(&self.kind);
        if let Value::Object(obj) = &mut prop {
            if self.nullable {
                if let Some(tag) = self.kind.type_tag() {
                    obj.insert("type".to_string(), json!([tag, "null"]));
                }
            }
            if !self.description.is_empty() {
                obj.insert("description".to_string(), json!(self.description));
            }
            if let Some(values) = &self.enum_values {
                obj.insert("enum".to_string(), json!(values));
            }
            if let Some(default) = &self.default {
                obj.insert("default".to_string(), default.clone());
            }
        }
        prop
    }
}

fn kind_schema(kind: &ParameterKind) -> Value {
    match kind {
        ParameterKind::Array(items) => json!({ "type": "array", "items": kind_schema(items) }),
        ParameterKind::Object(nested) => nested.to_json_schema(),
        ParameterKind::Any | ParameterKind::Context => json!({}),
        other => json!({ "type": other.type_tag() }),
    }
}

/// Ordered parameter list of a tool handler.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ToolParameters {
    params: Vec<ParameterSpec>,
}

impl ToolParameters {
    /// Create an empty parameter list (no parameters).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builder: create an object schema with properties.
    pub fn object() -> ParameterBuilder {
        ParameterBuilder {
            params: Vec::new(),
        }
    }

    pub fn params(&self) -> &[ParameterSpec] {
        &self.params
    }

    pub fn get(&self, name: &str) -> Option<&ParameterSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Render the model-facing schema. Context parameters are omitted.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for param in self.params.iter().filter(|p| !p.is_context()) {
            properties.insert(param.name.clone(), param.to_property_schema());
            if param.required {
                required.push(Value::String(param.name.clone()));
            }
        }
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Derive a descriptor from an explicit schema document.
    ///
    /// Fails on constructs the descriptor cannot represent, so a bad schema is
    /// rejected when the tool is built rather than when the model calls it.
    /// Parameter order follows the document's property order.
    pub fn from_json_schema(schema: &Value) -> Result<Self> {
        let obj = schema
            .as_object()
            .ok_or_else(|| LoopError::InvalidTool("schema must be a JSON object".to_string()))?;
        match obj.get("type") {
            None => {}
            Some(Value::String(tag)) if tag == "object" => {}
            Some(Value::Array(tags)) if tags.iter().any(|t| t == "object") => {}
            Some(other) => {
                return Err(LoopError::InvalidTool(format!(
                    "top-level schema type must be \"object\", got {other}"
                )))
            }
        }

        let required: Vec<&str> = obj
            .get("required")
            .and_then(|v| v.as_array())
            .map(|items| items.iter().filter_map(|v| v.as_str()).collect())
            .unwrap_or_default();

        let mut params = Vec::new();
        if let Some(properties) = obj.get("properties") {
            let properties = properties.as_object().ok_or_else(|| {
                LoopError::InvalidTool("\"properties\" must be an object".to_string())
            })?;
            for (name, prop) in properties {
                params.push(parse_property(name, prop, required.contains(&name.as_str()))?);
            }
        }
        for name in &required {
            if !params.iter().any(|p| p.name == *name) {
                return Err(LoopError::InvalidTool(format!(
                    "required property '{name}' is not declared"
                )));
            }
        }
        Ok(Self { params })
    }
}

fn parse_property(name: &str, prop: &Value, required: bool) -> Result<ParameterSpec> {
    let (kind, nullable) = parse_kind(name, prop)?;
    let mut spec = ParameterSpec::new(
        name,
        kind,
        prop.get("description").and_then(|v| v.as_str()).unwrap_or(""),
        required,
    );
    spec.nullable = nullable;
    spec.default = prop.get("default").cloned();
    spec.enum_values = prop.get("enum").and_then(|v| v.as_array()).map(|values| {
        values
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect()
    });
    Ok(spec)
}

fn parse_kind(name: &str, prop: &Value) -> Result<(ParameterKind, bool)> {
    let (tag, nullable) = match prop.get("type") {
        None => return Ok((ParameterKind::Any, false)),
        Some(Value::String(tag)) => (tag.as_str(), false),
        Some(Value::Array(tags)) => {
            let mut non_null = tags.iter().filter_map(|t| t.as_str()).filter(|t| *t != "null");
            let tag = non_null.next();
            let nullable = tags.iter().any(|t| t.as_str() == Some("null"));
            match (tag, non_null.next()) {
                (Some(tag), None) => (tag, nullable),
                _ => {
                    return Err(LoopError::InvalidTool(format!(
                        "property '{name}': only [\"T\", \"null\"] type unions are supported"
                    )))
                }
            }
        }
        Some(other) => {
            return Err(LoopError::InvalidTool(format!(
                "property '{name}': unsupported type {other}"
            )))
        }
    };
    let kind = match tag {
        "string" => ParameterKind::String,
        "integer" => ParameterKind::Integer,
        "number" => ParameterKind::Number,
        "boolean" => ParameterKind::Boolean,
        "array" => match prop.get("items") {
            Some(items) => ParameterKind::Array(Box::new(parse_kind(name, items)?.0)),
            None => ParameterKind::Array(Box::new(ParameterKind::Any)),
        },
        "object" => ParameterKind::Object(ToolParameters::from_json_schema(prop)?),
        other => {
            return Err(LoopError::InvalidTool(format!(
                "property '{name}': unsupported type \"{other}\""
            )))
        }
    };
    Ok((kind, nullable))
}

/// Builder for constructing tool parameter descriptors.
pub struct ParameterBuilder {
    params: Vec<ParameterSpec>,
}

impl ParameterBuilder {
    fn push(mut self, spec: ParameterSpec) -> Self {
        self.params.push(spec);
        self
    }

    /// Add a string property.
    pub fn string(self, name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        self.push(ParameterSpec::new(name, ParameterKind::String, description, required))
    }

    /// Add an integer property.
    pub fn integer(self, name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        self.push(ParameterSpec::new(name, ParameterKind::Integer, description, required))
    }

    /// Add a number property.
    pub fn number(self, name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        self.push(ParameterSpec::new(name, ParameterKind::Number, description, required))
    }

    /// Add a boolean property.
    pub fn boolean(self, name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        self.push(ParameterSpec::new(name, ParameterKind::Boolean, description, required))
    }

    /// Add an enum (string) property.
    pub fn string_enum(
        self,
        name: impl Into<String>,
        description: impl Into<String>,
        values: &[&str],
        required: bool,
    ) -> Self {
        let mut spec = ParameterSpec::new(name, ParameterKind::String, description, required);
        spec.enum_values = Some(values.iter().map(|v| v.to_string()).collect());
        self.push(spec)
    }

    /// Add an array property with the given item kind.
    pub fn array(
        self,
        name: impl Into<String>,
        description: impl Into<String>,
        items: ParameterKind,
        required: bool,
    ) -> Self {
        self.push(ParameterSpec::new(
            name,
            ParameterKind::Array(Box::new(items)),
            description,
            required,
        ))
    }

    /// Add a nested object property.
    pub fn object(
        self,
        name: impl Into<String>,
        description: impl Into<String>,
        nested: ToolParameters,
        required: bool,
    ) -> Self {
        self.push(ParameterSpec::new(
            name,
            ParameterKind::Object(nested),
            description,
            required,
        ))
    }

    /// Declare a slot bound to the run's tool context.
    pub fn context(self, name: impl Into<String>) -> Self {
        self.push(ParameterSpec::new(name, ParameterKind::Context, "", false))
    }

    /// Mark the last added property as nullable.
    pub fn nullable(mut self) -> Self {
        if let Some(last) = self.params.last_mut() {
            last.nullable = true;
        }
        self
    }

    /// Set the default of the last added property, used when it is omitted.
    pub fn default_value(mut self, value: Value) -> Self {
        if let Some(last) = self.params.last_mut() {
            last.default = Some(value);
        }
        self
    }

    /// Build into ToolParameters.
    pub fn build(self) -> ToolParameters {
        ToolParameters {
            params: self.params,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_parameters_are_hidden_from_schema() {
        let params = ToolParameters::object()
            .string("path", "File path", true)
            .context("ctx")
            .build();
        let schema = params.to_json_schema();
        assert!(schema["properties"].get("ctx").is_none());
        assert_eq!(schema["required"], json!(["path"]));
    }

    #[test]
    fn nullable_renders_type_union() {
        let params = ToolParameters::object()
            .integer("limit", "Max results", false)
            .nullable()
            .build();
        assert_eq!(
            params.to_json_schema()["properties"]["limit"]["type"],
            json!(["integer", "null"])
        );
    }

    #[test]
    fn nested_objects_render_recursively() {
        let inner = ToolParameters::object().string("city", "City", true).build();
        let params = ToolParameters::object()
            .object("address", "Postal address", inner, true)
            .build();
        let schema = params.to_json_schema();
        assert_eq!(schema["properties"]["address"]["type"], "object");
        assert_eq!(
            schema["properties"]["address"]["properties"]["city"]["type"],
            "string"
        );
    }

    #[test]
    fn from_json_schema_reads_required_and_nullable() {
        let params = ToolParameters::from_json_schema(&json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "Search query" },
                "limit": { "type": ["integer", "null"] },
                "tags": { "type": "array", "items": { "type": "string" } }
            },
            "required": ["query"]
        }))
        .unwrap();
        let query = params.get("query").unwrap();
        assert!(query.required);
        assert_eq!(query.description, "Search query");
        let limit = params.get("limit").unwrap();
        assert!(limit.nullable);
        assert!(!limit.required);
        assert_eq!(
            params.get("tags").unwrap().kind,
            ParameterKind::Array(Box::new(ParameterKind::String))
        );
    }

    #[test]
    fn from_json_schema_rejects_unsupported_types() {
        let err = ToolParameters::from_json_schema(&json!({
            "type": "object",
            "properties": { "when": { "type": "date" } }
        }))
        .unwrap_err();
        assert!(matches!(err, LoopError::InvalidTool(_)));

        let err = ToolParameters::from_json_schema(&json!({
            "type": "object",
            "properties": { "x": { "type": ["string", "integer"] } }
        }))
        .unwrap_err();
        assert!(matches!(err, LoopError::InvalidTool(_)));
    }

    #[test]
    fn from_json_schema_rejects_undeclared_required() {
        let err = ToolParameters::from_json_schema(&json!({
            "type": "object",
            "properties": {},
            "required": ["ghost"]
        }))
        .unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }
}
