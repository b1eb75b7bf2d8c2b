//! Closure-based tool definition.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use super::arguments::BoundArguments;
use super::types::ToolParameters;
use crate::error::Result;
use crate::provider::ToolDefinition;

/// Type alias for the tool handler function.
type ToolHandler =
    dyn Fn(BoundArguments) -> Pin<Box<dyn Future<Output = Result<Value>> + Send>> + Send + Sync;

/// A named, schema-described handler the model may call.
///
/// The parameter descriptor is resolved once at construction. Handler output
/// is serialized to JSON; a handler returning `()` produces `null`.
#[derive(Clone)]
pub struct Tool {
    name: String,
    description: String,
    parameters: ToolParameters,
    schema_override: Option<Value>,
    require_approval: bool,
    log_inputs_and_outputs: bool,
    handler: Arc<ToolHandler>,
}

impl Tool {
    /// Create a tool from a closure.
    pub fn new<F, Fut, T>(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: ToolParameters,
        handler: F,
    ) -> Self
    where
        F: Fn(BoundArguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
        T: Serialize + 'static,
    {
        let handler = Arc::new(handler);
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            schema_override: None,
            require_approval: false,
            log_inputs_and_outputs: false,
            handler: Arc::new(move |args| {
                let fut = handler(args);
                Box::pin(async move {
                    let output = fut.await?;
                    Ok(serde_json::to_value(output)?)
                })
            }),
        }
    }

    /// Create a tool whose parameters come from an explicit schema document.
    ///
    /// The document is shown to the model verbatim and the binder uses the
    /// descriptor derived from it.
    pub fn from_schema<F, Fut, T>(
        name: impl Into<String>,
        description: impl Into<String>,
        schema: Value,
        handler: F,
    ) -> Result<Self>
    where
        F: Fn(BoundArguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
        T: Serialize + 'static,
    {
        let parameters = ToolParameters::from_json_schema(&schema)?;
        Ok(Self::new(name, description, parameters, handler).with_schema(schema))
    }

    /// Replace the model-facing schema document. Binding still uses the
    /// declared parameters.
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.schema_override = Some(schema);
        self
    }

    /// Stop the loop before this tool runs until the caller approves it.
    pub fn requiring_approval(mut self) -> Self {
        self.require_approval = true;
        self
    }

    /// Log full inputs and outputs of every invocation.
    pub fn with_logging(mut self) -> Self {
        self.log_inputs_and_outputs = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn parameters(&self) -> &ToolParameters {
        &self.parameters
    }

    pub fn require_approval(&self) -> bool {
        self.require_approval
    }

    pub fn log_inputs_and_outputs(&self) -> bool {
        self.log_inputs_and_outputs
    }

    /// Model-facing schema document.
    pub fn schema(&self) -> Value {
        self.schema_override
            .clone()
            .unwrap_or_else(|| self.parameters.to_json_schema())
    }

    /// Definition sent to the provider.
    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: self.schema(),
        }
    }

    /// Run the handler on already-bound arguments.
    pub async fn invoke(&self, args: BoundArguments) -> Result<Value> {
        (self.handler)(args).await
    }
}

impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("require_approval", &self.require_approval)
            .finish()
    }
}
