//! Tool system: descriptors, binding, registry and invocation.

pub mod arguments;
pub mod context;
pub mod invoke;
pub mod registry;
pub mod tool;
pub mod types;
pub mod validation;

pub use arguments::{bind_arguments, BoundArguments, BoundValue};
pub use context::ToolContext;
pub use invoke::{use_tool, InvokeOptions, ToolOutcome, INVALID_INPUT_RESULT, UNKNOWN_TOOL_RESULT};
pub use registry::ToolSet;
pub use tool::Tool;
pub use types::{ParameterBuilder, ParameterKind, ParameterSpec, ToolParameters};
pub use validation::check_value;
