//! Provider-agnostic tool-use orchestration for LLM agents.
//!
//! Hand a task and a set of tools to an [`Agent`](agent_loop::Agent); it
//! alternates model turns and tool batches until the model answers, a tool
//! cancels or suspends the run, or an approval gate is reached. Suspended
//! results serialize to JSON and resume in any process.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use toolloop::prelude::*;
//!
//! # async fn example(provider: Arc<dyn ModelProvider>) -> toolloop::error::Result<()> {
//! let weather = Tool::new(
//!     "get_weather",
//!     "Current weather for a city",
//!     ToolParameters::object().string("city", "City name", true).build(),
//!     |args| async move { Ok(format!("sunny in {}", args.get_str("city")?)) },
//! );
//! let tools = ToolSet::new(vec![weather])?;
//! let agent = Agent::new(provider).with_config(LoopConfig::load()?);
//!
//! let result = agent
//!     .run(AgentTask::new("Weather in Oslo?"), &tools, &CancellationToken::new())
//!     .await?;
//! println!("{}", result.final_text().unwrap_or_default());
//! # Ok(())
//! # }
//! ```

pub mod agent_loop;
pub mod config;
pub mod error;
pub mod prelude;
pub mod provider;
pub mod tools;
pub mod types;
