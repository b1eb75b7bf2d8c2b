//! Agent loop primitives (runs, events, approvals, compaction).

pub mod approvals;
pub mod compaction;
pub mod events;
pub mod runner;
pub mod types;

pub use approvals::{ApprovalDecision, ApprovalRequest};
pub use compaction::keep_only;
pub use events::{AgentEvent, AgentEventSink};
pub use runner::{run_prompt, Agent};
pub use types::{AgentResult, AgentTask, LoopState, PendingToolUse, PendingToolUses, RunId};
