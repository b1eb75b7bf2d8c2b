//! Core types for toolloop.

pub mod attachment;
pub mod message;
pub mod usage;

pub use attachment::*;
pub use message::*;
pub use usage::*;
