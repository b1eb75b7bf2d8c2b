//! Per-run context shared with tool handlers.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct ContextState {
    text: Mutex<String>,
    cancelled: AtomicBool,
    suspended: AtomicBool,
    remember_tool_result_when_cancelled: AtomicBool,
}

/// Mutable state threaded into every handler invocation of one run.
///
/// Handlers receive it by declaring a [`ParameterKind::Context`] parameter.
/// Clones share state; a context belongs to a single run and is never
/// handed to another conversation.
///
/// [`ParameterKind::Context`]: super::ParameterKind::Context
#[derive(Clone)]
pub struct ToolContext {
    inner: Arc<ContextState>,
}

impl Default for ToolContext {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ToolContext {
    pub fn new(remember_tool_result_when_cancelled: bool) -> Self {
        let ctx = Self {
            inner: Arc::new(ContextState::default()),
        };
        ctx.set_remember_tool_result_when_cancelled(remember_tool_result_when_cancelled);
        ctx
    }

    /// Latest assistant text of the run.
    pub fn text(&self) -> String {
        match self.inner.text.lock() {
            Ok(text) => text.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub(crate) fn set_text(&self, text: &str) {
        let mut guard = match self.inner.text.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.clear();
        guard.push_str(text);
    }

    /// Stop the loop once the current result has been folded in.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Return to the caller with the current tool use left pending and unresulted.
    pub fn suspend(&self) {
        self.inner.suspended.store(true, Ordering::SeqCst);
    }

    pub fn is_suspended(&self) -> bool {
        self.inner.suspended.load(Ordering::SeqCst)
    }

    pub(crate) fn take_suspended(&self) -> bool {
        self.inner.suspended.swap(false, Ordering::SeqCst)
    }

    /// Whether a cancelling tool's own result stays in history.
    pub fn remember_tool_result_when_cancelled(&self) -> bool {
        self.inner
            .remember_tool_result_when_cancelled
            .load(Ordering::SeqCst)
    }

    pub fn set_remember_tool_result_when_cancelled(&self, remember: bool) {
        self.inner
            .remember_tool_result_when_cancelled
            .store(remember, Ordering::SeqCst);
    }

    /// Clear cancel/suspend flags before the context re-enters a run.
    pub(crate) fn reset_flags(&self) {
        self.inner.cancelled.store(false, Ordering::SeqCst);
        self.inner.suspended.store(false, Ordering::SeqCst);
    }
}

impl fmt::Debug for ToolContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolContext")
            .field("text", &self.text())
            .field("cancelled", &self.is_cancelled())
            .field("suspended", &self.is_suspended())
            .field(
                "remember_tool_result_when_cancelled",
                &self.remember_tool_result_when_cancelled(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_flags() {
        let ctx = ToolContext::new(false);
        let handle = ctx.clone();
        handle.cancel();
        handle.suspend();
        assert!(ctx.is_cancelled());
        assert!(ctx.take_suspended());
        assert!(!ctx.is_suspended());
        assert!(!ctx.remember_tool_result_when_cancelled());
    }

    #[test]
    fn reset_clears_cancel_and_suspend() {
        let ctx = ToolContext::default();
        ctx.cancel();
        ctx.suspend();
        ctx.reset_flags();
        assert!(!ctx.is_cancelled());
        assert!(!ctx.is_suspended());
        assert!(ctx.remember_tool_result_when_cancelled());
    }
}
