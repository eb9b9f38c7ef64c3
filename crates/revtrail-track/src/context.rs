//! Per-operation contexts threaded between pre and post events.
//!
//! A context is owned exclusively by one operation invocation: built by
//! the pre step, consumed by the matching post step, discarded when the
//! operation completes. It is never shared across concurrent operations
//! and never stored in a process-wide slot.

use revtrail_core::Record;

/// Outcome of the pre-write evaluation, consumed by the post-write step.
#[derive(Debug)]
pub struct WriteContext {
    pub(crate) dirty: bool,
    pub(crate) is_new: bool,
}

impl WriteContext {
    pub(crate) fn clean(is_new: bool) -> Self {
        Self {
            dirty: false,
            is_new,
        }
    }

    pub(crate) fn dirty(is_new: bool) -> Self {
        Self {
            dirty: true,
            is_new,
        }
    }

    /// Whether the tracked content changed and a new version was assigned.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

/// Payload stashed by the pre-delete step for the post-delete step.
#[derive(Debug)]
pub struct DeleteContext {
    pub(crate) payload: Option<Record>,
    pub(crate) instance: Option<Record>,
    pub(crate) prior_version: Option<String>,
}

impl DeleteContext {
    /// Context for an unresolvable delete; the post step is a no-op.
    pub(crate) fn inert() -> Self {
        Self {
            payload: None,
            instance: None,
            prior_version: None,
        }
    }

    /// Whether the delete resolved to an instance and stashed a payload.
    pub fn is_resolved(&self) -> bool {
        self.payload.is_some()
    }
}
