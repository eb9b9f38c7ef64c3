//! Completion notification for history-row creation.

use revtrail_core::Record;

/// Emitted by the post-write and post-delete steps when a history row
/// was created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRecorded {
    /// The history row as stored by the host.
    pub history_row: Record,
    /// The entity instance the row was recorded for.
    pub instance: Record,
}
