//! Host boundary consumed by the coordinator.
//!
//! The engine does not implement persistence or query execution; it
//! consumes a narrow surface from its host: single-instance lookups for
//! pre-event resolution and a relation-scoped append for history rows.

use serde_json::Value;

use revtrail_core::Record;

/// Error type for host-side persistence operations.
///
/// Host failures are opaque to the engine: they are wrapped into
/// [`TrackError::Persistence`](crate::TrackError::Persistence) and
/// propagated to whatever invoked the write/delete, with no retry.
pub type HostError = Box<dyn std::error::Error + Send + Sync>;

/// Persistence surface the coordinator consumes from its host.
///
/// One implementation per tracked entity type. Lookups returning
/// `Ok(None)` are resolution failures, which the coordinator treats as
/// silent no-ops, not errors.
pub trait EntityHost {
    /// Finds at most one record matching an equality condition.
    ///
    /// Used for pre-write resolution when the configuration permits
    /// lookup by the operation's match condition.
    fn find_one(&self, condition: &Value) -> Result<Option<Record>, HostError>;

    /// Finds a record by its identifier value.
    ///
    /// Used for pre-delete resolution when the delete condition carries
    /// the identifier field.
    fn find_by_id(&self, id: &Value) -> Result<Option<Record>, HostError>;

    /// Appends a row to the history collection, returning the stored row.
    ///
    /// The coordinator has already set the foreign key on the row; the
    /// host only persists it. History rows are never mutated or deleted
    /// by this mechanism.
    fn append_history(&mut self, row: Record) -> Result<Record, HostError>;
}
