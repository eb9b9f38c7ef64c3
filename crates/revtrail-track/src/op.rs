//! Write and delete operation descriptions.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use revtrail_core::Record;

/// Lifecycle action recorded on a history row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// First save of a brand-new record.
    Create,
    /// Save of an existing record.
    Update,
    /// Removal of a record.
    Delete,
}

impl Action {
    /// Returns the persisted label for this action.
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

/// One write operation (create or update) as seen by the pre-write hook.
///
/// `data` is the outgoing payload: the coordinator writes the new
/// fingerprint and version into it when the operation is dirty, and the
/// host persists it afterwards.
#[derive(Debug, Clone)]
pub struct WriteOp {
    /// Whether the write creates a brand-new record.
    pub is_new: bool,
    /// Explicitly supplied prior instance (full-save of a loaded record).
    pub instance: Option<Record>,
    /// Current persisted state supplied by the host (partial update).
    pub current: Option<Record>,
    /// Incoming write values; mutated in place by the pre-write step.
    pub data: Record,
    /// Match condition for conditional/bulk writes.
    pub condition: Option<Value>,
}

impl WriteOp {
    /// Describes the creation of a brand-new record.
    pub fn create(data: Record) -> Self {
        Self {
            is_new: true,
            instance: None,
            current: None,
            data,
            condition: None,
        }
    }

    /// Describes a partial update of one known record.
    pub fn update(current: Record, data: Record) -> Self {
        Self {
            is_new: false,
            instance: None,
            current: Some(current),
            data,
            condition: None,
        }
    }

    /// Describes a full save of an explicitly loaded instance.
    pub fn save(instance: Record, data: Record) -> Self {
        Self {
            is_new: false,
            instance: Some(instance),
            current: None,
            data,
            condition: None,
        }
    }

    /// Describes a conditional write not bound to one resolved instance.
    pub fn update_where(condition: Value, data: Record) -> Self {
        Self {
            is_new: false,
            instance: None,
            current: None,
            data,
            condition: Some(condition),
        }
    }
}

/// One delete operation as seen by the pre-delete hook.
#[derive(Debug, Clone)]
pub struct DeleteOp {
    /// Explicitly supplied instance being removed.
    pub instance: Option<Record>,
    /// Delete condition; resolvable only when it carries the identifier.
    pub condition: Option<Value>,
}

impl DeleteOp {
    /// Describes the removal of an explicitly loaded instance.
    pub fn of_instance(instance: Record) -> Self {
        Self {
            instance: Some(instance),
            condition: None,
        }
    }

    /// Describes a conditional delete.
    pub fn by_condition(condition: Value) -> Self {
        Self {
            instance: None,
            condition: Some(condition),
        }
    }
}
