//! Condition matching over record snapshots.

use revtrail_core::Record;
use serde_json::Value;

/// Returns true when the record matches an equality condition.
///
/// A condition is a JSON object of field name to expected value; every
/// entry must equal the record's value for that field. A field absent
/// from the record never matches. Non-object conditions match nothing.
pub fn matches(record: &Record, condition: &Value) -> bool {
    match condition.as_object() {
        Some(fields) => fields
            .iter()
            .all(|(name, expected)| record.get(name) == Some(expected)),
        None => false,
    }
}
