//! Core primitives for revtrail change tracking.
//!
//! This crate provides:
//! - Configuration resolution from partial boot options (`TrackConfig`)
//! - Content fingerprinting over a tracked field set
//! - Fixed-width, zero-padded version arithmetic
//! - Schema building: augmented entity schema, history schema, relations
//!
//! Core invariants:
//! - Configuration is resolved once at registration and immutable after
//! - The wildcard field set is expanded eagerly, never per-operation
//! - Fingerprints are content-derived: `H(domain_separator || canonical_bytes(values))`
//! - Version strings are monotonically non-decreasing per record identity
//!
#![deny(missing_docs)]

/// Configuration resolution and validation.
pub mod config;
/// Content fingerprinting over tracked field values.
pub mod fingerprint;
/// Entity, history, and relation schema building.
pub mod schema;
/// Version string arithmetic and formatting.
pub mod version;

pub use config::{ConfigError, TrackConfig};
pub use fingerprint::{fingerprint, FingerprintError};
pub use schema::{
    EntitySchema, FieldDef, FieldType, RelationDef, RelationKind, SchemaError, TrackedSchema,
};
pub use version::{next_version, VersionError};

/// Dynamic record snapshot: field name to JSON value.
///
/// Used for entity instances, incoming write data, and history rows.
/// `serde_json`'s default map keeps keys sorted, so two records holding
/// equal values compare equal regardless of insertion order.
pub type Record = serde_json::Map<String, serde_json::Value>;
