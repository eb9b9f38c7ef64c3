//! Lifecycle coordination for revtrail change tracking.
//!
//! This crate provides:
//! - The host boundary trait (`EntityHost`) the coordinator consumes
//! - Typed write/delete operation descriptions and per-operation contexts
//! - The `Tracker`: the state machine wiring pre/post write and delete
//!   events to fingerprinting, version assignment, and history appends
//! - The `VersionRecorded` notification emitted on history-row creation
//!
//! Core invariants:
//! - Pre always precedes post; post runs only after the primary
//!   write/delete committed
//! - A per-operation context is constructed at pipeline entry, passed by
//!   ownership pre to post, and discarded at exit
//! - Operations not resolvable to a single instance never mutate the
//!   version field or create history rows
//! - Version allocation is not serialized across concurrent operations
//!   on one record identity; atomicity is delegated to the persistence
//!   layer
//!
#![deny(missing_docs)]

/// Per-operation contexts threaded between pre and post events.
pub mod context;
/// Error types for tracking operations.
pub mod errors;
/// Host boundary consumed by the coordinator.
pub mod host;
/// Completion notification.
pub mod notify;
/// Write and delete operation descriptions.
pub mod op;
/// The lifecycle coordinator.
pub mod tracker;

pub use context::{DeleteContext, WriteContext};
pub use errors::TrackError;
pub use host::{EntityHost, HostError};
pub use notify::VersionRecorded;
pub use op::{Action, DeleteOp, WriteOp};
pub use revtrail_core::Record;
pub use tracker::Tracker;
