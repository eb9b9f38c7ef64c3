//! In-memory reference host for revtrail change tracking.
//!
//! This crate provides:
//! - `MemStore`: an in-memory record table plus history table for one
//!   tracked entity type, implementing the coordinator's host boundary
//! - Condition matching for conditional writes and deletes
//! - The write/delete pipelines that drive the `Tracker` end to end
//!
//! The memory backend is the reference implementation of the host
//! boundary and the place the end-to-end tracking properties are
//! exercised. It is intentionally unindexed; lookups are sequential
//! scans.
//!
#![deny(missing_docs)]

/// Error types for store operations.
pub mod error;
/// Condition matching over record snapshots.
pub mod filter;
/// The in-memory store.
pub mod store;

pub use error::MemStoreError;
pub use filter::matches;
pub use store::MemStore;
