use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Error, Debug)]
pub enum MemStoreError {
    /// No record with the given identifier.
    #[error("no record with id {id}")]
    NotFound {
        /// The missing identifier.
        id: u64,
    },
    /// A tracking step failed.
    #[error("tracking error: {0}")]
    Track(#[from] revtrail_track::TrackError),
}
