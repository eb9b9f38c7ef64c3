use thiserror::Error;

use crate::host::HostError;

/// Errors surfaced by tracking operations.
#[derive(Error, Debug)]
pub enum TrackError {
    /// Invalid boot options at registration.
    #[error("configuration error: {0}")]
    Config(#[from] revtrail_core::ConfigError),
    /// Schema building failed at registration.
    #[error("schema error: {0}")]
    Schema(#[from] revtrail_core::SchemaError),
    /// Version computation failed.
    #[error("version computation failed: {0}")]
    Version(#[from] revtrail_core::VersionError),
    /// Fingerprint computation failed.
    #[error("fingerprint computation failed: {0}")]
    Fingerprint(#[from] revtrail_core::FingerprintError),
    /// A host persistence call failed; propagated without retry.
    #[error("persistence failure during {op}: {source}")]
    Persistence {
        /// The host operation that failed.
        op: &'static str,
        /// The underlying host error.
        #[source]
        source: HostError,
    },
}
