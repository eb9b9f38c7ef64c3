//! Version string arithmetic and formatting.
//!
//! Version strings are decimal counters rendered zero-padded to a
//! configured width. The width is a formatting floor, not a cap: a
//! counter exceeding the width is never truncated.

use thiserror::Error;

/// Error during version computation.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum VersionError {
    /// The prior version string was not a decimal integer.
    #[error("prior version {0:?} is not a decimal integer")]
    UnparsablePrior(String),
}

/// Computes the next version string from a prior version.
///
/// With no prior version the numeric base is 1. For a new record the
/// base is used as-is, covering the first save; otherwise the base is
/// incremented by 1. The result is left-padded with zeros to `width`.
///
/// # Errors
///
/// Returns [`VersionError::UnparsablePrior`] when the prior version
/// does not parse as a decimal integer.
pub fn next_version(
    prior: Option<&str>,
    is_new: bool,
    width: usize,
) -> Result<String, VersionError> {
    let base: u64 = match prior {
        Some(s) => s
            .trim()
            .parse()
            .map_err(|_| VersionError::UnparsablePrior(s.to_owned()))?,
        None => 1,
    };
    let counter = if is_new { base } else { base + 1 };
    Ok(format!("{:0width$}", counter, width = width))
}
