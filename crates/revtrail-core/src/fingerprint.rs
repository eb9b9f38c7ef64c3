//! Content fingerprinting over tracked field values.
//!
//! Fingerprints are computed as:
//! `base64url(sha256(domain_separator || canonical_bytes(values)))`
//! truncated to the configured width. Canonical bytes follow RFC 8785,
//! so value-equal inputs produce equal digests regardless of field
//! insertion order. This is the sole dirty-detection signal when
//! fingerprinting is enabled.

use canonical_json::to_string;
use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::Record;

/// Domain separator for fingerprint computation.
const FINGERPRINT_DOMAIN_SEPARATOR: &[u8] = b"revtrail:fingerprint:v1\0";

/// Error during fingerprint computation.
#[derive(Error, Debug)]
pub enum FingerprintError {
    /// Canonical JSON rendering failed.
    ///
    /// Surfaces the serializer's error unchanged. `serde_json` values
    /// cannot hold non-finite numbers, so record maps are not expected
    /// to hit this.
    #[error("canonicalization failed: {0}")]
    Canonicalize(String),
}

/// Computes the content fingerprint of a tracked field value map.
///
/// Two calls with equal field values (by value equality, not identity)
/// and equal width produce equal digests.
///
/// # Errors
///
/// Returns [`FingerprintError::Canonicalize`] when the canonical JSON
/// serializer reports a failure; record maps built from `serde_json`
/// values are not expected to trigger it.
pub fn fingerprint(values: &Record, width: usize) -> Result<String, FingerprintError> {
    let canonical = to_string(&Value::Object(values.clone()))
        .map_err(|err| FingerprintError::Canonicalize(err.to_string()))?;

    let mut hasher = Sha256::new();
    hasher.update(FINGERPRINT_DOMAIN_SEPARATOR);
    hasher.update(canonical.as_bytes());
    let hash_bytes = hasher.finalize();

    use base64::Engine;
    let mut digest = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(hash_bytes);
    digest.truncate(width);
    Ok(digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn values(pairs: &[(&str, Value)]) -> Record {
        let mut map = Record::new();
        for (name, value) in pairs {
            map.insert((*name).to_owned(), value.clone());
        }
        map
    }

    #[test]
    fn equal_values_produce_equal_digests() {
        let a = values(&[("price", json!(100)), ("amount", json!(10))]);
        let b = values(&[("amount", json!(10)), ("price", json!(100))]);
        assert_eq!(fingerprint(&a, 10).unwrap(), fingerprint(&b, 10).unwrap());
    }

    #[test]
    fn different_values_produce_different_digests() {
        let a = values(&[("price", json!(100))]);
        let b = values(&[("price", json!(200))]);
        assert_ne!(fingerprint(&a, 10).unwrap(), fingerprint(&b, 10).unwrap());
    }

    #[test]
    fn digest_is_truncated_to_width() {
        let a = values(&[("price", json!(100))]);
        assert_eq!(fingerprint(&a, 10).unwrap().len(), 10);
        assert_eq!(fingerprint(&a, 4).unwrap().len(), 4);
    }

    #[test]
    fn null_and_absent_are_distinct_from_values() {
        let with_null = values(&[("price", Value::Null)]);
        let with_value = values(&[("price", json!(0))]);
        assert_ne!(
            fingerprint(&with_null, 10).unwrap(),
            fingerprint(&with_value, 10).unwrap()
        );
    }
}
