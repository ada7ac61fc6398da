use chrono::{DateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Maximum age of a signed callback, in seconds.
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Error, PartialEq)]
pub enum SignatureError {
    #[error("Signature header is malformed.")]
    MalformedHeader,

    #[error("Signature timestamp is outside the tolerance window.")]
    Expired,

    #[error("No signature matches the payload.")]
    Mismatch,

    #[error("Webhook secret is not usable as a key.")]
    InvalidSecret,
}

/// HMAC-SHA256 over the concatenation of `parts`.
#[cfg(test)]
pub(crate) fn hmac_sha256(key: &[u8], parts: &[&[u8]]) -> Result<Vec<u8>, SignatureError> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| SignatureError::InvalidSecret)?;
    for part in parts {
        mac.update(part);
    }
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Constant-time check of `expected` against the MAC of `parts`.
pub fn verify_hmac_sha256(key: &[u8], parts: &[&[u8]], expected: &[u8]) -> Result<(), SignatureError> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| SignatureError::InvalidSecret)?;
    for part in parts {
        mac.update(part);
    }
    mac.verify_slice(expected).map_err(|_| SignatureError::Mismatch)
}

/// Parses a unix timestamp in seconds and rejects it when it is further than `tolerance` seconds
/// away from `now`.
pub fn check_timestamp(raw: &str, tolerance: i64, now: DateTime<Utc>) -> Result<(), SignatureError> {
    let secs: i64 = raw.trim().parse().map_err(|_| SignatureError::MalformedHeader)?;
    let signed_at = Utc.timestamp_opt(secs, 0).single().ok_or(SignatureError::MalformedHeader)?;

    if (now - signed_at).num_seconds().abs() > tolerance {
        return Err(SignatureError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use rstest::rstest;

    use super::*;

    #[test]
    fn verifies_own_mac() {
        let mac = hmac_sha256(b"key", &[b"12", b".", b"body"]).unwrap();

        assert_eq!(Ok(()), verify_hmac_sha256(b"key", &[b"12.body"], &mac));
        assert_eq!(Err(SignatureError::Mismatch), verify_hmac_sha256(b"other", &[b"12.body"], &mac));
    }

    #[rstest]
    #[case(0, Ok(()))]
    #[case(299, Ok(()))]
    #[case(301, Err(SignatureError::Expired))]
    #[case(-301, Err(SignatureError::Expired))]
    fn timestamp_window(#[case] age: i64, #[case] expected: Result<(), SignatureError>) {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let signed_at = (now - Duration::seconds(age)).timestamp().to_string();

        assert_eq!(expected, check_timestamp(&signed_at, DEFAULT_TOLERANCE_SECS, now));
    }

    #[test]
    fn garbage_timestamp_is_malformed() {
        assert_eq!(Err(SignatureError::MalformedHeader), check_timestamp("soon", 300, Utc::now()));
    }
}
