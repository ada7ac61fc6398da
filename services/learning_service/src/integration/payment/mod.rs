//! Payment gateway: checkout session creation and signed event callbacks.

mod event;
mod stripe;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use typed_builder::TypedBuilder;
use uuid::Uuid;

pub use event::{GatewayEvent, SessionObject, CHECKOUT_COMPLETED, CHECKOUT_EXPIRED};
pub use stripe::StripeGateway;

use super::signature::{self, SignatureError};

/// Everything the gateway needs to render a one-item checkout page.
#[derive(Debug, Clone, PartialEq, TypedBuilder)]
pub struct CheckoutRequest {
    pub purchase_id: Uuid,
    pub course_id: Uuid,
    #[builder(setter(into))]
    pub user_id: String,
    #[builder(default, setter(into))]
    pub customer_email: String,
    #[builder(setter(into))]
    pub title: String,
    #[builder(setter(into))]
    pub thumbnail: String,
    /// Amount in minor currency units.
    pub unit_amount: i64,
    #[builder(setter(into))]
    pub currency: String,
    #[builder(setter(into))]
    pub success_url: String,
    #[builder(setter(into))]
    pub cancel_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Gateway request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Gateway rejected the request with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Gateway returned a session without a redirect URL.")]
    MissingUrl,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_checkout_session(&self, request: &CheckoutRequest) -> Result<CheckoutSession, GatewayError>;
}

/// Converts a decimal amount into minor units.
pub fn to_minor_units(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// Verifies a `t=<unix>,v1=<hex>` signature header against the raw payload. Any of several `v1`
/// entries may match, which happens while the webhook secret is being rolled.
pub fn verify_event_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance: i64,
    now: DateTime<Utc>,
) -> Result<(), SignatureError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::MalformedHeader)?;
    if signatures.is_empty() {
        return Err(SignatureError::MalformedHeader);
    }
    signature::check_timestamp(timestamp, tolerance, now)?;

    let matched = signatures.into_iter().filter_map(|s| hex::decode(s).ok()).any(|expected| {
        signature::verify_hmac_sha256(secret.as_bytes(), &[timestamp.as_bytes(), b".", payload], &expected).is_ok()
    });

    if matched {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

/// Builds the header the gateway would send for `payload`.
#[cfg(test)]
pub(crate) fn sign_event(payload: &[u8], secret: &str, timestamp: i64) -> Result<String, SignatureError> {
    let timestamp = timestamp.to_string();
    let mac = signature::hmac_sha256(secret.as_bytes(), &[timestamp.as_bytes(), b".", payload])?;
    Ok(format!("t={},v1={}", timestamp, hex::encode(mac)))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rstest::rstest;

    use super::*;

    const SECRET: &str = "whsec_test";
    const PAYLOAD: &[u8] = br#"{"id":"evt_1","type":"checkout.session.completed"}"#;

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn accepts_signed_payload() {
        let header = sign_event(PAYLOAD, SECRET, now().timestamp()).unwrap();

        assert_eq!(Ok(()), verify_event_signature(PAYLOAD, &header, SECRET, 300, now()));
    }

    #[test]
    fn accepts_any_matching_v1_entry() {
        let header = sign_event(PAYLOAD, SECRET, now().timestamp()).unwrap();
        let header = header.replacen("v1=", "v1=00ff,v1=", 1);

        assert_eq!(Ok(()), verify_event_signature(PAYLOAD, &header, SECRET, 300, now()));
    }

    #[test]
    fn rejects_tampered_payload() {
        let header = sign_event(PAYLOAD, SECRET, now().timestamp()).unwrap();

        assert_eq!(
            Err(SignatureError::Mismatch),
            verify_event_signature(b"{}", &header, SECRET, 300, now())
        );
    }

    #[test]
    fn rejects_stale_signature() {
        let header = sign_event(PAYLOAD, SECRET, now().timestamp() - 600).unwrap();

        assert_eq!(
            Err(SignatureError::Expired),
            verify_event_signature(PAYLOAD, &header, SECRET, 300, now())
        );
    }

    #[rstest]
    #[case("")]
    #[case("v1=abcd")]
    #[case("t=1700000000")]
    fn rejects_malformed_header(#[case] header: &str) {
        assert_eq!(
            Err(SignatureError::MalformedHeader),
            verify_event_signature(PAYLOAD, header, SECRET, 300, now())
        );
    }

    #[rstest]
    #[case(80.0, 8000)]
    #[case(42.49, 4249)]
    #[case(0.0, 0)]
    fn minor_units(#[case] amount: f64, #[case] expected: i64) {
        assert_eq!(expected, to_minor_units(amount));
    }
}
