use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::integration::signature::{self, SignatureError};

const SECRET_PREFIX: &str = "whsec_";

/// User lifecycle event sent by the identity provider.
#[derive(Debug, Clone, Deserialize)]
pub struct UserEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: UserEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserEventData {
    pub id: String,
    #[serde(default)]
    pub email_addresses: Vec<EmailAddress>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailAddress {
    pub email_address: String,
}

impl UserEventData {
    pub fn primary_email(&self) -> String {
        self.email_addresses
            .first()
            .map(|e| e.email_address.clone())
            .unwrap_or_default()
    }

    pub fn full_name(&self) -> String {
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn secret_key(secret: &str) -> Result<Vec<u8>, SignatureError> {
    base64::decode(secret.trim_start_matches(SECRET_PREFIX)).map_err(|_| SignatureError::InvalidSecret)
}

/// Verifies the `svix-signature` header: space separated `v1,<base64 mac>` entries over
/// `"{id}.{timestamp}.{body}"`.
pub fn verify_user_event(
    secret: &str,
    msg_id: &str,
    timestamp: &str,
    header: &str,
    body: &[u8],
    tolerance: i64,
    now: DateTime<Utc>,
) -> Result<(), SignatureError> {
    let key = secret_key(secret)?;
    signature::check_timestamp(timestamp, tolerance, now)?;

    let candidates: Vec<Vec<u8>> = header
        .split_whitespace()
        .filter_map(|entry| entry.split_once(','))
        .filter(|(version, _)| *version == "v1")
        .filter_map(|(_, sig)| base64::decode(sig).ok())
        .collect();
    if candidates.is_empty() {
        return Err(SignatureError::MalformedHeader);
    }

    let parts: [&[u8]; 5] = [msg_id.as_bytes(), b".", timestamp.as_bytes(), b".", body];
    if candidates
        .iter()
        .any(|expected| signature::verify_hmac_sha256(&key, &parts, expected).is_ok())
    {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

/// Builds the signature header the identity provider would send.
#[cfg(test)]
pub(crate) fn sign_user_event(secret: &str, msg_id: &str, timestamp: &str, body: &[u8]) -> Result<String, SignatureError> {
    let key = secret_key(secret)?;
    let mac = signature::hmac_sha256(&key, &[msg_id.as_bytes(), b".", timestamp.as_bytes(), b".", body])?;
    Ok(format!("v1,{}", base64::encode(mac)))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    // whsec_ + base64 of "identity-secret"
    const SECRET: &str = "whsec_aWRlbnRpdHktc2VjcmV0";
    const BODY: &[u8] = br#"{"type":"user.created","data":{"id":"user_1"}}"#;

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn accepts_signed_event() {
        let ts = now().timestamp().to_string();
        let header = sign_user_event(SECRET, "msg_1", &ts, BODY).unwrap();
        let header = format!("v1,bm9wZQ== {}", header);

        assert_eq!(Ok(()), verify_user_event(SECRET, "msg_1", &ts, &header, BODY, 300, now()));
    }

    #[test]
    fn rejects_other_message_id() {
        let ts = now().timestamp().to_string();
        let header = sign_user_event(SECRET, "msg_1", &ts, BODY).unwrap();

        assert_eq!(
            Err(SignatureError::Mismatch),
            verify_user_event(SECRET, "msg_2", &ts, &header, BODY, 300, now())
        );
    }

    #[test]
    fn rejects_header_without_v1() {
        let ts = now().timestamp().to_string();

        assert_eq!(
            Err(SignatureError::MalformedHeader),
            verify_user_event(SECRET, "msg_1", &ts, "v2,abc", BODY, 300, now())
        );
    }

    #[test]
    fn builds_profile_fields() {
        let event: UserEvent = serde_json::from_value(serde_json::json!({
            "type": "user.updated",
            "data": {
                "id": "user_1",
                "email_addresses": [{ "email_address": "ada@example.com" }],
                "first_name": "Ada",
                "last_name": null,
                "image_url": "https://img/ada.png"
            }
        }))
        .unwrap();

        assert_eq!("ada@example.com", event.data.primary_email());
        assert_eq!("Ada", event.data.full_name());
    }
}
