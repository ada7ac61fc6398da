use actix_web::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::Serialize;
use service_core::endpoint_error::EndpointError;
use service_core::operation_error::OperationError;
use service_core::simple_err_map;
use thiserror::Error;
use tracing::instrument;

use crate::context::Settings;
use crate::integration::identity::{verify_user_event, UserEvent, UserEventData};
use crate::integration::signature::SignatureError;
use crate::model::User;
use crate::store::Store;

pub const USER_CREATED: &str = "user.created";
pub const USER_UPDATED: &str = "user.updated";
pub const USER_DELETED: &str = "user.deleted";

/// Headers and body of an identity provider callback.
pub struct SyncUserInput<'a> {
    pub message_id: Option<&'a str>,
    pub timestamp: Option<&'a str>,
    pub signature: Option<&'a str>,
    pub payload: &'a [u8],
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct SyncUserOutput {}

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SyncUserError {
    #[error("Webhook error: {0}")]
    Signature(#[from] SignatureError),
}

impl OperationError for SyncUserError {
    fn code(&self) -> StatusCode {
        match self {
            Self::Signature(_) => StatusCode::BAD_REQUEST,
        }
    }
}

/// Mirrors account lifecycle events of the identity provider into the user collection.
#[instrument(skip_all)]
pub async fn sync_user(
    store: &(impl Store + ?Sized),
    settings: &Settings,
    input: SyncUserInput<'_>,
) -> Result<SyncUserOutput, EndpointError<SyncUserError>> {
    let (message_id, timestamp, signature) = match (input.message_id, input.timestamp, input.signature) {
        (Some(id), Some(ts), Some(sig)) => (id, ts, sig),
        _ => {
            tracing::warn!("Identity callback without signature headers.");
            return Err(EndpointError::operation(SyncUserError::Signature(SignatureError::MalformedHeader)));
        }
    };
    verify_user_event(
        &settings.identity_webhook_secret,
        message_id,
        timestamp,
        signature,
        input.payload,
        settings.signature_tolerance_secs,
        input.received_at,
    )
    .map_err(|e| {
        tracing::warn!(error = %e, "Rejected identity callback.");
        EndpointError::operation(SyncUserError::Signature(e))
    })?;

    let event: UserEvent = serde_json::from_slice(input.payload).map_err(|e| {
        tracing::warn!(error = %e, "Unreadable identity event.");
        EndpointError::validation("Invalid event payload.")
    })?;
    tracing::info!(kind = %event.kind, user_id = %event.data.id, "Identity event received.");

    match event.kind.as_str() {
        USER_CREATED | USER_UPDATED => upsert_profile(store, &event.data).await?,
        USER_DELETED => store
            .delete_user(&event.data.id)
            .await
            .map_err(simple_err_map!("Deleting user failed.", EndpointError::internal()))?,
        _ => tracing::debug!(kind = %event.kind, "Ignoring identity event."),
    }

    Ok(SyncUserOutput {})
}

/// Writes the profile fields only. The enrolled-course cache of an existing record is never part
/// of the write, so redelivered or reordered events cannot drop enrollments.
async fn upsert_profile(
    store: &(impl Store + ?Sized),
    data: &UserEventData,
) -> Result<(), EndpointError<SyncUserError>> {
    let user = User::builder()
        .user_id(&data.id)
        .name(data.full_name())
        .email(data.primary_email())
        .image_url(data.image_url.clone().unwrap_or_default())
        .build();

    store
        .upsert_profile(&user)
        .await
        .map_err(simple_err_map!("Saving user failed.", EndpointError::internal()))
}
