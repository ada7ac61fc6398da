use actix_web::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::Serialize;
use service_core::endpoint_error::EndpointError;
use service_core::operation_error::OperationError;
use service_core::simple_err_map;
use thiserror::Error;
use tracing::instrument;

use super::{activate_enrollments, require_id};
use crate::context::Settings;
use crate::integration::payment::{verify_event_signature, GatewayEvent, CHECKOUT_COMPLETED, CHECKOUT_EXPIRED};
use crate::integration::signature::SignatureError;
use crate::model::{Enrollment, EnrollmentStatus, PurchaseStatus};
use crate::store::{settle_purchase, Store};

pub struct ConfirmPaymentInput<'a> {
    /// Raw request body, exactly as signed by the gateway.
    pub payload: &'a [u8],
    pub signature: Option<&'a str>,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ConfirmPaymentOutput {
    pub received: bool,
}

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfirmPaymentError {
    #[error("Webhook error: {0}")]
    Signature(#[from] SignatureError),

    #[error("Purchase not found")]
    PurchaseNotFound,
}

impl OperationError for ConfirmPaymentError {
    fn code(&self) -> StatusCode {
        match self {
            Self::Signature(_) => StatusCode::BAD_REQUEST,
            Self::PurchaseNotFound => StatusCode::NOT_FOUND,
        }
    }
}

/// Handles a signed gateway callback. Only checkout completion and expiry change state; every
/// other event type is acknowledged untouched.
#[instrument(skip_all)]
pub async fn confirm_payment(
    store: &(impl Store + ?Sized),
    settings: &Settings,
    input: ConfirmPaymentInput<'_>,
) -> Result<ConfirmPaymentOutput, EndpointError<ConfirmPaymentError>> {
    let signature = input.signature.ok_or_else(|| {
        tracing::warn!("Gateway callback without signature header.");
        EndpointError::operation(ConfirmPaymentError::Signature(SignatureError::MalformedHeader))
    })?;
    verify_event_signature(
        input.payload,
        signature,
        &settings.payment_webhook_secret,
        settings.signature_tolerance_secs,
        input.received_at,
    )
    .map_err(|e| {
        tracing::warn!(error = %e, "Rejected gateway callback.");
        EndpointError::operation(ConfirmPaymentError::Signature(e))
    })?;

    let event: GatewayEvent = serde_json::from_slice(input.payload).map_err(|e| {
        tracing::warn!(error = %e, "Unreadable gateway event.");
        EndpointError::validation("Invalid event payload.")
    })?;
    tracing::info!(event_id = %event.id, kind = %event.kind, "Gateway event received.");

    match event.kind.as_str() {
        CHECKOUT_COMPLETED => checkout_completed(store, &event).await?,
        CHECKOUT_EXPIRED => checkout_expired(store, &event).await?,
        _ => tracing::debug!(kind = %event.kind, "Ignoring gateway event."),
    }

    Ok(ConfirmPaymentOutput { received: true })
}

async fn checkout_completed(
    store: &(impl Store + ?Sized),
    event: &GatewayEvent,
) -> Result<(), EndpointError<ConfirmPaymentError>> {
    let purchase_id = require_id(event.metadata("purchaseId"), "Purchase")?;
    let purchase = store
        .get_purchase(&purchase_id)
        .await
        .map_err(simple_err_map!("Loading purchase failed.", EndpointError::internal()))?
        .ok_or_else(|| EndpointError::operation(ConfirmPaymentError::PurchaseNotFound))?;

    if purchase.status != PurchaseStatus::Completed {
        settle_purchase(store, &purchase_id, PurchaseStatus::Completed)
            .await
            .map_err(simple_err_map!("Completing purchase failed.", EndpointError::internal()))?;
    }

    activate_enrollments(store, &purchase.user_id, &purchase.course_id, Some(&purchase))
        .await
        .map_err(simple_err_map!("Activating enrollment failed.", EndpointError::internal()))?;

    tracing::info!(%purchase_id, user_id = %purchase.user_id, course_id = %purchase.course_id, "Payment confirmed.");
    Ok(())
}

/// The checkout page timed out: the purchase fails, and so does the enrollment created for it
/// while it is still pending. Other attempts of the same pair are left alone.
async fn checkout_expired(
    store: &(impl Store + ?Sized),
    event: &GatewayEvent,
) -> Result<(), EndpointError<ConfirmPaymentError>> {
    let purchase_id = require_id(event.metadata("purchaseId"), "Purchase")?;
    let purchase = match store
        .get_purchase(&purchase_id)
        .await
        .map_err(simple_err_map!("Loading purchase failed.", EndpointError::internal()))?
    {
        Some(purchase) => purchase,
        None => {
            tracing::warn!(%purchase_id, "Expired checkout for unknown purchase.");
            return Ok(());
        }
    };

    if let Err(e) = purchase.status.transition(PurchaseStatus::Failed) {
        tracing::info!(%purchase_id, error = %e, "Expiry ignored for settled purchase.");
        return Ok(());
    }
    if purchase.status == PurchaseStatus::Pending
        && !store
            .set_purchase_status(&purchase_id, PurchaseStatus::Pending, PurchaseStatus::Failed)
            .await
            .map_err(simple_err_map!("Failing purchase failed.", EndpointError::internal()))?
    {
        tracing::info!(%purchase_id, "Purchase settled meanwhile; expiry ignored.");
        return Ok(());
    }

    // Only a still pending enrollment fails; an activated one keeps its access.
    let failed = store
        .set_enrollment_status(
            &Enrollment::id_for_purchase(&purchase_id),
            EnrollmentStatus::Pending,
            EnrollmentStatus::Failed,
        )
        .await
        .map_err(simple_err_map!("Failing enrollment failed.", EndpointError::internal()))?;

    tracing::info!(%purchase_id, enrollment_failed = failed, "Checkout expired.");
    Ok(())
}
