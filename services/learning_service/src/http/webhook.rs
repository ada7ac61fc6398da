use actix_web::web::Bytes;
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use service_core::endpoint_error::EndpointError;

use super::envelope::ok;
use crate::context::Context;
use crate::operations::confirm_payment::{confirm_payment, ConfirmPaymentError, ConfirmPaymentInput};
use crate::operations::sync_user::{sync_user, SyncUserError, SyncUserInput};

pub const PAYMENT_SIGNATURE_HEADER: &str = "stripe-signature";
pub const MESSAGE_ID_HEADER: &str = "svix-id";
pub const MESSAGE_TIMESTAMP_HEADER: &str = "svix-timestamp";
pub const MESSAGE_SIGNATURE_HEADER: &str = "svix-signature";

fn header<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
}

/// Payment gateway events. The body is taken raw since the signature covers the exact bytes.
pub async fn payment(
    ctx: web::Data<Context>,
    req: HttpRequest,
    body: Bytes,
) -> Result<HttpResponse, EndpointError<ConfirmPaymentError>> {
    let input = ConfirmPaymentInput {
        payload: &body,
        signature: header(&req, PAYMENT_SIGNATURE_HEADER),
        received_at: Utc::now(),
    };

    confirm_payment(&*ctx.store, &ctx.settings, input).await.map(ok)
}

pub async fn identity(
    ctx: web::Data<Context>,
    req: HttpRequest,
    body: Bytes,
) -> Result<HttpResponse, EndpointError<SyncUserError>> {
    let input = SyncUserInput {
        message_id: header(&req, MESSAGE_ID_HEADER),
        timestamp: header(&req, MESSAGE_TIMESTAMP_HEADER),
        signature: header(&req, MESSAGE_SIGNATURE_HEADER),
        payload: &body,
        received_at: Utc::now(),
    };

    sync_user(&*ctx.store, &ctx.settings, input).await.map(ok)
}
