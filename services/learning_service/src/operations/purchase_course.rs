use actix_web::http::StatusCode;
use serde::Serialize;
use service_core::endpoint_error::EndpointError;
use service_core::operation_error::OperationError;
use service_core::simple_err_map;
use thiserror::Error;
use tracing::instrument;

use super::require_id;
use crate::context::Settings;
use crate::integration::payment::{to_minor_units, CheckoutRequest, PaymentGateway};
use crate::model::{Enrollment, Purchase};
use crate::store::Store;

#[derive(Debug)]
pub struct PurchaseCourseInput {
    pub user_id: String,
    pub course_id: Option<String>,
    /// `Origin` header of the request, used for the redirect URLs.
    pub origin: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PurchaseCourseOutput {
    pub session_url: String,
}

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum PurchaseCourseError {
    #[error("Course not found")]
    CourseNotFound,

    #[error("User not found")]
    UserNotFound,

    #[error("You are already enrolled in this course")]
    AlreadyEnrolled,
}

impl OperationError for PurchaseCourseError {
    fn code(&self) -> StatusCode {
        match self {
            Self::CourseNotFound | Self::UserNotFound => StatusCode::NOT_FOUND,
            Self::AlreadyEnrolled => StatusCode::CONFLICT,
        }
    }
}

/// Records a pending purchase and enrollment, then asks the gateway for a checkout page.
#[instrument(skip(store, gateway, settings))]
pub async fn purchase_course(
    store: &(impl Store + ?Sized),
    gateway: &(impl PaymentGateway + ?Sized),
    settings: &Settings,
    input: PurchaseCourseInput,
) -> Result<PurchaseCourseOutput, EndpointError<PurchaseCourseError>> {
    let course_id = require_id(input.course_id.as_deref(), "Course")?;

    let course = store
        .get_course(&course_id)
        .await
        .map_err(simple_err_map!("Loading course failed.", EndpointError::internal()))?
        .ok_or_else(|| EndpointError::operation(PurchaseCourseError::CourseNotFound))?;
    let user = store
        .get_user(&input.user_id)
        .await
        .map_err(simple_err_map!("Loading user failed.", EndpointError::internal()))?
        .ok_or_else(|| EndpointError::operation(PurchaseCourseError::UserNotFound))?;

    if course.has_student(&user.user_id) || user.has_course(&course_id) {
        return Err(EndpointError::operation(PurchaseCourseError::AlreadyEnrolled));
    }

    let amount = course.checkout_amount();
    let purchase = Purchase::builder()
        .course_id(course_id)
        .user_id(&user.user_id)
        .amount(amount)
        .build();
    store
        .create_purchase(&purchase)
        .await
        .map_err(simple_err_map!("Creating purchase failed.", EndpointError::internal()))?;

    let enrollment = Enrollment::builder()
        .enrollment_id(Enrollment::id_for_purchase(&purchase.purchase_id))
        .user_id(&user.user_id)
        .course_id(course_id)
        .amount(amount)
        .build();
    store
        .put_enrollment(&enrollment)
        .await
        .map_err(simple_err_map!("Creating enrollment failed.", EndpointError::internal()))?;

    let origin = input
        .origin
        .as_deref()
        .map(|o| o.trim_end_matches('/'))
        .filter(|o| !o.is_empty())
        .unwrap_or(&settings.default_origin);
    let request = CheckoutRequest::builder()
        .purchase_id(purchase.purchase_id)
        .course_id(course_id)
        .user_id(&user.user_id)
        .customer_email(&user.email)
        .title(&course.title)
        .thumbnail(&course.thumbnail)
        .unit_amount(to_minor_units(amount))
        .currency(&settings.currency)
        .success_url(format!(
            "{}/my-enrollement?success=true&session_id={{CHECKOUT_SESSION_ID}}",
            origin
        ))
        .cancel_url(format!("{}/courses?canceled=true", origin))
        .build();

    let session = gateway
        .create_checkout_session(&request)
        .await
        .map_err(simple_err_map!("Creating checkout session failed.", EndpointError::internal()))?;

    tracing::info!(purchase_id = %purchase.purchase_id, session_id = %session.id, "Checkout started.");
    Ok(PurchaseCourseOutput {
        session_url: session.url,
    })
}
