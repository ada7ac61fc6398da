use actix_web::http::StatusCode;
use serde::Serialize;
use service_core::endpoint_error::EndpointError;
use service_core::operation_error::OperationError;
use service_core::simple_err_map;
use thiserror::Error;
use tracing::instrument;

use super::{activate_enrollments, require_id};
use crate::model::PurchaseStatus;
use crate::store::{settle_purchase, Store};

#[derive(Debug)]
pub struct CompleteEnrollmentInput {
    pub user_id: String,
    pub course_id: Option<String>,
    pub purchase_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteEnrollmentOutput {
    pub message: String,
    pub redirect_to: String,
}

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum CompleteEnrollmentError {
    #[error("Course not found")]
    CourseNotFound,

    #[error("User not found")]
    UserNotFound,
}

impl OperationError for CompleteEnrollmentError {
    fn code(&self) -> StatusCode {
        match self {
            Self::CourseNotFound | Self::UserNotFound => StatusCode::NOT_FOUND,
        }
    }
}

/// Client-driven fallback for a confirmation callback that never arrived. Mirrors the effects of
/// a completed checkout for the caller's own purchase.
#[instrument(skip(store))]
pub async fn complete_enrollment(
    store: &(impl Store + ?Sized),
    input: CompleteEnrollmentInput,
) -> Result<CompleteEnrollmentOutput, EndpointError<CompleteEnrollmentError>> {
    let course_id = require_id(input.course_id.as_deref(), "Course")?;
    let purchase_id = match input.purchase_id.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(raw) => Some(require_id(Some(raw), "Purchase")?),
        None => None,
    };

    store
        .get_course(&course_id)
        .await
        .map_err(simple_err_map!("Loading course failed.", EndpointError::internal()))?
        .ok_or_else(|| EndpointError::operation(CompleteEnrollmentError::CourseNotFound))?;
    store
        .get_user(&input.user_id)
        .await
        .map_err(simple_err_map!("Loading user failed.", EndpointError::internal()))?
        .ok_or_else(|| EndpointError::operation(CompleteEnrollmentError::UserNotFound))?;

    let purchase = match purchase_id {
        Some(purchase_id) => store
            .get_purchase(&purchase_id)
            .await
            .map_err(simple_err_map!("Loading purchase failed.", EndpointError::internal()))?
            .filter(|p| p.user_id == input.user_id && p.course_id == course_id),
        None => None,
    };

    if let Some(purchase) = &purchase {
        if purchase.status != PurchaseStatus::Completed {
            settle_purchase(store, &purchase.purchase_id, PurchaseStatus::Completed)
                .await
                .map_err(simple_err_map!("Completing purchase failed.", EndpointError::internal()))?;
        }
    } else if purchase_id.is_some() {
        tracing::warn!(?purchase_id, "Purchase unknown or not owned by caller; completing without it.");
    }

    activate_enrollments(store, &input.user_id, &course_id, purchase.as_ref())
        .await
        .map_err(simple_err_map!("Activating enrollment failed.", EndpointError::internal()))?;

    Ok(CompleteEnrollmentOutput {
        message: "Enrollment completed successfully".to_string(),
        redirect_to: "/my-enrollement".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::model::{Enrollment, Purchase};
    use crate::operations::testing::seeded;
    use crate::store::{EnrollmentRepository, PurchaseRepository, UserRepository};

    fn input(course_id: &Uuid, purchase_id: Option<&Uuid>) -> CompleteEnrollmentInput {
        CompleteEnrollmentInput {
            user_id: "user_1".to_string(),
            course_id: Some(course_id.to_string()),
            purchase_id: purchase_id.map(Uuid::to_string),
        }
    }

    #[tokio::test]
    async fn completes_callers_purchase() {
        let (store, course, _) = seeded(10.0, 0).await;
        let purchase = Purchase::builder().course_id(course.course_id).user_id("user_1").amount(10.0).build();
        store.create_purchase(&purchase).await.unwrap();

        let output = complete_enrollment(&store, input(&course.course_id, Some(&purchase.purchase_id)))
            .await
            .unwrap();

        assert_eq!("/my-enrollement", output.redirect_to);
        let stored = store.get_purchase(&purchase.purchase_id).await.unwrap().unwrap();
        assert_eq!(PurchaseStatus::Completed, stored.status);
        let enrollments = store.list_user_enrollments("user_1").await.unwrap();
        assert_eq!(Enrollment::id_for_purchase(&purchase.purchase_id), enrollments[0].enrollment_id);
        assert_eq!(10.0, enrollments[0].amount);
        assert!(store.get_user("user_1").await.unwrap().unwrap().has_course(&course.course_id));
    }

    #[tokio::test]
    async fn foreign_purchase_is_left_alone() {
        let (store, course, _) = seeded(10.0, 0).await;
        let purchase = Purchase::builder().course_id(course.course_id).user_id("user_2").amount(10.0).build();
        store.create_purchase(&purchase).await.unwrap();

        complete_enrollment(&store, input(&course.course_id, Some(&purchase.purchase_id)))
            .await
            .unwrap();

        let stored = store.get_purchase(&purchase.purchase_id).await.unwrap().unwrap();
        assert_eq!(PurchaseStatus::Pending, stored.status);
        let enrollments = store.list_user_enrollments("user_1").await.unwrap();
        assert_eq!(1, enrollments.len());
        assert_eq!(0.0, enrollments[0].amount);
    }

    #[tokio::test]
    async fn repeated_completion_keeps_one_enrollment() {
        let (store, course, _) = seeded(10.0, 0).await;

        complete_enrollment(&store, input(&course.course_id, None)).await.unwrap();
        complete_enrollment(&store, input(&course.course_id, None)).await.unwrap();

        assert_eq!(1, store.list_user_enrollments("user_1").await.unwrap().len());
    }

    #[tokio::test]
    async fn unknown_course_is_not_found() {
        let (store, _, _) = seeded(10.0, 0).await;

        let err = complete_enrollment(&store, input(&Uuid::new_v4(), None)).await.unwrap_err();

        assert!(matches!(err, EndpointError::Operation(CompleteEnrollmentError::CourseNotFound)));
        assert!(store.list_user_enrollments("user_1").await.unwrap().is_empty());
    }
}
