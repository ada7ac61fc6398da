use actix_web::http::StatusCode;
use serde::Serialize;
use service_core::endpoint_error::EndpointError;
use service_core::operation_error::OperationError;
use service_core::simple_err_map;
use thiserror::Error;
use tracing::instrument;

use super::require_id;
use crate::store::Store;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteCourseOutput {
    pub message: String,
    pub deleted_enrollments: usize,
    pub deleted_purchases: usize,
    pub updated_users: usize,
}

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DeleteCourseError {
    #[error("Course not found")]
    CourseNotFound,

    #[error("You are not authorized to delete this course")]
    NotOwner,
}

impl OperationError for DeleteCourseError {
    fn code(&self) -> StatusCode {
        match self {
            Self::CourseNotFound => StatusCode::NOT_FOUND,
            Self::NotOwner => StatusCode::FORBIDDEN,
        }
    }
}

/// Deletes a course and everything referencing it. Progress records are kept.
///
/// The course document goes last, so a failure half-way leaves it in place and the deletion can
/// be retried.
#[instrument(skip(store))]
pub async fn delete_course(
    store: &(impl Store + ?Sized),
    caller: &str,
    course_id: Option<&str>,
) -> Result<DeleteCourseOutput, EndpointError<DeleteCourseError>> {
    let course_id = require_id(course_id, "Course")?;

    let course = store
        .get_course(&course_id)
        .await
        .map_err(simple_err_map!("Loading course failed.", EndpointError::internal()))?
        .ok_or_else(|| EndpointError::operation(DeleteCourseError::CourseNotFound))?;
    if course.educator_id != caller {
        return Err(EndpointError::operation(DeleteCourseError::NotOwner));
    }

    let deleted_enrollments = store
        .delete_course_enrollments(&course_id)
        .await
        .map_err(simple_err_map!("Deleting enrollments failed.", EndpointError::internal()))?;
    let deleted_purchases = store
        .delete_course_purchases(&course_id)
        .await
        .map_err(simple_err_map!("Deleting purchases failed.", EndpointError::internal()))?;
    let updated_users = store
        .remove_course_from_users(&course_id)
        .await
        .map_err(simple_err_map!("Updating user caches failed.", EndpointError::internal()))?;
    store
        .delete_course(&course_id)
        .await
        .map_err(simple_err_map!("Deleting course failed.", EndpointError::internal()))?;

    tracing::info!(deleted_enrollments, deleted_purchases, updated_users, "Course deleted.");
    Ok(DeleteCourseOutput {
        message: "Course and all related enrollments deleted successfully".to_string(),
        deleted_enrollments,
        deleted_purchases,
        updated_users,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Purchase;
    use crate::operations::activate_enrollments;
    use crate::operations::testing::{seeded, user};
    use crate::store::{CourseRepository, EnrollmentRepository, PurchaseRepository, UserRepository};

    #[tokio::test]
    async fn cascades_to_ledgers_and_caches() {
        let (store, course, _) = seeded(10.0, 0).await;
        store.put_user(&user("user_2")).await.unwrap();
        for user_id in ["user_1", "user_2"] {
            let purchase = Purchase::builder()
                .course_id(course.course_id)
                .user_id(user_id)
                .amount(10.0)
                .build();
            store.create_purchase(&purchase).await.unwrap();
            activate_enrollments(&store, user_id, &course.course_id, Some(&purchase)).await.unwrap();
        }

        let output = delete_course(&store, "educator_1", Some(&course.course_id.to_string()))
            .await
            .unwrap();

        assert_eq!(2, output.deleted_enrollments);
        assert_eq!(2, output.deleted_purchases);
        assert_eq!(2, output.updated_users);
        assert!(store.get_course(&course.course_id).await.unwrap().is_none());
        assert!(store.list_course_enrollments(&course.course_id).await.unwrap().is_empty());
        assert!(store.list_course_purchases(&course.course_id).await.unwrap().is_empty());
        for user_id in ["user_1", "user_2"] {
            let user = store.get_user(user_id).await.unwrap().unwrap();
            assert!(!user.has_course(&course.course_id));
        }
    }

    #[tokio::test]
    async fn only_owner_may_delete() {
        let (store, course, _) = seeded(10.0, 0).await;

        let err = delete_course(&store, "user_1", Some(&course.course_id.to_string()))
            .await
            .unwrap_err();

        assert!(matches!(err, EndpointError::Operation(DeleteCourseError::NotOwner)));
        assert!(store.get_course(&course.course_id).await.unwrap().is_some());
    }
}
