use actix_web::http::StatusCode;
use serde::Serialize;
use service_core::endpoint_error::EndpointError;
use service_core::operation_error::OperationError;
use service_core::simple_err_map;
use thiserror::Error;
use tracing::instrument;
use uuid::Uuid;

use super::require_id;
use crate::model::Course;
use crate::store::{pair_enrollments, Store};

const RATING_ATTEMPTS: usize = 3;

#[derive(Debug)]
pub struct AddRatingInput {
    pub user_id: String,
    pub course_id: Option<String>,
    pub rating: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct AddRatingOutput {
    pub message: String,
}

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum AddRatingError {
    #[error("Course not found")]
    CourseNotFound,

    #[error("You must be enrolled in this course to rate it")]
    NotEnrolled,
}

impl OperationError for AddRatingError {
    fn code(&self) -> StatusCode {
        match self {
            Self::CourseNotFound => StatusCode::NOT_FOUND,
            Self::NotEnrolled => StatusCode::FORBIDDEN,
        }
    }
}

/// Stores the caller's rating, replacing an earlier one. Only a successful enrollment entitles
/// the caller to rate; the caches are not consulted.
#[instrument(skip(store))]
pub async fn add_rating(
    store: &(impl Store + ?Sized),
    input: AddRatingInput,
) -> Result<AddRatingOutput, EndpointError<AddRatingError>> {
    let rating = input
        .rating
        .filter(|r| (1..=5).contains(r))
        .ok_or_else(|| EndpointError::validation("Invalid rating details. Rating must be between 1-5."))?;
    let course_id = require_id(input.course_id.as_deref(), "Course")?;

    let mut course = load_course(store, &course_id).await?;

    let enrolled = pair_enrollments(store, &input.user_id, &course_id)
        .await
        .map_err(simple_err_map!("Loading enrollments failed.", EndpointError::internal()))?
        .iter()
        .any(|e| e.is_active());
    if !enrolled {
        return Err(EndpointError::operation(AddRatingError::NotEnrolled));
    }

    // Only the ratings are written, guarded by the list as read; other course fields change
    // concurrently through enrollment activation.
    for _ in 0..RATING_ATTEMPTS {
        let expected = course.ratings.clone();
        let replaced = course.upsert_rating(&input.user_id, rating as u8);
        let stored = store
            .replace_ratings(&course_id, &expected, &course.ratings)
            .await
            .map_err(simple_err_map!("Saving rating failed.", EndpointError::internal()))?;
        if stored {
            tracing::info!(rating, replaced, "Rating stored.");
            return Ok(AddRatingOutput {
                message: "Rating added successfully".to_string(),
            });
        }
        tracing::debug!("Ratings changed meanwhile, retrying.");
        course = load_course(store, &course_id).await?;
    }

    tracing::error!(attempts = RATING_ATTEMPTS, "Ratings kept changing.");
    Err(EndpointError::internal())
}

async fn load_course(
    store: &(impl Store + ?Sized),
    course_id: &Uuid,
) -> Result<Course, EndpointError<AddRatingError>> {
    store
        .get_course(course_id)
        .await
        .map_err(simple_err_map!("Loading course failed.", EndpointError::internal()))?
        .ok_or_else(|| EndpointError::operation(AddRatingError::CourseNotFound))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rstest::rstest;

    use super::*;
    use crate::model::{Enrollment, EnrollmentStatus, Rating};
    use crate::operations::activate_enrollments;
    use crate::operations::testing::{seeded, user, Interleaved};
    use crate::store::{CourseRepository, EnrollmentRepository, MemoryStore, UserRepository};

    fn input(course_id: &Uuid, rating: i64) -> AddRatingInput {
        AddRatingInput {
            user_id: "user_1".to_string(),
            course_id: Some(course_id.to_string()),
            rating: Some(rating),
        }
    }

    async fn enroll(store: &MemoryStore, course_id: Uuid, status: EnrollmentStatus) {
        let enrollment = Enrollment::builder()
            .user_id("user_1")
            .course_id(course_id)
            .status(status)
            .build();
        store.put_enrollment(&enrollment).await.unwrap();
    }

    #[tokio::test]
    async fn rating_twice_replaces() {
        let (store, course, _) = seeded(10.0, 0).await;
        enroll(&store, course.course_id, EnrollmentStatus::Success).await;

        add_rating(&store, input(&course.course_id, 4)).await.unwrap();
        add_rating(&store, input(&course.course_id, 2)).await.unwrap();

        let course = store.get_course(&course.course_id).await.unwrap().unwrap();
        assert_eq!(1, course.ratings.len());
        assert_eq!(2, course.ratings[0].rating);
    }

    #[tokio::test]
    async fn activation_during_rating_is_kept() {
        let (store, course, _) = seeded(10.0, 0).await;
        enroll(&store, course.course_id, EnrollmentStatus::Success).await;
        store.put_user(&user("user_2")).await.unwrap();
        let course_id = course.course_id;
        let store = Interleaved::new(Arc::new(store), move |inner| async move {
            activate_enrollments(&*inner, "user_2", &course_id, None).await.unwrap();
        });

        add_rating(&store, input(&course_id, 5)).await.unwrap();

        let course = store.inner.get_course(&course_id).await.unwrap().unwrap();
        assert!(course.has_student("user_2"));
        assert_eq!(5, course.ratings[0].rating);
    }

    #[tokio::test]
    async fn concurrent_ratings_are_both_kept() {
        let (store, course, _) = seeded(10.0, 0).await;
        enroll(&store, course.course_id, EnrollmentStatus::Success).await;
        let course_id = course.course_id;
        let store = Interleaved::new(Arc::new(store), move |inner| async move {
            let other = vec![Rating {
                user_id: "user_2".to_string(),
                rating: 3,
            }];
            assert!(inner.replace_ratings(&course_id, &[], &other).await.unwrap());
        });

        add_rating(&store, input(&course_id, 4)).await.unwrap();

        let course = store.inner.get_course(&course_id).await.unwrap().unwrap();
        assert_eq!(2, course.ratings.len());
        assert!(course.ratings.iter().any(|r| r.user_id == "user_1" && r.rating == 4));
    }

    #[tokio::test]
    async fn cache_membership_is_not_enough() {
        let (store, course, _) = seeded(10.0, 0).await;
        store.add_enrolled_student(&course.course_id, "user_1").await.unwrap();
        enroll(&store, course.course_id, EnrollmentStatus::Pending).await;

        let err = add_rating(&store, input(&course.course_id, 5)).await.unwrap_err();

        assert!(matches!(err, EndpointError::Operation(AddRatingError::NotEnrolled)));
        assert_eq!(StatusCode::FORBIDDEN, err.code());
    }

    #[rstest]
    #[case(0)]
    #[case(6)]
    #[case(-1)]
    #[tokio::test]
    async fn out_of_range_is_rejected(#[case] rating: i64) {
        let (store, course, _) = seeded(10.0, 0).await;

        let err = add_rating(&store, input(&course.course_id, rating)).await.unwrap_err();

        assert!(matches!(err, EndpointError::Validation(_)));
    }

    #[tokio::test]
    async fn unknown_course_is_not_found() {
        let (store, _, _) = seeded(10.0, 0).await;

        let err = add_rating(&store, input(&Uuid::new_v4(), 3)).await.unwrap_err();

        assert!(matches!(err, EndpointError::Operation(AddRatingError::CourseNotFound)));
    }
}
