pub mod add_rating;
pub mod complete_enrollment;
pub mod confirm_payment;
pub mod delete_course;
pub mod describe_course;
pub mod educator;
pub mod get_course_progress;
pub mod get_user_course;
pub mod get_user_data;
pub mod list_courses;
pub mod list_enrolled_courses;
pub mod purchase_course;
pub mod sync_user;
pub mod update_course_progress;

#[cfg(test)]
pub(crate) mod testing;

use service_core::endpoint_error::EndpointError;
use service_core::operation_error::OperationError;
use uuid::Uuid;

use crate::model::{Course, Enrollment, EnrollmentStatus, Purchase};
use crate::store::{pair_enrollments, settle_enrollment, Store, StoreError};

/// Parses an id taken from a request body or path. Absent and blank values are reported as
/// `"{what} ID is required"`.
pub(crate) fn require_id<E: OperationError>(raw: Option<&str>, what: &str) -> Result<Uuid, EndpointError<E>> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| EndpointError::validation(format!("{} ID is required", what)))?;

    Uuid::parse_str(raw).map_err(|_| EndpointError::validation(format!("Invalid {} ID.", what.to_lowercase())))
}

/// Grants access for a (user, course) pair: every enrollment of the pair moves to success, or one
/// is created when the pair has none, then both caches learn about the enrollment. Each step is
/// idempotent, so redelivered confirmations converge on the same state.
pub(crate) async fn activate_enrollments(
    store: &(impl Store + ?Sized),
    user_id: &str,
    course_id: &Uuid,
    purchase: Option<&Purchase>,
) -> Result<(), StoreError> {
    let enrollments = pair_enrollments(store, user_id, course_id).await?;

    if enrollments.is_empty() {
        let enrollment_id = match purchase {
            Some(purchase) => Enrollment::id_for_purchase(&purchase.purchase_id),
            None => Uuid::new_v5(course_id, user_id.as_bytes()),
        };
        let enrollment = Enrollment::builder()
            .enrollment_id(enrollment_id)
            .user_id(user_id)
            .course_id(*course_id)
            .amount(purchase.map_or(0.0, |p| p.amount))
            .status(EnrollmentStatus::Success)
            .build();
        store.put_enrollment(&enrollment).await?;
        tracing::info!(enrollment_id = %enrollment.enrollment_id, "Created missing enrollment.");
    }

    for enrollment in enrollments.iter().filter(|e| !e.is_active()) {
        if !settle_enrollment(store, &enrollment.enrollment_id, EnrollmentStatus::Success).await? {
            tracing::debug!(enrollment_id = %enrollment.enrollment_id, "Enrollment already settled.");
        }
    }

    if store.add_enrolled_student(course_id, user_id).await? {
        tracing::debug!(%course_id, user_id, "Student added to course cache.");
    }
    if store.add_enrolled_course(user_id, course_id).await? {
        tracing::debug!(%course_id, user_id, "Course added to user cache.");
    }

    Ok(())
}

/// Whether `user_id` may see the full content of `course`: the owner always can, students need a
/// successful enrollment or an entry in either cache.
pub(crate) async fn has_access(store: &(impl Store + ?Sized), user_id: &str, course: &Course) -> Result<bool, StoreError> {
    if course.educator_id == user_id || course.has_student(user_id) {
        return Ok(true);
    }
    if pair_enrollments(store, user_id, &course.course_id)
        .await?
        .iter()
        .any(Enrollment::is_active)
    {
        return Ok(true);
    }
    Ok(store
        .get_user(user_id)
        .await?
        .map_or(false, |user| user.has_course(&course.course_id)))
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use rstest::rstest;

    use super::testing::seeded;
    use super::*;
    use crate::store::{CourseRepository, EnrollmentRepository, UserRepository};

    #[rstest]
    #[case(None, "Course ID is required")]
    #[case(Some("  "), "Course ID is required")]
    #[case(Some("abc"), "Invalid course ID.")]
    fn rejects_bad_ids(#[case] raw: Option<&str>, #[case] message: &str) {
        let err = require_id::<Infallible>(raw, "Course").unwrap_err();

        assert_eq!(message, err.message());
    }

    #[test]
    fn parses_ids() {
        let id = Uuid::new_v4();

        assert_eq!(id, require_id::<Infallible>(Some(&id.to_string()), "Course").unwrap());
    }

    #[tokio::test]
    async fn access_follows_ownership_ledger_and_caches() {
        let (store, course, _) = seeded(10.0, 0).await;

        assert!(has_access(&store, "educator_1", &course).await.unwrap());
        assert!(!has_access(&store, "user_1", &course).await.unwrap());

        store.add_enrolled_course("user_1", &course.course_id).await.unwrap();
        assert!(has_access(&store, "user_1", &course).await.unwrap());

        let enrollment = Enrollment::builder()
            .user_id("user_2")
            .course_id(course.course_id)
            .status(EnrollmentStatus::Success)
            .build();
        store.put_enrollment(&enrollment).await.unwrap();
        assert!(has_access(&store, "user_2", &course).await.unwrap());
    }

    #[tokio::test]
    async fn activation_without_enrollment_creates_one() {
        let (store, course, user) = seeded(10.0, 0).await;

        activate_enrollments(&store, &user.user_id, &course.course_id, None).await.unwrap();
        activate_enrollments(&store, &user.user_id, &course.course_id, None).await.unwrap();

        let enrollments = store.list_user_enrollments(&user.user_id).await.unwrap();
        assert_eq!(1, enrollments.len());
        assert!(enrollments[0].is_active());

        let course = store.get_course(&course.course_id).await.unwrap().unwrap();
        assert_eq!(vec![user.user_id.clone()], course.enrolled_students);
        let user = store.get_user(&user.user_id).await.unwrap().unwrap();
        assert_eq!(vec![course.course_id], user.enrolled_courses);
    }
}
