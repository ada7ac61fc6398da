use std::collections::HashSet;

use actix_web::http::StatusCode;
use serde::Serialize;
use service_core::endpoint_error::EndpointError;
use service_core::operation_error::OperationError;
use service_core::simple_err_map;
use thiserror::Error;
use tracing::instrument;
use uuid::Uuid;

use crate::model::{Course, Progress, ProgressSummary};
use crate::store::Store;

#[derive(Debug, Serialize)]
pub struct EnrolledCourse {
    #[serde(flatten)]
    pub course: Course,
    pub progress: ProgressSummary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEnrolledCoursesOutput {
    pub enrolled_courses: Vec<EnrolledCourse>,
    pub message: String,
}

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ListEnrolledCoursesError {
    #[error("User not found")]
    UserNotFound,
}

impl OperationError for ListEnrolledCoursesError {
    fn code(&self) -> StatusCode {
        match self {
            Self::UserNotFound => StatusCode::NOT_FOUND,
        }
    }
}

/// Courses the user can access, with progress figures.
///
/// The successful enrollments come first, followed by courses only known to the user's cache.
/// References to deleted courses are dropped from the result and from the store, and courses the
/// ledger grants are added to the user's cache when absent. Repairs are best effort and only
/// logged when they fail.
#[instrument(skip(store))]
pub async fn list_enrolled_courses(
    store: &(impl Store + ?Sized),
    user_id: &str,
) -> Result<ListEnrolledCoursesOutput, EndpointError<ListEnrolledCoursesError>> {
    let user = store
        .get_user(user_id)
        .await
        .map_err(simple_err_map!("Loading user failed.", EndpointError::internal()))?
        .ok_or_else(|| EndpointError::operation(ListEnrolledCoursesError::UserNotFound))?;
    let enrollments = store
        .list_user_enrollments(user_id)
        .await
        .map_err(simple_err_map!("Loading enrollments failed.", EndpointError::internal()))?;

    let mut courses: Vec<Course> = Vec::new();
    let mut seen: HashSet<Uuid> = HashSet::new();
    let mut missing: HashSet<Uuid> = HashSet::new();

    for enrollment in enrollments.iter().filter(|e| e.is_active()) {
        if seen.contains(&enrollment.course_id) {
            continue;
        }
        if !missing.contains(&enrollment.course_id) {
            match load_course(store, &enrollment.course_id).await? {
                Some(course) => {
                    seen.insert(course.course_id);
                    courses.push(course);
                    continue;
                }
                None => {
                    missing.insert(enrollment.course_id);
                }
            }
        }

        tracing::warn!(enrollment_id = %enrollment.enrollment_id, "Deleting enrollment of a deleted course.");
        if let Err(e) = store.delete_enrollment(&enrollment.enrollment_id).await {
            tracing::warn!(error = ?e, "Deleting stale enrollment failed.");
        }
    }

    let ledger_courses: Vec<Uuid> = courses.iter().map(|c| c.course_id).collect();
    for course_id in &user.enrolled_courses {
        if seen.contains(course_id) || missing.contains(course_id) {
            continue;
        }
        match load_course(store, course_id).await? {
            Some(course) => {
                seen.insert(course.course_id);
                courses.push(course);
            }
            None => {
                missing.insert(*course_id);
            }
        }
    }

    let stale: Vec<Uuid> = user
        .enrolled_courses
        .iter()
        .filter(|id| missing.contains(*id))
        .copied()
        .collect();
    if !stale.is_empty() {
        tracing::warn!(user_id, removed = stale.len(), "Repairing enrolled-course cache.");
        match store.remove_enrolled_courses(user_id, &user.enrolled_courses, &stale).await {
            Ok(true) => {}
            Ok(false) => tracing::debug!(user_id, "Enrolled-course cache moved; repair left to a later read."),
            Err(e) => tracing::warn!(error = ?e, "Repairing enrolled-course cache failed."),
        }
    }
    for course_id in ledger_courses.iter().filter(|id| !user.has_course(id)) {
        if let Err(e) = store.add_enrolled_course(user_id, course_id).await {
            tracing::warn!(error = ?e, %course_id, "Adding ledger course to cache failed.");
        }
    }

    let mut enrolled_courses = Vec::with_capacity(courses.len());
    for course in courses {
        let progress = store
            .get_progress(user_id, &course.course_id)
            .await
            .map_err(simple_err_map!("Loading progress failed.", EndpointError::internal()))?;
        let progress = Progress::summarize(progress.as_ref(), &course);
        enrolled_courses.push(EnrolledCourse { course, progress });
    }

    let message = if enrolled_courses.is_empty() {
        String::from("No enrolled courses found")
    } else {
        format!("{} enrolled courses found", enrolled_courses.len())
    };

    Ok(ListEnrolledCoursesOutput {
        enrolled_courses,
        message,
    })
}

async fn load_course(
    store: &(impl Store + ?Sized),
    course_id: &Uuid,
) -> Result<Option<Course>, EndpointError<ListEnrolledCoursesError>> {
    store
        .get_course(course_id)
        .await
        .map_err(simple_err_map!("Loading course failed.", EndpointError::internal()))
}
