use actix_web::http::StatusCode;
use serde::Serialize;
use service_core::endpoint_error::EndpointError;
use service_core::operation_error::OperationError;
use service_core::simple_err_map;
use thiserror::Error;
use tracing::instrument;

use super::{has_access, require_id};
use crate::model::Course;
use crate::store::Store;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DescribeCourseOutput {
    pub course_data: Course,
    pub educator_name: Option<String>,
}

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DescribeCourseError {
    #[error("Course not found")]
    CourseNotFound,
}

impl OperationError for DescribeCourseError {
    fn code(&self) -> StatusCode {
        match self {
            Self::CourseNotFound => StatusCode::NOT_FOUND,
        }
    }
}

/// Public course page. Video URLs of locked lectures are blanked unless the viewer has access.
#[instrument(skip(store))]
pub async fn describe_course(
    store: &(impl Store + ?Sized),
    viewer: Option<&str>,
    course_id: Option<&str>,
) -> Result<DescribeCourseOutput, EndpointError<DescribeCourseError>> {
    let course_id = require_id(course_id, "Course")?;

    let mut course = store
        .get_course(&course_id)
        .await
        .map_err(simple_err_map!("Loading course failed.", EndpointError::internal()))?
        .ok_or_else(|| EndpointError::operation(DescribeCourseError::CourseNotFound))?;

    let unlocked = match viewer {
        Some(user_id) => has_access(store, user_id, &course)
            .await
            .map_err(simple_err_map!("Checking course access failed.", EndpointError::internal()))?,
        None => false,
    };
    if !unlocked {
        course.redact_locked_lectures();
    }

    let educator_name = store
        .get_user(&course.educator_id)
        .await
        .map_err(simple_err_map!("Loading educator failed.", EndpointError::internal()))?
        .map(|user| user.name);

    Ok(DescribeCourseOutput {
        course_data: course,
        educator_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::activate_enrollments;
    use crate::operations::testing::seeded;

    fn urls(course: &Course) -> Vec<(&str, bool)> {
        course
            .lectures()
            .map(|l| (l.lecture_id.as_str(), !l.url.is_empty()))
            .collect()
    }

    #[tokio::test]
    async fn anonymous_viewer_sees_previews_only() {
        let (store, course, _) = seeded(10.0, 0).await;

        let output = describe_course(&store, None, Some(&course.course_id.to_string()))
            .await
            .unwrap();

        assert_eq!(vec![("l1", true), ("l2", false), ("l3", false)], urls(&output.course_data));
    }

    #[tokio::test]
    async fn enrolled_viewer_sees_everything() {
        let (store, course, _) = seeded(10.0, 0).await;
        activate_enrollments(&store, "user_1", &course.course_id, None).await.unwrap();

        let output = describe_course(&store, Some("user_1"), Some(&course.course_id.to_string()))
            .await
            .unwrap();

        assert_eq!(vec![("l1", true), ("l2", true), ("l3", true)], urls(&output.course_data));
    }

    #[tokio::test]
    async fn unknown_course_is_not_found() {
        let (store, _, _) = seeded(10.0, 0).await;

        let err = describe_course(&store, None, Some(&uuid::Uuid::new_v4().to_string()))
            .await
            .unwrap_err();

        assert_eq!(StatusCode::NOT_FOUND, err.code());
    }
}
