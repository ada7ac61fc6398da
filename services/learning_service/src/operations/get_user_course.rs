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
pub struct GetUserCourseOutput {
    pub course: Course,
}

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum GetUserCourseError {
    #[error("Course not found")]
    CourseNotFound,

    #[error("You don't have access to this course")]
    NoAccess,
}

impl OperationError for GetUserCourseError {
    fn code(&self) -> StatusCode {
        match self {
            Self::CourseNotFound => StatusCode::NOT_FOUND,
            Self::NoAccess => StatusCode::FORBIDDEN,
        }
    }
}

/// Full course content, lecture URLs included, for students and the owner.
#[instrument(skip(store))]
pub async fn get_user_course(
    store: &(impl Store + ?Sized),
    user_id: &str,
    course_id: Option<&str>,
) -> Result<GetUserCourseOutput, EndpointError<GetUserCourseError>> {
    let course_id = require_id(course_id, "Course")?;

    let course = store
        .get_course(&course_id)
        .await
        .map_err(simple_err_map!("Loading course failed.", EndpointError::internal()))?
        .ok_or_else(|| EndpointError::operation(GetUserCourseError::CourseNotFound))?;

    let allowed = has_access(store, user_id, &course)
        .await
        .map_err(simple_err_map!("Checking course access failed.", EndpointError::internal()))?;
    if !allowed {
        return Err(EndpointError::operation(GetUserCourseError::NoAccess));
    }

    Ok(GetUserCourseOutput { course })
}
