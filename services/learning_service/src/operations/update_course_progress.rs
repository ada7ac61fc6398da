use actix_web::http::StatusCode;
use serde::Serialize;
use service_core::endpoint_error::EndpointError;
use service_core::operation_error::OperationError;
use service_core::simple_err_map;
use thiserror::Error;
use tracing::instrument;

use super::require_id;
use crate::model::Progress;
use crate::store::Store;

#[derive(Debug)]
pub struct UpdateCourseProgressInput {
    pub user_id: String,
    pub course_id: Option<String>,
    pub lecture_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCourseProgressOutput {
    pub message: String,
    pub progress_data: Progress,
    pub completed_count: usize,
    pub total_lecture_count: usize,
    pub percentage: u32,
    pub is_completed: bool,
}

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum UpdateCourseProgressError {
    #[error("Course not found")]
    CourseNotFound,

    #[error("Lecture not found in this course")]
    LectureNotFound,
}

impl OperationError for UpdateCourseProgressError {
    fn code(&self) -> StatusCode {
        match self {
            Self::CourseNotFound | Self::LectureNotFound => StatusCode::NOT_FOUND,
        }
    }
}

/// Marks a lecture as completed. Marking it again only refreshes the completion flag.
#[instrument(skip(store))]
pub async fn update_course_progress(
    store: &(impl Store + ?Sized),
    input: UpdateCourseProgressInput,
) -> Result<UpdateCourseProgressOutput, EndpointError<UpdateCourseProgressError>> {
    let course_id = require_id(input.course_id.as_deref(), "Course")?;
    let lecture_id = input
        .lecture_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| EndpointError::validation("Lecture ID is required"))?;

    let course = store
        .get_course(&course_id)
        .await
        .map_err(simple_err_map!("Loading course failed.", EndpointError::internal()))?
        .ok_or_else(|| EndpointError::operation(UpdateCourseProgressError::CourseNotFound))?;
    if !course.has_lecture(lecture_id) {
        return Err(EndpointError::operation(UpdateCourseProgressError::LectureNotFound));
    }

    let mut progress = store
        .get_progress(&input.user_id, &course_id)
        .await
        .map_err(simple_err_map!("Loading progress failed.", EndpointError::internal()))?
        .unwrap_or_else(|| Progress::empty(&input.user_id, course_id));

    let added = progress.mark(lecture_id);
    let was_completed = progress.completed;
    let summary = progress.refresh(&course);

    if added || was_completed != progress.completed {
        store
            .put_progress(&progress)
            .await
            .map_err(simple_err_map!("Saving progress failed.", EndpointError::internal()))?;
    }

    tracing::info!(
        completed = summary.completed_lectures,
        total = summary.total_lectures,
        "Progress updated."
    );
    Ok(UpdateCourseProgressOutput {
        message: if added { "Progress updated" } else { "Lecture already completed" }.to_string(),
        progress_data: progress,
        completed_count: summary.completed_lectures,
        total_lecture_count: summary.total_lectures,
        percentage: summary.percentage,
        is_completed: summary.is_completed,
    })
}
