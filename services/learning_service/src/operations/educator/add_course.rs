use actix_web::http::StatusCode;
use serde::{Deserialize, Serialize};
use service_core::endpoint_error::EndpointError;
use service_core::operation_error::OperationError;
use service_core::simple_err_map;
use thiserror::Error;
use tracing::instrument;
use uuid::Uuid;

use crate::integration::media::MediaHost;
use crate::model::{Chapter, Course};
use crate::store::Store;

/// Course fields an educator provides.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCourse {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub discount: u8,
    #[serde(default = "published")]
    pub is_published: bool,
    #[serde(default)]
    pub content: Vec<Chapter>,
}

fn published() -> bool {
    true
}

#[derive(Debug)]
pub struct AddCourseInput {
    pub educator_id: String,
    pub course: NewCourse,
    /// Data URI (or remote URL) of the thumbnail image.
    pub thumbnail: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCourseOutput {
    pub message: String,
    pub course_id: Uuid,
}

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum AddCourseError {
    #[error("Thumbnail is not attached.")]
    MissingThumbnail,
}

impl OperationError for AddCourseError {
    fn code(&self) -> StatusCode {
        match self {
            Self::MissingThumbnail => StatusCode::BAD_REQUEST,
        }
    }
}

/// Validates and stores a new course owned by the caller, with its thumbnail uploaded to the
/// media host. Nothing is stored when the upload fails.
#[instrument(skip(store, media, input), fields(educator_id = %input.educator_id))]
pub async fn add_course(
    store: &(impl Store + ?Sized),
    media: &(impl MediaHost + ?Sized),
    input: AddCourseInput,
) -> Result<AddCourseOutput, EndpointError<AddCourseError>> {
    let thumbnail = input
        .thumbnail
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| EndpointError::operation(AddCourseError::MissingThumbnail))?;

    let NewCourse {
        title,
        description,
        price,
        discount,
        is_published,
        content,
    } = input.course;
    let mut course = Course::builder()
        .title(title)
        .description(description)
        .price(price)
        .discount(discount)
        .is_published(is_published)
        .content(content)
        .educator_id(input.educator_id)
        .build();
    course
        .validate()
        .map_err(|e| EndpointError::validation(e.to_string()))?;

    course.thumbnail = media
        .upload_image(&thumbnail)
        .await
        .map_err(simple_err_map!("Uploading thumbnail failed.", EndpointError::internal()))?;

    store
        .put_course(&course)
        .await
        .map_err(simple_err_map!("Saving course failed.", EndpointError::internal()))?;

    tracing::info!(course_id = %course.course_id, "Course added.");
    Ok(AddCourseOutput {
        message: "Course added".to_string(),
        course_id: course.course_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::course::fixtures::lecture;
    use crate::operations::testing::FakeMedia;
    use crate::store::{CourseRepository, MemoryStore};

    fn new_course(discount: u8) -> NewCourse {
        serde_json::from_value(serde_json::json!({
            "title": "Async Rust",
            "price": 30.0,
            "discount": discount,
            "content": [{ "chapterId": "c1", "title": "Futures", "lectures": [] }]
        }))
        .unwrap()
    }

    fn input(course: NewCourse, thumbnail: Option<&str>) -> AddCourseInput {
        AddCourseInput {
            educator_id: "educator_1".to_string(),
            course,
            thumbnail: thumbnail.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn stores_course_with_uploaded_thumbnail() {
        let store = MemoryStore::new();

        let output = add_course(&store, &FakeMedia, input(new_course(10), Some("data:image/png;base64,AAAA")))
            .await
            .unwrap();

        let course = store.get_course(&output.course_id).await.unwrap().unwrap();
        assert_eq!("https://media.test/thumbnail.png", course.thumbnail);
        assert_eq!("educator_1", course.educator_id);
        assert!(course.is_published);
        assert!(course.enrolled_students.is_empty());
    }

    #[tokio::test]
    async fn thumbnail_is_required() {
        let store = MemoryStore::new();

        let err = add_course(&store, &FakeMedia, input(new_course(10), None)).await.unwrap_err();

        assert!(matches!(err, EndpointError::Operation(AddCourseError::MissingThumbnail)));
    }

    #[tokio::test]
    async fn invalid_course_is_rejected_before_upload() {
        let store = MemoryStore::new();
        let mut course = new_course(0);
        let mut broken = lecture("l1", false);
        broken.duration_minutes = -3.0;
        course.content[0].lectures.push(broken);

        let err = add_course(&store, &FakeMedia, input(course, Some("not-an-image"))).await.unwrap_err();

        assert!(matches!(err, EndpointError::Validation(msg) if msg == "Lecture l1 has a negative duration."));
    }

    #[tokio::test]
    async fn failed_upload_stores_nothing() {
        let store = MemoryStore::new();

        let err = add_course(&store, &FakeMedia, input(new_course(0), Some("not-an-image")))
            .await
            .unwrap_err();

        assert!(matches!(err, EndpointError::Internal));
        assert!(store.list_educator_courses("educator_1").await.unwrap().is_empty());
    }
}
