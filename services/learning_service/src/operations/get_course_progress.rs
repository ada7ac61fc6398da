use std::convert::Infallible;

use serde::Serialize;
use service_core::endpoint_error::EndpointError;
use service_core::simple_err_map;
use tracing::instrument;

use super::require_id;
use crate::model::Progress;
use crate::store::Store;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetCourseProgressOutput {
    pub progress_data: Progress,
}

/// The caller's progress record, or an empty one when nothing was completed yet.
#[instrument(skip(store))]
pub async fn get_course_progress(
    store: &(impl Store + ?Sized),
    user_id: &str,
    course_id: Option<&str>,
) -> Result<GetCourseProgressOutput, EndpointError<Infallible>> {
    let course_id = require_id(course_id, "Course")?;

    let progress_data = store
        .get_progress(user_id, &course_id)
        .await
        .map_err(simple_err_map!("Loading progress failed.", EndpointError::internal()))?
        .unwrap_or_else(|| Progress::empty(user_id, course_id));

    Ok(GetCourseProgressOutput { progress_data })
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::store::{MemoryStore, ProgressRepository};

    #[tokio::test]
    async fn defaults_to_empty_record() {
        let store = MemoryStore::new();
        let course_id = Uuid::new_v4();

        let output = get_course_progress(&store, "user_1", Some(&course_id.to_string()))
            .await
            .unwrap();

        assert_eq!(Progress::empty("user_1", course_id), output.progress_data);
    }

    #[tokio::test]
    async fn returns_stored_record() {
        let store = MemoryStore::new();
        let course_id = Uuid::new_v4();
        let mut progress = Progress::empty("user_1", course_id);
        progress.mark("l1");
        store.put_progress(&progress).await.unwrap();

        let output = get_course_progress(&store, "user_1", Some(&course_id.to_string()))
            .await
            .unwrap();

        assert_eq!(progress, output.progress_data);
    }

    #[tokio::test]
    async fn requires_course_id() {
        let store = MemoryStore::new();

        let err = get_course_progress(&store, "user_1", None).await.unwrap_err();

        assert_eq!("Course ID is required", err.message());
    }
}
