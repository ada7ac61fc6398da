use std::collections::HashMap;
use std::convert::Infallible;

use chrono::{DateTime, Utc};
use serde::Serialize;
use service_core::endpoint_error::EndpointError;
use service_core::simple_err_map;
use uuid::Uuid;

use crate::model::{Course, Rating};
use crate::store::{Store, StoreError};

/// Catalog entry: everything but the content and the enrolled-student cache.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseSummary {
    pub course_id: Uuid,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub discount: u8,
    pub thumbnail: String,
    pub educator_id: String,
    pub educator_name: Option<String>,
    pub ratings: Vec<Rating>,
    pub total_lectures: usize,
    pub created_at: DateTime<Utc>,
}

impl CourseSummary {
    fn new(course: Course, educator_name: Option<String>) -> Self {
        let total_lectures = course.total_lectures();
        CourseSummary {
            course_id: course.course_id,
            title: course.title,
            description: course.description,
            price: course.price,
            discount: course.discount,
            thumbnail: course.thumbnail,
            educator_id: course.educator_id,
            educator_name,
            ratings: course.ratings,
            total_lectures,
            created_at: course.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListCoursesOutput {
    pub courses: Vec<CourseSummary>,
}

pub async fn list_courses(store: &(impl Store + ?Sized)) -> Result<ListCoursesOutput, EndpointError<Infallible>> {
    let courses = store
        .list_published_courses()
        .await
        .map_err(simple_err_map!("Listing courses failed.", EndpointError::internal()))?;

    let names = educator_names(store, &courses)
        .await
        .map_err(simple_err_map!("Loading educators failed.", EndpointError::internal()))?;

    let courses = courses
        .into_iter()
        .map(|course| {
            let name = names.get(&course.educator_id).cloned();
            CourseSummary::new(course, name)
        })
        .collect();

    Ok(ListCoursesOutput { courses })
}

/// Display names of the educators owning `courses`. Educators without a user document are left out.
pub(crate) async fn educator_names(
    store: &(impl Store + ?Sized),
    courses: &[Course],
) -> Result<HashMap<String, String>, StoreError> {
    let mut names = HashMap::new();
    for course in courses {
        if names.contains_key(&course.educator_id) {
            continue;
        }
        if let Some(user) = store.get_user(&course.educator_id).await? {
            names.insert(course.educator_id.clone(), user.name);
        }
    }
    Ok(names)
}
