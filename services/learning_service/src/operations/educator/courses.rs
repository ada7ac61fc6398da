use std::convert::Infallible;

use serde::Serialize;
use service_core::endpoint_error::EndpointError;
use service_core::simple_err_map;

use crate::model::Course;
use crate::store::Store;

#[derive(Debug, Serialize)]
pub struct EducatorCoursesOutput {
    pub courses: Vec<Course>,
}

/// Every course owned by the educator, drafts included.
pub async fn educator_courses(
    store: &(impl Store + ?Sized),
    educator_id: &str,
) -> Result<EducatorCoursesOutput, EndpointError<Infallible>> {
    let courses = store
        .list_educator_courses(educator_id)
        .await
        .map_err(simple_err_map!("Listing educator courses failed.", EndpointError::internal()))?;

    Ok(EducatorCoursesOutput { courses })
}
