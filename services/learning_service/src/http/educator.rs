use actix_web::{web, HttpResponse};
use serde::Deserialize;
use service_core::endpoint_error::EndpointError;
use std::convert::Infallible;

use super::auth::{Authorization, Educator};
use super::envelope::ok;
use crate::context::Context;
use crate::operations::educator::add_course::{add_course, AddCourseError, AddCourseInput, NewCourse};
use crate::operations::educator::courses::educator_courses;
use crate::operations::educator::dashboard::educator_dashboard;
use crate::operations::educator::enrolled_students::enrolled_students;
use crate::operations::educator::update_role::{update_role, UpdateRoleError};

/// Browser clients send the course as a JSON-encoded string next to the image; API clients send
/// it inline.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CourseData {
    Inline(NewCourse),
    Encoded(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCourseRequest {
    pub course_data: CourseData,
    #[serde(default, alias = "image")]
    pub thumbnail: Option<String>,
}

pub async fn add(
    ctx: web::Data<Context>,
    educator: Educator,
    body: web::Json<AddCourseRequest>,
) -> Result<HttpResponse, EndpointError<AddCourseError>> {
    let AddCourseRequest { course_data, thumbnail } = body.into_inner();
    let course = match course_data {
        CourseData::Inline(course) => course,
        CourseData::Encoded(raw) => serde_json::from_str(&raw)
            .map_err(|e| EndpointError::validation(format!("Invalid course data: {}", e)))?,
    };
    let input = AddCourseInput {
        educator_id: educator.claims.sub,
        course,
        thumbnail,
    };

    add_course(&*ctx.store, &*ctx.media, input).await.map(ok)
}

pub async fn courses(ctx: web::Data<Context>, educator: Educator) -> Result<HttpResponse, EndpointError<Infallible>> {
    educator_courses(&*ctx.store, educator.claims.user_id()).await.map(ok)
}

pub async fn dashboard(ctx: web::Data<Context>, educator: Educator) -> Result<HttpResponse, EndpointError<Infallible>> {
    educator_dashboard(&*ctx.store, educator.claims.user_id()).await.map(ok)
}

pub async fn students(ctx: web::Data<Context>, educator: Educator) -> Result<HttpResponse, EndpointError<Infallible>> {
    enrolled_students(&*ctx.store, educator.claims.user_id()).await.map(ok)
}

/// Open to any signed-in caller: this is how a student becomes an educator.
pub async fn become_educator(
    ctx: web::Data<Context>,
    auth: Authorization,
) -> Result<HttpResponse, EndpointError<UpdateRoleError>> {
    update_role(&*ctx.identity, auth.user_id()).await.map(ok)
}
