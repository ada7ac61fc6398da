use actix_web::{web, HttpResponse};
use service_core::endpoint_error::EndpointError;
use std::convert::Infallible;

use super::auth::{Authorization, Viewer};
use super::envelope::ok;
use crate::context::Context;
use crate::operations::delete_course::{delete_course, DeleteCourseError};
use crate::operations::describe_course::{describe_course, DescribeCourseError};
use crate::operations::list_courses::list_courses;

pub async fn all(ctx: web::Data<Context>) -> Result<HttpResponse, EndpointError<Infallible>> {
    list_courses(&*ctx.store).await.map(ok)
}

pub async fn describe(
    ctx: web::Data<Context>,
    viewer: Viewer,
    course_id: web::Path<String>,
) -> Result<HttpResponse, EndpointError<DescribeCourseError>> {
    let viewer = viewer.0.as_ref().map(|claims| claims.user_id());
    describe_course(&*ctx.store, viewer, Some(course_id.as_str())).await.map(ok)
}

pub async fn delete(
    ctx: web::Data<Context>,
    auth: Authorization,
    course_id: web::Path<String>,
) -> Result<HttpResponse, EndpointError<DeleteCourseError>> {
    delete_course(&*ctx.store, auth.user_id(), Some(course_id.as_str()))
        .await
        .map(ok)
}
