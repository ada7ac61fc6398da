use actix_web::http::header::ORIGIN;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use service_core::endpoint_error::EndpointError;
use std::convert::Infallible;

use super::auth::Authorization;
use super::envelope::ok;
use crate::context::Context;
use crate::operations::add_rating::{add_rating, AddRatingError, AddRatingInput};
use crate::operations::complete_enrollment::{complete_enrollment, CompleteEnrollmentError, CompleteEnrollmentInput};
use crate::operations::get_course_progress::get_course_progress;
use crate::operations::get_user_course::{get_user_course, GetUserCourseError};
use crate::operations::get_user_data::{get_user_data, GetUserDataError};
use crate::operations::list_enrolled_courses::{list_enrolled_courses, ListEnrolledCoursesError};
use crate::operations::purchase_course::{purchase_course, PurchaseCourseError, PurchaseCourseInput};
use crate::operations::update_course_progress::{
    update_course_progress, UpdateCourseProgressError, UpdateCourseProgressInput,
};

/// Body of the user endpoints. Every field is optional so that missing values are reported by
/// the operation with a precise message instead of a generic parse failure.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRequest {
    pub course_id: Option<String>,
    pub purchase_id: Option<String>,
    pub lecture_id: Option<String>,
    pub rating: Option<i64>,
}

pub async fn data(
    ctx: web::Data<Context>,
    auth: Authorization,
) -> Result<HttpResponse, EndpointError<GetUserDataError>> {
    get_user_data(&*ctx.store, auth.user_id()).await.map(ok)
}

pub async fn enrolled_courses(
    ctx: web::Data<Context>,
    auth: Authorization,
) -> Result<HttpResponse, EndpointError<ListEnrolledCoursesError>> {
    list_enrolled_courses(&*ctx.store, auth.user_id()).await.map(ok)
}

pub async fn course(
    ctx: web::Data<Context>,
    auth: Authorization,
    course_id: web::Path<String>,
) -> Result<HttpResponse, EndpointError<GetUserCourseError>> {
    get_user_course(&*ctx.store, auth.user_id(), Some(course_id.as_str()))
        .await
        .map(ok)
}

pub async fn purchase(
    ctx: web::Data<Context>,
    auth: Authorization,
    req: HttpRequest,
    body: web::Json<UserRequest>,
) -> Result<HttpResponse, EndpointError<PurchaseCourseError>> {
    let origin = req
        .headers()
        .get(ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let input = PurchaseCourseInput {
        user_id: auth.user_id().to_string(),
        course_id: body.into_inner().course_id,
        origin,
    };

    purchase_course(&*ctx.store, &*ctx.gateway, &ctx.settings, input)
        .await
        .map(ok)
}

pub async fn complete(
    ctx: web::Data<Context>,
    auth: Authorization,
    body: web::Json<UserRequest>,
) -> Result<HttpResponse, EndpointError<CompleteEnrollmentError>> {
    let body = body.into_inner();
    let input = CompleteEnrollmentInput {
        user_id: auth.user_id().to_string(),
        course_id: body.course_id,
        purchase_id: body.purchase_id,
    };

    complete_enrollment(&*ctx.store, input).await.map(ok)
}

pub async fn update_progress(
    ctx: web::Data<Context>,
    auth: Authorization,
    body: web::Json<UserRequest>,
) -> Result<HttpResponse, EndpointError<UpdateCourseProgressError>> {
    let body = body.into_inner();
    let input = UpdateCourseProgressInput {
        user_id: auth.user_id().to_string(),
        course_id: body.course_id,
        lecture_id: body.lecture_id,
    };

    update_course_progress(&*ctx.store, input).await.map(ok)
}

pub async fn progress(
    ctx: web::Data<Context>,
    auth: Authorization,
    body: web::Json<UserRequest>,
) -> Result<HttpResponse, EndpointError<Infallible>> {
    get_course_progress(&*ctx.store, auth.user_id(), body.course_id.as_deref())
        .await
        .map(ok)
}

/// Same as [`progress`], for clients sending the course id in the query string.
pub async fn progress_query(
    ctx: web::Data<Context>,
    auth: Authorization,
    query: web::Query<UserRequest>,
) -> Result<HttpResponse, EndpointError<Infallible>> {
    get_course_progress(&*ctx.store, auth.user_id(), query.course_id.as_deref())
        .await
        .map(ok)
}

pub async fn rate(
    ctx: web::Data<Context>,
    auth: Authorization,
    body: web::Json<UserRequest>,
) -> Result<HttpResponse, EndpointError<AddRatingError>> {
    let body = body.into_inner();
    let input = AddRatingInput {
        user_id: auth.user_id().to_string(),
        course_id: body.course_id,
        rating: body.rating,
    };

    add_rating(&*ctx.store, input).await.map(ok)
}
