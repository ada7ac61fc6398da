//! HTTP surface: routing, authentication extractors and response rendering. Handlers only adapt
//! requests to operation inputs; every rule lives in `crate::operations`.

pub mod auth;
pub mod course;
pub mod educator;
pub mod envelope;
pub mod request_id;
pub mod user;
pub mod webhook;

use std::convert::Infallible;

use actix_web::{web, HttpResponse};
use serde::Serialize;
use service_core::endpoint_error::EndpointError;

/// Course thumbnails travel as data URIs inside the JSON body.
const JSON_LIMIT: usize = 10 * 1024 * 1024;

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

async fn health() -> HttpResponse {
    envelope::ok(Health { status: "ok" })
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().limit(JSON_LIMIT).error_handler(|err, _| {
        tracing::debug!(error = %err, "Rejecting request body.");
        EndpointError::<Infallible>::validation(format!("Invalid request body: {}", err)).into()
    })
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _| EndpointError::<Infallible>::validation(format!("Invalid query: {}", err)).into())
}

/// Registers every route. Expects a `web::Data<Context>` on the app.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .route("/health", web::get().to(health))
        .route("/webhook", web::post().to(webhook::payment))
        .route("/clerk", web::post().to(webhook::identity))
        .service(
            web::scope("/api/course")
                .route("/all", web::get().to(course::all))
                .route("/{course_id}", web::get().to(course::describe))
                .route("/{course_id}", web::delete().to(course::delete)),
        )
        .service(
            web::scope("/api/user")
                .route("/data", web::get().to(user::data))
                .route("/enrolled-courses", web::get().to(user::enrolled_courses))
                .route("/course/{course_id}", web::get().to(user::course))
                .route("/purchase", web::post().to(user::purchase))
                .route("/complete-enrollment", web::post().to(user::complete))
                .route("/update-course-progress", web::post().to(user::update_progress))
                .route("/get-course-progress", web::post().to(user::progress))
                .route("/get-course-progress", web::get().to(user::progress_query))
                .route("/add-rating", web::post().to(user::rate)),
        )
        .service(
            web::scope("/api/educator")
                .route("/update-role", web::get().to(educator::become_educator))
                .route("/add-course", web::post().to(educator::add))
                .route("/courses", web::get().to(educator::courses))
                .route("/dashboard", web::get().to(educator::dashboard))
                .route("/enrolled-students", web::get().to(educator::students)),
        );
}
