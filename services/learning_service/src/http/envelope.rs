use actix_web::HttpResponse;
use serde::Serialize;

/// Body rendered for every successful request: the operation output with `success: true` merged
/// in. Failures are rendered by `EndpointError`.
#[derive(Debug, Serialize)]
pub struct Success<T: Serialize> {
    success: bool,
    #[serde(flatten)]
    data: T,
}

pub fn ok<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(Success { success: true, data })
}
