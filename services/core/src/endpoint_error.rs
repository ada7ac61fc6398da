use std::error::Error;
use std::fmt::Display;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use strum::AsRefStr;

use crate::operation_error::OperationError;

#[derive(Debug, AsRefStr)]
pub enum EndpointError<E: OperationError> {
    Validation(String),
    Unauthorized(String),
    Internal,
    Operation(E),
}

/// Body rendered for every failed request.
#[derive(Debug, Serialize)]
pub struct FailureBody {
    pub success: bool,
    pub message: String,
}

impl<E: OperationError> EndpointError<E> {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn internal() -> Self {
        Self::Internal
    }

    pub fn operation(err: E) -> Self {
        Self::Operation(err)
    }

    /// Human readable message, without the kind prefix used by `Display`.
    pub fn message(&self) -> String {
        match self {
            EndpointError::Validation(msg) | EndpointError::Unauthorized(msg) => msg.clone(),
            EndpointError::Internal => String::from("Internal server error."),
            EndpointError::Operation(err) => err.to_string(),
        }
    }

    /// Re-targets the operation error, keeping the generic variants as they are.
    pub fn map_operation<F: OperationError>(self, f: impl FnOnce(E) -> F) -> EndpointError<F> {
        match self {
            EndpointError::Validation(msg) => EndpointError::Validation(msg),
            EndpointError::Unauthorized(msg) => EndpointError::Unauthorized(msg),
            EndpointError::Internal => EndpointError::Internal,
            EndpointError::Operation(e) => EndpointError::Operation(f(e)),
        }
    }
}

impl<E: OperationError> OperationError for EndpointError<E> {
    fn code(&self) -> StatusCode {
        match self {
            EndpointError::Validation(_) => StatusCode::BAD_REQUEST,
            EndpointError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            EndpointError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            EndpointError::Operation(e) => e.code(),
        }
    }
}

impl<E: OperationError> Error for EndpointError<E> {}

impl<E: OperationError> Display for EndpointError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind: &str = self.as_ref();
        write!(f, "{}: {}", kind, self.message())
    }
}

impl<E: OperationError + 'static> ResponseError for EndpointError<E> {
    fn status_code(&self) -> StatusCode {
        self.code()
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.code()).json(FailureBody {
            success: false,
            message: self.message(),
        })
    }
}
