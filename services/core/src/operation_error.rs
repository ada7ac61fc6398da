use std::convert::Infallible;
use std::error::Error;

use actix_web::http::StatusCode;

/// Trait to be implemented by errors returned by the different operations of services.
pub trait OperationError: Error {
    /// HTTP status corresponding to this error.
    fn code(&self) -> StatusCode;
}

impl OperationError for Infallible {
    fn code(&self) -> StatusCode {
        match *self {}
    }
}
