use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::http::StatusCode;
use actix_web::{web, FromRequest, HttpRequest};
use service_core::auth::jwt::Claims;
use service_core::endpoint_error::EndpointError;
use service_core::operation_error::OperationError;
use thiserror::Error;

use crate::context::Context;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Unauthorized access. Educator role required.")]
    NotEducator,
}

impl OperationError for AuthError {
    fn code(&self) -> StatusCode {
        match self {
            Self::NotEducator => StatusCode::FORBIDDEN,
        }
    }
}

/// Caller holding a valid bearer token.
#[derive(Debug, Clone)]
pub struct Authorization {
    pub claims: Claims,
}

/// Caller that may or may not be signed in. Invalid tokens are treated as anonymous.
#[derive(Debug, Clone)]
pub struct Viewer(pub Option<Claims>);

/// Caller whose token carries the educator role.
#[derive(Debug, Clone)]
pub struct Educator {
    pub claims: Claims,
}

impl Authorization {
    pub fn user_id(&self) -> &str {
        self.claims.user_id()
    }

    pub fn try_from_req(req: &HttpRequest) -> Result<Option<Self>, EndpointError<AuthError>> {
        let header = match req.headers().get("Authorization") {
            Some(header) => header,
            None => return Ok(None),
        };
        let token = header
            .to_str()
            .ok()
            .and_then(|h| h.strip_prefix("Bearer "))
            .ok_or_else(|| EndpointError::unauthorized("Invalid token."))?;

        let ctx = req.app_data::<web::Data<Context>>().ok_or_else(|| {
            tracing::error!("Context is not registered as app data.");
            EndpointError::internal()
        })?;
        let claims = ctx
            .tokens
            .verify(token.trim())
            .map_err(|e| EndpointError::unauthorized(e.to_string()))?;

        Ok(Some(Self { claims }))
    }

    fn required(req: &HttpRequest) -> Result<Self, EndpointError<AuthError>> {
        Self::try_from_req(req)?.ok_or_else(|| EndpointError::unauthorized("Not authorized. Login again."))
    }
}

impl FromRequest for Authorization {
    type Error = EndpointError<AuthError>;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Self::required(req))
    }
}

impl FromRequest for Viewer {
    type Error = EndpointError<AuthError>;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let claims = match Authorization::try_from_req(req) {
            Ok(auth) => auth.map(|a| a.claims),
            Err(EndpointError::Internal) => return ready(Err(EndpointError::internal())),
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring unusable token.");
                None
            }
        };
        ready(Ok(Viewer(claims)))
    }
}

impl FromRequest for Educator {
    type Error = EndpointError<AuthError>;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let result = Authorization::required(req).and_then(|auth| {
            if auth.claims.is_educator() {
                Ok(Educator { claims: auth.claims })
            } else {
                Err(EndpointError::operation(AuthError::NotEducator))
            }
        });
        ready(result)
    }
}
