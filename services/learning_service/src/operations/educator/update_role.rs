use actix_web::http::StatusCode;
use serde::Serialize;
use service_core::endpoint_error::EndpointError;
use service_core::operation_error::OperationError;
use thiserror::Error;
use tracing::instrument;

use crate::integration::identity::{IdentityAdmin, IdentityAdminError, EDUCATOR_ROLE};

#[derive(Debug, Serialize)]
pub struct UpdateRoleOutput {
    pub message: String,
}

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum UpdateRoleError {
    #[error("{0}")]
    Identity(#[from] IdentityAdminError),
}

impl OperationError for UpdateRoleError {
    fn code(&self) -> StatusCode {
        match self {
            Self::Identity(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Grants the educator role to the caller. Takes effect with the next token the identity
/// provider issues.
#[instrument(skip(identity))]
pub async fn update_role(
    identity: &(impl IdentityAdmin + ?Sized),
    user_id: &str,
) -> Result<UpdateRoleOutput, EndpointError<UpdateRoleError>> {
    identity.set_role(user_id, EDUCATOR_ROLE).await.map_err(|e| {
        tracing::error!(error = %e, "Updating role failed.");
        EndpointError::operation(UpdateRoleError::Identity(e))
    })?;

    Ok(UpdateRoleOutput {
        message: "User role updated to educator".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::testing::FakeIdentity;

    #[tokio::test]
    async fn sets_educator_role() {
        let identity = FakeIdentity::default();

        let output = update_role(&identity, "user_1").await.unwrap();

        assert_eq!("User role updated to educator", output.message);
        assert_eq!(
            vec![("user_1".to_string(), "educator".to_string())],
            identity.recorded()
        );
    }

    #[tokio::test]
    async fn provider_failure_is_reported() {
        let identity = FakeIdentity::rejecting();

        let err = update_role(&identity, "user_1").await.unwrap_err();

        assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, err.code());
        assert!(identity.recorded().is_empty());
    }
}
