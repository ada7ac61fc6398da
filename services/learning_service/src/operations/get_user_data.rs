use actix_web::http::StatusCode;
use serde::Serialize;
use service_core::endpoint_error::EndpointError;
use service_core::operation_error::OperationError;
use service_core::simple_err_map;
use thiserror::Error;

use crate::model::User;
use crate::store::Store;

#[derive(Debug, Serialize)]
pub struct GetUserDataOutput {
    pub user: User,
}

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum GetUserDataError {
    #[error("User not found")]
    UserNotFound,
}

impl OperationError for GetUserDataError {
    fn code(&self) -> StatusCode {
        match self {
            Self::UserNotFound => StatusCode::NOT_FOUND,
        }
    }
}

pub async fn get_user_data(
    store: &(impl Store + ?Sized),
    user_id: &str,
) -> Result<GetUserDataOutput, EndpointError<GetUserDataError>> {
    let user = store
        .get_user(user_id)
        .await
        .map_err(simple_err_map!("Loading user failed.", EndpointError::internal()))?
        .ok_or_else(|| EndpointError::operation(GetUserDataError::UserNotFound))?;

    Ok(GetUserDataOutput { user })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::testing::seeded;

    #[tokio::test]
    async fn returns_user_document() {
        let (store, _, user) = seeded(10.0, 0).await;

        assert_eq!(user, get_user_data(&store, "user_1").await.unwrap().user);
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let (store, _, _) = seeded(10.0, 0).await;

        let err = get_user_data(&store, "user_404").await.unwrap_err();

        assert_eq!(StatusCode::NOT_FOUND, err.code());
    }
}
