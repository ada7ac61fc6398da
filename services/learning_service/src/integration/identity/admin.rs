use async_trait::async_trait;
use serde_json::json;
use thiserror::Error;
use tracing::instrument;

const DEFAULT_API_BASE: &str = "https://api.clerk.com";

pub const EDUCATOR_ROLE: &str = "educator";

#[derive(Debug, Error)]
pub enum IdentityAdminError {
    #[error("Identity provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Identity provider rejected the update with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Account administration at the identity provider.
#[async_trait]
pub trait IdentityAdmin: Send + Sync {
    /// Sets the role carried in the account's public metadata, and so in its next tokens.
    async fn set_role(&self, user_id: &str, role: &str) -> Result<(), IdentityAdminError>;
}

pub struct ClerkAdmin {
    http: reqwest::Client,
    api_base: String,
    secret_key: String,
}

impl ClerkAdmin {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            secret_key: secret_key.into(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }
}

fn metadata_body(role: &str) -> serde_json::Value {
    json!({ "public_metadata": { "role": role } })
}

#[async_trait]
impl IdentityAdmin for ClerkAdmin {
    #[instrument(skip(self))]
    async fn set_role(&self, user_id: &str, role: &str) -> Result<(), IdentityAdminError> {
        let response = self
            .http
            .patch(format!("{}/v1/users/{}/metadata", self.api_base, user_id))
            .bearer_auth(&self.secret_key)
            .json(&metadata_body(role))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IdentityAdminError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!("Role updated.");
        Ok(())
    }
}
