use core::fmt;
use std::env;
use std::str::FromStr;
use std::sync::Arc;

use service_core::ddb::Adapter;
use thiserror::Error;
use typed_builder::TypedBuilder;

use crate::integration::identity::{ClerkAdmin, IdentityAdmin, TokenError, TokenVerifier};
use crate::integration::media::{Cloudinary, MediaHost};
use crate::integration::payment::{PaymentGateway, StripeGateway};
use crate::integration::signature::DEFAULT_TOLERANCE_SECS;
use crate::store::{DdbStore, MemoryStore, Store, TableNames};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContextKey {
    BindAddress,
    StoreBackend,
    DynamoDbEndpoint,
    CoursesTableName,
    UsersTableName,
    PurchasesTableName,
    EnrollmentsTableName,
    ProgressTableName,
    AccessTokenSecret,
    StripeSecretKey,
    StripeWebhookSecret,
    Currency,
    DefaultOrigin,
    IdentityWebhookSecret,
    IdentitySecretKey,
    CloudinaryCloudName,
    CloudinaryApiKey,
    CloudinaryApiSecret,
}

impl fmt::Display for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Self::BindAddress => "BIND_ADDRESS",
            Self::StoreBackend => "STORE_BACKEND",
            Self::DynamoDbEndpoint => "DYNAMODB_ENDPOINT",
            Self::CoursesTableName => "COURSES_TABLE_NAME",
            Self::UsersTableName => "USERS_TABLE_NAME",
            Self::PurchasesTableName => "PURCHASES_TABLE_NAME",
            Self::EnrollmentsTableName => "ENROLLMENTS_TABLE_NAME",
            Self::ProgressTableName => "PROGRESS_TABLE_NAME",
            Self::AccessTokenSecret => "ACCESS_TOKEN_SECRET",
            Self::StripeSecretKey => "STRIPE_SECRET_KEY",
            Self::StripeWebhookSecret => "STRIPE_WEBHOOK_SECRET",
            Self::Currency => "CURRENCY",
            Self::DefaultOrigin => "DEFAULT_ORIGIN",
            Self::IdentityWebhookSecret => "IDENTITY_WEBHOOK_SECRET",
            Self::IdentitySecretKey => "IDENTITY_SECRET_KEY",
            Self::CloudinaryCloudName => "CLOUDINARY_CLOUD_NAME",
            Self::CloudinaryApiKey => "CLOUDINARY_API_KEY",
            Self::CloudinaryApiSecret => "CLOUDINARY_API_SECRET",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("Environment variable {0} not set.")]
    Missing(ContextKey),

    #[error("Environment variable {key} is invalid: {reason}")]
    Invalid { key: ContextKey, reason: String },

    #[error("Access token secret is unusable: {0}")]
    Token(#[from] TokenError),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StoreBackend {
    DynamoDb,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dynamodb" => Ok(Self::DynamoDb),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown store backend `{}`", other)),
        }
    }
}

/// Plain values read once at startup.
#[derive(Debug, Clone, TypedBuilder)]
pub struct Settings {
    #[builder(default = String::from("0.0.0.0:4000"), setter(into))]
    pub bind_address: String,

    #[builder(default = String::from("usd"), setter(into))]
    pub currency: String,

    #[builder(default = String::from("http://localhost:5173"), setter(into))]
    pub default_origin: String,

    #[builder(setter(into))]
    pub payment_webhook_secret: String,

    #[builder(setter(into))]
    pub identity_webhook_secret: String,

    #[builder(default = DEFAULT_TOLERANCE_SECS)]
    pub signature_tolerance_secs: i64,
}

/// Service handles shared by every worker.
#[derive(Clone, TypedBuilder)]
pub struct Context {
    pub store: Arc<dyn Store>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub media: Arc<dyn MediaHost>,
    pub identity: Arc<dyn IdentityAdmin>,
    pub tokens: TokenVerifier,
    pub settings: Settings,
}

impl Context {
    pub async fn from_env() -> Result<Self, ContextError> {
        let backend = match Self::key(ContextKey::StoreBackend) {
            Some(raw) => raw.parse().map_err(|reason| ContextError::Invalid {
                key: ContextKey::StoreBackend,
                reason,
            })?,
            None => StoreBackend::DynamoDb,
        };

        let store: Arc<dyn Store> = match backend {
            StoreBackend::DynamoDb => Arc::new(DdbStore::new(Self::dynamodb_adapter().await?, Self::table_names()?)),
            StoreBackend::Memory => {
                tracing::warn!("Using the in-memory store; data is lost on shutdown.");
                Arc::new(MemoryStore::new())
            }
        };

        let settings = Settings::builder()
            .bind_address(Self::key_or(ContextKey::BindAddress, "0.0.0.0:4000"))
            .currency(Self::key_or(ContextKey::Currency, "usd"))
            .default_origin(Self::key_or(ContextKey::DefaultOrigin, "http://localhost:5173"))
            .payment_webhook_secret(Self::required(ContextKey::StripeWebhookSecret)?)
            .identity_webhook_secret(Self::required(ContextKey::IdentityWebhookSecret)?)
            .build();

        Ok(Context {
            store,
            gateway: Arc::new(StripeGateway::new(Self::required(ContextKey::StripeSecretKey)?)),
            media: Arc::new(Cloudinary::new(
                Self::required(ContextKey::CloudinaryCloudName)?,
                Self::required(ContextKey::CloudinaryApiKey)?,
                Self::required(ContextKey::CloudinaryApiSecret)?,
            )),
            identity: Arc::new(ClerkAdmin::new(Self::required(ContextKey::IdentitySecretKey)?)),
            tokens: TokenVerifier::from_base64_secret(&Self::required(ContextKey::AccessTokenSecret)?)?,
            settings,
        })
    }

    async fn dynamodb_adapter() -> Result<Adapter, ContextError> {
        let shared_config = aws_config::load_from_env().await;

        let dynamodb_config = if let Some(endpoint) = Self::key(ContextKey::DynamoDbEndpoint) {
            let uri = http::Uri::from_str(&endpoint).map_err(|e| ContextError::Invalid {
                key: ContextKey::DynamoDbEndpoint,
                reason: e.to_string(),
            })?;
            tracing::info!(%endpoint, "Using DynamoDB with custom endpoint.");
            aws_sdk_dynamodb::config::Builder::from(&shared_config)
                .endpoint_resolver(aws_sdk_dynamodb::Endpoint::immutable(uri))
                .build()
        } else {
            aws_sdk_dynamodb::config::Config::new(&shared_config)
        };

        Ok(aws_sdk_dynamodb::Client::from_conf(dynamodb_config).into())
    }

    fn table_names() -> Result<TableNames, ContextError> {
        Ok(TableNames::builder()
            .courses(Self::required(ContextKey::CoursesTableName)?)
            .users(Self::required(ContextKey::UsersTableName)?)
            .purchases(Self::required(ContextKey::PurchasesTableName)?)
            .enrollments(Self::required(ContextKey::EnrollmentsTableName)?)
            .progress(Self::required(ContextKey::ProgressTableName)?)
            .build())
    }

    pub fn key(key: ContextKey) -> Option<String> {
        env::var(key.to_string()).ok().filter(|v| !v.is_empty())
    }

    fn key_or(key: ContextKey, default: &str) -> String {
        Self::key(key).unwrap_or_else(|| default.to_string())
    }

    fn required(key: ContextKey) -> Result<String, ContextError> {
        Self::key(key).ok_or(ContextError::Missing(key))
    }
}
