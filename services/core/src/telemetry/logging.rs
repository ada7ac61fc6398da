use std::io;

use thiserror::Error;
use tracing::subscriber::{set_global_default, SetGlobalDefaultError};
use tracing::Subscriber;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_log::log_tracer::SetLoggerError;
use tracing_log::LogTracer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Registry};

#[derive(Debug, Error)]
pub enum InitSubscriberError {
    #[error("Failed to redirect `log` records: {0}")]
    Logger(#[from] SetLoggerError),

    #[error("Failed to install the tracing subscriber: {0}")]
    Subscriber(#[from] SetGlobalDefaultError),
}

/// Compose multiple layers into a tracing subscriber.
///
/// The layers used allow filtering tracing spans based on the logging level set in `RUST_LOG`,
/// falling back to `env_filter` when the variable is absent or unparsable. The logs are sent to
/// stdout in Bunyan compatible format.
pub fn make_subscriber(name: impl Into<String>, env_filter: impl Into<String>) -> impl Subscriber + Send + Sync {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(env_filter.into()));
    let formatting_layer = BunyanFormattingLayer::new(name.into(), io::stdout);

    Registry::default()
        .with(env_filter)
        .with(JsonStorageLayer)
        .with(formatting_layer)
}

/// Initializes the given tracing subscriber by setting it as global default. This function also
/// redirects all `log` calls to the given subscriber, so dependencies logging through `log` (the
/// AWS SDK, actix) end up in the same stream.
pub fn init_subscriber(subscriber: impl Subscriber + Send + Sync) -> Result<(), InitSubscriberError> {
    LogTracer::init()?;
    set_global_default(subscriber)?;
    Ok(())
}

/// Utility macro to log information about an error and map it to some other type.
///
/// This is meant to be used in a `Result::map_err`, e.g.:
///
/// ```ignore
/// store.get_course(&id).await.map_err(simple_err_map!("Loading course failed.", EndpointError::internal()))?;
/// ```
///
/// Gets expanded into:
///
/// ```ignore
/// store.get_course(&id).await.map_err(|e| {
///     tracing::error!(error = ?e, "Loading course failed.");
///     EndpointError::internal()
/// })?;
/// ```
#[macro_export]
macro_rules! simple_err_map {
    ($msg:expr, $result:expr) => {
        |e| {
            tracing::error!(error = ?e, $msg);
            $result
        }
    };
}
