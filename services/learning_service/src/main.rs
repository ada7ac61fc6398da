use actix_web::{web, App, HttpServer};
use learning_service::context::Context;
use learning_service::http::configure;
use learning_service::http::request_id::RequestIdHeader;
use service_core::telemetry::logging::{init_subscriber, make_subscriber};
use tracing_actix_web::TracingLogger;

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_subscriber(make_subscriber("learning_service", "info"))?;

    let ctx = Context::from_env().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to build service context.");
        e
    })?;
    let bind_address = ctx.settings.bind_address.clone();
    let ctx = web::Data::new(ctx);

    tracing::info!(%bind_address, "Starting learning service.");
    HttpServer::new(move || {
        App::new()
            .wrap(RequestIdHeader)
            .wrap(TracingLogger::default())
            .app_data(ctx.clone())
            .configure(configure)
    })
    .bind(bind_address)?
    .run()
    .await?;

    Ok(())
}
