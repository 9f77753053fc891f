use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use resource_grid::config::{Config, LogFormat};
use resource_grid::middleware::{json_error_handler, query_error_handler, ErrorHandler, RequestId};
use resource_grid::modules::health::controllers::health_controller;
use resource_grid::resources::controllers::record_proxy_controller;
use resource_grid::resources::models::Record;
use resource_grid::resources::services::{
    HttpResourceService, InMemoryResourceService, RecordService, ResourceRegistry,
};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    config
        .validate()
        .context("Configuration validation failed")?;

    init_tracing(&config);

    tracing::info!("Starting resource-grid record proxy");
    tracing::info!("Environment: {}", config.app.env);
    match &config.remote.base_url {
        Some(url) => tracing::info!("Proxying record store at {}", url),
        None => tracing::info!("No upstream configured, serving records from memory"),
    }

    let registry = web::Data::new(build_registry(&config)?);

    let bind_address = config.server.bind_address();
    let server = HttpServer::new(move || {
        App::new()
            .wrap(ErrorHandler)
            .wrap(RequestId)
            .wrap(TracingLogger::default())
            .wrap(Cors::permissive())
            .app_data(registry.clone())
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(web::QueryConfig::default().error_handler(query_error_handler))
            .configure(health_controller::configure)
            .configure(record_proxy_controller::configure)
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run();

    tracing::info!("Server started at http://{}", bind_address);

    server.await?;
    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("resource_grid={},actix_web=info", config.app.log_level).into()
    });

    match config.app.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
    }
}

fn build_registry(config: &Config) -> anyhow::Result<ResourceRegistry> {
    let mut registry = ResourceRegistry::new(config.remote.default_page_size);

    for name in &config.remote.resources {
        let service: RecordService = match &config.remote.base_url {
            Some(_) => Arc::new(
                HttpResourceService::<Record, serde_json::Value>::from_config(
                    &config.remote,
                    name.clone(),
                )
                .with_context(|| format!("Failed to build client for {}", name))?,
            ),
            None => Arc::new(InMemoryResourceService::new(name.clone())),
        };
        registry.register(service);
    }

    Ok(registry)
}
