//! # YONI Webhooks
//!
//! Entry point for the webhook intake server.
//! Configures telemetry, the processed-event store, SSL and route handling.
#![recursion_limit = "256"]

pub mod clock;
pub mod config;
pub mod consts;
pub mod metric;
pub mod models;
pub mod repo;
pub mod services;
pub mod utils;
pub mod webhook;

use anyhow::Context;
use logfire::config::MetricsOptions;
use ntex::web;
use openssl::ssl::{SslAcceptor, SslFiletype, SslMethod};
use std::sync::Arc;

#[ntex::main]
async fn main() -> anyhow::Result<()> {
    // Initialize configuration
    config::init_config()?;

    let app_config = config::APP_CONFIG
        .get()
        .context("failed to get app config")?;

    // Initialize logging and metrics
    let mut logfire_config = logfire::configure()
        .install_panic_handler()
        .with_metrics(Some(MetricsOptions::default()))
        .send_to_logfire(logfire::config::SendToLogfire::IfTokenPresent);
    if let Some(token) = &app_config.logfire_token {
        logfire_config = logfire_config.with_token(token);
    }
    let shutdown_handler = logfire_config.finish()?;

    warn_missing_secrets(app_config);

    let clock: Arc<dyn clock::Clock> = Arc::new(clock::SystemClock);
    let event_store = setup_event_store(app_config, clock.clone()).await?;

    let github_service = app_config
        .github_app_installation_token
        .as_deref()
        .filter(|token| !token.is_empty())
        .map(|token| {
            Arc::new(services::github::GithubHandler::new(token)) as services::ImplGithubService
        });

    configure_and_run_server(event_store, clock, github_service).await?;

    shutdown_handler.shutdown()?;

    Ok(())
}

/// A provider without secret still starts; its deliveries are answered with a 500.
fn warn_missing_secrets(app_config: &config::AppConfig) {
    for provider in webhook::build_providers(app_config, None).values() {
        if !provider.has_secret() {
            logfire::warn!(
                "Webhook secret for {provider} is not configured, its deliveries will be rejected",
                provider = provider.name.clone()
            );
        }
    }
}

/// Builds the processed-event store selected by `DEDUP_BACKEND`
async fn setup_event_store(
    app_config: &config::AppConfig,
    clock: Arc<dyn clock::Clock>,
) -> anyhow::Result<repo::ImplEventStore> {
    let retention = app_config.dedup_retention();

    match app_config.dedup_backend()? {
        config::DedupBackend::Memory => {
            logfire::warn!(
                "Using the in-memory event store: processed events are lost on restart and not shared between instances"
            );
            Ok(Arc::new(repo::in_memory::InMemoryEventStore::new(
                retention, clock,
            )))
        }
        config::DedupBackend::Sqlite => {
            let sqlite_store = repo::sqlite::SqlxSqliteEventStore {
                db_pool: utils::setup_sqlite_db_pool(
                    &app_config.db_host,
                    app_config.db_pass_encrypt.as_deref(),
                )
                .await?,
                retention,
                clock,
            };
            sqlite_store.ensure_schema().await?;

            Ok(Arc::new(sqlite_store))
        }
    }
}

/// Configures SSL acceptor for production environments
fn setup_ssl_acceptor(
    app_config: &config::AppConfig,
) -> anyhow::Result<openssl::ssl::SslAcceptorBuilder> {
    let mut ssl_acceptor = SslAcceptor::mozilla_intermediate(SslMethod::tls_server())
        .map_err(|e| anyhow::anyhow!("Failed to create SSL acceptor: {}", e))?;

    ssl_acceptor
        .set_private_key_file(&app_config.private_key_path, SslFiletype::PEM)
        .map_err(|e| {
            anyhow::anyhow!(
                "Failed to load private key from {}: {}",
                app_config.private_key_path,
                e
            )
        })?;

    ssl_acceptor
        .set_certificate_file(&app_config.certificate_path, SslFiletype::PEM)
        .map_err(|e| {
            anyhow::anyhow!(
                "Failed to load certificate from {}: {}",
                app_config.certificate_path,
                e
            )
        })?;

    Ok(ssl_acceptor)
}

/// Creates application state for one worker
///
/// Providers are rebuilt per worker; the event store is shared so a redelivery
/// landing on another worker is still detected.
fn create_app_state(
    app_config: &config::AppConfig,
    event_store: repo::ImplEventStore,
    clock: Arc<dyn clock::Clock>,
    github_service: Option<services::ImplGithubService>,
) -> webhook::AppState {
    webhook::AppState {
        providers: webhook::build_providers(app_config, github_service),
        event_store,
        clock,
    }
}

async fn serve_not_found() -> web::HttpResponse {
    web::HttpResponse::NotFound().json(&serde_json::json!({ "error": "not found" }))
}

/// Configures and starts the web server with appropriate SSL settings
async fn configure_and_run_server(
    event_store: repo::ImplEventStore,
    clock: Arc<dyn clock::Clock>,
    github_service: Option<services::ImplGithubService>,
) -> anyhow::Result<()> {
    let app_config = config::APP_CONFIG
        .get()
        .context("failed to get app config")?;
    let server_addr = (
        app_config.web_server_host.clone(),
        app_config.web_server_port,
    );

    let server = web::server(move || {
        web::App::new()
            .wrap(web::middleware::Logger::default())
            .wrap(web::middleware::Compress::default())
            .state(create_app_state(
                app_config,
                event_store.clone(),
                clock.clone(),
                github_service.clone(),
            ))
            .configure(webhook::routes::webhooks)
            .default_service(web::route().to(serve_not_found))
    });

    logfire::info!(
        "Listening on {host}:{port}",
        host = app_config.web_server_host.clone(),
        port = app_config.web_server_port.to_string()
    );

    let bound_server = if app_config.is_prod() {
        let ssl_acceptor = setup_ssl_acceptor(app_config)?;
        server.bind_openssl(server_addr, ssl_acceptor)?
    } else {
        server.bind(server_addr)?
    };

    bound_server
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))
}
