//! # WhatsApp Flows Endpoint
//!
//! Main entry point of the encrypted data exchange endpoint used by
//! WhatsApp Flows. Loads configuration, sets up logging and serves the
//! endpoint routes.

pub mod config;
pub mod consts;
pub mod metric;
pub mod webhook;

use anyhow::Context;
use envconfig::Envconfig;
use logfire::config::SendToLogfire;
use ntex::web;
use openssl::ssl::{SslAcceptor, SslFiletype, SslMethod};
use std::sync::Arc;
use webhook::flows::{handler::FlowEndpoint, logic::DefaultFlowLogic};

#[ntex::main]
async fn main() -> anyhow::Result<()> {
    let app_config = config::AppConfig::init_from_env()
        .context("failed to load app config from environment variables")?;

    // Initialize logging and metrics
    let mut logfire_config = logfire::configure()
        .install_panic_handler()
        .send_to_logfire(SendToLogfire::IfTokenPresent);
    if let Some(token) = &app_config.logfire_token {
        logfire_config = logfire_config.with_token(token.clone());
    }
    let shutdown_handler = logfire_config.finish()?;

    let settings = app_config.endpoint_settings();
    match &settings.private_key {
        Some(private_key) => {
            if let Err(e) = private_key.load() {
                logfire::warn!(
                    "PRIVATE_KEY could not be loaded, data exchanges will fail with 421: {error}",
                    error = e.to_string()
                );
            }
        }
        None => {
            logfire::warn!("PRIVATE_KEY is not set, data exchanges will fail with 500");
        }
    }

    let flow_endpoint = FlowEndpoint::new(settings, Arc::new(DefaultFlowLogic));

    configure_and_run_server(&app_config, flow_endpoint).await?;

    shutdown_handler.shutdown()?;

    Ok(())
}

/// Configures SSL acceptor for production environments
fn setup_ssl_acceptor(
    app_config: &config::AppConfig,
) -> anyhow::Result<openssl::ssl::SslAcceptorBuilder> {
    let certificate_path = app_config
        .tls_certificate_path
        .as_deref()
        .context("TLS_CERTIFICATE_PATH is required in prod")?;
    let private_key_path = app_config
        .tls_private_key_path
        .as_deref()
        .context("TLS_PRIVATE_KEY_PATH is required in prod")?;

    let mut ssl_acceptor = SslAcceptor::mozilla_intermediate(SslMethod::tls_server())
        .map_err(|e| anyhow::anyhow!("Failed to create SSL acceptor: {}", e))?;

    ssl_acceptor
        .set_private_key_file(private_key_path, SslFiletype::PEM)
        .map_err(|e| {
            anyhow::anyhow!(
                "Failed to load private key from {}: {}",
                private_key_path,
                e
            )
        })?;

    ssl_acceptor
        .set_certificate_file(certificate_path, SslFiletype::PEM)
        .map_err(|e| {
            anyhow::anyhow!(
                "Failed to load certificate from {}: {}",
                certificate_path,
                e
            )
        })?;

    Ok(ssl_acceptor)
}

/// Configures and starts the web server with appropriate SSL settings
async fn configure_and_run_server(
    app_config: &config::AppConfig,
    flow_endpoint: FlowEndpoint,
) -> anyhow::Result<()> {
    let server_addr = (app_config.host.clone(), app_config.port);

    let server = web::server(move || {
        web::App::new()
            .wrap(web::middleware::Logger::default())
            .state(flow_endpoint.clone())
            .configure(webhook::routes::flows)
            .default_service(web::route().to(webhook::flows::method_not_allowed))
    });

    let bound_server = if app_config.is_prod() {
        let ssl_acceptor = setup_ssl_acceptor(app_config)?;
        server.bind_openssl(server_addr, ssl_acceptor)?
    } else {
        server.bind(server_addr)?
    };

    logfire::info!(
        "Server is listening on {host}:{port}",
        host = app_config.host.clone(),
        port = i64::from(app_config.port)
    );

    bound_server
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))
}
