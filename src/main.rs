//! Contact Gateway
//!
//! Backend for a company website's contact form, newsletter sign-up,
//! inbound email replies and news feed.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌────────────────────────────────────────────────────┐
//!                     │                  CONTACT GATEWAY                   │
//!                     │                                                    │
//!   Browser / mail    │  ┌─────────┐   ┌───────────┐   ┌───────────────┐   │
//!   provider request  │  │  http   │──▶│ security  │──▶│   handlers    │   │
//!   ──────────────────┼─▶│ server  │   │ origin    │   │ contact       │   │
//!                     │  │ layers  │   │ rate limit│   │ newsletter    │   │
//!                     │  └─────────┘   │ signature │   │ webhook, news │   │
//!                     │                │ validation│   │ admin         │   │
//!                     │                └───────────┘   └───────┬───────┘   │
//!                     │                                        │           │
//!                     │                          ┌─────────────┴─────┐     │
//!                     │                          ▼                   ▼     │
//!                     │                   ┌─────────────┐    ┌───────────┐ │
//!                     │                   │    store    │    │   mail    │─┼──▶ Mail API
//!                     │                   │ + snapshot  │    │ transport │ │
//!                     │                   └─────────────┘    └───────────┘ │
//!                     │                                                    │
//!                     │  config (hot reload) · observability · lifecycle   │
//!                     └────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use contact_gateway::config::loader::apply_env_overrides;
use contact_gateway::config::validation::validate_config;
use contact_gateway::config::{load_config, ConfigWatcher, GatewayConfig};
use contact_gateway::lifecycle::{build_state, wait_for_shutdown_signal, Shutdown};
use contact_gateway::observability::{logging, metrics};
use contact_gateway::HttpServer;

#[derive(Parser)]
#[command(name = "contact-gateway", version, about = "Contact form and webhook gateway")]
struct Args {
    /// Path to the TOML configuration file. Defaults are used when omitted.
    #[arg(short, long, env = "CONTACT_GATEWAY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => {
            let mut config = GatewayConfig::default();
            apply_env_overrides(&mut config, |key| std::env::var(key).ok());
            if let Err(errors) = validate_config(&config) {
                for e in &errors {
                    eprintln!("invalid default configuration: {}", e);
                }
                return Err("invalid configuration".into());
            }
            config
        }
    };

    logging::init_logging(&config.observability);

    tracing::info!("contact-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        request_timeout_secs = config.timeouts.request_secs,
        allowed_origins = config.security.allowed_origins.len(),
        webhook_secret = config.webhook.secret.is_some(),
        mail_enabled = config.mail.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // The watcher handle must outlive the server.
    let (_watcher, config_updates) = match &args.config {
        Some(path) => {
            let (watcher, rx) = ConfigWatcher::new(path);
            (Some(watcher.run()?), rx)
        }
        None => {
            let (_tx, rx) = mpsc::unbounded_channel();
            (None, rx)
        }
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let state = build_state(config)?;
    let server = HttpServer::new(state);

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        shutdown.trigger();
    });

    server.run(listener, config_updates, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
