pub mod cli;
pub mod core;
pub mod providers;
pub mod store;
pub mod web;

use crate::core::QuoteService;
use crate::core::config::AppConfig;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    Serve {
        host: Option<String>,
        port: Option<u16>,
    },
    Quote {
        from: String,
        amount: String,
        to: String,
    },
    Rates {
        base: String,
        refresh: bool,
    },
}

pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");
    Ok(config)
}

/// Wires the configured sources and cache into a quote service.
pub fn build_service(config: &AppConfig) -> Result<QuoteService> {
    let sources = providers::configured_sources(&config.providers)?;
    let cache = store::open_rate_cache(&config.cache)?;
    Ok(QuoteService::new(
        sources,
        cache,
        config.supported_currencies.clone(),
        config.cache.life_time(),
    ))
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    let config = load_config(config_path)?;
    let quotes = build_service(&config)?;

    match command {
        AppCommand::Serve { host, port } => {
            let host = host.unwrap_or(config.server.host);
            let port = port.unwrap_or(config.server.port);
            let listener = tokio::net::TcpListener::bind((host.as_str(), port))
                .await
                .with_context(|| format!("Failed to bind {host}:{port}"))?;
            info!("Quote service starting...");
            let state = web::AppState {
                quotes: Arc::new(quotes),
            };
            web::serve(listener, state).await
        }
        AppCommand::Quote { from, amount, to } => {
            cli::quote::run(&quotes, &from, &amount, &to).await
        }
        AppCommand::Rates { base, refresh } => cli::rates::run(&quotes, &base, refresh).await,
    }
}
