use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use chrono::Local;
use tracing::{info, warn};

use common::env::ensure_env;
use configs::AppConfig;
use service::{seed, AppServices};

use crate::errors::StartupError;
use crate::routes;

pub struct LoadedConfig {
    pub config: AppConfig,
    /// Why the config file was skipped, logged once tracing is up.
    pub fallback_reason: Option<String>,
}

impl LoadedConfig {
    pub fn log_fallback(&self) {
        if let Some(reason) = &self.fallback_reason {
            warn!(error = %reason, "config file not loaded, starting on defaults");
        }
    }
}

/// Config file first; defaults plus env overrides when it is missing or unreadable.
pub fn load_config() -> anyhow::Result<LoadedConfig> {
    match AppConfig::load_and_validate() {
        Ok(config) => Ok(LoadedConfig { config, fallback_reason: None }),
        Err(e) => Ok(LoadedConfig { config: AppConfig::from_env()?, fallback_reason: Some(e.to_string()) }),
    }
}

fn bind_addr(cfg: &AppConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("bind address: {e}")))
}

/// Wire the services, optionally load demo data and build the router.
pub async fn build_app(cfg: &AppConfig) -> anyhow::Result<Router> {
    let services = Arc::new(AppServices::new(cfg)?);
    if cfg.seed.demo_data {
        seed::load_demo_data(&services, Local::now().date_naive()).await?;
    }
    Ok(routes::build_router(services, &cfg.server.frontend_dir))
}

/// Run the HTTP server until it fails; logging must already be set up.
pub async fn serve(cfg: AppConfig) -> anyhow::Result<()> {
    ensure_env(&cfg.server.frontend_dir)
        .await
        .map_err(|e| StartupError::Runtime(e.to_string()))?;

    let app = build_app(&cfg).await?;

    let addr = bind_addr(&cfg)?;
    info!(%addr, ocr = %cfg.ocr.base_url, "starting pantry server");
    println!("pantry listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
