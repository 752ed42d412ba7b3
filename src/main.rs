//! SICOSS API bootstrap: loads configuration, connects to Postgres, and
//! serves the ApiFacade.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use sicoss_core::config::{DbConfig, SicossConfig};
use sicoss_core::ops::MetricsRegistry;
use sicoss_core::sicoss::extractor::SqlxExtractorSet;
use sicoss_core::sicoss::handlers::{self, AppState};
use sicoss_core::sicoss::service::SicossService;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let ini_path = std::env::var("SICOSS_DB_INI")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("sicoss.ini"));
    let db_config = DbConfig::load(&ini_path).context("loading database configuration")?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&db_config.connection_string())
        .await
        .context("connecting to postgres")?;

    let sicoss_config = SicossConfig::default();
    sicoss_config.validate().context("validating default sicoss config")?;

    let extractor = Arc::new(SqlxExtractorSet::new(pool.clone()));
    let service = Arc::new(SicossService::new(extractor, Some(pool), sicoss_config));
    let state =
        AppState { service, metrics: Arc::new(Mutex::new(MetricsRegistry::new())), started_at: Instant::now() };

    let app = handlers::router(state).layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive());

    let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    tracing::info!(%port, "sicoss-api listening");
    axum::serve(listener, app).await?;
    Ok(())
}
