mod api;
mod config;
mod error;
mod etherscan;
mod ledger;
mod sheets;
mod telemetry;

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

use crate::api::AppState;
use crate::config::AppConfig;
use crate::error::AppError;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    telemetry::init_telemetry(&config.log_level);

    info!("Starting KONG staking ledger service");
    info!(
        api_key_configured = config.api_key_configured(),
        gsheets_configured = config.gsheets_credentials_configured(),
        spreadsheet_id = %config.spreadsheet_id,
        worksheet = %config.worksheet_name,
        "Configuration loaded"
    );

    let port = config.port;
    let state = Arc::new(AppState::new(config)?);
    let app = api::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "HTTP API listening");

    axum::serve(listener, app).await?;
    Ok(())
}
