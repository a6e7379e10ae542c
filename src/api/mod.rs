pub mod handlers;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::etherscan::client::EtherscanClient;
use crate::etherscan::models::TokenTxResponse;
use crate::ledger::models::LedgerEntry;

/// Process-wide state shared by the endpoint handlers.
///
/// The two caches are the only state the service holds; both are replaced
/// wholesale by their producing stage and lost on restart. The locks guard
/// against torn reads only; the service assumes a single caller driving the
/// fetch/process/upload sequence, so concurrent writers are not coordinated
/// beyond last-write-wins.
pub struct AppState {
    pub config: AppConfig,
    pub etherscan: EtherscanClient,
    pub raw: RwLock<Option<TokenTxResponse>>,
    pub ledger: RwLock<Option<Vec<LedgerEntry>>>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self, AppError> {
        Ok(Self {
            config,
            etherscan: EtherscanClient::new()?,
            raw: RwLock::new(None),
            ledger: RwLock::new(None),
        })
    }
}

/// Build the HTTP surface. CORS is wide open; the service fronts a browser
/// client and carries no credentials of its own.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/fetch", get(handlers::fetch))
        .route("/api/process", get(handlers::process))
        .route("/api/upload", post(handlers::upload))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
