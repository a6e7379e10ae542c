use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};
use tracing::info;

use crate::api::AppState;
use crate::config;
use crate::error::AppError;
use crate::ledger::transform::build_ledger;
use crate::sheets::client::SheetsClient;
use crate::sheets::credentials::ServiceAccountKey;

/// The process endpoint returns at most this many entries; the full ledger is
/// still cached for export.
const PREVIEW_LIMIT: usize = 50;

/// Health check endpoint for deployment verification.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "api_key_configured": state.config.api_key_configured(),
    }))
}

/// Fetch the most recent transfer page from Etherscan and cache the envelope.
/// The cache is left untouched on failure.
pub async fn fetch(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    if !state.config.api_key_configured() {
        return Err(AppError::Config("ETHERSCAN_API_KEY".to_string()));
    }

    let envelope = state
        .etherscan
        .token_transfers(&state.config.etherscan_api_key)
        .await?;
    let count = envelope.result.len();

    *state.raw.write().await = Some(envelope);

    Ok(Json(json!({ "status": "success", "count": count })))
}

/// Transform the cached raw records into the stake/unstake ledger, cache the
/// full ledger, and return a bounded preview.
pub async fn process(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let raw = state.raw.read().await;
    let envelope = raw
        .as_ref()
        .ok_or_else(|| AppError::State("No data fetched yet".to_string()))?;

    let ledger = build_ledger(&envelope.result, config::STAKING_CONTRACT_ADDRESS)?;
    drop(raw);

    let preview_len = ledger.len().min(PREVIEW_LIMIT);
    let preview = serde_json::to_value(&ledger[..preview_len])
        .map_err(|e| AppError::Parse(e.to_string()))?;

    info!(entries = ledger.len(), preview = preview_len, "ledger processed");
    *state.ledger.write().await = Some(ledger);

    Ok(Json(json!({ "status": "success", "data": preview })))
}

/// Export the cached ledger to the configured worksheet, replacing its
/// contents.
pub async fn upload(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let guard = state.ledger.read().await;
    let ledger = guard
        .as_ref()
        .ok_or_else(|| AppError::State("No data processed yet".to_string()))?;

    if !state.config.gsheets_credentials_configured() {
        return Err(AppError::Config("GSHEETS_CREDENTIALS".to_string()));
    }

    let key = ServiceAccountKey::from_json(&state.config.gsheets_credentials)?;
    let client = SheetsClient::new(key, state.config.spreadsheet_id.clone())?;
    client
        .replace_worksheet(&state.config.worksheet_name, ledger)
        .await?;

    Ok(Json(json!({ "status": "success" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::router;
    use crate::config::{AppConfig, STAKING_CONTRACT_ADDRESS};
    use crate::etherscan::models::{TokenTransfer, TokenTxResponse};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn test_config() -> AppConfig {
        AppConfig {
            etherscan_api_key: String::new(),
            gsheets_credentials: "{}".to_string(),
            spreadsheet_id: "sheet-id".to_string(),
            worksheet_name: "KONG_Staking".to_string(),
            port: 8000,
            log_level: "info".to_string(),
        }
    }

    fn envelope(records: Vec<TokenTransfer>) -> TokenTxResponse {
        TokenTxResponse {
            status: "1".to_string(),
            message: "OK".to_string(),
            result: records,
        }
    }

    fn record(seq: u64) -> TokenTransfer {
        TokenTransfer {
            hash: format!("0x{:x}", seq),
            from: STAKING_CONTRACT_ADDRESS.to_string(),
            to: format!("0xwallet{}", seq),
            value: "1500000000000000000".to_string(),
            token_decimal: "18".to_string(),
            time_stamp: "1700000000".to_string(),
        }
    }

    async fn get(state: Arc<AppState>, uri: &str) -> (StatusCode, Value) {
        request(state, "GET", uri).await
    }

    async fn request(state: Arc<AppState>, method: &str, uri: &str) -> (StatusCode, Value) {
        let response = router(state)
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap();
        (status, body)
    }

    #[tokio::test]
    async fn health_reports_missing_api_key() {
        let state = Arc::new(AppState::new(test_config()).unwrap());
        let (status, body) = get(state, "/api/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["api_key_configured"], false);
    }

    #[tokio::test]
    async fn fetch_without_api_key_is_server_error() {
        let state = Arc::new(AppState::new(test_config()).unwrap());
        let (status, body) = get(state, "/api/fetch").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["detail"], "ETHERSCAN_API_KEY not configured");
    }

    #[tokio::test]
    async fn process_before_fetch_is_client_error() {
        let state = Arc::new(AppState::new(test_config()).unwrap());
        let (status, body) = get(state, "/api/process").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "No data fetched yet");
    }

    #[tokio::test]
    async fn process_previews_fifty_but_caches_all() {
        let state = Arc::new(AppState::new(test_config()).unwrap());
        *state.raw.write().await = Some(envelope((0..60u64).map(record).collect()));

        let (status, body) = get(state.clone(), "/api/process").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        let data = body["data"].as_array().unwrap();
        assert_eq!(data.len(), 50);
        assert_eq!(data[0]["type"], "UnStake");
        assert_eq!(data[0]["time"], "2023-11-14 22:13:20");
        assert_eq!(data[0]["balance"], -1.5);

        let cached = state.ledger.read().await;
        assert_eq!(cached.as_ref().unwrap().len(), 60);
    }

    #[tokio::test]
    async fn process_failure_leaves_ledger_cache_untouched() {
        let state = Arc::new(AppState::new(test_config()).unwrap());
        let mut bad = record(0);
        bad.value = "not-a-number".to_string();
        *state.raw.write().await = Some(envelope(vec![bad]));

        let (status, _) = get(state.clone(), "/api/process").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(state.ledger.read().await.is_none());
    }

    #[tokio::test]
    async fn upload_before_process_is_client_error() {
        let state = Arc::new(AppState::new(test_config()).unwrap());
        let (status, body) = request(state, "POST", "/api/upload").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "No data processed yet");
    }

    #[tokio::test]
    async fn upload_without_credentials_is_server_error() {
        let state = Arc::new(AppState::new(test_config()).unwrap());
        *state.raw.write().await = Some(envelope(vec![record(0)]));
        let _ = get(state.clone(), "/api/process").await;

        let (status, body) = request(state, "POST", "/api/upload").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["detail"], "GSHEETS_CREDENTIALS not configured");
    }

    #[tokio::test]
    async fn upload_with_malformed_credentials_surfaces_parse_error() {
        let mut config = test_config();
        config.gsheets_credentials = "{not valid json".to_string();
        let state = Arc::new(AppState::new(config).unwrap());
        *state.raw.write().await = Some(envelope(vec![record(0)]));
        let _ = get(state.clone(), "/api/process").await;

        let (status, body) = request(state, "POST", "/api/upload").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let detail = body["detail"].as_str().unwrap();
        assert!(detail.contains("invalid credentials JSON"));
    }
}
