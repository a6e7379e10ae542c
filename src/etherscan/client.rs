use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info};

use crate::config;
use crate::error::AppError;
use crate::etherscan::models::TokenTxResponse;

/// Per-attempt request timeout; failures are terminal, no retry is performed.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Thin client for the Etherscan v2 transaction-history API.
///
/// The contract pair and page size are fixed at build time; only the API key
/// varies per call so the missing-key check can stay with the caller.
pub struct EtherscanClient {
    http: reqwest::Client,
    base_url: String,
}

impl EtherscanClient {
    pub fn new() -> Result<Self, AppError> {
        Self::with_base_url(config::ETHERSCAN_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    /// Fetch up to one page of the most recent KONG transfers touching the
    /// staking contract, most recent first.
    ///
    /// A provider-side failure (`status != "1"`) surfaces as Upstream with the
    /// full payload attached; transport and deserialization failures surface
    /// as Transport.
    pub async fn token_transfers(&self, api_key: &str) -> Result<TokenTxResponse, AppError> {
        let chain_id = config::CHAIN_ID.to_string();
        let page_size = config::PAGE_SIZE.to_string();
        let params = [
            ("chainid", chain_id.as_str()),
            ("module", "account"),
            ("action", "tokentx"),
            ("contractaddress", config::KONG_TOKEN_CONTRACT),
            ("address", config::STAKING_CONTRACT_ADDRESS),
            ("page", "1"),
            ("offset", page_size.as_str()),
            ("sort", "desc"),
            ("apikey", api_key),
        ];

        debug!(base_url = %self.base_url, "requesting token transfers");

        let response = self.http.get(&self.base_url).query(&params).send().await?;
        let body: Value = response.json().await?;

        if body.get("status").and_then(Value::as_str) != Some("1") {
            return Err(AppError::Upstream(body.to_string()));
        }

        let envelope: TokenTxResponse = serde_json::from_value(body)
            .map_err(|e| AppError::Transport(format!("unexpected Etherscan response: {}", e)))?;

        info!(count = envelope.result.len(), "fetched transfer records");
        Ok(envelope)
    }
}
