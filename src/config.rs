use std::env;

use crate::error::AppError;

/// Etherscan v2 endpoint; the target chain is selected by the `chainid` query
/// parameter rather than by host.
pub const ETHERSCAN_BASE_URL: &str = "https://api.etherscan.io/v2/api";

/// Ethereum mainnet.
pub const CHAIN_ID: u64 = 1;

// Contract addresses are public, so they can be hardcoded.
pub const KONG_TOKEN_CONTRACT: &str = "0x8db036f007841C21B97eFF7dfc2c187241d59BaF";
pub const STAKING_CONTRACT_ADDRESS: &str = "0x8a9d0C64F708A2feEa843eCF7d92f63522775e94";

/// A single most-recent-first page; no further pagination is performed.
pub const PAGE_SIZE: u32 = 1000;

/// Application configuration loaded from environment variables.
///
/// Secrets are deliberately allowed to be absent at startup: a missing
/// Etherscan key or Sheets credential only fails the endpoint that needs it,
/// so the service can still boot for health checks and partial use.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub etherscan_api_key: String,
    pub gsheets_credentials: String,
    pub spreadsheet_id: String,
    pub worksheet_name: String,
    pub port: u16,
    pub log_level: String,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// - ETHERSCAN_API_KEY: Etherscan v2 API key (default: empty)
    /// - GSHEETS_CREDENTIALS: service-account key JSON, single line (default: "{}")
    /// - SPREADSHEET_ID: target Google spreadsheet
    /// - WORKSHEET_NAME: target worksheet title (default: "KONG_Staking")
    /// - PORT: HTTP listen port (default: 8000)
    /// - LOG_LEVEL: tracing filter (default: "info")
    pub fn from_env() -> Result<Self, AppError> {
        let etherscan_api_key = env::var("ETHERSCAN_API_KEY").unwrap_or_default();

        let gsheets_credentials =
            env::var("GSHEETS_CREDENTIALS").unwrap_or_else(|_| "{}".to_string());

        let spreadsheet_id = env::var("SPREADSHEET_ID")
            .unwrap_or_else(|_| "1RECsmm9b1PSjFZVgPr0joUugNFpXuWnPKnxk-U7AoyA".to_string());

        let worksheet_name =
            env::var("WORKSHEET_NAME").unwrap_or_else(|_| "KONG_Staking".to_string());

        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|_| AppError::Parse(format!("PORT is not a valid port: {}", raw)))?,
            Err(_) => 8000,
        };

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            etherscan_api_key,
            gsheets_credentials,
            spreadsheet_id,
            worksheet_name,
            port,
            log_level,
        })
    }

    /// True when an Etherscan key is present; reported by /api/health.
    pub fn api_key_configured(&self) -> bool {
        !self.etherscan_api_key.is_empty()
    }

    /// True when the Sheets credential bundle is present and non-trivial.
    /// The literal "{}" default is treated the same as unset.
    pub fn gsheets_credentials_configured(&self) -> bool {
        !self.gsheets_credentials.is_empty() && self.gsheets_credentials != "{}"
    }
}
