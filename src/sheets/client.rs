use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::error::AppError;
use crate::ledger::models::LedgerEntry;
use crate::sheets::credentials::ServiceAccountKey;

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const JWT_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Grid size for a worksheet created on demand.
const NEW_SHEET_ROWS: u32 = 1000;
const NEW_SHEET_COLS: u32 = 20;

/// Column headers, matching the ledger entry field order.
const HEADER: [&str; 6] = ["time", "type", "wallet", "amount", "balance", "hash"];

#[derive(Serialize)]
struct Claims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Thin wrapper over the Google Sheets v4 REST API, authenticated with a
/// service-account JWT grant.
pub struct SheetsClient {
    http: reqwest::Client,
    key: ServiceAccountKey,
    spreadsheet_id: String,
}

impl SheetsClient {
    pub fn new(key: ServiceAccountKey, spreadsheet_id: String) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::Sheets(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            key,
            spreadsheet_id,
        })
    }

    /// Replace the named worksheet's entire contents with the ledger,
    /// creating the worksheet if it does not exist.
    ///
    /// Clear-then-write, not transactional: a failure mid-write can leave the
    /// sheet partially written and must be re-run by the caller.
    pub async fn replace_worksheet(
        &self,
        title: &str,
        ledger: &[LedgerEntry],
    ) -> Result<(), AppError> {
        let token = self.access_token().await?;

        if !self.worksheet_exists(&token, title).await? {
            self.add_worksheet(&token, title).await?;
        }

        self.clear_worksheet(&token, title).await?;
        self.write_ledger(&token, title, ledger).await?;

        info!(worksheet = title, rows = ledger.len(), "ledger exported");
        Ok(())
    }

    /// Exchange a short-lived RS256 assertion for an access token.
    async fn access_token(&self) -> Result<String, AppError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            iss: self.key.client_email.clone(),
            scope: SHEETS_SCOPE.to_string(),
            aud: self.key.token_uri.clone(),
            iat: now,
            exp: now + 3600,
        };

        let encoding_key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())
            .map_err(|e| AppError::Sheets(format!("invalid private key: {}", e)))?;
        let assertion = jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &encoding_key)
            .map_err(|e| AppError::Sheets(format!("failed to sign JWT: {}", e)))?;

        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_GRANT_TYPE), ("assertion", assertion.as_str())])
            .send()
            .await?;
        let response = expect_success(response, "token exchange").await?;

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::Sheets(format!("unexpected token response: {}", e)))?;
        Ok(token.access_token)
    }

    async fn worksheet_exists(&self, token: &str, title: &str) -> Result<bool, AppError> {
        let mut url = self.spreadsheet_url(&[])?;
        url.set_query(Some("fields=sheets.properties"));

        let response = self.http.get(url).bearer_auth(token).send().await?;
        let response = expect_success(response, "spreadsheet lookup").await?;
        let body: Value = response
            .json()
            .await
            .map_err(|e| AppError::Sheets(format!("unexpected lookup response: {}", e)))?;

        let found = body["sheets"]
            .as_array()
            .map(|sheets| {
                sheets
                    .iter()
                    .any(|s| s["properties"]["title"].as_str() == Some(title))
            })
            .unwrap_or(false);

        debug!(worksheet = title, found, "worksheet lookup");
        Ok(found)
    }

    async fn add_worksheet(&self, token: &str, title: &str) -> Result<(), AppError> {
        let url = self.spreadsheet_url_with_suffix(":batchUpdate")?;
        let body = json!({
            "requests": [{
                "addSheet": {
                    "properties": {
                        "title": title,
                        "gridProperties": {
                            "rowCount": NEW_SHEET_ROWS,
                            "columnCount": NEW_SHEET_COLS,
                        },
                    },
                },
            }],
        });

        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        expect_success(response, "worksheet creation").await?;

        info!(worksheet = title, "created worksheet");
        Ok(())
    }

    async fn clear_worksheet(&self, token: &str, title: &str) -> Result<(), AppError> {
        let url = self.spreadsheet_url(&["values", &format!("{}:clear", quote_title(title))])?;

        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&json!({}))
            .send()
            .await?;
        expect_success(response, "worksheet clear").await?;
        Ok(())
    }

    async fn write_ledger(
        &self,
        token: &str,
        title: &str,
        ledger: &[LedgerEntry],
    ) -> Result<(), AppError> {
        let range = format!("{}!A1", quote_title(title));
        let mut url = self.spreadsheet_url(&["values", &range])?;
        url.set_query(Some("valueInputOption=RAW"));

        let body = json!({
            "range": range,
            "majorDimension": "ROWS",
            "values": ledger_rows(ledger),
        });

        let response = self
            .http
            .put(url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        expect_success(response, "worksheet write").await?;
        Ok(())
    }

    fn spreadsheet_url(&self, segments: &[&str]) -> Result<Url, AppError> {
        let mut url = Url::parse(SHEETS_API_BASE)
            .map_err(|e| AppError::Sheets(format!("invalid Sheets API URL: {}", e)))?;
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| AppError::Sheets("invalid Sheets API URL".to_string()))?;
            path.push(&self.spreadsheet_id);
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }

    /// Like `spreadsheet_url` but for the colon-suffixed RPC-style endpoints,
    /// which hang off the spreadsheet id itself.
    fn spreadsheet_url_with_suffix(&self, suffix: &str) -> Result<Url, AppError> {
        let mut url = Url::parse(SHEETS_API_BASE)
            .map_err(|e| AppError::Sheets(format!("invalid Sheets API URL: {}", e)))?;
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| AppError::Sheets("invalid Sheets API URL".to_string()))?;
            path.push(&format!("{}{}", self.spreadsheet_id, suffix));
        }
        Ok(url)
    }
}

/// Turn a non-2xx Sheets/OAuth response into a Sheets error carrying the
/// underlying message.
async fn expect_success(
    response: reqwest::Response,
    context: &str,
) -> Result<reqwest::Response, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(AppError::Sheets(format!(
        "{} failed ({}): {}",
        context, status, body
    )))
}

/// A1-notation requires sheet titles to be single-quoted; embedded quotes are
/// doubled.
fn quote_title(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

/// Header row plus one row per entry. Amount fields stay JSON numbers so the
/// sheet receives them without string coercion.
fn ledger_rows(ledger: &[LedgerEntry]) -> Vec<Vec<Value>> {
    let mut rows = Vec::with_capacity(ledger.len() + 1);
    rows.push(HEADER.iter().map(|h| json!(h)).collect());

    for entry in ledger {
        rows.push(vec![
            json!(entry.time_string()),
            json!(entry.kind.as_str()),
            json!(entry.wallet),
            json!(entry.amount),
            json!(entry.balance),
            json!(entry.hash),
        ]);
    }

    rows
}
