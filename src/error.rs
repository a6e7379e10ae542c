use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Application-level errors with context-rich messages.
///
/// All fallible operations in this application return Result<T, AppError>.
/// Each variant maps to one HTTP status: operations invoked out of order and
/// provider-reported failures are the caller's problem (400), everything else
/// is a server-side failure (500).
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0} not configured")]
    Config(String),

    #[error("{0}")]
    State(String),

    /// Etherscan answered but reported failure; the payload is passed through.
    #[error("Etherscan Error: {0}")]
    Upstream(String),

    #[error("{0}")]
    Parse(String),

    #[error("Google Sheets error: {0}")]
    Sheets(String),

    #[error("request error: {0}")]
    Transport(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::State(_) | AppError::Upstream(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Network, timeout, and body-decoding failures all surface as Transport.
impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Transport(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
