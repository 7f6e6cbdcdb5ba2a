// Error type shared by every client in the crate. Binaries wrap it in
// `anyhow` at the edge; library code returns `Result<T, ApiError>`.

use reqwest::{Method, StatusCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or invalid input, detected before any network call.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The token could not be resolved to a user.
    #[error("Authentication failed: {status} - {body}")]
    Auth { status: StatusCode, body: String },

    /// Any non-2xx response.
    #[error("{method} {url} failed: {status} - {body}")]
    Http {
        method: Method,
        url: String,
        status: StatusCode,
        body: String,
    },

    /// An expected JSON field is missing or has the wrong shape.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Pagination stopped after {0} pages: server keeps sending a next link")]
    PaginationLimitExceeded(usize),

    #[error("Failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ApiError {
    /// Configuration and authentication failures end the process with
    /// exit code 1 after being logged.
    pub fn is_fatal_setup(&self) -> bool {
        matches!(self, ApiError::Config(_) | ApiError::Auth { .. })
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
