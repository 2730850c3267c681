//! HERE client error types.

use serde_json::Value;

/// Errors from the HERE HTTP client.
#[derive(Debug, thiserror::Error)]
pub enum HereError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),

    /// API returned a non-success status code
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    /// Response body was not the expected JSON
    #[error("JSON parse error: {message}")]
    Json { message: String },
}

// Request URLs carry the API key, so they never reach messages or logs.
impl From<reqwest::Error> for HereError {
    fn from(err: reqwest::Error) -> Self {
        HereError::Http(err.without_url())
    }
}

impl HereError {
    /// Detail to report to the caller.
    ///
    /// The upstream response body when there is one (decoded as JSON if
    /// possible), otherwise the error message.
    pub fn details(&self) -> Value {
        match self {
            HereError::Api { body, .. } if !body.is_empty() => {
                serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.clone()))
            }
            HereError::Http(e) => Value::String(e.to_string()),
            other => Value::String(other.to_string()),
        }
    }
}
