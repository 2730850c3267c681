//! HERE Public Transit HTTP client.
//!
//! Failures are never retried; they are returned to the caller with the
//! upstream body attached when the API produced one.

use serde_json::Value;
use tracing::debug;

use super::error::HereError;
use super::types::{DeparturesResponse, StationQuery};

/// Default base URL for the HERE Public Transit API.
const DEFAULT_BASE_URL: &str = "https://transit.hereapi.com/v8";

/// Fields requested for each station in a search.
const STATION_RETURN_FIELDS: &str = "transport";

/// Configuration for the HERE client.
#[derive(Debug, Clone)]
pub struct HereConfig {
    /// API key sent as the `apiKey` query parameter
    pub api_key: String,
    /// Base URL for the API (defaults to production HERE v8)
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl HereConfig {
    /// Create a new config with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// HERE Public Transit API client.
#[derive(Debug, Clone)]
pub struct HereClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HereClient {
    /// Create a new HERE client with the given configuration.
    pub fn new(config: HereConfig) -> Result<Self, HereError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url,
            api_key: config.api_key,
        })
    }

    /// Search for stations around a point.
    ///
    /// Returns the upstream payload as-is.
    pub async fn stations(&self, query: &StationQuery) -> Result<Value, HereError> {
        let url = format!("{}/stations", self.base_url);

        let body = self
            .fetch(
                &url,
                &[
                    ("in", format!("{},{}", query.latitude, query.longitude)),
                    ("radius", query.radius.to_string()),
                    ("return", STATION_RETURN_FIELDS.to_string()),
                ],
            )
            .await?;

        serde_json::from_str(&body).map_err(|e| HereError::Json {
            message: e.to_string(),
        })
    }

    /// List departure boards for a station id.
    pub async fn departures(&self, station_id: &str) -> Result<DeparturesResponse, HereError> {
        let url = format!("{}/departures", self.base_url);

        let body = self
            .fetch(&url, &[("ids", station_id.to_string())])
            .await?;

        serde_json::from_str(&body).map_err(|e| HereError::Json {
            message: e.to_string(),
        })
    }

    /// Issue a GET with the API key attached and return the body text.
    async fn fetch(&self, url: &str, params: &[(&str, String)]) -> Result<String, HereError> {
        debug!(url, ?params, "requesting HERE API");

        let response = self
            .http
            .get(url)
            .query(params)
            .query(&[("apiKey", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HereError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.text().await?)
    }
}
