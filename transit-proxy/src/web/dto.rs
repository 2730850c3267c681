//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Query for `GET /api/stations`.
///
/// Fields are kept as raw strings so that missing and malformed values can
/// be reported with a JSON error body.
#[derive(Debug, Default, Deserialize)]
pub struct StationsRequest {
    /// Centre latitude in degrees
    pub latitude: Option<String>,

    /// Centre longitude in degrees
    pub longitude: Option<String>,

    /// Search radius in metres (defaults to 1000)
    pub radius: Option<String>,
}

/// Query for `GET /api/departures`.
#[derive(Debug, Default, Deserialize)]
pub struct DeparturesRequest {
    /// Upstream station identifier
    #[serde(rename = "stationId")]
    pub station_id: Option<String>,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// What went wrong
    pub error: String,

    /// Upstream error body or transport error message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}
