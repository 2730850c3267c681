//! HTTP route handlers.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

use crate::cache::{DEFAULT_RADIUS, LocationKey};
use crate::here::{HereError, StationQuery};

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/stations", get(stations))
        .route("/api/departures", get(departures))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Liveness check for load balancers.
async fn index() -> &'static str {
    "OK"
}

/// Health check endpoint.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        message: "server is running",
    })
}

/// Search stations around a point, cached by rounded location.
async fn stations(
    State(state): State<AppState>,
    Query(req): Query<StationsRequest>,
) -> Result<Json<Arc<Value>>, AppError> {
    let (Some(latitude), Some(longitude)) = (non_empty(&req.latitude), non_empty(&req.longitude))
    else {
        return Err(AppError::BadRequest {
            message: "latitude and longitude parameters are required".to_string(),
        });
    };

    let query = StationQuery {
        latitude: parse_coordinate("latitude", latitude)?,
        longitude: parse_coordinate("longitude", longitude)?,
        radius: match non_empty(&req.radius) {
            Some(radius) => radius.parse().map_err(|_| AppError::BadRequest {
                message: format!("Invalid radius: {radius}"),
            })?,
            None => DEFAULT_RADIUS,
        },
    };

    let key = LocationKey::new(query.latitude, query.longitude, query.radius);

    if let Some(cached) = state.cache.get_stations(&key).await {
        debug!(%key, "station cache hit");
        return Ok(Json(cached));
    }

    let payload = state
        .here
        .stations(&query)
        .await
        .map_err(|e| AppError::upstream("failed to fetch stations", e))?;
    let payload = Arc::new(payload);

    state.cache.put_stations(&key, payload.clone()).await;

    Ok(Json(payload))
}

/// List departures for a station with supplemental departures merged in.
async fn departures(
    State(state): State<AppState>,
    Query(req): Query<DeparturesRequest>,
) -> Result<Json<Arc<Value>>, AppError> {
    // Used verbatim as both cache key and upstream id
    let station_id = req
        .station_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::BadRequest {
            message: "stationId parameter is required".to_string(),
        })?;

    if let Some(cached) = state.cache.get_departures(station_id).await {
        debug!(station_id, "departures cache hit");
        return Ok(Json(cached));
    }

    let mut response = state
        .here
        .departures(station_id)
        .await
        .map_err(|e| AppError::upstream("failed to fetch departures", e))?;

    state.extra_boards.merge_into(response.boards_mut());

    let payload = serde_json::to_value(&response).map_err(|e| AppError::Internal {
        message: format!("failed to encode departures: {e}"),
    })?;
    let payload = Arc::new(payload);

    state.cache.put_departures(station_id, payload.clone()).await;

    Ok(Json(payload))
}

/// A present, non-empty query value.
fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Parse a finite coordinate in degrees.
fn parse_coordinate(name: &str, value: &str) -> Result<f64, AppError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| AppError::BadRequest {
            message: format!("Invalid {name}: {value}"),
        })
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    Upstream { message: String, source: HereError },
    Internal { message: String },
}

impl AppError {
    fn upstream(message: &str, source: HereError) -> Self {
        AppError::Upstream {
            message: message.to_string(),
            source,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::BadRequest { message } => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: message,
                    details: None,
                },
            ),
            AppError::Upstream { message, source } => {
                error!(error = %source, "{message}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: message,
                        details: Some(source.details()),
                    },
                )
            }
            AppError::Internal { message } => {
                error!("{message}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: message,
                        details: None,
                    },
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
