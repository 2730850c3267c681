//! Web layer for the transit proxy.
//!
//! Provides the station and departure lookup endpoints plus health checks.

mod dto;
mod routes;
mod state;

#[cfg(test)]
mod routes_tests;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
