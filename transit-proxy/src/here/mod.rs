//! HERE Public Transit API client.
//!
//! Two endpoints are used:
//! - `/stations` searches for stations around a point within a radius
//! - `/departures` lists the departure boards for a station id
//!
//! Station payloads are passed through untouched. Departure payloads are
//! decoded into [`DeparturesResponse`] so extra departures can be merged in,
//! with every field the proxy does not inspect preserved verbatim.

mod client;
mod error;
mod types;

pub use client::{HereClient, HereConfig};
pub use error::HereError;
pub use types::{Board, Departure, DeparturesResponse, Place, StationQuery};
