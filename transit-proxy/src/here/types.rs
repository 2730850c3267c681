//! HERE API request and response types.
//!
//! Only the fields the proxy reads are typed. Everything else is captured in
//! `extra` maps and written back out unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single departure record. Opaque to the proxy.
pub type Departure = Value;

/// Parameters for a station search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StationQuery {
    /// Centre latitude in degrees.
    pub latitude: f64,
    /// Centre longitude in degrees.
    pub longitude: f64,
    /// Search radius in metres.
    pub radius: u32,
}

/// Response from `GET /departures`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeparturesResponse {
    /// One board per requested station place. `None` when the upstream
    /// omitted the field, so it is not added on the way back out.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boards: Option<Vec<Board>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DeparturesResponse {
    /// The boards, empty if the upstream sent none.
    pub fn boards(&self) -> &[Board] {
        self.boards.as_deref().unwrap_or_default()
    }

    /// Mutable access to the boards, empty if the upstream sent none.
    pub fn boards_mut(&mut self) -> &mut [Board] {
        self.boards.as_deref_mut().unwrap_or_default()
    }
}

/// Departures at one station place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Board {
    #[serde(default)]
    pub place: Place,

    /// Departures in upstream order.
    #[serde(default)]
    pub departures: Vec<Departure>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Board {
    /// The place name, if the upstream sent one.
    pub fn place_name(&self) -> Option<&str> {
        self.place.name.as_deref()
    }
}

/// A station place. Only the name is used for matching.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Place {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
