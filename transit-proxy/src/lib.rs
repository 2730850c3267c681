//! Transit API proxy server.
//!
//! Forwards station and departure lookups to the HERE Public Transit API,
//! merges in locally maintained departures, and caches responses in memory
//! for a short window.

pub mod cache;
pub mod config;
pub mod here;
pub mod supplemental;
pub mod web;
