//! Caching layer for upstream transit API responses.
//!
//! Station searches are keyed by a rounded location so that near-identical
//! queries collapse onto one entry. Departure boards are keyed by the raw
//! station id. Every entry is served for a fixed window after it was stored.
//!
//! Freshness is decided from the entry timestamp on every read. The backing
//! moka cache also expires entries in the background, slightly after the
//! freshness window, so stale keys do not accumulate.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::future::Cache as MokaCache;
use serde_json::Value;
use tracing::trace;

/// How long a cached response stays fresh (2 minutes).
pub const CACHE_DURATION: Duration = Duration::from_secs(2 * 60);

/// Search radius in metres used when a station query omits one.
pub const DEFAULT_RADIUS: u32 = 1000;

/// Coordinate rounding step in degrees (~111 m).
const COORDINATE_PRECISION: f64 = 0.001;

/// Extra lifetime given to the background purge beyond the freshness window.
const PURGE_GRACE: Duration = Duration::from_secs(1);

/// Cache key for station searches: rounded latitude, rounded longitude, radius.
///
/// Coordinates are rounded to the nearest 0.001° and printed with three
/// decimals, so points in the same rounding cell share a key.
///
/// # Examples
///
/// ```
/// use transit_proxy::cache::LocationKey;
///
/// let a = LocationKey::new(52.52041, 13.40498, 1000);
/// let b = LocationKey::new(52.51970, 13.40520, 1000);
/// assert_eq!(a, b);
/// assert_eq!(a.as_str(), "52.520,13.405,1000");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocationKey(String);

impl LocationKey {
    /// Derive the key for a station search.
    pub fn new(latitude: f64, longitude: f64, radius: u32) -> Self {
        Self(format!(
            "{},{},{}",
            format_coordinate(latitude),
            format_coordinate(longitude),
            radius
        ))
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Round to the nearest multiple of [`COORDINATE_PRECISION`].
fn round_coordinate(value: f64) -> f64 {
    let rounded = (value / COORDINATE_PRECISION).round() * COORDINATE_PRECISION;
    // -0.0 would print as "-0.000"
    if rounded == 0.0 { 0.0 } else { rounded }
}

fn format_coordinate(value: f64) -> String {
    format!("{:.3}", round_coordinate(value))
}

/// Source of the current instant for freshness checks.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> Instant;
}

/// Wall clock backed by [`Instant::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A stored response and the instant it was stored.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub inserted_at: Instant,
    pub payload: Arc<Value>,
}

/// Configuration for the response caches.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// How long an entry is served after being stored.
    pub ttl: Duration,
}

impl CacheConfig {
    /// Create a config with a custom freshness window.
    pub fn new(ttl: Duration) -> Self {
        Self { ttl }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: CACHE_DURATION,
        }
    }
}

/// String-keyed JSON cache whose entries go stale after a fixed window.
///
/// `put` always overwrites. `get` treats entries aged `>= ttl` as absent but
/// does not remove them; the next `put` for that key replaces them.
pub struct TimedCache {
    entries: MokaCache<String, CacheEntry>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TimedCache {
    /// Create a cache that reads time from the system clock.
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    /// Create a cache that reads time from the given clock.
    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        let entries = MokaCache::builder()
            .time_to_live(ttl + PURGE_GRACE)
            .build();

        Self {
            entries,
            ttl,
            clock,
        }
    }

    /// Get a fresh payload, or `None` if absent or expired.
    pub async fn get(&self, key: &str) -> Option<Arc<Value>> {
        let entry = self.entries.get(key).await?;
        let age = self
            .clock
            .now()
            .saturating_duration_since(entry.inserted_at);

        if age >= self.ttl {
            trace!(key, age_ms = age.as_millis() as u64, "cache entry expired");
            return None;
        }

        Some(entry.payload)
    }

    /// Store a payload, replacing any existing entry for the key.
    pub async fn put(&self, key: impl Into<String>, payload: Arc<Value>) {
        let entry = CacheEntry {
            inserted_at: self.clock.now(),
            payload,
        };
        self.entries.insert(key.into(), entry).await;
    }

    /// Invalidate all cached entries.
    pub fn invalidate_all(&self) {
        self.entries.invalidate_all();
    }
}

/// The two response caches kept by the proxy.
pub struct ResponseCache {
    /// Station search results, keyed by [`LocationKey`].
    pub stations: TimedCache,

    /// Merged departure boards, keyed by station id.
    pub departures: TimedCache,
}

impl ResponseCache {
    /// Create both caches with the given configuration.
    pub fn new(config: &CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create both caches sharing one clock.
    pub fn with_clock(config: &CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            stations: TimedCache::with_clock(config.ttl, clock.clone()),
            departures: TimedCache::with_clock(config.ttl, clock),
        }
    }

    /// Get a cached station search.
    pub async fn get_stations(&self, key: &LocationKey) -> Option<Arc<Value>> {
        self.stations.get(key.as_str()).await
    }

    /// Store a station search result.
    pub async fn put_stations(&self, key: &LocationKey, payload: Arc<Value>) {
        self.stations.put(key.as_str(), payload).await;
    }

    /// Get a cached departure board.
    pub async fn get_departures(&self, station_id: &str) -> Option<Arc<Value>> {
        self.departures.get(station_id).await
    }

    /// Store a merged departure board.
    pub async fn put_departures(&self, station_id: &str, payload: Arc<Value>) {
        self.departures.put(station_id, payload).await;
    }

    /// Invalidate both caches.
    pub fn invalidate_all(&self) {
        self.stations.invalidate_all();
        self.departures.invalidate_all();
    }
}
