//! Process configuration.
//!
//! Values come from the environment, optionally seeded from a `.env` file.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, warn};

use crate::cache::CACHE_DURATION;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_EXTRA_DEPARTURES_PATH: &str = "extraBusDb.json";

#[derive(Debug, Clone)]
pub struct Config {
    /// HERE API key (`HERE_API_KEY`).
    pub here_api_key: String,
    /// HERE API base URL override (`HERE_BASE_URL`).
    pub here_base_url: Option<String>,
    /// Address to listen on (`BIND_ADDR`).
    pub bind_addr: IpAddr,
    /// Port to listen on (`PORT`).
    pub port: u16,
    /// Supplemental departures file (`EXTRA_DEPARTURES_PATH`).
    pub extra_departures_path: PathBuf,
    /// Response cache freshness window (`CACHE_TTL_SECS`).
    pub cache_ttl: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            here_api_key: String::new(),
            here_base_url: None,
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            extra_departures_path: PathBuf::from(DEFAULT_EXTRA_DEPARTURES_PATH),
            cache_ttl: CACHE_DURATION,
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// A `.env` file in the working directory or a parent is read first;
    /// variables already set in the environment take precedence.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            debug!("No .env file loaded: {}", e);
        }

        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from a variable lookup function.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        match lookup("HERE_API_KEY").filter(|key| !key.is_empty()) {
            Some(key) => config.here_api_key = key,
            None => warn!("HERE_API_KEY not set. Upstream calls will fail."),
        }

        if let Some(url) = lookup("HERE_BASE_URL").filter(|url| !url.is_empty()) {
            config.here_base_url = Some(url);
        }

        if let Some(addr) = lookup("BIND_ADDR") {
            config.bind_addr = parse_var("BIND_ADDR", &addr)?;
        }

        if let Some(port) = lookup("PORT") {
            config.port = parse_var("PORT", &port)?;
        }

        if let Some(path) = lookup("EXTRA_DEPARTURES_PATH").filter(|path| !path.is_empty()) {
            config.extra_departures_path = PathBuf::from(path);
        }

        if let Some(secs) = lookup("CACHE_TTL_SECS") {
            let secs: u64 = parse_var("CACHE_TTL_SECS", &secs)?;
            if secs == 0 {
                return Err(ConfigError::Invalid {
                    name: "CACHE_TTL_SECS",
                    value: secs.to_string(),
                });
            }
            config.cache_ttl = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Socket address the server binds to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        value: value.to_string(),
    })
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}
