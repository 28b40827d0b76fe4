//! Runtime configuration from environment variables.
//!
//! - `YINYANG_LISTEN_ADDR`: split listener (default `0.0.0.0:8080`)
//! - `YINYANG_HEALTH_ADDR`: health listener (default `0.0.0.0:8081`)
//! - `YINYANG_DISCOVERY_URL`: variant discovery endpoint
//! - `YINYANG_UPSTREAM_TIMEOUT_SECS`: per-fetch timeout, unset for none

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_DISCOVERY_URL: &str = "https://cfw-takehome.developers.workers.dev/api/variants";

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_HEALTH_ADDR: &str = "0.0.0.0:8081";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub health_addr: SocketAddr,
    pub discovery_url: String,
    pub upstream_timeout: Option<Duration>,
}

impl Config {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Loads configuration through `lookup`, which maps a variable name to
    /// its value if set.
    pub fn from_lookup<L>(lookup: L) -> Result<Self, ConfigError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let listen_addr = parse_addr(
            "YINYANG_LISTEN_ADDR",
            lookup("YINYANG_LISTEN_ADDR").as_deref(),
            DEFAULT_LISTEN_ADDR,
        )?;
        let health_addr = parse_addr(
            "YINYANG_HEALTH_ADDR",
            lookup("YINYANG_HEALTH_ADDR").as_deref(),
            DEFAULT_HEALTH_ADDR,
        )?;

        let discovery_url = lookup("YINYANG_DISCOVERY_URL")
            .unwrap_or_else(|| DEFAULT_DISCOVERY_URL.to_string());
        if !(discovery_url.starts_with("http://") || discovery_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                var: "YINYANG_DISCOVERY_URL",
                value: discovery_url,
                reason: "expected an http or https url".to_string(),
            });
        }

        let upstream_timeout = match lookup("YINYANG_UPSTREAM_TIMEOUT_SECS") {
            None => None,
            Some(raw) => match raw.parse::<u64>() {
                Ok(0) | Err(_) => {
                    return Err(ConfigError::Invalid {
                        var: "YINYANG_UPSTREAM_TIMEOUT_SECS",
                        value: raw,
                        reason: "expected a positive number of seconds".to_string(),
                    })
                }
                Ok(secs) => Some(Duration::from_secs(secs)),
            },
        };

        Ok(Self {
            listen_addr,
            health_addr,
            discovery_url,
            upstream_timeout,
        })
    }
}

fn parse_addr(
    var: &'static str,
    value: Option<&str>,
    default: &str,
) -> Result<SocketAddr, ConfigError> {
    let raw = value.unwrap_or(default);
    raw.parse().map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
        var,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}
