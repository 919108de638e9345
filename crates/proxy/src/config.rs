//! Proxy configuration read from the environment.
//!
//! | Variable | Default |
//! |---|---|
//! | `FOLIO_PROXY_UPSTREAM` | required |
//! | `FOLIO_PROXY_TIMEOUT_MS` | `10000` |
//! | `FOLIO_PROXY_BIND` | `0.0.0.0:8080` |
//! | `FOLIO_LOG_JSON` | `true` |

use crate::error::ConfigError;
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_BIND: &str = "0.0.0.0:8080";

#[derive(Debug, Clone, PartialEq)]
pub struct ProxyConfig {
    /// Project cards endpoint every request is forwarded to.
    pub upstream: String,
    /// Budget for the whole upstream exchange, body included.
    pub timeout: Duration,
    pub bind: SocketAddr,
    pub log_json: bool,
}

impl ProxyConfig {
    /// Config for `upstream` with every other setting at its default.
    pub fn new(upstream: impl Into<String>) -> Self {
        Self {
            upstream: upstream.into(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            bind: SocketAddr::from(([0, 0, 0, 0], 8080)),
            log_json: true,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source. Unparseable numbers and
    /// flags fall back to their defaults; a missing or non-HTTP upstream and
    /// an unparseable bind address are errors.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let upstream = lookup("FOLIO_PROXY_UPSTREAM")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingUpstream)?;
        if !(upstream.starts_with("http://") || upstream.starts_with("https://")) {
            return Err(ConfigError::InvalidUpstream(upstream));
        }
        let timeout_ms = lookup("FOLIO_PROXY_TIMEOUT_MS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .unwrap_or(DEFAULT_TIMEOUT_MS);
        let bind_raw = lookup("FOLIO_PROXY_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_raw
            .trim()
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidBind(bind_raw.clone()))?;
        let log_json = lookup("FOLIO_LOG_JSON")
            .and_then(|v| parse_bool(&v))
            .unwrap_or(true);
        Ok(Self {
            upstream,
            timeout: Duration::from_millis(timeout_ms),
            bind,
            log_json,
        })
    }
}

pub(crate) fn parse_bool(v: &str) -> Option<bool> {
    match v.trim() {
        "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
        "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
        _ => None,
    }
}
