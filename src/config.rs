//! Runtime configuration. Hosts hand us their JSON platform block; the demo
//! reads the same settings from the environment.

use std::time::Duration;

use serde::Deserialize;

use crate::client::DEFAULT_TIMEOUT;
use crate::proxy::DEFAULT_EXPIRATION;
use crate::types::DisplayUnit;
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// IP address or host name of the controller, optionally with a port.
    pub host: String,
    pub display_unit: DisplayUnit,
    /// How long a fetched snapshot is served before the next read refetches.
    pub cache_expiration: Duration,
    pub request_timeout: Duration,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConfig {
    host: String,
    #[serde(default)]
    display_unit: DisplayUnit,
    cache_expiration_ms: Option<u64>,
    request_timeout_ms: Option<u64>,
}

impl Config {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            display_unit: DisplayUnit::default(),
            cache_expiration: DEFAULT_EXPIRATION,
            request_timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn from_json(s: &str) -> Result<Self> {
        let raw: RawConfig = serde_json::from_str(s)?;
        Self {
            host: raw.host.trim().to_string(),
            display_unit: raw.display_unit,
            cache_expiration: raw
                .cache_expiration_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_EXPIRATION),
            request_timeout: raw
                .request_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_TIMEOUT),
        }
        .validated()
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let host = lookup("UPONOR_HOST")
            .ok_or_else(|| Error::Config("missing UPONOR_HOST".to_string()))?;

        let display_unit = match lookup("UPONOR_DISPLAY_UNIT") {
            Some(s) if !s.trim().is_empty() => DisplayUnit::parse(&s)
                .ok_or_else(|| Error::Config(format!("unknown display unit: {s}")))?,
            _ => DisplayUnit::default(),
        };

        let millis = |key: &str, default: Duration| -> Result<Duration> {
            match lookup(key) {
                Some(s) if !s.trim().is_empty() => s
                    .trim()
                    .parse::<u64>()
                    .map(Duration::from_millis)
                    .map_err(|_| Error::Config(format!("{key} must be a number of milliseconds"))),
                _ => Ok(default),
            }
        };

        Self {
            host: host.trim().to_string(),
            display_unit,
            cache_expiration: millis("UPONOR_CACHE_EXPIRATION_MS", DEFAULT_EXPIRATION)?,
            request_timeout: millis("UPONOR_REQUEST_TIMEOUT_MS", DEFAULT_TIMEOUT)?,
        }
        .validated()
    }

    fn validated(self) -> Result<Self> {
        if self.host.is_empty() {
            return Err(Error::Config("host must not be empty".to_string()));
        }
        if self.request_timeout.is_zero() {
            return Err(Error::Config("request timeout must be positive".to_string()));
        }
        Ok(self)
    }
}
