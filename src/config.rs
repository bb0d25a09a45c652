//! Runtime configuration parsed from environment variables.
//!
//! Unset or unparsable values fall back to defaults. Only the bind address
//! can fail.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_CLIENT_CHANNEL_CAPACITY: usize = 256;
pub const DEFAULT_PREVIEW_INTERVAL_MS: u64 = 250;
pub const DEFAULT_PREVIEW_STALE_MS: u64 = 2000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid BIND_ADDR '{0}'")]
    InvalidBindAddr(String),
}

/// Server-side settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    /// Outbound frames buffered per connection before fan-out starts skipping it.
    pub client_channel_capacity: usize,
}

impl ServerConfig {
    /// Build server config from environment variables.
    ///
    /// - `BIND_ADDR`: default `0.0.0.0`
    /// - `PORT`: default 3000
    /// - `CLIENT_CHANNEL_CAPACITY`: default 256, minimum 1
    ///
    /// # Errors
    ///
    /// Returns an error if `BIND_ADDR` is set but is not an IP address.
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        let ip: IpAddr = raw_addr
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddr(raw_addr.clone()))?;
        let port = env_parse("PORT", DEFAULT_PORT);
        let client_channel_capacity = env_parse("CLIENT_CHANNEL_CAPACITY", DEFAULT_CLIENT_CHANNEL_CAPACITY).max(1);

        Ok(Self { addr: SocketAddr::new(ip, port), client_channel_capacity })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::new(IpAddr::from([0, 0, 0, 0]), DEFAULT_PORT),
            client_channel_capacity: DEFAULT_CLIENT_CHANNEL_CAPACITY,
        }
    }
}

/// Participant-side timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientConfig {
    /// Period between preview publications during a gesture.
    pub preview_interval: Duration,
    /// A remote preview not refreshed within this window is evicted.
    pub preview_stale_after: Duration,
}

impl ClientConfig {
    /// Build client config from environment variables.
    ///
    /// - `PREVIEW_INTERVAL_MS`: default 250, minimum 1
    /// - `PREVIEW_STALE_MS`: default 2000, never below the preview interval
    #[must_use]
    pub fn from_env() -> Self {
        let interval_ms = env_parse("PREVIEW_INTERVAL_MS", DEFAULT_PREVIEW_INTERVAL_MS).max(1);
        let stale_ms = env_parse("PREVIEW_STALE_MS", DEFAULT_PREVIEW_STALE_MS).max(interval_ms);
        Self {
            preview_interval: Duration::from_millis(interval_ms),
            preview_stale_after: Duration::from_millis(stale_ms),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            preview_interval: Duration::from_millis(DEFAULT_PREVIEW_INTERVAL_MS),
            preview_stale_after: Duration::from_millis(DEFAULT_PREVIEW_STALE_MS),
        }
    }
}

fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
