//! Service configuration loaded from environment variables.
//!
//! All settings come from environment variables (or a `.env` file via
//! `dotenvy`):
//!
//! | Variable            | Default        |
//! |---------------------|----------------|
//! | `LISTEN_ADDR`       | `0.0.0.0:8000` |
//! | `OUTBOX_CAPACITY`   | `256`          |
//! | `SEND_TIMEOUT_MS`   | `10000`        |
//! | `MAX_MESSAGE_BYTES` | `65536`        |
//! | `LOG_FORMAT`        | `text`         |

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;

/// Output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Top-level service configuration.
///
/// Loaded once at startup via [`HubConfig::from_env`].
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:8000`).
    pub listen_addr: SocketAddr,

    /// Per-connection outbound queue length. A broadcast that finds the
    /// queue full is dropped for that connection only.
    pub outbox_capacity: usize,

    /// Longest a single socket write may take before the session is dropped.
    pub send_timeout: Duration,

    /// Largest inbound websocket message accepted, in bytes.
    pub max_message_bytes: usize,

    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            outbox_capacity: 256,
            send_timeout: Duration::from_millis(10_000),
            max_message_bytes: 64 * 1024,
            log_format: LogFormat::Text,
        }
    }
}

impl HubConfig {
    /// Loads configuration from the process environment.
    ///
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as
    /// a [`SocketAddr`].
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    ///
    /// Missing or unparseable values fall back to [`HubConfig::default`],
    /// except `LISTEN_ADDR`, which must parse when present.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is present but invalid.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let listen_addr = match lookup("LISTEN_ADDR") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("invalid LISTEN_ADDR {raw:?}"))?,
            None => defaults.listen_addr,
        };

        let outbox_capacity = parse_var(&lookup, "OUTBOX_CAPACITY", defaults.outbox_capacity);
        // mpsc::channel panics on zero capacity
        let outbox_capacity = outbox_capacity.max(1);

        let send_timeout = lookup("SEND_TIMEOUT_MS")
            .and_then(|v| v.parse().ok())
            .map_or(defaults.send_timeout, Duration::from_millis);

        let max_message_bytes =
            parse_var(&lookup, "MAX_MESSAGE_BYTES", defaults.max_message_bytes);

        let log_format = match lookup("LOG_FORMAT").as_deref() {
            Some("json") | Some("JSON") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            listen_addr,
            outbox_capacity,
            send_timeout,
            max_message_bytes,
            log_format,
        })
    }
}

/// Parses a variable as `T`, returning `default` on missing or invalid
/// values.
fn parse_var<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> anyhow::Result<HubConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        HubConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let Ok(config) = from_pairs(&[]) else {
            panic!("defaults must load");
        };
        assert_eq!(config.listen_addr.port(), 8000);
        assert_eq!(config.outbox_capacity, 256);
        assert_eq!(config.send_timeout, Duration::from_secs(10));
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn values_override_defaults() {
        let Ok(config) = from_pairs(&[
            ("LISTEN_ADDR", "127.0.0.1:9001"),
            ("OUTBOX_CAPACITY", "8"),
            ("SEND_TIMEOUT_MS", "250"),
            ("MAX_MESSAGE_BYTES", "1024"),
            ("LOG_FORMAT", "json"),
        ]) else {
            panic!("valid config rejected");
        };
        assert_eq!(config.listen_addr, SocketAddr::from(([127, 0, 0, 1], 9001)));
        assert_eq!(config.outbox_capacity, 8);
        assert_eq!(config.send_timeout, Duration::from_millis(250));
        assert_eq!(config.max_message_bytes, 1024);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn bad_listen_addr_is_an_error() {
        assert!(from_pairs(&[("LISTEN_ADDR", ":8000")]).is_err());
    }

    #[test]
    fn bad_numbers_fall_back() {
        let Ok(config) = from_pairs(&[("OUTBOX_CAPACITY", "lots"), ("SEND_TIMEOUT_MS", "-1")])
        else {
            panic!("fallbacks must load");
        };
        assert_eq!(config.outbox_capacity, 256);
        assert_eq!(config.send_timeout, Duration::from_secs(10));
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let Ok(config) = from_pairs(&[("OUTBOX_CAPACITY", "0")]) else {
            panic!("config rejected");
        };
        assert_eq!(config.outbox_capacity, 1);
    }
}
