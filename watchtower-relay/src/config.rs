//! Configuration module for environment variable parsing.
//!
//! All settings are read once at startup into an immutable [`Config`] which is
//! then shared behind an `Arc` for the lifetime of the process.

use std::env;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;
use url::Url;

/// Default Watchtower base URL when `WATCHTOWER_URL` is unset.
pub const DEFAULT_WATCHTOWER_URL: &str = "localhost:8080";

/// Default delay before a webhook is forwarded.
pub const DEFAULT_DELAY_SECONDS: u64 = 20;

/// Default inbound listen port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default inbound body limit (2 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Path appended to the Watchtower base URL.
pub const UPDATE_PATH: &str = "/v1/update";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("invalid WATCHTOWER_URL {value:?}: {source}")]
    InvalidUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Identifier expected in `/api/webhooks/{id}`
    pub webhook_id: String,

    /// Bearer token sent to Watchtower
    pub watchtower_api_key: String,

    /// Base URL of the Watchtower HTTP API, scheme included
    pub watchtower_url: String,

    /// Port for the web server to listen on
    pub port: u16,

    /// Only forward pushes whose tag is `latest`
    pub watch_only_for_latest_tag: bool,

    /// Delay between accepting a webhook and forwarding it
    pub delay: Duration,

    /// Maximum accepted request body size
    pub max_body_bytes: usize,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let webhook_id = required(&lookup, "WEBHOOK_ID")?;
        let watchtower_api_key = required(&lookup, "WATCHTOWER_API_KEY")?;

        let watchtower_url = normalize_base_url(
            lookup("WATCHTOWER_URL")
                .filter(|v| !v.trim().is_empty())
                .as_deref()
                .unwrap_or(DEFAULT_WATCHTOWER_URL),
        )?;

        Ok(Config {
            webhook_id,
            watchtower_api_key,
            watchtower_url,

            port: parse_or_default(&lookup, "PORT", DEFAULT_PORT),

            watch_only_for_latest_tag: lookup("WATCH_ONLY_FOR_LATEST_TAG")
                .map(|v| v.trim().eq_ignore_ascii_case("true"))
                .unwrap_or(false),

            delay: Duration::from_secs(parse_positive(
                &lookup,
                "DELAY_SECONDS",
                DEFAULT_DELAY_SECONDS,
            )),

            max_body_bytes: parse_or_default(&lookup, "MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES),
        })
    }

    /// Full URL of the Watchtower update endpoint.
    pub fn update_url(&self) -> String {
        format!("{}{}", self.watchtower_url, UPDATE_PATH)
    }
}

fn required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}

/// Add an `http://` scheme when missing and strip trailing slashes.
fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let raw = raw.trim();
    let with_scheme = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("http://{}", raw)
    };

    Url::parse(&with_scheme).map_err(|source| ConfigError::InvalidUrl {
        value: raw.to_string(),
        source,
    })?;

    Ok(with_scheme.trim_end_matches('/').to_string())
}

/// Parse a value, falling back to `default` when unset or malformed.
fn parse_or_default<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let Some(raw) = lookup(name) else {
        return default;
    };

    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid value, using default");
            default
        }
    }
}

/// Parse a strictly positive integer; zero, negatives and garbage fall back.
fn parse_positive<F>(lookup: &F, name: &str, default: u64) -> u64
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(name) else {
        return default;
    };
    if raw.is_empty() {
        return default;
    }

    match raw.trim().parse::<i64>() {
        Ok(value) if value > 0 => value as u64,
        _ => {
            warn!(env_var = name, value = %raw, "Non-positive or invalid value, using default");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn base() -> Vec<(&'static str, &'static str)> {
        vec![("WEBHOOK_ID", "hook-123"), ("WATCHTOWER_API_KEY", "secret")]
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&base())).unwrap();
        assert_eq!(config.webhook_id, "hook-123");
        assert_eq!(config.watchtower_api_key, "secret");
        assert_eq!(config.watchtower_url, "http://localhost:8080");
        assert_eq!(config.port, 3000);
        assert!(!config.watch_only_for_latest_tag);
        assert_eq!(config.delay, Duration::from_secs(20));
        assert_eq!(config.max_body_bytes, DEFAULT_MAX_BODY_BYTES);
    }

    #[test]
    fn test_missing_required() {
        let err = Config::from_lookup(lookup_from(&[("WATCHTOWER_API_KEY", "k")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("WEBHOOK_ID")));

        let err = Config::from_lookup(lookup_from(&[("WEBHOOK_ID", "id"), ("WATCHTOWER_API_KEY", "")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Missing("WATCHTOWER_API_KEY")));
    }

    #[test]
    fn test_update_url_composition() {
        let mut vars = base();
        vars.push(("WATCHTOWER_URL", "https://wt.example:9999"));
        let config = Config::from_lookup(lookup_from(&vars)).unwrap();
        assert_eq!(config.update_url(), "https://wt.example:9999/v1/update");

        let mut vars = base();
        vars.push(("WATCHTOWER_URL", "http://watchtower:8080/"));
        let config = Config::from_lookup(lookup_from(&vars)).unwrap();
        assert_eq!(config.update_url(), "http://watchtower:8080/v1/update");
    }

    #[test]
    fn test_invalid_url() {
        let mut vars = base();
        vars.push(("WATCHTOWER_URL", "http://bad host"));
        let err = Config::from_lookup(lookup_from(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));
    }

    #[test]
    fn test_watch_only_flag_case_insensitive() {
        for (value, expected) in [("true", true), ("TRUE", true), ("True", true), ("yes", false), ("1", false)] {
            let mut vars = base();
            vars.push(("WATCH_ONLY_FOR_LATEST_TAG", value));
            let config = Config::from_lookup(lookup_from(&vars)).unwrap();
            assert_eq!(config.watch_only_for_latest_tag, expected, "value {value}");
        }
    }

    #[test]
    fn test_delay_override() {
        let mut vars = base();
        vars.push(("DELAY_SECONDS", "5"));
        let config = Config::from_lookup(lookup_from(&vars)).unwrap();
        assert_eq!(config.delay, Duration::from_secs(5));
    }

    #[test]
    fn test_delay_ignores_non_positive_and_garbage() {
        for value in ["0", "-3", "abc", "1.5", ""] {
            let mut vars = base();
            vars.push(("DELAY_SECONDS", value));
            let config = Config::from_lookup(lookup_from(&vars)).unwrap();
            assert_eq!(config.delay, Duration::from_secs(20), "value {value:?}");
        }
    }

    #[test]
    fn test_invalid_port_falls_back() {
        let mut vars = base();
        vars.push(("PORT", "not-a-port"));
        let config = Config::from_lookup(lookup_from(&vars)).unwrap();
        assert_eq!(config.port, 3000);

        let mut vars = base();
        vars.push(("PORT", "8081"));
        let config = Config::from_lookup(lookup_from(&vars)).unwrap();
        assert_eq!(config.port, 8081);
    }
}
