//! Service settings read from the environment.
//!
//! Settings come from process environment variables, optionally seeded from
//! a `.env` file. Every setting has a default so the service starts with no
//! configuration at all.

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use super::repository::LoadPolicy;

/// Errors raised while reading service settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A numeric setting could not be parsed.
    #[error("{key} must be a valid {expected}, got '{value}'")]
    InvalidNumber {
        /// The environment variable name.
        key: &'static str,
        /// The kind of number expected.
        expected: &'static str,
        /// The value that was supplied.
        value: String,
    },

    /// The host is neither `localhost` nor an IP address.
    #[error("APP_HOST must parse to an IPv4 or IPv6 address")]
    InvalidHost {
        /// The underlying parse failure.
        #[source]
        source: std::net::AddrParseError,
    },
}

/// Top-level settings for the engine service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Host the HTTP server binds to.
    pub host: String,
    /// Port the HTTP server binds to.
    pub port: u16,
    /// Tracing filter directive (e.g., "info", "salary_tax_engine=debug").
    pub log_level: String,
    /// Directory holding `<fiscal-year>.yaml` rule files.
    pub rules_dir: PathBuf,
    /// Timeout and retry behaviour for rule loading.
    pub load_policy: LoadPolicy,
}

impl EngineSettings {
    /// Reads settings from the environment, loading `.env` first if present.
    pub fn from_env() -> Result<Self, SettingsError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads settings through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = LoadPolicy::default();

        let host = lookup("APP_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = parse_number(&lookup, "APP_PORT", "u16", 3000u16)?;
        let log_level = lookup("APP_LOG_LEVEL").unwrap_or_else(|| "info".to_string());
        let rules_dir = lookup("RULES_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./config/rules"));

        let timeout_ms = parse_number(
            &lookup,
            "RULE_LOAD_TIMEOUT_MS",
            "u64",
            defaults.timeout.as_millis() as u64,
        )?;
        let max_attempts =
            parse_number(&lookup, "RULE_LOAD_MAX_ATTEMPTS", "u32", defaults.max_attempts)?;
        let backoff_ms = parse_number(
            &lookup,
            "RULE_LOAD_BACKOFF_MS",
            "u64",
            defaults.initial_backoff.as_millis() as u64,
        )?;

        Ok(Self {
            host,
            port,
            log_level,
            rules_dir,
            load_policy: LoadPolicy {
                timeout: Duration::from_millis(timeout_ms),
                max_attempts,
                initial_backoff: Duration::from_millis(backoff_ms),
            },
        })
    }

    /// Resolves the socket address to bind.
    pub fn socket_addr(&self) -> Result<SocketAddr, SettingsError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| SettingsError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

fn parse_number<F, T>(
    lookup: &F,
    key: &'static str,
    expected: &'static str,
    default: T,
) -> Result<T, SettingsError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| SettingsError::InvalidNumber {
                key,
                expected,
                value,
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_from(pairs: &[(&str, &str)]) -> Result<EngineSettings, SettingsError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EngineSettings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let settings = settings_from(&[]).unwrap();
        assert_eq!(settings.host, "127.0.0.1");
        assert_eq!(settings.port, 3000);
        assert_eq!(settings.log_level, "info");
        assert_eq!(settings.rules_dir, PathBuf::from("./config/rules"));
        assert_eq!(settings.load_policy, LoadPolicy::default());
    }

    #[test]
    fn test_overrides_are_applied() {
        let settings = settings_from(&[
            ("APP_PORT", "8080"),
            ("RULES_DIR", "/etc/salary/rules"),
            ("RULE_LOAD_TIMEOUT_MS", "500"),
            ("RULE_LOAD_MAX_ATTEMPTS", "5"),
            ("RULE_LOAD_BACKOFF_MS", "20"),
        ])
        .unwrap();

        assert_eq!(settings.port, 8080);
        assert_eq!(settings.rules_dir, PathBuf::from("/etc/salary/rules"));
        assert_eq!(settings.load_policy.timeout, Duration::from_millis(500));
        assert_eq!(settings.load_policy.max_attempts, 5);
        assert_eq!(settings.load_policy.initial_backoff, Duration::from_millis(20));
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let err = settings_from(&[("APP_PORT", "seventy")]).unwrap_err();
        assert_eq!(err.to_string(), "APP_PORT must be a valid u16, got 'seventy'");
    }

    #[test]
    fn test_localhost_resolves_to_loopback() {
        let settings = settings_from(&[("APP_HOST", "localhost"), ("APP_PORT", "4000")]).unwrap();
        let addr = settings.socket_addr().unwrap();
        assert_eq!(addr, SocketAddr::from(([127, 0, 0, 1], 4000)));
    }

    #[test]
    fn test_invalid_host_is_rejected() {
        let settings = settings_from(&[("APP_HOST", "not-a-host")]).unwrap();
        assert!(matches!(
            settings.socket_addr(),
            Err(SettingsError::InvalidHost { .. })
        ));
    }
}
