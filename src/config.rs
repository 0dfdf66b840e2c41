//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;
use std::path::PathBuf;

use rand::RngCore;

use crate::auth::{TokenSettings, DEFAULT_ACCESS_TTL_MINUTES, DEFAULT_REFRESH_TTL_DAYS};

/// Longest accepted access token lifetime (one day)
pub const MAX_ACCESS_TTL_MINUTES: i64 = 24 * 60;

/// Longest accepted refresh token lifetime (one year)
pub const MAX_REFRESH_TTL_DAYS: i64 = 365;

/// Application configuration
#[derive(Clone)]
pub struct Config {
    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    /// HMAC secret for access tokens
    pub access_secret: String,

    /// HMAC secret for refresh tokens
    pub refresh_secret: String,

    pub access_token_ttl_minutes: i64,

    pub refresh_token_ttl_days: i64,

    /// Directory holding customers.json, merchants.json and histories.json
    pub data_dir: PathBuf,

    /// Record every request in the history log
    pub history_enabled: bool,

    /// Map refresh failures to 500 instead of 401
    pub legacy_refresh_status: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from any name-to-value source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());

        let port = parse_var(&lookup, "PORT", 8080)?;

        let environment = lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string());
        let production = environment == "production";

        let access_secret = secret_var(&lookup, "ACCESS_SECRET", production)?;
        let refresh_secret = secret_var(&lookup, "REFRESH_SECRET", production)?;
        if access_secret == refresh_secret {
            return Err(ConfigError::SecretReuse);
        }

        let access_token_ttl_minutes = parse_var(
            &lookup,
            "ACCESS_TOKEN_TTL_MINUTES",
            DEFAULT_ACCESS_TTL_MINUTES,
        )?;
        if !(1..=MAX_ACCESS_TTL_MINUTES).contains(&access_token_ttl_minutes) {
            return Err(ConfigError::InvalidValue("ACCESS_TOKEN_TTL_MINUTES"));
        }

        let refresh_token_ttl_days =
            parse_var(&lookup, "REFRESH_TOKEN_TTL_DAYS", DEFAULT_REFRESH_TTL_DAYS)?;
        if !(1..=MAX_REFRESH_TTL_DAYS).contains(&refresh_token_ttl_days) {
            return Err(ConfigError::InvalidValue("REFRESH_TOKEN_TTL_DAYS"));
        }

        let data_dir = lookup("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data"));

        let history_enabled = parse_var(&lookup, "HISTORY_ENABLED", true)?;
        let legacy_refresh_status = parse_var(&lookup, "LEGACY_REFRESH_STATUS", false)?;

        Ok(Self {
            host,
            port,
            environment,
            access_secret,
            refresh_secret,
            access_token_ttl_minutes,
            refresh_token_ttl_days,
            data_dir,
            history_enabled,
            legacy_refresh_status,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Signing settings for the token issuer, lifetimes clamped to the accepted range
    pub fn token_settings(&self) -> TokenSettings {
        let access_minutes = self.access_token_ttl_minutes.clamp(1, MAX_ACCESS_TTL_MINUTES);
        let refresh_days = self.refresh_token_ttl_days.clamp(1, MAX_REFRESH_TTL_DAYS);

        let mut settings = TokenSettings::new(&self.access_secret, &self.refresh_secret);
        settings.access_ttl = chrono::Duration::minutes(access_minutes);
        settings.refresh_ttl = chrono::Duration::days(refresh_days);
        settings
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("environment", &self.environment)
            .field("access_secret", &"[REDACTED]")
            .field("refresh_secret", &"[REDACTED]")
            .field("access_token_ttl_minutes", &self.access_token_ttl_minutes)
            .field("refresh_token_ttl_days", &self.refresh_token_ttl_days)
            .field("data_dir", &self.data_dir)
            .field("history_enabled", &self.history_enabled)
            .field("legacy_refresh_status", &self.legacy_refresh_status)
            .finish()
    }
}

fn parse_var<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue(name)),
        None => Ok(default),
    }
}

/// Secrets are mandatory in production; development gets a random per-process secret.
fn secret_var<F>(lookup: &F, name: &'static str, required: bool) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) if !value.is_empty() => Ok(value),
        _ if required => Err(ConfigError::MissingEnv(name)),
        _ => {
            tracing::warn!("{} not set, using a random secret; tokens will not survive a restart", name);
            Ok(random_secret())
        }
    }
}

fn random_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),

    #[error("ACCESS_SECRET and REFRESH_SECRET must differ")]
    SecretReuse,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.environment, "development");
        assert_eq!(config.access_token_ttl_minutes, DEFAULT_ACCESS_TTL_MINUTES);
        assert_eq!(config.refresh_token_ttl_days, DEFAULT_REFRESH_TTL_DAYS);
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert!(config.history_enabled);
        assert!(!config.legacy_refresh_status);
        assert_ne!(config.access_secret, config.refresh_secret);
    }

    #[test]
    fn test_explicit_values() {
        let config = load(&[
            ("HOST", "0.0.0.0"),
            ("PORT", " 3000 "),
            ("ACCESS_SECRET", "access"),
            ("REFRESH_SECRET", "refresh"),
            ("ACCESS_TOKEN_TTL_MINUTES", "30"),
            ("REFRESH_TOKEN_TTL_DAYS", "14"),
            ("DATA_DIR", "/srv/pay"),
            ("HISTORY_ENABLED", "false"),
            ("LEGACY_REFRESH_STATUS", "true"),
        ])
        .unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.access_secret, "access");
        assert_eq!(config.refresh_secret, "refresh");
        assert_eq!(config.access_token_ttl_minutes, 30);
        assert_eq!(config.refresh_token_ttl_days, 14);
        assert_eq!(config.data_dir, PathBuf::from("/srv/pay"));
        assert!(!config.history_enabled);
        assert!(config.legacy_refresh_status);
    }

    #[test]
    fn test_equal_secrets_rejected() {
        let err = load(&[("ACCESS_SECRET", "same"), ("REFRESH_SECRET", "same")]).unwrap_err();
        assert!(matches!(err, ConfigError::SecretReuse));
    }

    #[test]
    fn test_production_requires_secrets() {
        let err = load(&[("ENVIRONMENT", "production")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnv("ACCESS_SECRET")));

        let err = load(&[
            ("ENVIRONMENT", "production"),
            ("ACCESS_SECRET", "access"),
            ("REFRESH_SECRET", ""),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnv("REFRESH_SECRET")));

        let config = load(&[
            ("ENVIRONMENT", "production"),
            ("ACCESS_SECRET", "access"),
            ("REFRESH_SECRET", "refresh"),
        ])
        .unwrap();
        assert!(config.is_production());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let cases = [
            ("PORT", "http", "PORT"),
            ("PORT", "70000", "PORT"),
            ("HISTORY_ENABLED", "yes", "HISTORY_ENABLED"),
            ("LEGACY_REFRESH_STATUS", "1", "LEGACY_REFRESH_STATUS"),
            ("ACCESS_TOKEN_TTL_MINUTES", "0", "ACCESS_TOKEN_TTL_MINUTES"),
            ("ACCESS_TOKEN_TTL_MINUTES", "-5", "ACCESS_TOKEN_TTL_MINUTES"),
            ("ACCESS_TOKEN_TTL_MINUTES", "1441", "ACCESS_TOKEN_TTL_MINUTES"),
            ("REFRESH_TOKEN_TTL_DAYS", "0", "REFRESH_TOKEN_TTL_DAYS"),
            ("REFRESH_TOKEN_TTL_DAYS", "200000000", "REFRESH_TOKEN_TTL_DAYS"),
            ("REFRESH_TOKEN_TTL_DAYS", "9223372036854775807", "REFRESH_TOKEN_TTL_DAYS"),
        ];

        for (name, value, expected) in cases {
            match load(&[(name, value)]) {
                Err(ConfigError::InvalidValue(var)) => assert_eq!(var, expected, "{}={}", name, value),
                other => panic!("{}={} gave {:?}", name, value, other),
            }
        }
    }

    #[test]
    fn test_upper_ttl_bounds_accepted() {
        let config = load(&[
            ("ACCESS_TOKEN_TTL_MINUTES", "1440"),
            ("REFRESH_TOKEN_TTL_DAYS", "365"),
        ])
        .unwrap();
        let settings = config.token_settings();
        assert_eq!(settings.access_ttl, chrono::Duration::minutes(MAX_ACCESS_TTL_MINUTES));
        assert_eq!(settings.refresh_ttl, chrono::Duration::days(MAX_REFRESH_TTL_DAYS));
    }

    #[test]
    fn test_random_secrets_differ() {
        let a = random_secret();
        let b = random_secret();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
    }

    #[test]
    fn test_token_settings_use_configured_ttls() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            environment: "development".to_string(),
            access_secret: "a".to_string(),
            refresh_secret: "r".to_string(),
            access_token_ttl_minutes: 5,
            refresh_token_ttl_days: 1,
            data_dir: PathBuf::from("data"),
            history_enabled: true,
            legacy_refresh_status: false,
        };

        let settings = config.token_settings();
        assert_eq!(settings.access_ttl, chrono::Duration::minutes(5));
        assert_eq!(settings.refresh_ttl, chrono::Duration::days(1));
        assert!(!config.is_production());
        assert!(!format!("{:?}", config).contains("\"a\""));
    }

    #[test]
    fn test_token_settings_clamp_hand_built_ttls() {
        let mut config = load(&[]).unwrap();
        config.access_token_ttl_minutes = i64::MAX;
        config.refresh_token_ttl_days = i64::MAX;

        let settings = config.token_settings();
        assert_eq!(settings.access_ttl, chrono::Duration::minutes(MAX_ACCESS_TTL_MINUTES));
        assert_eq!(settings.refresh_ttl, chrono::Duration::days(MAX_REFRESH_TTL_DAYS));
    }
}
