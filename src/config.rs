//! # Configuration
//!
//! Settings come from `DASHBOARD_*` environment variables, after an optional
//! `.env` file has been loaded.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `DASHBOARD_BACKEND_URL` | unset: run on the in-memory backend |
//! | `DASHBOARD_BACKEND_ANON_KEY` | required with the URL |
//! | `DASHBOARD_POLL_INTERVAL_MS` | `5000` |
//! | `DASHBOARD_MAILBOX_CAPACITY` | `32` |
//! | `DASHBOARD_SESSION_PATH` | `.session/pediai_admin_session.json` |
//! | `DASHBOARD_LOG_JSON` | `false` |

use config::{Config, Environment};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

const ENV_PREFIX: &str = "DASHBOARD";
const DEFAULT_POLL_INTERVAL_MS: u64 = 5_000;
const DEFAULT_MAILBOX_CAPACITY: u64 = 32;
const DEFAULT_SESSION_PATH: &str = ".session/pediai_admin_session.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("DASHBOARD_BACKEND_ANON_KEY must be provided when DASHBOARD_BACKEND_URL is set")]
    MissingAnonKey,

    #[error("DASHBOARD_BACKEND_URL must be provided when DASHBOARD_BACKEND_ANON_KEY is set")]
    MissingBackendUrl,

    #[error("Invalid backend URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

#[derive(Debug, Deserialize)]
struct RawSettings {
    backend_url: Option<String>,
    backend_anon_key: Option<String>,
    poll_interval_ms: u64,
    mailbox_capacity: usize,
    session_path: String,
    log_json: bool,
}

/// Connection to the hosted backend.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendConfig {
    pub url: Url,
    pub anon_key: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    /// `None` runs the dashboard on the in-memory backend.
    pub backend: Option<BackendConfig>,
    pub poll_interval: Duration,
    pub mailbox_capacity: usize,
    pub session_path: PathBuf,
    pub log_json: bool,
}

impl DashboardConfig {
    /// Loads `.env` (if any) and reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_environment(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
    }

    /// Reads settings from an explicit variable map instead of the process
    /// environment. Keys use the full `DASHBOARD_*` names.
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_environment(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .source(Some(vars)),
        )
    }

    fn from_environment(environment: Environment) -> Result<Self, ConfigError> {
        let raw: RawSettings = Config::builder()
            .set_default("poll_interval_ms", DEFAULT_POLL_INTERVAL_MS)?
            .set_default("mailbox_capacity", DEFAULT_MAILBOX_CAPACITY)?
            .set_default("session_path", DEFAULT_SESSION_PATH)?
            .set_default("log_json", false)?
            .add_source(environment)
            .build()?
            .try_deserialize()?;
        let config = Self::validate(raw)?;
        debug!(?config, "Configuration loaded");
        Ok(config)
    }

    fn validate(raw: RawSettings) -> Result<Self, ConfigError> {
        let url = raw.backend_url.filter(|v| !v.trim().is_empty());
        let key = raw.backend_anon_key.filter(|v| !v.trim().is_empty());
        let backend = match (url, key) {
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::MissingAnonKey),
            (None, Some(_)) => return Err(ConfigError::MissingBackendUrl),
            (Some(url), Some(anon_key)) => {
                let parsed = Url::parse(url.trim()).map_err(|e| ConfigError::InvalidUrl {
                    url: url.clone(),
                    reason: e.to_string(),
                })?;
                if !matches!(parsed.scheme(), "http" | "https") {
                    return Err(ConfigError::InvalidUrl {
                        url,
                        reason: "scheme must be http or https".to_string(),
                    });
                }
                Some(BackendConfig {
                    url: parsed,
                    anon_key,
                })
            }
        };

        if raw.poll_interval_ms == 0 {
            return Err(ConfigError::Zero("DASHBOARD_POLL_INTERVAL_MS"));
        }
        if raw.mailbox_capacity == 0 {
            return Err(ConfigError::Zero("DASHBOARD_MAILBOX_CAPACITY"));
        }

        Ok(Self {
            backend,
            poll_interval: Duration::from_millis(raw.poll_interval_ms),
            mailbox_capacity: raw.mailbox_capacity,
            session_path: PathBuf::from(raw.session_path),
            log_json: raw.log_json,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_without_backend() {
        let config = DashboardConfig::from_vars(HashMap::new()).unwrap();
        assert_eq!(config.backend, None);
        assert_eq!(config.poll_interval, Duration::from_millis(5_000));
        assert_eq!(config.mailbox_capacity, 32);
        assert_eq!(
            config.session_path,
            PathBuf::from(".session/pediai_admin_session.json")
        );
        assert!(!config.log_json);
    }

    #[test]
    fn test_backend_and_overrides() {
        let config = DashboardConfig::from_vars(vars(&[
            ("DASHBOARD_BACKEND_URL", "https://abc.supabase.co"),
            ("DASHBOARD_BACKEND_ANON_KEY", "anon"),
            ("DASHBOARD_POLL_INTERVAL_MS", "1500"),
            ("DASHBOARD_LOG_JSON", "true"),
        ]))
        .unwrap();

        let backend = config.backend.unwrap();
        assert_eq!(backend.url.host_str(), Some("abc.supabase.co"));
        assert_eq!(backend.anon_key, "anon");
        assert_eq!(config.poll_interval, Duration::from_millis(1_500));
        assert!(config.log_json);
    }

    #[test]
    fn test_url_without_key_is_rejected() {
        let result = DashboardConfig::from_vars(vars(&[(
            "DASHBOARD_BACKEND_URL",
            "https://abc.supabase.co",
        )]));
        assert!(matches!(result, Err(ConfigError::MissingAnonKey)));
    }

    #[test]
    fn test_bad_url_is_rejected() {
        let result = DashboardConfig::from_vars(vars(&[
            ("DASHBOARD_BACKEND_URL", "not a url"),
            ("DASHBOARD_BACKEND_ANON_KEY", "anon"),
        ]));
        assert!(matches!(result, Err(ConfigError::InvalidUrl { .. })));
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let result = DashboardConfig::from_vars(vars(&[("DASHBOARD_POLL_INTERVAL_MS", "0")]));
        assert!(matches!(result, Err(ConfigError::Zero(_))));
    }
}
