//! Local configuration for the remote configuration fetch client.
//!
//! [`LocalConfig`] is supplied once at construction and never mutated by the
//! client. [`RemoteConfigEnv`] derives the same settings from the host process
//! environment so embedders and the CLI share one loading path.

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use crate::http::HttpClientOptions;
use crate::sink::{LoggingSink, TracingSink};

/// Environment variable carrying the project API key.
const ENV_API_KEY: &str = "REMOTE_CONFIG_API_KEY";
/// Environment variable selecting the server zone (`US`, `EU`, `STAGING`).
const ENV_SERVER_ZONE: &str = "REMOTE_CONFIG_SERVER_ZONE";
/// Environment variable overriding the configuration server URL.
const ENV_SERVER_URL: &str = "REMOTE_CONFIG_SERVER_URL";
/// Environment variable bounding attempts per session.
const ENV_FLUSH_MAX_RETRIES: &str = "REMOTE_CONFIG_FLUSH_MAX_RETRIES";
/// Environment variable listing the namespaces to request (comma separated).
const ENV_CONFIG_KEYS: &str = "REMOTE_CONFIG_KEYS";
/// Environment variable allowing `http://` server URLs.
const ENV_ALLOW_PLAINTEXT: &str = "REMOTE_CONFIG_ALLOW_PLAINTEXT";
/// Environment variable disabling TLS certificate and hostname validation.
const ENV_NO_TLS_VALIDATION: &str = "REMOTE_CONFIG_NO_TLS_VALIDATION";
/// Environment variable setting the log level used by the CLI.
const ENV_LOG_LEVEL: &str = "REMOTE_CONFIG_LOG_LEVEL";

/// Default number of attempts allowed per session.
pub const DEFAULT_FLUSH_MAX_RETRIES: u32 = 12;
/// Default log level.
const DEFAULT_LOG_LEVEL: &str = "info";

/// Errors raised while materialising a [`LocalConfig`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// No API key was supplied.
    #[error("missing API key: set REMOTE_CONFIG_API_KEY")]
    MissingApiKey,
    /// The server zone is not one of `US`, `EU` or `STAGING`.
    #[error("invalid server zone: {0}")]
    InvalidServerZone(String),
    /// The retry bound is not a non-negative integer.
    #[error("invalid flush max retries: {0}")]
    InvalidFlushMaxRetries(String),
}

/// Data residency zone of the configuration server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ServerZone {
    #[default]
    Us,
    Eu,
    Staging,
}

impl FromStr for ServerZone {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "US" => Ok(Self::Us),
            "EU" => Ok(Self::Eu),
            "STAGING" => Ok(Self::Staging),
            _ => Err(ConfigError::InvalidServerZone(value.to_string())),
        }
    }
}

impl fmt::Display for ServerZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Us => "US",
            Self::Eu => "EU",
            Self::Staging => "STAGING",
        };
        f.write_str(name)
    }
}

/// Read-only settings supplied by the embedding application.
#[derive(Clone)]
pub struct LocalConfig {
    /// Project API key sent as the `api_key` query parameter.
    pub api_key: String,
    /// Zone used to pick the default server when no override is set.
    pub server_zone: ServerZone,
    /// Explicit server URL; wins over the zone default.
    pub config_server_url: Option<String>,
    /// Maximum number of attempts counted against a single session.
    pub flush_max_retries: u32,
    /// Sink receiving the client's success messages.
    pub logger: Arc<dyn LoggingSink>,
}

impl LocalConfig {
    /// Builds a config for `api_key` with default zone, retries and a tracing sink.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            server_zone: ServerZone::default(),
            config_server_url: None,
            flush_max_retries: DEFAULT_FLUSH_MAX_RETRIES,
            logger: Arc::new(TracingSink),
        }
    }
}

impl fmt::Debug for LocalConfig {
    /// Omits the API key and the sink from debug output.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalConfig")
            .field("api_key", &"<redacted>")
            .field("server_zone", &self.server_zone)
            .field("config_server_url", &self.config_server_url)
            .field("flush_max_retries", &self.flush_max_retries)
            .finish()
    }
}

/// Captures environment-derived options used to build a [`LocalConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfigEnv {
    /// Sanitised API key, if any.
    pub api_key: Option<String>,
    /// Raw server zone value (validated by [`RemoteConfigEnv::to_local_config`]).
    pub server_zone: Option<String>,
    /// Optional server URL override.
    pub config_server_url: Option<String>,
    /// Raw retry bound (validated by [`RemoteConfigEnv::to_local_config`]).
    pub flush_max_retries: Option<String>,
    /// Namespaces to request, in declaration order.
    pub config_keys: Vec<String>,
    /// Whether plaintext server URLs are accepted.
    pub allow_plaintext: bool,
    /// Whether TLS validation is skipped.
    pub no_tls_validation: bool,
    /// Log level for the CLI subscriber.
    pub log_level: String,
}

impl RemoteConfigEnv {
    /// Builds settings from the current process environment.
    pub fn from_os_env() -> Self {
        Self::from_env_iter(env::vars())
    }

    /// Builds settings from an iterator of key/value pairs (typically for tests).
    pub fn from_env_iter<I, K, V>(iter: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map: HashMap<String, String> = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let get = |name: &str| map.get(name).and_then(|value| sanitize_non_empty(value));

        let config_keys = get(ENV_CONFIG_KEYS)
            .map(|keys| {
                keys.split(',')
                    .filter_map(sanitize_non_empty)
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        Self {
            api_key: get(ENV_API_KEY),
            server_zone: get(ENV_SERVER_ZONE),
            config_server_url: get(ENV_SERVER_URL),
            flush_max_retries: get(ENV_FLUSH_MAX_RETRIES),
            config_keys,
            allow_plaintext: parse_bool(map.get(ENV_ALLOW_PLAINTEXT).map(String::as_str), false),
            no_tls_validation: parse_bool(
                map.get(ENV_NO_TLS_VALIDATION).map(String::as_str),
                false,
            ),
            log_level: get(ENV_LOG_LEVEL)
                .map(|level| level.to_ascii_lowercase())
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        }
    }

    /// Validates the captured values and builds a [`LocalConfig`] logging to `logger`.
    pub fn to_local_config(
        &self,
        logger: Arc<dyn LoggingSink>,
    ) -> Result<LocalConfig, ConfigError> {
        let api_key = self.api_key.clone().ok_or(ConfigError::MissingApiKey)?;
        let server_zone = self
            .server_zone
            .as_deref()
            .map(ServerZone::from_str)
            .transpose()?
            .unwrap_or_default();
        let flush_max_retries = match self.flush_max_retries.as_deref() {
            Some(raw) => raw
                .parse::<u32>()
                .map_err(|_| ConfigError::InvalidFlushMaxRetries(raw.to_string()))?,
            None => DEFAULT_FLUSH_MAX_RETRIES,
        };
        Ok(LocalConfig {
            api_key,
            server_zone,
            config_server_url: self.config_server_url.clone(),
            flush_max_retries,
            logger,
        })
    }
}

impl RemoteConfigEnv {
    /// Transport options derived from the TLS switches.
    pub fn http_client_options(&self) -> HttpClientOptions {
        HttpClientOptions {
            allow_plaintext: self.allow_plaintext,
            accept_invalid_certs: self.no_tls_validation,
        }
    }
}

/// Parses boolean values from strings, falling back to the provided default.
fn parse_bool(value: Option<&str>, default: bool) -> bool {
    match value.map(|s| s.trim().to_ascii_lowercase()) {
        Some(ref v) if ["1", "true", "t", "yes", "y"].contains(&v.as_str()) => true,
        Some(ref v) if ["0", "false", "f", "no", "n"].contains(&v.as_str()) => false,
        _ => default,
    }
}

/// Helper trimming whitespace and discarding empty values.
fn sanitize_non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
