//! Configuration server endpoint resolution.

use crate::config::{LocalConfig, ServerZone};

/// Global default configuration server.
pub const REMOTE_CONFIG_SERVER_URL: &str = "https://sr-client-cfg.amplitude.com/config";
/// Configuration server used for the `STAGING` zone.
pub const REMOTE_CONFIG_SERVER_URL_STAGING: &str =
    "https://sr-client-cfg.stag2.amplitude.com/config";
/// Configuration server used for the `EU` zone.
pub const REMOTE_CONFIG_SERVER_URL_EU: &str = "https://sr-client-cfg.eu.amplitude.com/config";

/// Returns the base URL to query: explicit override, then zone default, then global default.
pub fn resolve_server_url(config: &LocalConfig) -> &str {
    if let Some(url) = config.config_server_url.as_deref() {
        return url;
    }
    match config.server_zone {
        ServerZone::Staging => REMOTE_CONFIG_SERVER_URL_STAGING,
        ServerZone::Eu => REMOTE_CONFIG_SERVER_URL_EU,
        ServerZone::Us => REMOTE_CONFIG_SERVER_URL,
    }
}
