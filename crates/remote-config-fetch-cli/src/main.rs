// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::env;
use std::process::ExitCode;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use remote_config_fetch::{RemoteConfigEnv, RemoteConfigFetch, SessionId, TracingSink};

/// Optional session identifier for the fetch.
const ENV_SESSION_ID: &str = "REMOTE_CONFIG_SESSION_ID";
const USAGE: &str = "usage: remote-config-fetch <namespace> [key]";

#[tokio::main]
pub async fn main() -> ExitCode {
    let env_config = RemoteConfigEnv::from_os_env();
    init_logging(&env_config.log_level);

    let args: Vec<String> = env::args().skip(1).collect();
    let Some((namespace, key)) = parse_args(&args) else {
        error!("{USAGE}");
        return ExitCode::FAILURE;
    };
    let session_id = env::var(ENV_SESSION_ID)
        .ok()
        .and_then(|raw| parse_session_id(&raw));

    let local_config = match env_config.to_local_config(Arc::new(TracingSink)) {
        Ok(config) => config,
        Err(err) => {
            error!("invalid configuration: {err}");
            return ExitCode::FAILURE;
        }
    };

    // The requested namespace is always part of the fetch.
    let mut config_keys = env_config.config_keys.clone();
    config_keys.push(namespace.to_string());

    let options = env_config.http_client_options();
    let client = match RemoteConfigFetch::with_options(local_config, config_keys, options) {
        Ok(client) => client,
        Err(err) => {
            error!("unable to create remote config client: {err}");
            return ExitCode::FAILURE;
        }
    };
    debug!(server_url = client.server_url(), keys = ?client.config_keys(), "fetching remote config");

    let result = match key {
        Some(key) => client
            .get_remote_config(namespace, key, session_id.as_ref())
            .await,
        None => client
            .get_remote_namespace_config(namespace, session_id.as_ref())
            .await
            .map(|config| config.map(Value::Object)),
    };

    match result {
        Ok(value) => {
            debug!(metrics = %client.metrics(), "remote config fetch complete");
            println!("{}", value.unwrap_or(Value::Null));
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("remote config fetch failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(log_level: &str) {
    let env_filter = format!("h2=off,hyper=off,rustls=off,{}", log_level);
    let filter = EnvFilter::try_new(env_filter).unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("a global tracing subscriber was already installed");
    }

    debug!("Logging subsystem enabled");
}

/// Splits the positional arguments into a namespace and an optional key.
fn parse_args(args: &[String]) -> Option<(&str, Option<&str>)> {
    match args {
        [namespace] => Some((namespace.as_str(), None)),
        [namespace, key] => Some((namespace.as_str(), Some(key.as_str()))),
        _ => None,
    }
}

/// Numeric identifiers are sent as numbers, anything else as text.
fn parse_session_id(raw: &str) -> Option<SessionId> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    Some(
        raw.parse::<i64>()
            .map(SessionId::Number)
            .unwrap_or_else(|_| SessionId::Text(raw.to_string())),
    )
}
