//! Logging sink abstraction.
//!
//! The fetch client reports successful fetches through a [`LoggingSink`]
//! owned by the embedding application. [`TracingSink`] forwards messages to
//! `tracing` for callers that do not bring their own logger.

/// Side channel receiving human-readable status messages from the client.
pub trait LoggingSink: Send + Sync {
    /// Records a single message.
    fn log(&self, message: &str);
}

/// Default sink forwarding messages as `tracing` info events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LoggingSink for TracingSink {
    fn log(&self, message: &str) {
        tracing::info!(target: "remote_config_fetch", "{message}");
    }
}
