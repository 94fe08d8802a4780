//! Public entry points for the remote configuration fetch client.
//!
//! [`RemoteConfigFetch`] retrieves a namespaced configuration document over
//! HTTP with a bounded, session-scoped retry budget and a hard deadline, then
//! exposes lookups into the fetched namespaces. The remaining modules provide
//! its collaborators: endpoint resolution, the HTTP transport, status
//! classification, the logging sink, and environment-driven configuration.

pub mod config;
pub mod endpoint;
mod error;
pub mod fetch;
pub mod http;
pub mod metrics;
pub mod response;
pub mod session;
pub mod sink;
pub mod status;

pub use config::{ConfigError, LocalConfig, RemoteConfigEnv, ServerZone};
pub use endpoint::resolve_server_url;
pub use error::FetchError;
pub use fetch::{RemoteConfigFetch, DEFAULT_FETCH_TIMEOUT, DEFAULT_RETRY_BASE_DELAY};
pub use http::{
    FetchRequest, HttpClientOptions, ReqwestTransport, Transport, TransportError,
    TransportResponse,
};
pub use metrics::FetchMetrics;
pub use response::{NamespaceConfig, RemoteConfigApiResponse};
pub use session::SessionId;
pub use sink::{LoggingSink, TracingSink};
pub use status::{Status, StatusClassifier, TransportStatusClassifier};
