//! HTTP transport for configuration fetches.
//!
//! The fetch engine talks to the network through the [`Transport`] trait so
//! retry and deadline behaviour can be exercised without sockets.
//! [`ReqwestTransport`] is the production implementation: a single `GET`
//! carrying the query pairs, raced against the caller's cancellation token.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderValue, ACCEPT};
use reqwest::Client;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Query parameters whose values never appear in logs.
const SENSITIVE_PARAMS: [&str; 1] = ["api_key"];

/// A fully resolved configuration request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Base URL without query string.
    pub url: String,
    /// Query pairs in wire order; keys may repeat.
    pub query: Vec<(String, String)>,
}

impl FetchRequest {
    /// Returns the query pairs with sensitive values replaced, for logging.
    pub fn redacted_query(&self) -> Vec<(&str, &str)> {
        self.query
            .iter()
            .map(|(name, value)| {
                if SENSITIVE_PARAMS.contains(&name.as_str()) {
                    (name.as_str(), "<redacted>")
                } else {
                    (name.as_str(), value.as_str())
                }
            })
            .collect()
    }
}

/// Status code and fully buffered body of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Bytes,
}

/// Failures raised by a [`Transport`].
#[derive(Debug, Error)]
pub enum TransportError {
    /// The cancellation token fired while the request was in flight.
    #[error("request cancelled")]
    Cancelled,
    /// The URL violates the transport policy.
    #[error("insecure base url requires explicit opt-in: {0}")]
    InsecureUrl(String),
    /// Transport-level issue (DNS, TLS, socket, body read).
    #[error("transport error: {0}")]
    Http(#[from] reqwest::Error),
    /// Failure reported by a custom transport.
    #[error("{0}")]
    Other(String),
}

/// Performs configuration `GET` requests.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `request` and buffers the response body.
    ///
    /// Implementations must stop waiting and return [`TransportError::Cancelled`]
    /// once `cancel` fires.
    async fn get(
        &self,
        request: &FetchRequest,
        cancel: &CancellationToken,
    ) -> Result<TransportResponse, TransportError>;
}

/// Additional options governing how the HTTP client is constructed.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpClientOptions {
    /// Whether plaintext (HTTP) endpoints are allowed.
    pub allow_plaintext: bool,
    /// Whether TLS certificate validation should be skipped.
    pub accept_invalid_certs: bool,
}

/// [`Transport`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    options: HttpClientOptions,
}

impl ReqwestTransport {
    /// Builds the transport with the given options.
    pub fn new(options: HttpClientOptions) -> Result<Self, TransportError> {
        let client = Client::builder()
            .danger_accept_invalid_certs(options.accept_invalid_certs)
            .danger_accept_invalid_hostnames(options.accept_invalid_certs)
            .build()?;
        Ok(Self { client, options })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(
        &self,
        request: &FetchRequest,
        cancel: &CancellationToken,
    ) -> Result<TransportResponse, TransportError> {
        if !self.options.allow_plaintext && request.url.starts_with("http://") {
            return Err(TransportError::InsecureUrl(request.url.clone()));
        }

        tracing::debug!(
            url = %request.url,
            query = ?request.redacted_query(),
            "remote-config HTTP request"
        );

        let exchange = async {
            let response = self
                .client
                .get(&request.url)
                .header(ACCEPT, HeaderValue::from_static("*/*"))
                .query(&request.query)
                .send()
                .await?;
            let status = response.status().as_u16();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>(TransportResponse { status, body })
        };

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TransportError::Cancelled),
            result = exchange => result?,
        };

        tracing::debug!(
            url = %request.url,
            status = response.status,
            body_len = response.body.len(),
            "remote-config HTTP response"
        );
        Ok(response)
    }
}
