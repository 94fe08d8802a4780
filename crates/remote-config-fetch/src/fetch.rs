//! Fetch/retry/timeout engine and namespace lookups.
//!
//! A [`RemoteConfigFetch`] is built once per application session and reused
//! for every lookup. Each lookup runs one fetch sequence:
//!
//! * the whole sequence shares a single deadline (5 seconds by default),
//!   surfaced to the transport as a [`CancellationToken`];
//! * attempts are counted per session: reaching `flush_max_retries` for the
//!   same session rejects further fetches until a success or a session change;
//! * only [`Status::Failed`] responses are retried, after a linear backoff of
//!   `attempts × retry_base_delay`.
//!
//! The attempt counter is shared by the instance, so sequences are serialised:
//! a lookup waits for the previous one to finish before arming its deadline.

use std::fmt;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::LocalConfig;
use crate::endpoint::resolve_server_url;
use crate::error::FetchError;
use crate::http::{FetchRequest, HttpClientOptions, ReqwestTransport, Transport};
use crate::metrics::FetchMetrics;
use crate::response::{NamespaceConfig, RemoteConfigApiResponse};
use crate::session::{FetchState, SessionId};
use crate::status::{Status, StatusClassifier, TransportStatusClassifier};

/// Deadline for an entire fetch sequence, retries included.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);
/// Unit of the linear backoff between attempts.
pub const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_millis(1000);

/// Message sent to the logging sink after a successful fetch.
pub const SUCCESS_MESSAGE: &str = "Remote config successfully fetched";

/// Remote configuration client.
pub struct RemoteConfigFetch {
    local_config: LocalConfig,
    config_keys: Vec<String>,
    transport: Arc<dyn Transport>,
    classifier: Arc<dyn StatusClassifier>,
    retry_base_delay: Duration,
    fetch_timeout: Duration,
    /// Held for the duration of a fetch sequence.
    state: Mutex<FetchState>,
    /// Never held across an await point.
    metrics: StdMutex<FetchMetrics>,
}

impl fmt::Debug for RemoteConfigFetch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteConfigFetch")
            .field("local_config", &self.local_config)
            .field("config_keys", &self.config_keys)
            .field("retry_base_delay", &self.retry_base_delay)
            .field("fetch_timeout", &self.fetch_timeout)
            .finish()
    }
}

impl RemoteConfigFetch {
    /// Builds a client requesting `config_keys` with the default HTTPS transport.
    ///
    /// Duplicate keys are dropped; the first occurrence keeps its position.
    pub fn new<I, K>(local_config: LocalConfig, config_keys: I) -> Result<Self, FetchError>
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self::with_options(local_config, config_keys, HttpClientOptions::default())
    }

    /// Builds a client whose reqwest transport follows `options`, e.g. to reach
    /// a plaintext `config_server_url`.
    pub fn with_options<I, K>(
        local_config: LocalConfig,
        config_keys: I,
        options: HttpClientOptions,
    ) -> Result<Self, FetchError>
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let transport =
            ReqwestTransport::new(options).map_err(|err| FetchError::Client(err.to_string()))?;
        Ok(Self::with_transport(
            local_config,
            config_keys,
            Arc::new(transport),
        ))
    }

    /// Builds a client that sends its requests through `transport`.
    pub fn with_transport<I, K>(
        local_config: LocalConfig,
        config_keys: I,
        transport: Arc<dyn Transport>,
    ) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let mut keys: Vec<String> = Vec::new();
        for key in config_keys {
            let key = key.into();
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        Self {
            local_config,
            config_keys: keys,
            transport,
            classifier: Arc::new(TransportStatusClassifier),
            retry_base_delay: DEFAULT_RETRY_BASE_DELAY,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            state: Mutex::new(FetchState::default()),
            metrics: StdMutex::new(FetchMetrics::default()),
        }
    }

    /// Replaces the status classifier.
    pub fn with_status_classifier(mut self, classifier: Arc<dyn StatusClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Overrides the backoff unit (default one second).
    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    /// Overrides the sequence deadline (default five seconds).
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Namespaces requested on every fetch, in wire order.
    pub fn config_keys(&self) -> &[String] {
        &self.config_keys
    }

    /// Base URL queried by this client.
    pub fn server_url(&self) -> &str {
        resolve_server_url(&self.local_config)
    }

    /// Latency of the most recent lookups.
    pub fn metrics(&self) -> FetchMetrics {
        *self.metrics_guard()
    }

    /// Fetches the config object of `namespace`.
    ///
    /// Returns `Ok(None)` when the fetch succeeded but the document has no
    /// object for `namespace`; fetch failures are returned as errors.
    pub async fn get_remote_namespace_config(
        &self,
        namespace: &str,
        session_id: Option<&SessionId>,
    ) -> Result<Option<NamespaceConfig>, FetchError> {
        let started = Instant::now();
        let response = self.fetch_with_timeout(session_id).await?;
        let config = response.into_namespace(namespace);
        let elapsed = started.elapsed();

        let mut metrics = self.metrics_guard();
        if config.is_some() {
            metrics.record_success(elapsed);
        } else {
            debug!(namespace, "remote-config namespace missing from response");
            metrics.record_failure(elapsed);
        }
        Ok(config)
    }

    /// Fetches a single value from `namespace`.
    pub async fn get_remote_config(
        &self,
        namespace: &str,
        key: &str,
        session_id: Option<&SessionId>,
    ) -> Result<Option<Value>, FetchError> {
        let config = self
            .get_remote_namespace_config(namespace, session_id)
            .await?;
        Ok(config.and_then(|mut config| config.remove(key)))
    }

    /// Fetches `namespace` and deserializes it into `T`.
    pub async fn get_typed_namespace_config<T: DeserializeOwned>(
        &self,
        namespace: &str,
        session_id: Option<&SessionId>,
    ) -> Result<Option<T>, FetchError> {
        self.get_remote_namespace_config(namespace, session_id)
            .await?
            .map(|config| serde_json::from_value(Value::Object(config)))
            .transpose()
            .map_err(FetchError::Decode)
    }

    /// Runs one fetch sequence under the deadline.
    ///
    /// When the deadline elapses the token is cancelled and the sequence is
    /// driven to completion: an in-flight request aborts, a running backoff
    /// finishes, and the next attempt check reports the timeout.
    pub async fn fetch_with_timeout(
        &self,
        session_id: Option<&SessionId>,
    ) -> Result<RemoteConfigApiResponse, FetchError> {
        let mut state = self.state.lock().await;
        let cancel = CancellationToken::new();

        let sequence = self.fetch_remote_config(&mut *state, &cancel, session_id);
        tokio::pin!(sequence);
        let deadline = sleep(self.fetch_timeout);
        tokio::pin!(deadline);

        tokio::select! {
            biased;
            result = &mut sequence => result,
            _ = &mut deadline => {
                debug!(timeout = ?self.fetch_timeout, "remote-config fetch deadline elapsed");
                cancel.cancel();
                sequence.await
            }
        }
    }

    async fn fetch_remote_config(
        &self,
        state: &mut FetchState,
        cancel: &CancellationToken,
        session_id: Option<&SessionId>,
    ) -> Result<RemoteConfigApiResponse, FetchError> {
        loop {
            let same_session = state.is_current(session_id);
            if same_session && state.attempts >= self.local_config.flush_max_retries {
                warn!(
                    attempts = state.attempts,
                    max_retries = self.local_config.flush_max_retries,
                    "remote-config fetch rejected: retry budget exhausted for session"
                );
                return Err(FetchError::RetryExhausted);
            } else if cancel.is_cancelled() {
                return Err(FetchError::Timeout(self.fetch_timeout));
            } else if !same_session {
                state.begin(session_id);
            }

            let request = self.build_request(session_id);
            state.attempts += 1;

            let response = match self.transport.get(&request, cancel).await {
                Ok(response) => response,
                Err(_) if cancel.is_cancelled() => {
                    return Err(FetchError::Timeout(self.fetch_timeout));
                }
                Err(err) => {
                    warn!(attempt = state.attempts, error = %err, "remote-config fetch failed");
                    return Err(FetchError::request(err.to_string()));
                }
            };

            match self.classifier.classify(response.status) {
                Status::Success => {
                    state.attempts = 0;
                    return self.parse_response(&response.body);
                }
                Status::Failed => {
                    let delay = self.retry_base_delay.saturating_mul(state.attempts);
                    debug!(
                        attempt = state.attempts,
                        status = response.status,
                        delay = ?delay,
                        "remote-config fetch failed; retrying"
                    );
                    sleep(delay).await;
                }
                other => {
                    warn!(
                        status = response.status,
                        classification = ?other,
                        "remote-config fetch returned unexpected status"
                    );
                    return Err(FetchError::UnexpectedStatus(response.status));
                }
            }
        }
    }

    fn build_request(&self, session_id: Option<&SessionId>) -> FetchRequest {
        let mut query = Vec::with_capacity(self.config_keys.len() + 2);
        query.push(("api_key".to_string(), self.local_config.api_key.clone()));
        for key in &self.config_keys {
            query.push(("config_keys".to_string(), key.clone()));
        }
        if let Some(session_id) = session_id.filter(|id| !id.is_blank()) {
            query.push(("session_id".to_string(), session_id.to_string()));
        }
        FetchRequest {
            url: self.server_url().to_string(),
            query,
        }
    }

    fn parse_response(&self, body: &[u8]) -> Result<RemoteConfigApiResponse, FetchError> {
        let response = RemoteConfigApiResponse::from_slice(body)?;
        self.local_config.logger.log(SUCCESS_MESSAGE);
        Ok(response)
    }

    fn metrics_guard(&self) -> MutexGuard<'_, FetchMetrics> {
        self.metrics.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{TransportError, TransportResponse};
    use crate::sink::LoggingSink;
    use async_trait::async_trait;
    use bytes::Bytes;
    use serde::Deserialize;
    use serde_json::json;
    use std::collections::VecDeque;
    use tracing_test::traced_test;

    const FEATURE_BODY: &str = r#"{"configs":{"featureA":{"x":1,"label":"on"}}}"#;

    /// Scripted outcome of one transport call.
    #[derive(Debug, Clone)]
    enum Step {
        Respond(u16, &'static str),
        Fail(&'static str),
        /// Blocks until the token is cancelled.
        Hang,
    }

    /// In-memory transport replaying scripted steps and recording requests.
    struct ScriptedTransport {
        steps: StdMutex<VecDeque<Step>>,
        fallback: Step,
        requests: StdMutex<Vec<(FetchRequest, Instant)>>,
    }

    impl ScriptedTransport {
        fn new(steps: impl IntoIterator<Item = Step>, fallback: Step) -> Arc<Self> {
            Arc::new(Self {
                steps: StdMutex::new(steps.into_iter().collect()),
                fallback,
                requests: StdMutex::new(Vec::new()),
            })
        }

        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        fn requests(&self) -> Vec<FetchRequest> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .map(|(request, _)| request.clone())
                .collect()
        }

        /// Offsets of each request from `origin`.
        fn offsets(&self, origin: Instant) -> Vec<Duration> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .map(|(_, at)| at.duration_since(origin))
                .collect()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn get(
            &self,
            request: &FetchRequest,
            cancel: &CancellationToken,
        ) -> Result<TransportResponse, TransportError> {
            self.requests
                .lock()
                .unwrap()
                .push((request.clone(), Instant::now()));
            let step = self
                .steps
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| self.fallback.clone());
            match step {
                Step::Respond(status, body) => Ok(TransportResponse {
                    status,
                    body: Bytes::from_static(body.as_bytes()),
                }),
                Step::Fail(message) => Err(TransportError::Other(message.to_string())),
                Step::Hang => {
                    cancel.cancelled().await;
                    Err(TransportError::Cancelled)
                }
            }
        }
    }

    /// Sink capturing every message for assertions.
    #[derive(Default)]
    struct RecordingSink {
        messages: StdMutex<Vec<String>>,
    }

    impl LoggingSink for RecordingSink {
        fn log(&self, message: &str) {
            self.messages.lock().unwrap().push(message.to_string());
        }
    }

    fn local_config(max_retries: u32) -> LocalConfig {
        let mut config = LocalConfig::new("project-key");
        config.flush_max_retries = max_retries;
        config
    }

    fn build_client(max_retries: u32, transport: Arc<ScriptedTransport>) -> RemoteConfigFetch {
        RemoteConfigFetch::with_transport(
            local_config(max_retries),
            ["featureA", "featureB"],
            transport,
        )
    }

    fn query_values<'a>(request: &'a FetchRequest, name: &str) -> Vec<&'a str> {
        request
            .query
            .iter()
            .filter(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn returns_namespace_value_and_none_for_missing() {
        let transport = ScriptedTransport::new([], Step::Respond(200, FEATURE_BODY));
        let client = build_client(3, transport.clone());

        let value = client.get_remote_config("featureA", "x", None).await.unwrap();
        assert_eq!(value, Some(json!(1)));
        let missing_namespace = client.get_remote_config("featureB", "x", None).await.unwrap();
        assert_eq!(missing_namespace, None);
        let missing_key = client.get_remote_config("featureA", "y", None).await.unwrap();
        assert_eq!(missing_key, None);
        assert_eq!(transport.request_count(), 3);
    }

    /// Scenario: two attempts, both Failed, then the budget rejects the session.
    #[tokio::test(start_paused = true)]
    async fn same_session_is_bounded_by_max_retries() {
        let transport = ScriptedTransport::new([], Step::Respond(503, ""));
        let client = build_client(2, transport.clone());
        let session = SessionId::from(1_i64);

        let err = client
            .get_remote_namespace_config("featureA", Some(&session))
            .await
            .expect_err("budget is exhausted");
        assert!(matches!(err, FetchError::RetryExhausted));
        assert_eq!(transport.request_count(), 2);

        let err = client
            .get_remote_namespace_config("featureA", Some(&session))
            .await
            .expect_err("session stays exhausted");
        assert!(matches!(err, FetchError::RetryExhausted));
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_retry_budget_never_hits_the_network() {
        let transport = ScriptedTransport::new([], Step::Respond(200, FEATURE_BODY));
        let client = build_client(0, transport.clone());

        let err = client.fetch_with_timeout(None).await.unwrap_err();
        assert!(matches!(err, FetchError::RetryExhausted));
        assert_eq!(transport.request_count(), 0);
    }

    /// Switching sessions resets the counter even after the previous session was exhausted.
    #[tokio::test(start_paused = true)]
    async fn session_change_resets_attempts() {
        let transport = ScriptedTransport::new([], Step::Respond(503, ""));
        let client = build_client(1, transport.clone());
        let first = SessionId::from("first");
        let second = SessionId::from("second");

        for session in [&first, &second, &first] {
            let err = client.fetch_with_timeout(Some(session)).await.unwrap_err();
            assert!(matches!(err, FetchError::RetryExhausted));
        }

        let sessions: Vec<Vec<String>> = transport
            .requests()
            .iter()
            .map(|request| {
                query_values(request, "session_id")
                    .into_iter()
                    .map(str::to_string)
                    .collect()
            })
            .collect();
        assert_eq!(
            sessions,
            vec![vec!["first"], vec!["second"], vec!["first"]]
        );
    }

    /// Backoff before the Nth retry is N times the base delay.
    #[tokio::test(start_paused = true)]
    async fn backoff_grows_linearly() {
        let transport = ScriptedTransport::new(
            [
                Step::Respond(500, ""),
                Step::Respond(502, ""),
                Step::Respond(503, ""),
            ],
            Step::Respond(200, FEATURE_BODY),
        );
        let client = build_client(10, transport.clone()).with_fetch_timeout(Duration::from_secs(60));
        let origin = Instant::now();

        let config = client
            .get_remote_namespace_config("featureA", None)
            .await
            .unwrap()
            .expect("namespace present");
        assert_eq!(config.get("label"), Some(&json!("on")));
        assert_eq!(
            transport.offsets(origin),
            vec![
                Duration::ZERO,
                Duration::from_millis(1000),
                Duration::from_millis(3000),
                Duration::from_millis(6000),
            ]
        );
        assert_eq!(client.state.lock().await.attempts, 0);
    }

    #[traced_test]
    #[tokio::test(start_paused = true)]
    async fn retry_log_reports_backoff_delay() {
        let transport =
            ScriptedTransport::new([Step::Respond(503, "")], Step::Respond(200, FEATURE_BODY));
        let client = build_client(3, transport).with_retry_base_delay(Duration::from_millis(1500));

        client.fetch_with_timeout(None).await.unwrap();
        assert!(logs_contain("delay=1.5s"));
    }

    #[tokio::test(start_paused = true)]
    async fn custom_base_delay_scales_backoff() {
        let transport =
            ScriptedTransport::new([Step::Respond(503, "")], Step::Respond(200, FEATURE_BODY));
        let client = build_client(3, transport.clone()).with_retry_base_delay(Duration::from_millis(250));
        let origin = Instant::now();

        client.fetch_with_timeout(None).await.unwrap();
        assert_eq!(
            transport.offsets(origin),
            vec![Duration::ZERO, Duration::from_millis(250)]
        );
    }

    /// A hung request is aborted at the deadline and nothing else is sent.
    #[tokio::test(start_paused = true)]
    async fn deadline_aborts_in_flight_request() {
        let transport = ScriptedTransport::new([Step::Hang], Step::Respond(200, FEATURE_BODY));
        let client = build_client(5, transport.clone());
        let origin = Instant::now();

        let err = client
            .get_remote_namespace_config("featureA", None)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Timeout(timeout) if timeout == DEFAULT_FETCH_TIMEOUT));
        assert_eq!(origin.elapsed(), DEFAULT_FETCH_TIMEOUT);
        assert_eq!(transport.request_count(), 1);
        assert_eq!(client.metrics(), FetchMetrics::default());
    }

    /// The deadline does not shorten a running backoff; the next attempt check reports it.
    #[tokio::test(start_paused = true)]
    async fn deadline_is_observed_after_backoff() {
        let transport = ScriptedTransport::new([], Step::Respond(503, ""));
        let client = build_client(10, transport.clone());
        let origin = Instant::now();

        let err = client.fetch_with_timeout(None).await.unwrap_err();
        assert!(matches!(err, FetchError::Timeout(_)));
        assert_eq!(
            transport.offsets(origin),
            vec![
                Duration::ZERO,
                Duration::from_millis(1000),
                Duration::from_millis(3000),
            ]
        );
        assert_eq!(origin.elapsed(), Duration::from_millis(6000));
    }

    #[tokio::test(start_paused = true)]
    async fn unexpected_status_is_not_retried() {
        let transport = ScriptedTransport::new([], Step::Respond(400, ""));
        let client = build_client(5, transport.clone());

        let err = client.fetch_with_timeout(None).await.unwrap_err();
        assert!(matches!(err, FetchError::UnexpectedStatus(400)));
        assert_eq!(transport.request_count(), 1);

        let transport = ScriptedTransport::new([], Step::Respond(429, ""));
        let client = build_client(5, transport.clone());
        let err = client.fetch_with_timeout(None).await.unwrap_err();
        assert!(matches!(err, FetchError::UnexpectedStatus(429)));
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn transport_errors_carry_their_message() {
        let transport = ScriptedTransport::new([Step::Fail("connection refused")], Step::Fail(""));
        let client = build_client(5, transport.clone());

        let err = client.fetch_with_timeout(None).await.unwrap_err();
        assert_eq!(err.to_string(), "connection refused");
        let err = client.fetch_with_timeout(None).await.unwrap_err();
        assert_eq!(err.to_string(), "unexpected error occurred");
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_body_is_a_decode_error() {
        let transport = ScriptedTransport::new([], Step::Respond(200, "not json"));
        let client = build_client(5, transport);

        let err = client
            .get_remote_namespace_config("featureA", None)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn request_carries_key_namespaces_and_session() {
        let transport = ScriptedTransport::new([], Step::Respond(200, FEATURE_BODY));
        let client = RemoteConfigFetch::with_transport(
            local_config(3),
            ["sessionReplay", "analytics", "sessionReplay"],
            transport.clone(),
        );
        assert_eq!(client.config_keys(), ["sessionReplay", "analytics"]);

        client
            .fetch_with_timeout(Some(&SessionId::from(1_700_000_000_000_i64)))
            .await
            .unwrap();
        client.fetch_with_timeout(None).await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].url, crate::endpoint::REMOTE_CONFIG_SERVER_URL);
        assert_eq!(
            requests[0].query,
            vec![
                ("api_key".to_string(), "project-key".to_string()),
                ("config_keys".to_string(), "sessionReplay".to_string()),
                ("config_keys".to_string(), "analytics".to_string()),
                ("session_id".to_string(), "1700000000000".to_string()),
            ]
        );
        assert!(query_values(&requests[1], "session_id").is_empty());
    }

    /// Blank sessions stay off the wire but still get their own budget.
    #[tokio::test(start_paused = true)]
    async fn blank_sessions_are_counted_but_not_sent() {
        let transport = ScriptedTransport::new([], Step::Respond(500, ""));
        let client = build_client(1, transport.clone());
        let zero = SessionId::from(0_i64);
        let empty = SessionId::from("");

        for session in [None, Some(&zero), Some(&empty)] {
            let err = client.fetch_with_timeout(session).await.unwrap_err();
            assert!(matches!(err, FetchError::RetryExhausted));
        }

        let requests = transport.requests();
        assert_eq!(requests.len(), 3);
        for request in &requests {
            assert!(query_values(request, "session_id").is_empty());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn success_is_reported_to_the_sink() {
        let sink = Arc::new(RecordingSink::default());
        let mut config = local_config(3);
        config.logger = sink.clone();
        let transport = ScriptedTransport::new([], Step::Respond(200, FEATURE_BODY));
        let client = RemoteConfigFetch::with_transport(config, ["featureA"], transport);

        client.fetch_with_timeout(None).await.unwrap();
        assert_eq!(*sink.messages.lock().unwrap(), vec![SUCCESS_MESSAGE.to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn metrics_record_success_and_failure_latency() {
        let transport = ScriptedTransport::new(
            [Step::Respond(503, "")],
            Step::Respond(200, FEATURE_BODY),
        );
        let client = build_client(3, transport);

        client
            .get_remote_namespace_config("featureA", None)
            .await
            .unwrap();
        let metrics = client.metrics();
        assert_eq!(metrics.fetch_time_api_success, Some(Duration::from_millis(1000)));
        assert_eq!(metrics.fetch_time_api_fail, None);

        let missing = client
            .get_remote_namespace_config("featureB", None)
            .await
            .unwrap();
        assert!(missing.is_none());
        let metrics = client.metrics();
        assert_eq!(metrics.fetch_time_api_success, Some(Duration::from_millis(1000)));
        assert_eq!(metrics.fetch_time_api_fail, Some(Duration::ZERO));
    }

    #[tokio::test(start_paused = true)]
    async fn typed_namespace_config_decodes_into_caller_type() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct FeatureA {
            x: u32,
            label: String,
        }

        let transport = ScriptedTransport::new([], Step::Respond(200, FEATURE_BODY));
        let client = build_client(3, transport);

        let feature: Option<FeatureA> = client
            .get_typed_namespace_config("featureA", None)
            .await
            .unwrap();
        assert_eq!(
            feature,
            Some(FeatureA {
                x: 1,
                label: "on".into()
            })
        );

        let err = client
            .get_typed_namespace_config::<Vec<u32>>("featureA", None)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    /// Concurrent lookups on a shared client run one sequence at a time.
    #[tokio::test(start_paused = true)]
    async fn concurrent_lookups_are_serialised() {
        let transport = ScriptedTransport::new(
            [Step::Respond(503, "")],
            Step::Respond(200, FEATURE_BODY),
        );
        let client = Arc::new(build_client(3, transport.clone()));
        let origin = Instant::now();

        let first = {
            let client = client.clone();
            tokio::spawn(async move {
                client
                    .get_remote_config("featureA", "x", Some(&SessionId::from(1_i64)))
                    .await
            })
        };
        let second = {
            let client = client.clone();
            tokio::spawn(async move {
                client
                    .get_remote_config("featureA", "x", Some(&SessionId::from(2_i64)))
                    .await
            })
        };

        assert_eq!(first.await.unwrap().unwrap(), Some(json!(1)));
        assert_eq!(second.await.unwrap().unwrap(), Some(json!(1)));

        let offsets = transport.offsets(origin);
        assert_eq!(offsets.len(), 3);
        // The retried sequence finishes before the other one starts.
        assert_eq!(offsets[1], Duration::from_millis(1000));
        assert_eq!(offsets[2], Duration::from_millis(1000));
    }
}
