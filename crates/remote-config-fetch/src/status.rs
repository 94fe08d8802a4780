//! HTTP status classification.
//!
//! The fetch engine only distinguishes success, a recoverable failure and
//! everything else; the richer [`Status`] taxonomy is kept so classifiers
//! can be shared with other transports.

/// Outcome category of an HTTP response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// 2xx.
    Success,
    /// 429.
    RateLimit,
    /// 413.
    PayloadTooLarge,
    /// 408.
    Timeout,
    /// Any other 4xx.
    Invalid,
    /// 5xx; the only category the fetch engine retries.
    Failed,
    /// Informational, redirect, or out-of-range codes.
    Unknown,
}

/// Maps an HTTP status code to a [`Status`].
pub trait StatusClassifier: Send + Sync {
    fn classify(&self, status: u16) -> Status;
}

/// Default classifier shared by the transport layer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TransportStatusClassifier;

impl StatusClassifier for TransportStatusClassifier {
    fn classify(&self, status: u16) -> Status {
        match status {
            200..=299 => Status::Success,
            429 => Status::RateLimit,
            413 => Status::PayloadTooLarge,
            408 => Status::Timeout,
            400..=499 => Status::Invalid,
            500.. => Status::Failed,
            _ => Status::Unknown,
        }
    }
}
