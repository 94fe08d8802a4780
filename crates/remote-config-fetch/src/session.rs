//! Session identifiers and per-session attempt accounting.

use std::fmt;

/// Logical session under which fetch attempts are counted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SessionId {
    Number(i64),
    Text(String),
}

impl SessionId {
    /// Zero and the empty string still count as sessions for attempt
    /// accounting, but are not sent as the `session_id` parameter.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Number(id) => *id == 0,
            Self::Text(id) => id.is_empty(),
        }
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(id) => write!(f, "{id}"),
            Self::Text(id) => f.write_str(id),
        }
    }
}

impl From<i64> for SessionId {
    fn from(id: i64) -> Self {
        Self::Number(id)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self::Text(id.to_string())
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self::Text(id)
    }
}

/// Attempt counter shared by every fetch sequence of a client.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FetchState {
    /// Attempts made for `last_fetched_session_id` since the last success.
    pub attempts: u32,
    /// Session of the most recent sequence; `None` is a valid session.
    pub last_fetched_session_id: Option<SessionId>,
}

impl FetchState {
    /// Whether `session` is the session currently being counted.
    pub fn is_current(&self, session: Option<&SessionId>) -> bool {
        self.last_fetched_session_id.as_ref() == session
    }

    /// Starts counting for `session` from zero.
    pub fn begin(&mut self, session: Option<&SessionId>) {
        self.last_fetched_session_id = session.cloned();
        self.attempts = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_renders_for_query() {
        assert_eq!(SessionId::from(1_700_000_000_123_i64).to_string(), "1700000000123");
        assert_eq!(SessionId::from("abc-123").to_string(), "abc-123");
    }

    #[test]
    fn zero_and_empty_sessions_are_blank() {
        assert!(SessionId::from(0_i64).is_blank());
        assert!(SessionId::from("").is_blank());
        assert!(!SessionId::from(-1_i64).is_blank());
        assert!(!SessionId::from("0").is_blank());
    }

    /// A fresh state treats the absent session as current.
    #[test]
    fn state_tracks_current_session() {
        let mut state = FetchState::default();
        assert!(state.is_current(None));

        let session = SessionId::from(7_i64);
        assert!(!state.is_current(Some(&session)));

        state.attempts = 3;
        state.begin(Some(&session));
        assert!(state.is_current(Some(&session)));
        assert!(!state.is_current(None));
        assert_eq!(state.attempts, 0);
    }

    #[test]
    fn numeric_and_text_sessions_differ() {
        let state = FetchState {
            attempts: 0,
            last_fetched_session_id: Some(SessionId::Number(5)),
        };
        assert!(!state.is_current(Some(&SessionId::from("5"))));
    }
}
