//! Types for stream sessions

use serde::Serialize;

/// Lifecycle status of an [`EventStream`](crate::EventStream)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Never connected
    #[default]
    Idle,
    /// Request sent (or reconnect pending), no response headers yet
    Connecting,
    /// Response headers received, events are flowing
    Open,
    /// Disconnected or cancelled; will not reconnect
    Closed,
}

impl SessionStatus {
    /// Returns `true` while the session wants a connection
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Connecting | Self::Open)
    }
}

/// A notification forwarded by [`ChannelSubscriber`](crate::ChannelSubscriber)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum SessionEvent {
    /// The stream was (re)opened
    Opened,
    /// One event line
    Event(String),
    /// A connection attempt ended; `None` means the server closed the stream
    Error(Option<String>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_active() {
        assert!(!SessionStatus::Idle.is_active());
        assert!(SessionStatus::Connecting.is_active());
        assert!(SessionStatus::Open.is_active());
        assert!(!SessionStatus::Closed.is_active());
    }

    #[test]
    fn test_session_event_json() {
        let json = serde_json::to_string(&SessionEvent::Event("a".into())).unwrap();
        assert_eq!(json, r#"{"type":"event","data":"a"}"#);
        let json = serde_json::to_string(&SessionEvent::Opened).unwrap();
        assert_eq!(json, r#"{"type":"opened"}"#);
    }
}
