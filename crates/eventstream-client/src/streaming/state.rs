//! Reconnect policy
//!
//! The completion of a connection attempt is mapped to the next status and
//! the effect the session driver has to carry out. No I/O happens here.

use std::time::Duration;

use crate::error::StreamError;

use super::types::SessionStatus;

static CANCELLED: StreamError = StreamError::Cancelled;

/// How a connection attempt ended
#[derive(Debug)]
pub enum Completion {
    /// The server ended the body normally
    Finished,
    /// Network or transport failure
    Failed(StreamError),
    /// The request was cancelled explicitly
    Cancelled,
}

impl Completion {
    /// Classify the optional error reported by a transport
    pub fn from_error(error: Option<StreamError>) -> Self {
        match error {
            None => Self::Finished,
            Some(e) if e.is_cancelled() => Self::Cancelled,
            Some(e) => Self::Failed(e),
        }
    }

    /// The error reported to the subscriber, if any
    pub fn error(&self) -> Option<&StreamError> {
        match self {
            Self::Finished => None,
            Self::Failed(e) => Some(e),
            Self::Cancelled => Some(&CANCELLED),
        }
    }
}

/// What the driver does after a completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Open the stream again after the delay
    ScheduleReconnect(Duration),
    /// Stop; the session is over
    Terminal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub next: SessionStatus,
    pub effect: Effect,
}

/// Decide what follows a completed connection attempt.
///
/// A closed session stays closed. Otherwise everything except an explicit
/// cancel is retried after `retry_interval`, with no upper bound.
pub fn on_completion(
    status: SessionStatus,
    completion: &Completion,
    retry_interval: Duration,
) -> Transition {
    match (status, completion) {
        (SessionStatus::Closed, _) | (_, Completion::Cancelled) => Transition {
            next: SessionStatus::Closed,
            effect: Effect::Terminal,
        },
        (_, Completion::Finished | Completion::Failed(_)) => Transition {
            next: SessionStatus::Connecting,
            effect: Effect::ScheduleReconnect(retry_interval),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const RETRY: Duration = Duration::from_millis(3000);

    #[rstest]
    #[case(SessionStatus::Open)]
    #[case(SessionStatus::Connecting)]
    fn test_clean_end_reconnects(#[case] status: SessionStatus) {
        let t = on_completion(status, &Completion::Finished, RETRY);
        assert_eq!(t.next, SessionStatus::Connecting);
        assert_eq!(t.effect, Effect::ScheduleReconnect(RETRY));
    }

    #[rstest]
    #[case(SessionStatus::Open)]
    #[case(SessionStatus::Connecting)]
    fn test_failure_reconnects(#[case] status: SessionStatus) {
        let completion = Completion::Failed(StreamError::transport("connection reset"));
        let t = on_completion(status, &completion, RETRY);
        assert_eq!(t.next, SessionStatus::Connecting);
        assert_eq!(t.effect, Effect::ScheduleReconnect(RETRY));
    }

    #[test]
    fn test_cancel_is_terminal() {
        let t = on_completion(SessionStatus::Open, &Completion::Cancelled, RETRY);
        assert_eq!(t.next, SessionStatus::Closed);
        assert_eq!(t.effect, Effect::Terminal);
    }

    #[test]
    fn test_closed_session_never_reconnects() {
        let t = on_completion(SessionStatus::Closed, &Completion::Finished, RETRY);
        assert_eq!(t.effect, Effect::Terminal);
    }

    #[test]
    fn test_from_error_classification() {
        assert!(matches!(Completion::from_error(None), Completion::Finished));
        assert!(matches!(
            Completion::from_error(Some(StreamError::Cancelled)),
            Completion::Cancelled
        ));
        assert!(matches!(
            Completion::from_error(Some(StreamError::transport("eof"))),
            Completion::Failed(_)
        ));
    }

    #[test]
    fn test_reported_error() {
        assert!(Completion::Finished.error().is_none());
        assert!(Completion::Cancelled.error().unwrap().is_cancelled());
        let failed = Completion::Failed(StreamError::transport("eof"));
        assert_eq!(failed.error().unwrap().to_string(), "Transport error: eof");
    }
}
