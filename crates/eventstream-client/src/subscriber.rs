//! Consumers of stream notifications

use tokio::sync::mpsc;

use crate::error::StreamError;
use crate::streaming::SessionEvent;

/// Receives the notifications of an [`EventStream`](crate::EventStream).
///
/// Callbacks run on the session's driver task and must not block for long.
/// They may call `connect` or `disconnect` on the session.
pub trait Subscriber: Send + Sync {
    /// A connection was established (once per reconnect)
    fn on_open(&self);

    /// One event line was received
    fn on_event(&self, event: &str);

    /// A connection attempt ended. `None` means the server closed the stream
    /// without an error; the session still reconnects.
    fn on_error(&self, error: Option<&StreamError>);
}

/// Forwards notifications into an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelSubscriber {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl ChannelSubscriber {
    /// Create a subscriber and the receiving end of its channel
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, event: SessionEvent) {
        // Receiver gone means nobody is listening anymore
        let _ = self.tx.send(event);
    }
}

impl Subscriber for ChannelSubscriber {
    fn on_open(&self) {
        self.send(SessionEvent::Opened);
    }

    fn on_event(&self, event: &str) {
        self.send(SessionEvent::Event(event.to_string()));
    }

    fn on_error(&self, error: Option<&StreamError>) {
        self.send(SessionEvent::Error(error.map(|e| e.to_string())));
    }
}

type OpenFn = Box<dyn Fn() + Send + Sync>;
type EventFn = Box<dyn Fn(&str) + Send + Sync>;
type ErrorFn = Box<dyn Fn(Option<&StreamError>) + Send + Sync>;

/// Subscriber built from closures; unset callbacks do nothing
#[derive(Default)]
pub struct FnSubscriber {
    open: Option<OpenFn>,
    event: Option<EventFn>,
    error: Option<ErrorFn>,
}

impl FnSubscriber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_open(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.open = Some(Box::new(f));
        self
    }

    pub fn with_event(mut self, f: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.event = Some(Box::new(f));
        self
    }

    pub fn with_error(mut self, f: impl Fn(Option<&StreamError>) + Send + Sync + 'static) -> Self {
        self.error = Some(Box::new(f));
        self
    }
}

impl Subscriber for FnSubscriber {
    fn on_open(&self) {
        if let Some(f) = &self.open {
            f();
        }
    }

    fn on_event(&self, event: &str) {
        if let Some(f) = &self.event {
            f(event);
        }
    }

    fn on_error(&self, error: Option<&StreamError>) {
        if let Some(f) = &self.error {
            f(error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_channel_subscriber_forwards_in_order() {
        let (subscriber, mut rx) = ChannelSubscriber::new();
        subscriber.on_open();
        subscriber.on_event("a");
        subscriber.on_error(None);
        subscriber.on_error(Some(&StreamError::transport("reset")));

        assert_eq!(rx.try_recv().unwrap(), SessionEvent::Opened);
        assert_eq!(rx.try_recv().unwrap(), SessionEvent::Event("a".into()));
        assert_eq!(rx.try_recv().unwrap(), SessionEvent::Error(None));
        assert_eq!(
            rx.try_recv().unwrap(),
            SessionEvent::Error(Some("Transport error: reset".into()))
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_channel_subscriber_survives_dropped_receiver() {
        let (subscriber, rx) = ChannelSubscriber::new();
        drop(rx);
        subscriber.on_event("ignored");
    }

    #[test]
    fn test_fn_subscriber_calls_closures() {
        let events = Arc::new(AtomicUsize::new(0));
        let counter = events.clone();
        let subscriber = FnSubscriber::new().with_event(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        // Unset callbacks are no-ops
        subscriber.on_open();
        subscriber.on_event("x");
        subscriber.on_event("y");
        subscriber.on_error(None);

        assert_eq!(events.load(Ordering::SeqCst), 2);
    }
}
