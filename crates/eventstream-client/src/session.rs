//! Self-healing event stream session

use std::sync::Arc;

use futures::StreamExt;
use parking_lot::{Mutex, ReentrantMutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn, Instrument};
use url::Url;

use crate::auth::Credentials;
use crate::config::StreamConfig;
use crate::error::Result;
use crate::streaming::framing::EventFramer;
use crate::streaming::state::{on_completion, Completion, Effect};
use crate::streaming::SessionStatus;
use crate::subscriber::Subscriber;
use crate::transport::{HttpTransport, StreamRequest, Transport, TransportEvent};

/// A long-lived event stream that reconnects on failure.
///
/// # Lifecycle
///
/// - [`connect`](Self::connect) starts a session and registers its subscriber
/// - Whenever the stream ends or fails, the subscriber gets `on_error` and the
///   stream is reopened after the retry interval, forever
/// - [`disconnect`](Self::disconnect) (or dropping the `EventStream`) cancels
///   the request and deregisters the subscriber; no notification follows
///
/// # Example
///
/// ```no_run
/// use eventstream_client::{ChannelSubscriber, Credentials, EventStream, StreamConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let stream = EventStream::with_http(StreamConfig::default())?;
/// let (subscriber, mut events) = ChannelSubscriber::new();
///
/// stream.connect(
///     "https://streaming.example.com/stream/42".parse()?,
///     Credentials::new("owner@example.com", "token"),
///     subscriber,
/// );
///
/// while let Some(event) = events.recv().await {
///     println!("{:?}", event);
/// }
/// # Ok(())
/// # }
/// ```
pub struct EventStream<T: Transport = HttpTransport> {
    shared: Arc<Shared<T>>,
}

struct Shared<T> {
    transport: T,
    config: StreamConfig,
    state: Mutex<SessionState>,
    /// Held while a subscriber callback runs and by connect/disconnect, so a
    /// disconnect never overlaps a callback on another thread
    delivery: ReentrantMutex<()>,
}

#[derive(Default)]
struct SessionState {
    status: SessionStatus,
    target: Option<Target>,
    subscriber: Option<Arc<dyn Subscriber>>,
    driver: Option<JoinHandle<()>>,
    /// Bumped by every connect and disconnect; drivers of an older
    /// generation deliver nothing
    generation: u64,
}

#[derive(Clone)]
struct Target {
    url: Url,
    credentials: Credentials,
}

impl EventStream<HttpTransport> {
    /// Create a session that streams over HTTP
    pub fn with_http(config: StreamConfig) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::new(&config)?;
        Self::new(transport, config)
    }
}

impl<T: Transport> EventStream<T> {
    /// Create an idle session on top of `transport`
    pub fn new(transport: T, config: StreamConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            shared: Arc::new(Shared {
                transport,
                config,
                state: Mutex::new(SessionState::default()),
                delivery: ReentrantMutex::new(()),
            }),
        })
    }

    /// Start streaming `url` and report to `subscriber`.
    ///
    /// Any previous request of this session is cancelled first. The outcome
    /// is only observable through the subscriber. Must be called from within
    /// a tokio runtime.
    #[instrument(skip_all, fields(url = %url))]
    pub fn connect(&self, url: Url, credentials: Credentials, subscriber: impl Subscriber + 'static) {
        let _delivery = self.shared.delivery.lock();
        let mut state = self.shared.state.lock();

        if let Some(previous) = state.driver.take() {
            debug!("Cancelling previous stream request");
            previous.abort();
        }
        let previous_subscriber = state.subscriber.replace(Arc::new(subscriber));

        state.generation += 1;
        state.target = Some(Target { url, credentials });
        state.status = SessionStatus::Connecting;

        let generation = state.generation;
        let driver = run_session(Arc::clone(&self.shared), generation).in_current_span();
        state.driver = Some(tokio::spawn(driver));

        drop(state);
        drop(previous_subscriber);
    }

    /// Cancel the stream and deregister the subscriber.
    ///
    /// No notification is delivered once this returns, including from a
    /// pending reconnect. Calling it without an active session does nothing.
    pub fn disconnect(&self) {
        let _delivery = self.shared.delivery.lock();
        let mut state = self.shared.state.lock();

        let Some(driver) = state.driver.take() else {
            return;
        };
        driver.abort();

        state.generation += 1;
        state.status = SessionStatus::Closed;
        state.target = None;
        let subscriber = state.subscriber.take();
        drop(state);
        drop(subscriber);

        info!("Event stream disconnected");
    }

    /// Current lifecycle status
    pub fn status(&self) -> SessionStatus {
        self.shared.state.lock().status
    }

    /// Whether response headers have been received on the current connection
    pub fn is_open(&self) -> bool {
        self.status() == SessionStatus::Open
    }

    /// URL of the current session, if any
    pub fn url(&self) -> Option<Url> {
        self.shared
            .state
            .lock()
            .target
            .as_ref()
            .map(|t| t.url.clone())
    }

    pub fn config(&self) -> &StreamConfig {
        &self.shared.config
    }
}

impl<T: Transport> Drop for EventStream<T> {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl<T: Transport> Shared<T> {
    /// Stored target, if `generation` is still the live session
    fn target(&self, generation: u64) -> Option<Target> {
        let state = self.state.lock();
        if state.generation != generation {
            return None;
        }
        state.target.clone()
    }

    /// Set the status if `generation` is still live
    fn set_status(&self, generation: u64, status: SessionStatus) -> bool {
        let mut state = self.state.lock();
        if state.generation != generation {
            return false;
        }
        state.status = status;
        true
    }

    /// Run `notify` against the subscriber of a live generation.
    ///
    /// Returns `false` once the generation is stale.
    fn deliver(&self, generation: u64, notify: impl FnOnce(&dyn Subscriber)) -> bool {
        let _delivery = self.delivery.lock();
        let subscriber = {
            let state = self.state.lock();
            if state.generation != generation {
                return false;
            }
            state.subscriber.clone()
        };

        if let Some(subscriber) = subscriber {
            notify(subscriber.as_ref());
        }
        true
    }

    /// Terminal close after an explicit cancel reported by the transport
    fn close(&self, generation: u64) {
        let _delivery = self.delivery.lock();
        let mut state = self.state.lock();
        if state.generation != generation {
            return;
        }

        state.status = SessionStatus::Closed;
        state.target = None;
        let subscriber = state.subscriber.take();
        // Our own handle; dropping it detaches the finishing task
        let driver = state.driver.take();
        drop(state);
        drop(subscriber);
        drop(driver);
    }

    /// Drive one request until it completes.
    ///
    /// Returns `None` if the session stopped wanting this request.
    async fn run_attempt(
        &self,
        request: StreamRequest,
        generation: u64,
        framer: &mut EventFramer,
    ) -> Option<Completion> {
        let mut stream = self.transport.open(request);

        while let Some(event) = stream.next().await {
            match event {
                TransportEvent::Headers(status) => {
                    if !self.set_status(generation, SessionStatus::Open) {
                        return None;
                    }
                    info!(%status, "Event stream open");
                    if !self.deliver(generation, |s| s.on_open()) {
                        return None;
                    }
                }
                TransportEvent::Chunk(bytes) => {
                    for event in framer.feed(&bytes) {
                        if !self.deliver(generation, |s| s.on_event(&event)) {
                            return None;
                        }
                    }
                }
                TransportEvent::Complete(error) => return Some(Completion::from_error(error)),
            }
        }

        Some(Completion::Finished)
    }
}

/// Session driver: one request at a time, reopened after each completion
/// until the session is closed.
async fn run_session<T: Transport>(shared: Arc<Shared<T>>, generation: u64) {
    let retry_interval = shared.config.retry_interval();
    let mut framer = EventFramer::new(shared.config.framing)
        .with_max_event_bytes(shared.config.max_event_bytes);
    let mut attempt: u64 = 0;

    loop {
        let Some(target) = shared.target(generation) else {
            debug!("Session no longer wanted, not reconnecting");
            return;
        };
        attempt += 1;
        framer.reset();

        let completion = match StreamRequest::event_stream(target.url, &target.credentials) {
            Ok(request) => match shared.run_attempt(request, generation, &mut framer).await {
                Some(completion) => completion,
                None => return,
            },
            Err(e) => Completion::Failed(e),
        };

        let transition = {
            let mut state = shared.state.lock();
            if state.generation != generation {
                return;
            }
            let transition = on_completion(state.status, &completion, retry_interval);
            state.status = transition.next;
            transition
        };

        match &completion {
            Completion::Finished => debug!(attempt, "Event stream ended by server"),
            Completion::Failed(e) => warn!(attempt, "Event stream failed: {}", e),
            Completion::Cancelled => debug!(attempt, "Event stream cancelled"),
        }

        if !shared.deliver(generation, |s| s.on_error(completion.error())) {
            return;
        }

        match transition.effect {
            Effect::Terminal => {
                shared.close(generation);
                return;
            }
            Effect::ScheduleReconnect(delay) => {
                debug!(attempt, "Reconnecting in {:?}", delay);
                tokio::time::sleep(delay).await;
            }
        }
    }
}
