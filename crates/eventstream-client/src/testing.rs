//! Test utilities for eventstream-client
//!
//! Provides a scripted in-memory transport and an HTTP test server.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpListener;
use url::Url;

use crate::error::Result;
use crate::transport::{StreamRequest, Transport, TransportEvent, TransportStream};

/// Events played back for one opened request
#[derive(Debug)]
pub struct Script {
    events: Vec<TransportEvent>,
    hold_open: bool,
}

impl Script {
    /// Play `events`, then end the stream
    pub fn new(events: Vec<TransportEvent>) -> Self {
        Self {
            events,
            hold_open: false,
        }
    }

    /// Keep the request open after the last event instead of ending it
    pub fn hold_open(mut self) -> Self {
        self.hold_open = true;
        self
    }
}

#[derive(Debug, Default)]
struct ScriptState {
    scripts: VecDeque<Script>,
    requests: Vec<StreamRequest>,
}

/// In-memory [`Transport`] that plays one [`Script`] per opened request.
///
/// Requests opened after the scripts run out never answer. Clones share
/// the same scripts and request log.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the script for the next opened request
    pub fn push(&self, script: Script) {
        self.state.lock().scripts.push_back(script);
    }

    /// All requests opened so far, in order
    pub fn requests(&self) -> Vec<StreamRequest> {
        self.state.lock().requests.clone()
    }

    /// Number of requests opened so far
    pub fn open_count(&self) -> usize {
        self.state.lock().requests.len()
    }
}

impl Transport for ScriptedTransport {
    fn open(&self, request: StreamRequest) -> TransportStream {
        let script = {
            let mut state = self.state.lock();
            state.requests.push(request);
            state.scripts.pop_front()
        };

        match script {
            Some(Script {
                events,
                hold_open: false,
            }) => stream::iter(events).boxed(),
            Some(Script {
                events,
                hold_open: true,
            }) => stream::iter(events).chain(stream::pending()).boxed(),
            None => stream::pending().boxed(),
        }
    }
}

/// A test server that automatically shuts down when dropped
pub struct TestServer {
    pub addr: SocketAddr,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl TestServer {
    /// Serve an axum Router on an ephemeral local port
    ///
    /// # Example
    ///
    /// ```ignore
    /// use axum::{routing::get, Router};
    /// use eventstream_client::testing::TestServer;
    ///
    /// let router = Router::new().route("/stream", get(|| async { "a\r\nb\r\n" }));
    /// let server = TestServer::start(router).await?;
    /// let url = server.url("/stream")?;
    /// ```
    pub async fn start<S>(router: axum::Router<S>) -> Result<Self>
    where
        S: Clone + Send + Sync + 'static,
        axum::Router<S>: Into<axum::Router>,
    {
        // Bind to any available port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| crate::StreamError::transport(format!("bind failed: {}", e)))?;
        let addr = listener
            .local_addr()
            .map_err(|e| crate::StreamError::transport(format!("local_addr failed: {}", e)))?;

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

        let router: axum::Router = router.into();

        // Spawn the server
        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        // Give server a moment to start
        tokio::time::sleep(Duration::from_millis(10)).await;

        Ok(Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Get the base URL of the test server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Absolute URL for `path` on this server
    pub fn url(&self, path: &str) -> Result<Url> {
        Ok(Url::parse(&self.base_url())?.join(path)?)
    }

    /// Shutdown the server gracefully
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        // Send shutdown signal if not already done
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        // Abort the task if still running
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// Wait for a condition with timeout
pub async fn wait_for<F>(condition: F, timeout: Duration) -> bool
where
    F: Fn() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;

    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Credentials;
    use bytes::Bytes;

    fn request() -> StreamRequest {
        let url = Url::parse("http://127.0.0.1:8080/stream").unwrap();
        StreamRequest::event_stream(url, &Credentials::new("u", "p")).unwrap()
    }

    #[tokio::test]
    async fn test_scripted_transport_plays_scripts_in_order() {
        let transport = ScriptedTransport::new();
        transport.push(Script::new(vec![TransportEvent::Chunk(Bytes::from_static(
            b"one",
        ))]));
        transport.push(Script::new(vec![TransportEvent::Complete(None)]));

        let first: Vec<_> = transport.open(request()).collect().await;
        assert!(matches!(first.as_slice(), [TransportEvent::Chunk(b)] if b == "one"));

        let second: Vec<_> = transport.open(request()).collect().await;
        assert!(matches!(second.as_slice(), [TransportEvent::Complete(None)]));

        assert_eq!(transport.open_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scripted_transport_without_script_never_answers() {
        let transport = ScriptedTransport::new();
        let mut stream = transport.open(request());
        let next = tokio::time::timeout(Duration::from_secs(5), stream.next()).await;
        assert!(next.is_err());
    }

    #[tokio::test]
    async fn test_server_url() {
        let server = TestServer::start(axum::Router::new()).await.unwrap();
        let url = server.url("/stream").unwrap();
        assert_eq!(url.as_str(), format!("http://{}/stream", server.addr));
        server.shutdown().await;
    }
}
