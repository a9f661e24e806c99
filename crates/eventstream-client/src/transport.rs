//! Streaming HTTP transport
//!
//! A [`Transport`] opens one streaming request and reports, in order, the
//! response headers, the body chunks and a final completion. Dropping the
//! returned stream cancels the request.

use std::pin::Pin;

use bytes::Bytes;
use futures::stream::{Stream, StreamExt};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CACHE_CONTROL};
use reqwest::{Client, StatusCode};
use tracing::debug;
use url::Url;

use crate::auth::Credentials;
use crate::config::StreamConfig;
use crate::error::{Result, StreamError};

/// Notification emitted by an open transport request
#[derive(Debug)]
pub enum TransportEvent {
    /// Response headers arrived (at most once)
    Headers(StatusCode),
    /// A body chunk
    Chunk(Bytes),
    /// The request is over; `None` is a clean end of body
    Complete(Option<StreamError>),
}

/// Stream of notifications for one request
pub type TransportStream = Pin<Box<dyn Stream<Item = TransportEvent> + Send>>;

/// Capability to open streaming requests.
///
/// A stream that ends without a [`TransportEvent::Complete`] is treated as a
/// clean end of body.
pub trait Transport: Send + Sync + 'static {
    fn open(&self, request: StreamRequest) -> TransportStream;
}

/// A streaming GET request
#[derive(Debug, Clone)]
pub struct StreamRequest {
    pub url: Url,
    pub headers: HeaderMap,
}

impl StreamRequest {
    /// Build the event-stream request for `url` authenticated as `credentials`
    pub fn event_stream(url: Url, credentials: &Credentials) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

        let mut auth = HeaderValue::from_str(&credentials.header_value())
            .map_err(|e| StreamError::InvalidHeader(format!("Authorization: {}", e)))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        Ok(Self { url, headers })
    }
}

/// [`Transport`] backed by a reqwest client
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport using the timeouts from `config`.
    ///
    /// Without a stream timeout the request has no deadline at all.
    pub fn new(config: &StreamConfig) -> Result<Self> {
        let mut builder = Client::builder().connect_timeout(config.connect_timeout());
        if let Some(timeout) = config.stream_timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }
}

impl Transport for HttpTransport {
    fn open(&self, request: StreamRequest) -> TransportStream {
        let client = self.client.clone();

        Box::pin(async_stream::stream! {
            debug!("Connecting to event stream: {}", request.url);

            let response = match client.get(request.url).headers(request.headers).send().await {
                Ok(response) => response,
                Err(e) => {
                    yield TransportEvent::Complete(Some(StreamError::Connection(e)));
                    return;
                }
            };

            yield TransportEvent::Headers(response.status());

            let mut body = response.bytes_stream();
            while let Some(chunk) = body.next().await {
                match chunk {
                    Ok(bytes) => yield TransportEvent::Chunk(bytes),
                    Err(e) => {
                        yield TransportEvent::Complete(Some(StreamError::Connection(e)));
                        return;
                    }
                }
            }

            yield TransportEvent::Complete(None);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_stream_headers() {
        let url = Url::parse("https://streaming.example.com/stream/1").unwrap();
        let request = StreamRequest::event_stream(url.clone(), &Credentials::new("user", "pass"))
            .unwrap();

        assert_eq!(request.url, url);
        assert_eq!(request.headers.len(), 3);
        assert_eq!(request.headers[ACCEPT], "*/*");
        assert_eq!(request.headers[CACHE_CONTROL], "no-cache");
        assert_eq!(request.headers[AUTHORIZATION], "Basic dXNlcjpwYXNz");
        assert!(request.headers[AUTHORIZATION].is_sensitive());
    }

    #[test]
    fn test_debug_hides_authorization() {
        let url = Url::parse("https://streaming.example.com/").unwrap();
        let request =
            StreamRequest::event_stream(url, &Credentials::new("user", "secret")).unwrap();
        let debug = format!("{:?}", request);
        assert!(!debug.contains("dXNlcjpzZWNyZXQ="));
    }

    #[test]
    fn test_http_transport_builds_without_timeout() {
        assert!(HttpTransport::new(&StreamConfig::default()).is_ok());
    }
}
