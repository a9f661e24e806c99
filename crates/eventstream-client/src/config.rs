//! Stream session configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StreamError};

/// Default limit for one buffered event (1 MiB)
pub const DEFAULT_MAX_EVENT_BYTES: usize = 1024 * 1024;

/// How incoming body chunks are split into events
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Framing {
    /// Each chunk is split on its own; the text after the last CR-LF of a
    /// chunk is discarded
    #[default]
    PerChunk,
    /// The text after the last CR-LF is kept and joined with the next chunk
    Buffered,
}

/// Configuration for an [`EventStream`](crate::EventStream)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Delay before reconnecting after the stream ends or fails
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,
    /// Total request timeout; `None` keeps the stream open indefinitely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_timeout_secs: Option<u64>,
    /// TCP/TLS connect timeout
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Chunk framing mode
    #[serde(default)]
    pub framing: Framing,
    /// Largest event kept by buffered framing; longer events are dropped
    #[serde(default = "default_max_event_bytes")]
    pub max_event_bytes: usize,
}

fn default_retry_interval_ms() -> u64 {
    3000
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_max_event_bytes() -> usize {
    DEFAULT_MAX_EVENT_BYTES
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            retry_interval_ms: default_retry_interval_ms(),
            stream_timeout_secs: None,
            connect_timeout_secs: default_connect_timeout_secs(),
            framing: Framing::default(),
            max_event_bytes: default_max_event_bytes(),
        }
    }
}

impl StreamConfig {
    /// Set the reconnect delay, rounded up to whole milliseconds
    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        let millis = interval.as_millis() + u128::from(interval.subsec_nanos() % 1_000_000 > 0);
        self.retry_interval_ms = u64::try_from(millis).unwrap_or(u64::MAX);
        self
    }

    /// Set the total request timeout, rounded up to whole seconds
    pub fn with_stream_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.stream_timeout_secs =
            timeout.map(|t| t.as_secs().saturating_add(u64::from(t.subsec_nanos() > 0)));
        self
    }

    pub fn with_framing(mut self, framing: Framing) -> Self {
        self.framing = framing;
        self
    }

    pub fn with_max_event_bytes(mut self, max_event_bytes: usize) -> Self {
        self.max_event_bytes = max_event_bytes;
        self
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    pub fn stream_timeout(&self) -> Option<Duration> {
        self.stream_timeout_secs.map(Duration::from_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Check that all intervals are usable
    pub fn validate(&self) -> Result<()> {
        if self.retry_interval_ms == 0 {
            return Err(StreamError::config("Retry interval must be > 0"));
        }
        if self.connect_timeout_secs == 0 {
            return Err(StreamError::config("Connect timeout must be > 0"));
        }
        if self.max_event_bytes == 0 {
            return Err(StreamError::config("Max event size must be > 0"));
        }
        if self.stream_timeout_secs == Some(0) {
            return Err(StreamError::config(
                "Stream timeout must be > 0 (omit it to disable)",
            ));
        }
        Ok(())
    }
}
