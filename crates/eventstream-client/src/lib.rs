//! Event Stream Client Library
//!
//! A self-healing client for long-lived, chunked HTTP event streams. The
//! client opens a streaming request authenticated with HTTP Basic auth,
//! splits the body into CR-LF delimited text events and reconnects after a
//! fixed delay whenever the stream ends or fails, until it is disconnected.
//!
//! # Example
//!
//! ```rust,no_run
//! use eventstream_client::{
//!     ChannelSubscriber, Credentials, EventStream, SessionEvent, StreamConfig,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let stream = EventStream::with_http(StreamConfig::default())?;
//!     let (subscriber, mut events) = ChannelSubscriber::new();
//!
//!     stream.connect(
//!         "https://streaming.example.com/stream/42".parse()?,
//!         Credentials::new("owner@example.com", "token"),
//!         subscriber,
//!     );
//!
//!     while let Some(event) = events.recv().await {
//!         match event {
//!             SessionEvent::Opened => println!("connected"),
//!             SessionEvent::Event(line) => println!("{}", line),
//!             SessionEvent::Error(reason) => eprintln!("stream ended: {:?}", reason),
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Callbacks
//!
//! Implement [`Subscriber`] (or use [`FnSubscriber`]) to receive the
//! notifications directly on the session's driver task.
//!
//! # Testing
//!
//! The `testing` module provides a scripted in-memory transport and an HTTP
//! test server:
//!
//! ```rust,ignore
//! use eventstream_client::testing::{Script, ScriptedTransport};
//!
//! let transport = ScriptedTransport::new();
//! transport.push(Script::new(vec![/* transport events */]));
//! let stream = EventStream::new(transport.clone(), StreamConfig::default())?;
//! ```

mod auth;
mod config;
mod error;
mod session;
pub mod streaming;
mod subscriber;
pub mod testing;
pub mod transport;

pub use auth::{basic_auth_header, Credentials};
pub use config::{Framing, StreamConfig};
pub use error::{Result, StreamError};
pub use session::EventStream;
pub use subscriber::{ChannelSubscriber, FnSubscriber, Subscriber};

// Re-export streaming types for convenience
pub use streaming::{SessionEvent, SessionStatus};
pub use transport::{HttpTransport, StreamRequest, Transport, TransportEvent};
