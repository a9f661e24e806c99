//! Stream processing: event framing and the reconnect policy
//!
//! Body chunks are split into CR-LF delimited events by [`framing`]. How a
//! finished connection attempt affects the session is decided by
//! [`state::on_completion`], a pure function the session driver executes.
//!
//! # Example
//!
//! ```
//! use eventstream_client::streaming::framing::split_chunk;
//!
//! // The text after the last CR-LF is an unfinished event
//! assert_eq!(split_chunk(b"a\r\nb\r\nc"), vec!["a", "b"]);
//! ```

pub mod framing;
pub mod state;
mod types;

pub use types::{SessionEvent, SessionStatus};
