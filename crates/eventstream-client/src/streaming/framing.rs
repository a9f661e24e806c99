//! Event framing
//!
//! Splits raw body chunks into CR-LF delimited text events.

use tracing::{trace, warn};

use crate::config::{Framing, DEFAULT_MAX_EVENT_BYTES};

const DELIMITER: &str = "\r\n";

/// Split one chunk into events without looking at any other chunk.
///
/// The chunk must be valid UTF-8 as a whole, otherwise it is dropped. The
/// segment after the last CR-LF is treated as an unfinished event and
/// discarded, so a chunk without any CR-LF yields nothing.
pub fn split_chunk(chunk: &[u8]) -> Vec<String> {
    let text = match std::str::from_utf8(chunk) {
        Ok(text) => text,
        Err(e) => {
            trace!("Dropping {} byte chunk: {}", chunk.len(), e);
            return Vec::new();
        }
    };

    let mut segments: Vec<String> = text.split(DELIMITER).map(str::to_string).collect();
    segments.pop();
    segments
}

/// Framer state for one connection
#[derive(Debug)]
pub struct EventFramer {
    framing: Framing,
    /// Longest event kept in buffered framing
    max_event_bytes: usize,
    /// Bytes after the last CR-LF seen so far (buffered framing only)
    pending: Vec<u8>,
    /// Prefix of `pending` already searched for a delimiter
    scanned: usize,
    /// Skipping the remainder of an oversized event
    discarding: bool,
}

impl Default for EventFramer {
    fn default() -> Self {
        Self::new(Framing::default())
    }
}

impl EventFramer {
    pub fn new(framing: Framing) -> Self {
        Self {
            framing,
            max_event_bytes: DEFAULT_MAX_EVENT_BYTES,
            pending: Vec::new(),
            scanned: 0,
            discarding: false,
        }
    }

    /// Limit the size of a buffered event; longer events are dropped
    pub fn with_max_event_bytes(mut self, max_event_bytes: usize) -> Self {
        self.max_event_bytes = max_event_bytes;
        self
    }

    /// Feed a chunk and return the events it completes, in order
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        match self.framing {
            Framing::PerChunk => split_chunk(chunk),
            Framing::Buffered => self.feed_buffered(chunk),
        }
    }

    /// Forget any partial event (called when a new connection starts)
    pub fn reset(&mut self) {
        self.pending.clear();
        self.scanned = 0;
        self.discarding = false;
    }

    fn feed_buffered(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut events = Vec::new();
        let mut line_start = 0;
        // A delimiter may straddle the previous chunk boundary
        let mut cursor = self.scanned.saturating_sub(DELIMITER.len() - 1);

        while let Some(offset) = find_delimiter(&self.pending[cursor..]) {
            let line_end = cursor + offset;
            let line = &self.pending[line_start..line_end];

            if self.discarding {
                self.discarding = false;
                trace!("Dropped the tail of an oversized event");
            } else if line.len() > self.max_event_bytes {
                trace!("Dropping {} byte event (limit {})", line.len(), self.max_event_bytes);
            } else {
                match std::str::from_utf8(line) {
                    Ok(event) => events.push(event.to_string()),
                    Err(e) => trace!("Dropping invalid UTF-8 event: {}", e),
                }
            }

            line_start = line_end + DELIMITER.len();
            cursor = line_start;
        }
        self.pending.drain(..line_start);

        if !self.discarding && self.pending.len() > self.max_event_bytes {
            warn!(
                "Partial event exceeds {} bytes, discarding until the next delimiter",
                self.max_event_bytes
            );
            self.discarding = true;
        }
        if self.discarding {
            // Keep a trailing CR, it may begin the delimiter ending this event
            let keep = usize::from(self.pending.last() == Some(&b'\r'));
            let cut = self.pending.len() - keep;
            self.pending.drain(..cut);
        }
        self.scanned = self.pending.len();

        events
    }
}

fn find_delimiter(haystack: &[u8]) -> Option<usize> {
    haystack
        .windows(DELIMITER.len())
        .position(|w| w == DELIMITER.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(b"a\r\nb\r\nc", &["a", "b"])]
    #[case(b"a\r\nb\r\n", &["a", "b"])]
    #[case(b"\r\nsecond\r\n", &["", "second"])]
    #[case(b"\r\n", &[""])]
    #[case(b"first", &[])]
    #[case(b"", &[])]
    // Bare LF is not a delimiter
    #[case(b"one\ntwo\r\n", &["one\ntwo"])]
    #[case("temp:21°C\r\n".as_bytes(), &["temp:21°C"])]
    fn test_split_chunk(#[case] chunk: &[u8], #[case] expected: &[&str]) {
        assert_eq!(split_chunk(chunk), expected);
    }

    #[test]
    fn test_split_delivers_all_but_last_segment() {
        let chunk = "1\r\n2\r\n3\r\n4\r\ntail";
        let segments = chunk.split("\r\n").count();
        let events = split_chunk(chunk.as_bytes());
        assert_eq!(events.len(), segments - 1);
        assert!(!events.contains(&"tail".to_string()));
    }

    #[test]
    fn test_invalid_utf8_chunk_is_dropped() {
        assert!(split_chunk(b"ok\r\n\xff\xfe\r\n").is_empty());
    }

    #[test]
    fn test_per_chunk_does_not_join_chunks() {
        let mut framer = EventFramer::new(Framing::PerChunk);
        assert!(framer.feed(b"first").is_empty());
        assert_eq!(framer.feed(b"\r\nsecond\r\n"), vec!["", "second"]);
    }

    #[test]
    fn test_buffered_joins_chunks() {
        let mut framer = EventFramer::new(Framing::Buffered);
        assert!(framer.feed(b"first").is_empty());
        assert_eq!(framer.feed(b"\r\nsecond\r\n"), vec!["first", "second"]);
    }

    #[test]
    fn test_buffered_delimiter_split_across_chunks() {
        let mut framer = EventFramer::new(Framing::Buffered);
        assert!(framer.feed(b"abc\r").is_empty());
        assert_eq!(framer.feed(b"\ndef"), vec!["abc"]);
        assert_eq!(framer.feed(b"\r\n"), vec!["def"]);
    }

    #[test]
    fn test_buffered_multibyte_char_split_across_chunks() {
        let bytes = "21°C\r\n".as_bytes();
        // Split inside the two-byte encoding of '°'
        let (head, tail) = bytes.split_at(3);
        let mut framer = EventFramer::new(Framing::Buffered);
        assert!(framer.feed(head).is_empty());
        assert_eq!(framer.feed(tail), vec!["21°C"]);
    }

    #[test]
    fn test_buffered_drops_invalid_event_only() {
        let mut framer = EventFramer::new(Framing::Buffered);
        assert_eq!(framer.feed(b"\xff\r\nok\r\n"), vec!["ok"]);
    }

    #[test]
    fn test_buffered_drops_oversized_partial_event() {
        let mut framer = EventFramer::new(Framing::Buffered).with_max_event_bytes(8);
        assert!(framer.feed(b"0123456789").is_empty());
        assert!(framer.pending.is_empty());
        // The rest of the oversized event is skipped, the next one is kept
        assert!(framer.feed(b"abc").is_empty());
        assert_eq!(framer.feed(b"def\r\nnext\r\n"), vec!["next"]);
    }

    #[test]
    fn test_buffered_oversized_event_ends_on_split_delimiter() {
        let mut framer = EventFramer::new(Framing::Buffered).with_max_event_bytes(4);
        assert!(framer.feed(b"0123456789\r").is_empty());
        assert_eq!(framer.feed(b"\nok\r\n"), vec!["ok"]);
    }

    #[test]
    fn test_buffered_drops_complete_oversized_event() {
        let mut framer = EventFramer::new(Framing::Buffered).with_max_event_bytes(4);
        assert_eq!(framer.feed(b"too long\r\nfine\r\n"), vec!["fine"]);
    }

    #[test]
    fn test_buffered_endless_line_stays_bounded() {
        let mut framer = EventFramer::new(Framing::Buffered);
        let kib = [b'x'; 1024];
        for _ in 0..2000 {
            assert!(framer.feed(&kib).is_empty());
            assert!(framer.pending.len() <= DEFAULT_MAX_EVENT_BYTES);
        }
        assert_eq!(framer.feed(b"\r\nlast\r\n"), vec!["last"]);
    }

    #[test]
    fn test_buffered_long_event_within_limit() {
        let mut framer = EventFramer::new(Framing::Buffered);
        let kib = [b'y'; 1024];
        for _ in 0..64 {
            assert!(framer.feed(&kib).is_empty());
        }
        let events = framer.feed(b"\r\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].len(), 64 * 1024);
    }

    #[test]
    fn test_reset_discards_partial_event() {
        let mut framer = EventFramer::new(Framing::Buffered);
        assert!(framer.feed(b"stale").is_empty());
        framer.reset();
        assert_eq!(framer.feed(b"fresh\r\n"), vec!["fresh"]);
    }
}
