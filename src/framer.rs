//! Splits a continuous inbound byte stream into terminator-delimited
//! SLCAN responses.

use crate::transport::Transport;
use std::time::{Duration, Instant};

const OK: u8 = b'\r';
const ERROR: u8 = b'\a';

/// Owns the not-yet-terminated tail of the inbound byte stream and
/// yields complete responses as they arrive.
///
/// Not reentrant: a single `LineFramer` must not be driven from more
/// than one call site at a time (mirrors the single-threaded,
/// synchronous concurrency model of the bus façade that owns it).
#[derive(Default)]
pub struct LineFramer {
    buffer: Vec<u8>,
}

impl LineFramer {
    pub fn new() -> Self {
        LineFramer { buffer: Vec::new() }
    }

    /// Returns the next complete response (the prefix of the buffer up
    /// to and including its first terminator), polling `transport` for
    /// more bytes until one arrives or `timeout` elapses.
    ///
    /// Returns `Ok(None)` if no terminator appeared before the
    /// deadline; never blocks past `timeout` plus the ~1ms poll
    /// granularity.
    pub fn read<T: Transport>(
        &mut self,
        transport: &mut T,
        timeout: Duration,
    ) -> std::io::Result<Option<String>> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(pos) = self
                .buffer
                .iter()
                .position(|&b| b == OK || b == ERROR)
            {
                let response: Vec<u8> = self.buffer.drain(..=pos).collect();
                let text = String::from_utf8_lossy(&response).into_owned();
                return Ok(Some(text));
            }

            if Instant::now() >= deadline {
                return Ok(None);
            }

            let available = transport.bytes_to_read()?;
            if available > 0 {
                let mut chunk = vec![0u8; available];
                let n = transport.read(&mut chunk)?;
                chunk.truncate(n);
                log::trace!("framer read {} byte(s) from transport", n);
                self.buffer.extend_from_slice(&chunk);
            } else {
                std::thread::sleep(Duration::from_millis(1));
            }
        }
    }

    /// Discards any buffered, not-yet-terminated bytes.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;

    #[test]
    fn splits_on_cr_and_bel() {
        let mut transport = MockTransport::new();
        transport.feed(b"t1238AABBCCDDEEFF0011\rV1234\r\x07T0000000080\r");
        let mut framer = LineFramer::new();

        let mut responses = Vec::new();
        for _ in 0..3 {
            responses.push(
                framer
                    .read(&mut transport, Duration::from_millis(50))
                    .unwrap()
                    .unwrap(),
            );
        }

        assert_eq!(responses[0], "t1238AABBCCDDEEFF0011\r");
        assert_eq!(responses[1], "V1234\r");
        assert_eq!(responses[2], "\x07");
        // T0000000080\r remains buffered for the next call.
        let last = framer
            .read(&mut transport, Duration::from_millis(50))
            .unwrap()
            .unwrap();
        assert_eq!(last, "T0000000080\r");
    }

    #[test]
    fn times_out_with_no_terminator() {
        let mut transport = MockTransport::new();
        transport.feed(b"t123"); // no terminator ever arrives
        let mut framer = LineFramer::new();

        let start = Instant::now();
        let result = framer
            .read(&mut transport, Duration::from_millis(20))
            .unwrap();
        let elapsed = start.elapsed();

        assert!(result.is_none());
        assert!(elapsed >= Duration::from_millis(20));
        assert!(elapsed < Duration::from_millis(100), "elapsed={elapsed:?}");
    }

    #[test]
    fn determinism_over_many_segments() {
        let mut transport = MockTransport::new();
        let mut expected = Vec::new();
        let mut input = Vec::new();
        for i in 0..20 {
            let segment = format!("t{:03X}0", i);
            input.extend_from_slice(segment.as_bytes());
            input.push(b'\r');
            expected.push(format!("{segment}\r"));
        }
        transport.feed(&input);

        let mut framer = LineFramer::new();
        let mut actual = Vec::new();
        for _ in 0..20 {
            actual.push(
                framer
                    .read(&mut transport, Duration::from_secs(1))
                    .unwrap()
                    .unwrap(),
            );
        }
        assert_eq!(actual, expected);
    }

    #[test]
    fn clear_drops_buffered_bytes() {
        let mut transport = MockTransport::new();
        transport.feed(b"t1230");
        let mut framer = LineFramer::new();
        // prime the buffer without a terminator
        let _ = framer.read(&mut transport, Duration::from_millis(5));
        framer.clear();
        transport.feed(b"\r");
        // only the post-clear bytes plus the fresh \r should be seen
        let response = framer
            .read(&mut transport, Duration::from_millis(50))
            .unwrap()
            .unwrap();
        assert_eq!(response, "\r");
    }
}
