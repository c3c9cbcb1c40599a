//! Open/closed lifecycle and the command/response exchanges that are
//! only meaningful at the session level: open, close, version, serial
//! number.

use crate::error::{Error, Result};
use crate::framer::LineFramer;
use crate::transport::Transport;
use std::time::Duration;

const CR: u8 = b'\r';

/// The adapter's current channel mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Closed,
    OpenNormal,
    OpenListenOnly,
}

impl SessionState {
    pub fn is_open(self) -> bool {
        !matches!(self, SessionState::Closed)
    }
}

/// Tracks the adapter's open/closed state and issues the commands that
/// are only legal in one state or the other. Does not own a transport
/// or framer itself — both are borrowed per call, matching the bus
/// façade's single ownership of those resources.
pub struct Session {
    state: SessionState,
}

impl Session {
    pub fn new() -> Self {
        Session { state: SessionState::Closed }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Writes a bare command followed by `\r` and flushes.
    fn write_command<T: Transport>(transport: &mut T, command: &str) -> Result<()> {
        transport.write_all(command.as_bytes())?;
        transport.write_all(&[CR])?;
        transport.flush()?;
        Ok(())
    }

    /// Writes a configuration command (timing, bitrate). Only legal
    /// while closed; callers enforce that by only calling this during
    /// construction, before `open`.
    pub fn configure<T: Transport>(transport: &mut T, command: &str) -> Result<()> {
        Self::write_command(transport, command)
            .map_err(|e| Error::Initialization(format!("failed to write {command:?}: {e}")))
    }

    /// Emits `O` (normal) or `L` (listen-only) and marks the session
    /// open. Unconditional: does not check current state, matching the
    /// source driver's "open is idempotent enough to just send it"
    /// behavior.
    pub fn open<T: Transport>(&mut self, transport: &mut T, listen_only: bool) -> Result<()> {
        let command = if listen_only { "L" } else { "O" };
        Self::write_command(transport, command)
            .map_err(|e| Error::Initialization(format!("failed to open channel: {e}")))?;
        self.state = if listen_only {
            SessionState::OpenListenOnly
        } else {
            SessionState::OpenNormal
        };
        Ok(())
    }

    /// Emits `C` and marks the session closed. Safe to call when
    /// already closed (idempotent).
    pub fn close<T: Transport>(&mut self, transport: &mut T) -> Result<()> {
        if self.state == SessionState::Closed {
            log::trace!("close() on an already-closed session, no-op");
            return Ok(());
        }
        Self::write_command(transport, "C")
            .map_err(|e| Error::Operation(format!("failed to close channel: {e}")))?;
        self.state = SessionState::Closed;
        Ok(())
    }

    /// Returns an error unless a data-transmitting operation is
    /// currently legal (the session guard of the open/closed
    /// invariant).
    pub fn require_open(&self) -> Result<()> {
        if self.state.is_open() {
            Ok(())
        } else {
            Err(Error::Operation(
                "cannot send while the channel is closed".into(),
            ))
        }
    }

    /// Writes `V`, reads one response, and decodes hardware/software
    /// version as two two-digit decimal fields. Returns `None` if the
    /// reply is not the expected six-character `V<hh><ss>\r` shape.
    pub fn get_version<T: Transport>(
        transport: &mut T,
        framer: &mut LineFramer,
        timeout: Duration,
    ) -> Result<Option<(u8, u8)>> {
        Self::write_command(transport, "V")
            .map_err(|e| Error::Operation(format!("failed to write version query: {e}")))?;
        let reply = framer.read(transport, timeout)?;
        Ok(reply.and_then(|line| parse_version(&line)))
    }

    /// Writes `N`, reads one response, and returns the four-character
    /// serial number body. Returns `None` if the reply is not the
    /// expected six-character `N<xxxx>\r` shape.
    pub fn get_serial_number<T: Transport>(
        transport: &mut T,
        framer: &mut LineFramer,
        timeout: Duration,
    ) -> Result<Option<String>> {
        Self::write_command(transport, "N")
            .map_err(|e| Error::Operation(format!("failed to write serial number query: {e}")))?;
        let reply = framer.read(transport, timeout)?;
        Ok(reply.and_then(|line| parse_serial_number(&line)))
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_version(line: &str) -> Option<(u8, u8)> {
    let bytes = line.as_bytes();
    if bytes.len() != 6 || bytes[0] != b'V' {
        return None;
    }
    let hw = std::str::from_utf8(&bytes[1..3]).ok()?.parse().ok()?;
    let sw = std::str::from_utf8(&bytes[3..5]).ok()?.parse().ok()?;
    Some((hw, sw))
}

fn parse_serial_number(line: &str) -> Option<String> {
    let bytes = line.as_bytes();
    if bytes.len() != 6 || bytes[0] != b'N' {
        return None;
    }
    Some(String::from_utf8_lossy(&bytes[1..5]).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;

    #[test]
    fn starts_closed() {
        let session = Session::new();
        assert_eq!(session.state(), SessionState::Closed);
        assert!(session.require_open().is_err());
    }

    #[test]
    fn open_then_close_round_trip() {
        let mut transport = MockTransport::new();
        let mut session = Session::new();

        session.open(&mut transport, false).unwrap();
        assert_eq!(session.state(), SessionState::OpenNormal);
        assert!(session.require_open().is_ok());

        session.close(&mut transport).unwrap();
        assert_eq!(session.state(), SessionState::Closed);
        assert!(session.require_open().is_err());

        assert_eq!(transport.written, b"O\rC\r");
    }

    #[test]
    fn listen_only_open_emits_l() {
        let mut transport = MockTransport::new();
        let mut session = Session::new();
        session.open(&mut transport, true).unwrap();
        assert_eq!(session.state(), SessionState::OpenListenOnly);
        assert_eq!(transport.written, b"L\r");
    }

    #[test]
    fn close_is_idempotent() {
        let mut transport = MockTransport::new();
        let mut session = Session::new();
        session.open(&mut transport, false).unwrap();
        session.close(&mut transport).unwrap();
        session.close(&mut transport).unwrap();
        // the second close writes nothing further to the wire
        assert_eq!(transport.written, b"O\rC\r");
    }

    #[test]
    fn version_query_parses_hw_sw_pair() {
        let mut transport = MockTransport::new();
        transport.feed(b"V1234\r");
        let mut framer = LineFramer::new();
        let version =
            Session::get_version(&mut transport, &mut framer, Duration::from_millis(50)).unwrap();
        assert_eq!(version, Some((12, 34)));
    }

    #[test]
    fn malformed_version_reply_yields_none() {
        let mut transport = MockTransport::new();
        transport.feed(b"\x07");
        let mut framer = LineFramer::new();
        let version =
            Session::get_version(&mut transport, &mut framer, Duration::from_millis(50)).unwrap();
        assert_eq!(version, None);
    }

    #[test]
    fn serial_number_query_slices_four_chars() {
        let mut transport = MockTransport::new();
        transport.feed(b"NABCD\r");
        let mut framer = LineFramer::new();
        let serial = Session::get_serial_number(&mut transport, &mut framer, Duration::from_millis(50))
            .unwrap();
        assert_eq!(serial, Some("ABCD".to_string()));
    }
}
