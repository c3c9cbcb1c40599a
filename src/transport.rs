//! The byte-transport contract the core depends on, and its
//! implementations: a real serial port (behind the `transport-serial`
//! feature) and an in-memory mock used by the test suite.

use std::io;
use std::time::Duration;

/// A full-duplex byte stream with the handful of operations the SLCAN
/// core needs: blocking writes with flush, non-blocking
/// `bytes_to_read` polling, timed reads, an input-buffer reset, and an
/// optional file-descriptor accessor.
pub trait Transport {
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()>;
    fn flush(&mut self) -> io::Result<()>;

    /// Number of bytes currently available to read without blocking.
    fn bytes_to_read(&mut self) -> io::Result<usize>;

    /// Reads up to `buf.len()` bytes, returning the number read.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    fn set_read_timeout(&mut self, timeout: Duration) -> io::Result<()>;
    fn set_write_timeout(&mut self, timeout: Duration) -> io::Result<()>;

    /// Discards any buffered, not-yet-read input.
    fn reset_input_buffer(&mut self) -> io::Result<()>;

    /// The underlying OS file descriptor, if the transport exposes one.
    fn fileno(&self) -> Option<i32> {
        None
    }
}

#[cfg(feature = "transport-serial")]
mod serial {
    use super::Transport;
    use std::io;
    use std::time::Duration;

    /// A [`Transport`] backed by a real serial port, via the
    /// `serialport` crate.
    pub struct SerialTransport {
        port: Box<dyn serialport::SerialPort>,
    }

    impl SerialTransport {
        /// Opens `url` (a device path such as `/dev/ttyUSB0` or
        /// `COM8`) at `baudrate`, with the given read timeout and
        /// optional RTS/CTS hardware flow control.
        pub fn open(
            url: &str,
            baudrate: u32,
            rtscts: bool,
            timeout: Duration,
        ) -> Result<Self, serialport::Error> {
            let mut builder = serialport::new(url, baudrate).timeout(timeout);
            if rtscts {
                builder = builder.flow_control(serialport::FlowControl::Hardware);
            }
            let port = builder.open()?;
            Ok(SerialTransport { port })
        }
    }

    impl Transport for SerialTransport {
        fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
            std::io::Write::write_all(&mut self.port, buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            std::io::Write::flush(&mut self.port)
        }

        fn bytes_to_read(&mut self) -> io::Result<usize> {
            self.port
                .bytes_to_read()
                .map(|n| n as usize)
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
        }

        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            std::io::Read::read(&mut self.port, buf)
        }

        fn set_read_timeout(&mut self, timeout: Duration) -> io::Result<()> {
            self.port
                .set_timeout(timeout)
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
        }

        fn set_write_timeout(&mut self, _timeout: Duration) -> io::Result<()> {
            // serialport has a single combined read/write timeout.
            Ok(())
        }

        fn reset_input_buffer(&mut self) -> io::Result<()> {
            self.port
                .clear(serialport::ClearBuffer::Input)
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
        }

        #[cfg(unix)]
        fn fileno(&self) -> Option<i32> {
            use std::os::unix::io::AsRawFd;
            Some(self.port.as_raw_fd())
        }

        #[cfg(not(unix))]
        fn fileno(&self) -> Option<i32> {
            None
        }
    }
}

#[cfg(feature = "transport-serial")]
pub use serial::SerialTransport;

/// An uninhabited stand-in for the real transport when the
/// `transport-serial` feature is disabled. `Bus::open` always returns
/// `Err` before a value of this type could ever be constructed, so
/// every trait method is unreachable.
#[cfg(not(feature = "transport-serial"))]
pub struct NoSerialTransport(std::convert::Infallible);

#[cfg(not(feature = "transport-serial"))]
impl Transport for NoSerialTransport {
    fn write_all(&mut self, _buf: &[u8]) -> io::Result<()> {
        match self.0 {}
    }
    fn flush(&mut self) -> io::Result<()> {
        match self.0 {}
    }
    fn bytes_to_read(&mut self) -> io::Result<usize> {
        match self.0 {}
    }
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        match self.0 {}
    }
    fn set_read_timeout(&mut self, _timeout: Duration) -> io::Result<()> {
        match self.0 {}
    }
    fn set_write_timeout(&mut self, _timeout: Duration) -> io::Result<()> {
        match self.0 {}
    }
    fn reset_input_buffer(&mut self) -> io::Result<()> {
        match self.0 {}
    }
}

/// An in-memory duplex byte queue standing in for real serial
/// hardware in tests: bytes written to it land in an `inbox` a test
/// can inspect, and bytes queued via [`MockTransport::feed`] are what
/// subsequent `read` calls return.
#[cfg(test)]
pub struct MockTransport {
    pub written: Vec<u8>,
    inbox: std::collections::VecDeque<u8>,
    fileno: Option<i32>,
}

#[cfg(test)]
impl MockTransport {
    pub fn new() -> Self {
        MockTransport {
            written: Vec::new(),
            inbox: std::collections::VecDeque::new(),
            fileno: None,
        }
    }

    /// Queues bytes that subsequent `read` calls will return.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.inbox.extend(bytes.iter().copied());
    }

    pub fn with_fileno(mut self, fd: i32) -> Self {
        self.fileno = Some(fd);
        self
    }
}

#[cfg(test)]
impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
impl Transport for MockTransport {
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.written.extend_from_slice(buf);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn bytes_to_read(&mut self) -> io::Result<usize> {
        Ok(self.inbox.len())
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.inbox.len());
        for slot in buf.iter_mut().take(n) {
            *slot = self.inbox.pop_front().unwrap();
        }
        Ok(n)
    }

    fn set_read_timeout(&mut self, _timeout: Duration) -> io::Result<()> {
        Ok(())
    }

    fn set_write_timeout(&mut self, _timeout: Duration) -> io::Result<()> {
        Ok(())
    }

    fn reset_input_buffer(&mut self) -> io::Result<()> {
        self.inbox.clear();
        Ok(())
    }

    fn fileno(&self) -> Option<i32> {
        self.fileno
    }
}
