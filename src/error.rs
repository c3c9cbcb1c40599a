//! Error types for the SLCAN bus adapter.
//!
//! Mirrors the four error kinds of the driver's error handling design:
//! configuration errors raised from constructor argument validation,
//! initialization errors raised while opening the transport or issuing
//! setup commands, operation errors raised from `send`/`recv`/`flush`/
//! `shutdown` after the bus is already open, and a dependency-missing
//! error when the crate was built without its serial transport backend.

use thiserror::Error;

/// The error type returned by all fallible operations in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// An invalid combination of constructor arguments (empty channel,
    /// unsupported preset bitrate, bitrate and explicit timing both given,
    /// `f_clock` mismatch).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The transport could not be opened, or a setup command (timing,
    /// open) could not be written while constructing the bus.
    #[error("initialization error: {0}")]
    Initialization(String),

    /// A transport read or write failed after the bus was already open,
    /// or `fileno` is not available on this transport.
    #[error("operation error: {0}")]
    Operation(String),

    /// The crate was built without the `transport-serial` feature, so no
    /// real serial transport is available.
    #[error("the serial transport backend is not compiled in: {0}")]
    DependencyMissing(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Operation(e.to_string())
    }
}
