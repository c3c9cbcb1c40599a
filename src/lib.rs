//! SLCAN (LAWICEL) bus adapter.
//!
//! This crate drives a Controller Area Network (CAN / CAN-FD) bus
//! through an adapter speaking the *SLCAN*, also called *LAWICEL*,
//! ASCII line protocol over a serial transport. It owns the framing
//! codec, the frame encode/decode tables, the bit-timing configuration
//! protocol, and the open/closed session lifecycle; it does not own
//! the serial port itself beyond the [`Transport`] contract, nor any
//! higher-level cyclic send scheduling or multi-threaded mediation —
//! those belong above this crate.
//!
//! # An introduction to SLCAN
//!
//! A CAN frame carries an identifier and up to 8 bytes of payload (64
//! for CAN-FD). The SLCAN dialect represents each frame as a short
//! ASCII command: `t1234DEADBEEF\r` sends a standard frame with
//! identifier `0x123` and payload `DE AD BE EF`. The adapter itself
//! replies to commands with `\r` (success) or `\a`/BEL (error), and
//! asynchronously emits the same frame-shaped lines for traffic it
//! receives off the bus.
//!
//! # Getting started
//!
//! ```no_run
//! use slcan::{Bus, BusOptions, Message};
//!
//! # fn main() -> Result<(), slcan::Error> {
//! let mut options = BusOptions::new("/dev/ttyUSB0");
//! options.bitrate = Some(500_000);
//! let mut bus = Bus::open(options)?;
//!
//! bus.send(&Message::new_standard(0x123, vec![0xDE, 0xAD, 0xBE, 0xEF]), None)?;
//! let (msg, _filtered) = bus.recv(None)?;
//! bus.shutdown()?;
//! # Ok(())
//! # }
//! ```
//!
//! Logging goes through the `log` facade throughout; call
//! [`logging::install`] if you want this crate's events on a colored
//! console, or wire up any other `log`-compatible subscriber.

pub mod bus;
pub mod dlc;
pub mod error;
pub mod frame_codec;
pub mod framer;
pub mod logging;
pub mod message;
pub mod session;
pub mod timing;
pub mod transport;

pub use bus::{Bus, BusOptions};
pub use error::{Error, Result};
pub use framer::LineFramer;
pub use message::{ClassicalTiming, FdQuadruple, FdTiming, Message, Timing};
pub use session::{Session, SessionState};
pub use transport::Transport;

#[cfg(feature = "transport-serial")]
pub use transport::SerialTransport;
