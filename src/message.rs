//! The in-memory CAN/CAN-FD frame and bit-timing data model.

/// A CAN 2.0 or CAN-FD frame, as exchanged with the caller.
///
/// `is_remote_frame` and `is_fd` are mutually exclusive. For CAN-FD
/// frames, `data.len()` must be one of the nine canonical FD lengths
/// (`0..=8, 12, 16, 20, 24, 32, 48, 64`); `dlc` mirrors `data.len()` in
/// that case. For CAN 2.0 frames `dlc` is `0..=8` and equals
/// `data.len()` for data frames, or the advertised remote-frame length
/// when `is_remote_frame` is set (remote frames carry no payload).
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub arbitration_id: u32,
    pub is_extended_id: bool,
    pub is_remote_frame: bool,
    pub is_fd: bool,
    pub bitrate_switch: bool,
    pub dlc: usize,
    pub data: Vec<u8>,
    /// Seconds since the bus's monotonic origin, set by the adapter on
    /// reception. Ignored on send.
    pub timestamp: f64,
}

impl Message {
    /// A standard (11-bit) data frame.
    pub fn new_standard(arbitration_id: u32, data: impl Into<Vec<u8>>) -> Self {
        let data = data.into();
        Message {
            arbitration_id,
            is_extended_id: false,
            is_remote_frame: false,
            is_fd: false,
            bitrate_switch: false,
            dlc: data.len(),
            data,
            timestamp: 0.0,
        }
    }

    /// An extended (29-bit) data frame.
    pub fn new_extended(arbitration_id: u32, data: impl Into<Vec<u8>>) -> Self {
        let mut msg = Self::new_standard(arbitration_id, data);
        msg.is_extended_id = true;
        msg
    }

    /// A remote-transmission-request frame carrying no payload.
    pub fn new_remote(arbitration_id: u32, is_extended_id: bool, dlc: usize) -> Self {
        Message {
            arbitration_id,
            is_extended_id,
            is_remote_frame: true,
            is_fd: false,
            bitrate_switch: false,
            dlc,
            data: Vec::new(),
            timestamp: 0.0,
        }
    }

    /// A CAN-FD data frame. `data.len()` must be a canonical FD length.
    pub fn new_fd(
        arbitration_id: u32,
        is_extended_id: bool,
        bitrate_switch: bool,
        data: impl Into<Vec<u8>>,
    ) -> Self {
        let data = data.into();
        Message {
            arbitration_id,
            is_extended_id,
            is_remote_frame: false,
            is_fd: true,
            bitrate_switch,
            dlc: data.len(),
            data,
            timestamp: 0.0,
        }
    }
}

/// Classical-CAN bit timing, as a BTR0/BTR1 register pair.
///
/// `f_clock` is carried alongside the registers so the timing encoder
/// can verify it matches the 8 MHz this dialect assumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassicalTiming {
    pub btr0: u8,
    pub btr1: u8,
    pub f_clock: u32,
}

impl ClassicalTiming {
    pub fn new(btr0: u8, btr1: u8) -> Self {
        ClassicalTiming {
            btr0,
            btr1,
            f_clock: 8_000_000,
        }
    }
}

/// One phase (nominal or data) of CAN-FD bit timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FdQuadruple {
    pub sjw: u16,
    pub tseg1: u16,
    pub tseg2: u16,
    pub brp: u16,
}

/// CAN-FD bit timing: nominal (arbitration) phase and data phase.
///
/// `f_clock` is carried alongside for the same reason as
/// [`ClassicalTiming::f_clock`]; this dialect assumes 60 MHz.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FdTiming {
    pub nominal: FdQuadruple,
    pub data: FdQuadruple,
    pub f_clock: u32,
}

impl FdTiming {
    pub fn new(nominal: FdQuadruple, data: FdQuadruple) -> Self {
        FdTiming {
            nominal,
            data,
            f_clock: 60_000_000,
        }
    }
}

/// Tagged variant over the two bit-timing representations, replacing
/// the source driver's runtime dispatch on the timing argument's type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timing {
    Classical(ClassicalTiming),
    Fd(FdTiming),
}
