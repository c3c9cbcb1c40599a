//! Serializes preset bitrates, classical BTR pairs, and CAN-FD timing
//! quadruples to their SLCAN wire commands.

use crate::error::Error;
use crate::message::{ClassicalTiming, FdQuadruple, FdTiming};

/// The preset bitrates this dialect understands, and their `Sx` codes.
/// Taken verbatim from `python-can`'s `slcanBus._BITRATES`.
const PRESET_BITRATES: &[(u32, u8)] = &[
    (10_000, b'0'),
    (20_000, b'1'),
    (50_000, b'2'),
    (100_000, b'3'),
    (125_000, b'4'),
    (250_000, b'5'),
    (500_000, b'6'),
    (750_000, b'7'),
    (1_000_000, b'8'),
    (83_300, b'9'),
];

/// Encodes a preset bitrate (bit/s) to its `Sx` command. Rejects any
/// value not in the fixed preset table.
pub fn encode_preset_bitrate(bitrate: u32) -> Result<String, Error> {
    PRESET_BITRATES
        .iter()
        .find(|(rate, _)| *rate == bitrate)
        .map(|(_, code)| format!("S{}", *code as char))
        .ok_or_else(|| {
            let choices: Vec<String> = PRESET_BITRATES
                .iter()
                .map(|(rate, _)| rate.to_string())
                .collect();
            Error::Configuration(format!(
                "invalid bitrate {bitrate}, choose one of {}",
                choices.join(", ")
            ))
        })
}

/// Encodes an explicit BTR0/BTR1 register pair to its `s<hh><hh>`
/// command. `f_clock` must be 8 MHz, the only clock this dialect's
/// classical-CAN timing registers are defined against.
pub fn encode_classical(timing: &ClassicalTiming) -> Result<String, Error> {
    if timing.f_clock != 8_000_000 {
        return Err(Error::Configuration(format!(
            "classical CAN timing requires f_clock = 8_000_000, got {}",
            timing.f_clock
        )));
    }
    Ok(format!("s{:02X}{:02X}", timing.btr0, timing.btr1))
}

/// Encodes a CAN-FD nominal/data timing pair to its `P`/`p` command
/// pair. `f_clock` must be 60 MHz.
pub fn encode_fd(timing: &FdTiming) -> Result<(String, String), Error> {
    if timing.f_clock != 60_000_000 {
        return Err(Error::Configuration(format!(
            "CAN-FD timing requires f_clock = 60_000_000, got {}",
            timing.f_clock
        )));
    }
    Ok((
        encode_quadruple('P', &timing.nominal),
        encode_quadruple('p', &timing.data),
    ))
}

fn encode_quadruple(prefix: char, q: &FdQuadruple) -> String {
    format!(
        "{prefix}{:04}{:04}{:04}{:04}",
        q.sjw, q.tseg1, q.tseg2, q.brp
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_presets_encode() {
        assert_eq!(encode_preset_bitrate(500_000).unwrap(), "S6");
        assert_eq!(encode_preset_bitrate(83_300).unwrap(), "S9");
        assert_eq!(encode_preset_bitrate(1_000_000).unwrap(), "S8");
    }

    #[test]
    fn unknown_preset_rejected() {
        assert!(encode_preset_bitrate(42).is_err());
    }

    #[test]
    fn btr_pair_encodes_zero_padded_hex() {
        let timing = ClassicalTiming::new(0x01, 0x1C);
        assert_eq!(encode_classical(&timing).unwrap(), "s011C");
    }

    #[test]
    fn btr_pair_wrong_clock_rejected() {
        let mut timing = ClassicalTiming::new(0x01, 0x1C);
        timing.f_clock = 16_000_000;
        assert!(encode_classical(&timing).is_err());
    }

    #[test]
    fn fd_quadruples_encode_4digit_decimal() {
        let timing = FdTiming::new(
            FdQuadruple { sjw: 1, tseg1: 44, tseg2: 15, brp: 1 },
            FdQuadruple { sjw: 1, tseg1: 8, tseg2: 3, brp: 1 },
        );
        let (nominal, data) = encode_fd(&timing).unwrap();
        assert_eq!(nominal, "P0001004400150001");
        assert_eq!(data, "p0001000800030001");
    }

    #[test]
    fn fd_wrong_clock_rejected() {
        let mut timing = FdTiming::new(
            FdQuadruple { sjw: 1, tseg1: 44, tseg2: 15, brp: 1 },
            FdQuadruple { sjw: 1, tseg1: 8, tseg2: 3, brp: 1 },
        );
        timing.f_clock = 8_000_000;
        assert!(encode_fd(&timing).is_err());
    }
}
