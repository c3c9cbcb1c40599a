//! Encoding of outgoing frames to SLCAN ASCII commands, and decoding of
//! incoming response lines back into [`Message`]s.

use crate::dlc;
use crate::error::Error;
use crate::message::Message;

/// Encodes a message to the ASCII command that transmits it, not
/// including the trailing `\r` (the transport writer appends that).
pub fn encode(msg: &Message) -> Result<String, Error> {
    if msg.is_remote_frame && msg.is_fd {
        return Err(Error::Configuration(
            "a message cannot be both a remote frame and a CAN-FD frame".into(),
        ));
    }

    if msg.is_fd {
        encode_fd(msg)
    } else if msg.is_remote_frame {
        encode_remote(msg)
    } else {
        encode_data(msg)
    }
}

fn encode_id(arbitration_id: u32, is_extended_id: bool, out: &mut String) {
    if is_extended_id {
        out.push_str(&format!("{:08X}", arbitration_id));
    } else {
        out.push_str(&format!("{:03X}", arbitration_id));
    }
}

fn encode_data(msg: &Message) -> Result<String, Error> {
    if msg.data.len() > 8 {
        return Err(Error::Configuration(format!(
            "CAN 2.0 payload must be at most 8 bytes, got {}",
            msg.data.len()
        )));
    }
    let mut out = String::with_capacity(2 + 8 + 16);
    out.push(if msg.is_extended_id { 'T' } else { 't' });
    encode_id(msg.arbitration_id, msg.is_extended_id, &mut out);
    out.push_str(&msg.data.len().to_string());
    for byte in &msg.data {
        out.push_str(&format!("{:02X}", byte));
    }
    Ok(out)
}

fn encode_remote(msg: &Message) -> Result<String, Error> {
    if msg.dlc > 8 {
        return Err(Error::Configuration(format!(
            "remote frame DLC must be at most 8, got {}",
            msg.dlc
        )));
    }
    let mut out = String::with_capacity(2 + 8);
    out.push(if msg.is_extended_id { 'R' } else { 'r' });
    encode_id(msg.arbitration_id, msg.is_extended_id, &mut out);
    out.push_str(&msg.dlc.to_string());
    Ok(out)
}

fn encode_fd(msg: &Message) -> Result<String, Error> {
    if msg.data.len() > 64 {
        return Err(Error::Configuration(format!(
            "CAN-FD payload must be at most 64 bytes, got {}",
            msg.data.len()
        )));
    }
    let dlc_nibble = dlc::encode_fd_len(msg.data.len());

    let mut out = String::with_capacity(2 + 8 + 128);
    let prefix = match (msg.is_extended_id, msg.bitrate_switch) {
        (false, false) => 'd',
        (true, false) => 'D',
        (false, true) => 'b',
        (true, true) => 'B',
    };
    out.push(prefix);
    encode_id(msg.arbitration_id, msg.is_extended_id, &mut out);
    out.push(dlc_nibble as char);
    for byte in &msg.data {
        out.push_str(&format!("{:02X}", byte));
    }
    // If the nibble claims 64 bytes but fewer were supplied, pad the
    // wire payload with zeros so it still represents the nibble's
    // canonical meaning.
    if dlc_nibble == b'F' && msg.data.len() < 64 {
        for _ in msg.data.len()..64 {
            out.push_str("00");
        }
    }
    Ok(out)
}

/// Decodes a single framer-yielded response line (without its
/// terminator) into a [`Message`], or `None` if the line is not a
/// frame notification (a command echo, a bare ACK/error marker, or
/// anything this dialect doesn't recognize).
pub fn decode(line: &str, timestamp: f64) -> Option<Message> {
    let bytes = line.as_bytes();
    let kind = *bytes.first()?;

    match kind {
        b't' => decode_standard(bytes, false, timestamp),
        b'r' => decode_standard(bytes, true, timestamp),
        b'T' | b'x' => decode_extended(bytes, false, timestamp),
        b'R' => decode_extended(bytes, true, timestamp),
        b'd' => decode_fd(bytes, false, false, false, timestamp),
        b'D' => decode_fd(bytes, true, false, false, timestamp),
        b'b' => decode_fd(bytes, false, true, true, timestamp),
        b'B' => decode_fd(bytes, true, true, true, timestamp),
        _ => None,
    }
}

fn hex_u32(s: &str) -> Option<u32> {
    u32::from_str_radix(s, 16).ok()
}

fn dec_digit(b: u8) -> Option<usize> {
    if b.is_ascii_digit() {
        Some((b - b'0') as usize)
    } else {
        None
    }
}

fn decode_standard(bytes: &[u8], is_remote: bool, timestamp: f64) -> Option<Message> {
    // t<id:3><dlc:1>[data] / r<id:3><dlc:1>
    if bytes.len() < 5 {
        return None;
    }
    let id = hex_u32(std::str::from_utf8(&bytes[1..4]).ok()?)?;
    let dlc = dec_digit(bytes[4])?;
    if dlc > 8 {
        return None;
    }
    let data = if is_remote {
        Vec::new()
    } else {
        decode_hex_bytes(bytes.get(5..5 + dlc * 2)?)?
    };
    Some(Message {
        arbitration_id: id,
        is_extended_id: false,
        is_remote_frame: is_remote,
        is_fd: false,
        bitrate_switch: false,
        dlc,
        data,
        timestamp,
    })
}

fn decode_extended(bytes: &[u8], is_remote: bool, timestamp: f64) -> Option<Message> {
    // T<id:8><dlc:1>[data] / R<id:8><dlc:1>
    if bytes.len() < 10 {
        return None;
    }
    let id = hex_u32(std::str::from_utf8(&bytes[1..9]).ok()?)?;
    let dlc = dec_digit(bytes[9])?;
    if dlc > 8 {
        return None;
    }
    let data = if is_remote {
        Vec::new()
    } else {
        decode_hex_bytes(bytes.get(10..10 + dlc * 2)?)?
    };
    Some(Message {
        arbitration_id: id,
        is_extended_id: true,
        is_remote_frame: is_remote,
        is_fd: false,
        bitrate_switch: false,
        dlc,
        data,
        timestamp,
    })
}

fn decode_fd(
    bytes: &[u8],
    is_extended: bool,
    is_fd: bool,
    bitrate_switch: bool,
    timestamp: f64,
) -> Option<Message> {
    let (id_len, id) = if is_extended {
        if bytes.len() < 10 {
            return None;
        }
        (8, hex_u32(std::str::from_utf8(&bytes[1..9]).ok()?)?)
    } else {
        if bytes.len() < 5 {
            return None;
        }
        (3, hex_u32(std::str::from_utf8(&bytes[1..4]).ok()?)?)
    };
    let dlc_pos = 1 + id_len;
    let dlc = dlc::decode_fd_nibble(*bytes.get(dlc_pos)?);
    let data_start = dlc_pos + 1;
    let data = decode_hex_bytes(bytes.get(data_start..data_start + dlc * 2)?)?;
    Some(Message {
        arbitration_id: id,
        is_extended_id: is_extended,
        is_remote_frame: false,
        is_fd,
        bitrate_switch,
        dlc,
        data,
        timestamp,
    })
}

fn decode_hex_bytes(hex: &[u8]) -> Option<Vec<u8>> {
    hex::decode(hex).ok()
}
