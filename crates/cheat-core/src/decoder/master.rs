//! Master System / Game Gear code formats
//!
//! | Format            | Shape         | Separator      |
//! |-------------------|---------------|----------------|
//! | Game Genie        | `DDA-AAH`     | `-` at index 3 |
//! | Game Genie + ref  | `DDA-AAH-R?R` | `-` at index 7 |
//! | Action Replay     | `00AA-AADD`   | `-` at index 4 |
//! | Fusion (RAM)      | `AAAA:DD`     | `:` at index 4 |
//! | Fusion (ROM)      | `RRAAAA:DD`   | `:` at index 6 |
//!
//! Every address at or above `$C000` is system RAM, which the Z80 sees
//! mirrored. Such addresses are folded into the work RAM window so the
//! engine treats them as RAM patches.

use super::{has_separator, hex_digits, DecodedCode};
use crate::error::DecodeError;

/// First Z80 address backed by system RAM
pub const RAM_START: u32 = 0xC000;
/// Base of the work RAM window RAM addresses are folded into
pub const WORK_RAM_MIRROR: u32 = 0xFF0000;
/// System RAM repeats every 8 KiB
pub const RAM_MIRROR_MASK: u32 = 0x1FFF;

/// Bits XORed into a Game Genie reference byte after rotation
const REFERENCE_XOR: u8 = 0xBA;

/// Decode an 8-bit family code.
pub fn decode(code: &str) -> Result<DecodedCode, DecodeError> {
    let bytes = code.as_bytes();
    let decoded = if bytes.len() >= 7 && has_separator(bytes, 3, b'-') {
        decode_game_genie(code)?
    } else if bytes.len() >= 9 && has_separator(bytes, 4, b'-') {
        decode_action_replay(code)?
    } else if bytes.len() >= 7 && has_separator(bytes, 4, b':') {
        decode_fusion_ram(code)?
    } else if bytes.len() >= 9 && has_separator(bytes, 6, b':') {
        decode_fusion_rom(code)?
    } else {
        return Err(DecodeError::MalformedCode { len: bytes.len() });
    };

    Ok(DecodedCode {
        address: fold_ram_address(decoded.address),
        ..decoded
    })
}

/// Map a Z80 RAM address into the work RAM window, leaving others alone.
pub fn fold_ram_address(address: u32) -> u32 {
    if address >= RAM_START {
        WORK_RAM_MIRROR | (address & RAM_MIRROR_MASK)
    } else {
        address
    }
}

/// Unscramble a Game Genie reference byte.
pub fn unscramble_reference(raw: u8) -> u8 {
    raw.rotate_right(2) ^ REFERENCE_XOR
}

fn decode_game_genie(code: &str) -> Result<DecodedCode, DecodeError> {
    let data = hex_digits(code, &[0, 1])?;
    let low = hex_digits(code, &[2, 4, 5])?;
    // High nibble is stored inverted
    let high = hex_digits(code, &[6])? ^ 0xF;
    let address = high << 12 | low;

    if !has_separator(code.as_bytes(), 7, b'-') {
        return Ok(DecodedCode {
            address,
            data: data as u16,
            reference: None,
            len: 7,
        });
    }

    if code.len() < 11 {
        return Err(DecodeError::MalformedCode { len: code.len() });
    }
    // Index 9 carries no reference bits
    let raw = hex_digits(code, &[8, 10])? as u8;

    Ok(DecodedCode {
        address,
        data: data as u16,
        reference: Some(u16::from(unscramble_reference(raw))),
        len: 11,
    })
}

/// The first two characters are a device prefix and are not decoded.
fn decode_action_replay(code: &str) -> Result<DecodedCode, DecodeError> {
    Ok(DecodedCode {
        address: hex_digits(code, &[2, 3, 5, 6])?,
        data: hex_digits(code, &[7, 8])? as u16,
        reference: None,
        len: 9,
    })
}

fn decode_fusion_ram(code: &str) -> Result<DecodedCode, DecodeError> {
    Ok(DecodedCode {
        address: hex_digits(code, &[0, 1, 2, 3])?,
        data: hex_digits(code, &[5, 6])? as u16,
        reference: None,
        len: 7,
    })
}

fn decode_fusion_rom(code: &str) -> Result<DecodedCode, DecodeError> {
    let reference = hex_digits(code, &[0, 1])?;
    Ok(DecodedCode {
        address: hex_digits(code, &[2, 3, 4, 5])?,
        data: hex_digits(code, &[7, 8])? as u16,
        reference: Some(reference as u16),
        len: 9,
    })
}
