//! Cheat code decoding
//!
//! Each hardware family has its own set of code formats. The formats are
//! told apart by length and by where the separator sits, so the family must
//! be known up front: `1A2-B3C` is a Game Genie code on the Master System
//! and garbage on the Mega Drive.
//!
//! Decoding is pure. It never touches the cheat table or emulated memory.

pub mod genesis;
pub mod master;

use crate::error::DecodeError;

/// Game Genie symbol set used by the 16-bit formats.
pub const GAME_GENIE_ALPHABET: &[u8; 32] = b"ABCDEFGHJKLMNPRSTVWXYZ0123456789";

/// Hex digit set used by every other format.
pub const HEX_ALPHABET: &[u8; 16] = b"0123456789ABCDEF";

/// Console lineage the code targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HardwareFamily {
    /// Mega Drive / Genesis (68000 side, optionally with a Mega-CD)
    MegaDrive,
    /// Master System / Game Gear / SG-1000 (Z80 side)
    MasterSystem,
}

/// Result of a successful decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedCode {
    /// Target address, up to 24 bits
    pub address: u32,
    /// Value to write; only the low byte is significant for 8-bit formats
    pub data: u16,
    /// Expected original byte, for the formats that carry one
    pub reference: Option<u16>,
    /// Number of characters the format consumed
    pub len: usize,
}

/// Decode one cheat code using the grammar of `family`.
pub fn decode(code: &str, family: HardwareFamily) -> Result<DecodedCode, DecodeError> {
    let result = match family {
        HardwareFamily::MegaDrive => genesis::decode(code),
        HardwareFamily::MasterSystem => master::decode(code),
    };
    if let Err(err) = &result {
        tracing::trace!(code, ?family, %err, "cheat code rejected");
    }
    result
}

/// Check for `separator` at `index`.
pub(crate) fn has_separator(code: &[u8], index: usize, separator: u8) -> bool {
    code.get(index) == Some(&separator)
}

/// Position of the byte at `position` within `alphabet`.
pub(crate) fn symbol_index(code: &str, position: usize, alphabet: &[u8]) -> Result<u32, DecodeError> {
    code.as_bytes()
        .get(position)
        .and_then(|byte| alphabet.iter().position(|symbol| symbol == byte))
        .map(|index| index as u32)
        .ok_or_else(|| DecodeError::UnknownSymbol {
            symbol: code
                .get(position..)
                .and_then(|rest| rest.chars().next())
                .unwrap_or(char::REPLACEMENT_CHARACTER),
            position,
        })
}

/// Big-endian hex value of the digits at `positions`.
pub(crate) fn hex_digits(code: &str, positions: &[usize]) -> Result<u32, DecodeError> {
    positions.iter().try_fold(0u32, |value, &position| {
        Ok(value << 4 | symbol_index(code, position, HEX_ALPHABET)?)
    })
}
