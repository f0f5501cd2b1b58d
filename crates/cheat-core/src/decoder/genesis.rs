//! Mega Drive / Genesis code formats
//!
//! - Game Genie: `XXXX-XXXX`, eight symbols of [`GAME_GENIE_ALPHABET`]
//! - Pro Action Replay: `AAAAAA:DDDD`, 24-bit address and 16-bit data in hex

use super::{has_separator, hex_digits, symbol_index, DecodedCode, GAME_GENIE_ALPHABET};
use crate::error::DecodeError;

/// Length of a Game Genie code including the separator
pub const GAME_GENIE_LEN: usize = 9;
/// Length of a Pro Action Replay code including the separator
pub const ACTION_REPLAY_LEN: usize = 11;

/// Character positions of the eight Game Genie symbols (index 4 is the `-`).
const GAME_GENIE_POSITIONS: [usize; 8] = [0, 1, 2, 3, 5, 6, 7, 8];

/// Decode a 16-bit family code.
pub fn decode(code: &str) -> Result<DecodedCode, DecodeError> {
    let bytes = code.as_bytes();
    if bytes.len() >= GAME_GENIE_LEN && has_separator(bytes, 4, b'-') {
        decode_game_genie(code)
    } else if bytes.len() >= ACTION_REPLAY_LEN && has_separator(bytes, 6, b':') {
        decode_action_replay(code)
    } else {
        Err(DecodeError::MalformedCode { len: bytes.len() })
    }
}

/// Game Genie codes scramble address and data bits across every symbol.
fn decode_game_genie(code: &str) -> Result<DecodedCode, DecodeError> {
    let mut address = 0u32;
    let mut data = 0u32;

    for (i, &position) in GAME_GENIE_POSITIONS.iter().enumerate() {
        let n = symbol_index(code, position, GAME_GENIE_ALPHABET)?;
        match i {
            0 => {
                data |= n << 3;
            }
            1 => {
                data |= n >> 2;
                address |= (n & 3) << 14;
            }
            2 => {
                address |= n << 9;
            }
            3 => {
                address |= (n & 0xF) << 20 | (n >> 4) << 8;
            }
            4 => {
                data |= (n & 1) << 12;
                address |= (n >> 1) << 16;
            }
            5 => {
                data |= (n & 1) << 15 | (n >> 1) << 8;
            }
            6 => {
                data |= (n >> 3) << 13;
                address |= (n & 7) << 5;
            }
            _ => {
                address |= n;
            }
        }
    }

    Ok(DecodedCode {
        address,
        data: data as u16,
        reference: None,
        len: GAME_GENIE_LEN,
    })
}

fn decode_action_replay(code: &str) -> Result<DecodedCode, DecodeError> {
    let address = hex_digits(code, &[0, 1, 2, 3, 4, 5])?;
    let data = hex_digits(code, &[7, 8, 9, 10])?;

    Ok(DecodedCode {
        address,
        data: data as u16,
        reference: None,
        len: ACTION_REPLAY_LEN,
    })
}
