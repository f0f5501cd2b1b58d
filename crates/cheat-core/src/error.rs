//! Error types
//!
//! None of these abort anything: a rejected code is simply not added, and a
//! full table silently drops new codes. The types exist so callers that care
//! can find out why.

use thiserror::Error;

/// Why a cheat code string could not be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Length or separator placement matches none of the family's formats.
    #[error("unrecognized code format ({len} characters)")]
    MalformedCode { len: usize },
    /// A character is not part of the alphabet the format requires.
    #[error("invalid symbol {symbol:?} at position {position}")]
    UnknownSymbol { symbol: char, position: usize },
}

/// Cheat table failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("cheat table is full ({capacity} entries)")]
    CapacityExceeded { capacity: usize },
}
