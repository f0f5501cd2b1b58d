//! Cheat Core - cheat code engine for Sega 8/16-bit console cores
//!
//! This crate decodes Game Genie, Action Replay and Fusion style cheat codes
//! and keeps the resulting patches applied to a running emulation. RAM patches
//! are reasserted once per frame; ROM patches are written once and, on the
//! 8-bit consoles, moved around as the paging mapper remaps its windows.

#![forbid(unsafe_code)]

/// Errors reported by the decoder and the cheat table
pub mod error;
/// Cheat code grammars for both hardware families
pub mod decoder;
/// Bounded cheat entry table
pub mod table;
/// Memory map seam and the reference console bus
pub mod bus;
/// Cartridge ROM and Sega paging mapper
pub mod cartridge;
/// Patch application, removal and refresh
pub mod engine;
/// Session object tying a bus and an engine together
pub mod system;

pub use bus::{AddOn, BankSwitch, ConsoleBus, MemoryMap, Location, MemoryRegion};
pub use cartridge::{Cartridge, Mapper};
pub use decoder::{decode, DecodedCode, HardwareFamily};
pub use engine::{CheatEngine, EngineConfig};
pub use error::{DecodeError, TableError};
pub use system::CheatSession;
pub use table::{CheatEntry, CheatTable, LivePatch, MergeSummary, PatchWidth, CODE_JOINER, MAX_CHEATS};
