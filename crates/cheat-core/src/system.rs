//! Cheat session
//!
//! Ties a [`ConsoleBus`] and a [`CheatEngine`] together for the lifetime of
//! one emulation session, and enforces the two timing rules the engine
//! relies on:
//!
//! - RAM patches are refreshed at the start of every frame, before the
//!   program runs.
//! - ROM patches are moved inside the same call that writes a mapper register.

use crate::bus::{BankSwitch, ConsoleBus};
use crate::engine::{CheatEngine, EngineConfig};
use crate::table::MergeSummary;

/// Emulation session with cheats attached
#[derive(Debug, Clone)]
pub struct CheatSession {
    bus: ConsoleBus,
    cheats: CheatEngine,
    /// Frame counter
    frame_count: u64,
}

impl CheatSession {
    pub fn new(bus: ConsoleBus) -> Self {
        Self::with_config(bus, EngineConfig::default())
    }

    pub fn with_config(bus: ConsoleBus, config: EngineConfig) -> Self {
        Self {
            bus,
            cheats: CheatEngine::with_config(config),
            frame_count: 0,
        }
    }

    /// Add, enable or disable cheat codes
    pub fn set_cheat(&mut self, index: usize, enabled: bool, code: &str) -> MergeSummary {
        self.cheats.set(index, enabled, code, &mut self.bus)
    }

    /// Remove all cheats, restoring patched ROM
    pub fn reset_cheats(&mut self) {
        self.cheats.reset(&mut self.bus);
    }

    /// Read a byte via the bus
    pub fn read_memory(&self, address: u32) -> u8 {
        self.bus.read(address)
    }

    /// Write a byte via the bus, moving ROM patches if a bank was switched
    pub fn write_memory(&mut self, address: u32, value: u8) -> Option<BankSwitch> {
        let switch = self.bus.write(address, value);
        if let Some(BankSwitch { slot, bank }) = switch {
            tracing::trace!(slot, bank, "bank switch");
            self.cheats.refresh_rom_patches(&mut self.bus);
        }
        switch
    }

    /// Run one frame: refresh RAM patches, then hand control to `program`.
    pub fn run_frame<F>(&mut self, program: F)
    where
        F: FnOnce(&mut Self),
    {
        self.cheats.refresh_ram_patches(&mut self.bus);
        program(self);
        self.frame_count += 1;
    }

    /// Get bus reference
    pub fn bus(&self) -> &ConsoleBus {
        &self.bus
    }

    /// Get mutable bus reference. Mapper writes made through it bypass the
    /// bank-switch hook; use [`CheatSession::write_memory`] for those.
    pub fn bus_mut(&mut self) -> &mut ConsoleBus {
        &mut self.bus
    }

    /// Get cheat engine reference
    pub fn cheats(&self) -> &CheatEngine {
        &self.cheats
    }

    /// Get frame count
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// End the session and hand back the bus, with ROM patches still applied
    pub fn into_bus(self) -> ConsoleBus {
        self.bus
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::BANK_SIZE;

    #[test]
    fn test_frame_refreshes_ram_first() {
        let mut session = CheatSession::new(ConsoleBus::mega_drive(vec![0; 0x100]));
        session.set_cheat(0, true, "FF1000:0063");

        let mut seen = 0;
        session.run_frame(|s| {
            seen = s.read_memory(0xFF1000);
            s.write_memory(0xFF1000, 0x01);
        });

        assert_eq!(seen, 0x63);
        assert_eq!(session.read_memory(0xFF1000), 0x01);
        assert_eq!(session.frame_count(), 1);

        session.run_frame(|_| {});
        assert_eq!(session.read_memory(0xFF1000), 0x63);
    }

    #[test]
    fn test_write_memory_runs_bank_hook() {
        let rom: Vec<u8> = (0..4 * BANK_SIZE).map(|i| (i / BANK_SIZE) as u8).collect();
        let mut session = CheatSession::new(ConsoleBus::master_system(rom));

        // Fusion ROM code at $8000, reference 03: bank 3 only
        session.set_cheat(0, true, "038000:AA");
        assert_eq!(session.read_memory(0x8000), 2);

        assert!(session.write_memory(0xFFFF, 3).is_some());
        assert_eq!(session.read_memory(0x8000), 0xAA);
    }

    #[test]
    fn test_reset_cheats() {
        let mut session = CheatSession::new(ConsoleBus::mega_drive(vec![0x55; 0x100]));
        session.set_cheat(0, true, "000020:1234");
        session.reset_cheats();
        assert!(session.cheats().is_empty());
        assert_eq!(session.bus().read_u16(0x20), 0x5555);
    }
}
