//! Patch engine
//!
//! Enabled entries fall into one of three groups when applied:
//!
//! - RAM patches (work RAM, Mega-CD PRG-RAM / Word-RAM). The game overwrites
//!   RAM constantly, so these are reasserted every frame by
//!   [`CheatEngine::refresh_ram_patches`].
//! - Flat ROM patches (Mega Drive). Written once into the ROM image, with the
//!   original word kept for removal.
//! - Banked ROM patches (Master System). Written into whichever ROM byte the
//!   mapper currently exposes at the address, if that byte matches the code's
//!   reference. [`CheatEngine::refresh_rom_patches`] moves them when the
//!   mapper changes.
//!
//! RAM and banked ROM patches are tracked in one index list of fixed
//! capacity: RAM indices fill it from the front, ROM indices from the back.

use crate::bus::{
    Location, MemoryMap, MemoryRegion, PRG_RAM_END, WORD_RAM_END, WORD_RAM_START, WORK_RAM_START,
};
use crate::decoder::HardwareFamily;
use crate::table::{CheatEntry, CheatTable, LivePatch, MergeSummary, PatchWidth, MAX_CHEATS};

/// Address mask for 16-bit aligned ROM words
const WORD_ALIGN_MASK: u32 = 0xFFFFFE;

/// Engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Maximum number of cheat entries
    pub capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            capacity: MAX_CHEATS,
        }
    }
}

/// Where an enabled entry's patch goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Ram,
    FlatRom,
    BankedRom,
    Unmapped,
}

/// Shared index space for RAM and ROM patches
#[derive(Debug, Clone)]
struct PatchIndex {
    slots: Vec<usize>,
    ram: usize,
    rom: usize,
}

impl PatchIndex {
    fn new(capacity: usize) -> Self {
        Self {
            slots: vec![0; capacity],
            ram: 0,
            rom: 0,
        }
    }

    fn clear(&mut self) {
        self.ram = 0;
        self.rom = 0;
    }

    fn is_full(&self) -> bool {
        self.ram + self.rom >= self.slots.len()
    }

    fn push_ram(&mut self, index: usize) -> bool {
        if self.is_full() {
            return false;
        }
        self.slots[self.ram] = index;
        self.ram += 1;
        true
    }

    fn push_rom(&mut self, index: usize) -> bool {
        if self.is_full() {
            return false;
        }
        self.rom += 1;
        let slot = self.slots.len() - self.rom;
        self.slots[slot] = index;
        true
    }

    /// RAM patch indices in registration order
    fn ram(&self) -> &[usize] {
        &self.slots[..self.ram]
    }

    /// ROM patch indices, most recently registered first
    fn rom(&self) -> &[usize] {
        &self.slots[self.slots.len() - self.rom..]
    }
}

/// Cheat engine for one emulation session
#[derive(Debug, Clone)]
pub struct CheatEngine {
    table: CheatTable,
    patches: PatchIndex,
}

impl CheatEngine {
    /// Create an engine with the default capacity
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            table: CheatTable::new(config.capacity),
            patches: PatchIndex::new(config.capacity),
        }
    }

    pub fn table(&self) -> &CheatTable {
        &self.table
    }

    pub fn entries(&self) -> &[CheatEntry] {
        self.table.entries()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Number of entries reasserted every frame
    pub fn ram_patch_count(&self) -> usize {
        self.patches.ram
    }

    /// Number of entries tracked across bank switches
    pub fn rom_patch_count(&self) -> usize {
        self.patches.rom
    }

    /// Remove every patch from ROM, then forget all entries.
    pub fn reset<M: MemoryMap + ?Sized>(&mut self, mem: &mut M) {
        self.clear(mem);
        self.table.reset();
        self.patches.clear();
        tracing::debug!("cheats reset");
    }

    /// Add or toggle the `+`-separated codes in `code`, then re-apply.
    ///
    /// `index` is the host's slot number. Entries are matched by content, not
    /// by slot, so it is only used for logging.
    pub fn set<M: MemoryMap + ?Sized>(
        &mut self,
        index: usize,
        enabled: bool,
        code: &str,
        mem: &mut M,
    ) -> MergeSummary {
        let _span = tracing::debug_span!("cheat_set", index, enabled).entered();

        // ROM must be pristine before entries change
        self.clear(mem);
        let summary = self.table.add_compound(code, enabled, mem.family());
        self.apply(mem);

        tracing::debug!(
            added = summary.added,
            updated = summary.updated,
            rejected = summary.rejected,
            dropped = summary.dropped,
            "cheat codes merged"
        );
        summary
    }

    /// Classify enabled entries and lay down ROM patches.
    ///
    /// Any patch still in place is removed first, so the values captured for
    /// restoration always come from unpatched ROM.
    pub fn apply<M: MemoryMap + ?Sized>(&mut self, mem: &mut M) {
        self.clear(mem);
        self.patches.clear();

        let family = mem.family();
        let cd_ram_active = mem.add_on().cd_ram_active();
        let rom_size = mem.rom_size();

        for index in 0..self.table.len() {
            let Some(entry) = self.table.get(index) else {
                continue;
            };
            if !entry.enabled {
                continue;
            }

            match classify(entry.address, family, cd_ram_active, rom_size) {
                Target::Ram => {
                    self.patches.push_ram(index);
                    tracing::trace!(index, address = entry.address, "RAM patch registered");
                }
                Target::FlatRom => {
                    if let Some(entry) = self.table.get_mut(index) {
                        patch_flat(entry, mem);
                    }
                }
                Target::BankedRom => {
                    self.patches.push_rom(index);
                    patch_banked(&mut self.table, index, mem);
                }
                Target::Unmapped => {
                    tracing::trace!(index, address = entry.address, "cheat targets unmapped memory");
                }
            }
        }

        tracing::debug!(
            ram = self.patches.ram,
            rom = self.patches.rom,
            "cheats applied"
        );
    }

    /// Put back every ROM byte or word currently patched.
    ///
    /// Entries are unwound last to first so stacked patches on the same
    /// word come off in the opposite order they went on.
    pub fn clear<M: MemoryMap + ?Sized>(&mut self, mem: &mut M) {
        for (index, entry) in self.table.entries_mut().iter_mut().enumerate().rev() {
            if let Some(patch) = entry.live.take() {
                restore(mem, patch);
                tracing::trace!(index, offset = patch.location.offset, "ROM patch removed");
            }
        }
    }

    /// Reassert RAM patches. Call once per frame, before the CPU runs.
    ///
    /// Entries are written newest first, so on overlapping addresses the
    /// earliest registered entry is the one left in memory.
    pub fn refresh_ram_patches<M: MemoryMap + ?Sized>(&self, mem: &mut M) {
        for &index in self.patches.ram().iter().rev() {
            let Some(entry) = self.table.get(index) else {
                continue;
            };
            let (region, mask) = ram_target(entry.address);

            if entry.data & 0xFF00 != 0 {
                let offset = (entry.address & mask) as usize;
                mem.write_word(Location::new(region, offset), entry.data);
            } else {
                // Keep the low address bit for byte writes
                let offset = (entry.address & (mask | 1)) as usize;
                mem.write_byte(Location::new(region, offset), entry.data as u8);
            }
        }
    }

    /// Move banked ROM patches to the new mapping.
    ///
    /// Must be called from inside the mapper write that remapped a window,
    /// before the CPU can read through it again.
    pub fn refresh_rom_patches<M: MemoryMap + ?Sized>(&mut self, mem: &mut M) {
        let Self { table, patches } = self;

        for &index in patches.rom() {
            if let Some(patch) = table.get_mut(index).and_then(|entry| entry.live.take()) {
                restore(mem, patch);
            }
        }

        for &index in patches.rom().iter().rev() {
            patch_banked(table, index, mem);
        }
    }
}

impl Default for CheatEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn classify(address: u32, family: HardwareFamily, cd_ram_active: bool, rom_size: usize) -> Target {
    if address >= WORK_RAM_START {
        return Target::Ram;
    }

    if cd_ram_active {
        // Disc games have no cartridge ROM to patch
        let prg_ram = address < PRG_RAM_END;
        let word_ram = (WORD_RAM_START..WORD_RAM_END).contains(&address);
        return if prg_ram || word_ram {
            Target::Ram
        } else {
            Target::Unmapped
        };
    }

    if (address as usize) < rom_size {
        match family {
            HardwareFamily::MegaDrive => Target::FlatRom,
            HardwareFamily::MasterSystem => Target::BankedRom,
        }
    } else {
        Target::Unmapped
    }
}

/// Backing region and offset mask for a RAM patch address
fn ram_target(address: u32) -> (MemoryRegion, u32) {
    match (address >> 20) & 0xF {
        0x0 => (MemoryRegion::PrgRam, 0x7FFFE),
        0x2 => (MemoryRegion::WordRam, 0x3FFFE),
        _ => (MemoryRegion::WorkRam, 0xFFFE),
    }
}

/// Write a Mega Drive ROM patch, keeping the word it replaces.
fn patch_flat<M: MemoryMap + ?Sized>(entry: &mut CheatEntry, mem: &mut M) {
    let location = Location::new(MemoryRegion::CartridgeRom, (entry.address & WORD_ALIGN_MASK) as usize);
    let Some(displaced) = mem.read_word(location) else {
        return;
    };

    if mem.write_word(location, entry.data) {
        entry.reference = Some(displaced);
        entry.live = Some(LivePatch {
            location,
            width: PatchWidth::Word,
            displaced,
        });
        tracing::trace!(address = entry.address, displaced, data = entry.data, "flat ROM patched");
    }
}

/// Patch the ROM byte currently visible at the entry's address, if its
/// reference allows it and no other entry already holds that byte.
fn patch_banked<M: MemoryMap + ?Sized>(table: &mut CheatTable, index: usize, mem: &mut M) -> bool {
    let Some(entry) = table.get(index) else {
        return false;
    };
    let Some(location) = mem.resolve_banked(entry.address) else {
        return false;
    };
    let Some(current) = mem.read_byte(location) else {
        return false;
    };

    if !entry.accepts(current) {
        tracing::trace!(index, address = entry.address, current, "reference mismatch, patch pending");
        return false;
    }

    let held = table
        .entries()
        .iter()
        .enumerate()
        .any(|(other, e)| other != index && e.live.is_some_and(|p| p.location == location));
    if held {
        tracing::trace!(index, offset = location.offset, "ROM byte already patched by another entry");
        return false;
    }

    let data = entry.data as u8;
    if !mem.write_byte(location, data) {
        return false;
    }

    if let Some(entry) = table.get_mut(index) {
        entry.live = Some(LivePatch {
            location,
            width: PatchWidth::Byte,
            displaced: u16::from(current),
        });
    }
    tracing::trace!(index, offset = location.offset, data, "banked ROM patched");
    true
}

fn restore<M: MemoryMap + ?Sized>(mem: &mut M, patch: LivePatch) {
    match patch.width {
        PatchWidth::Byte => {
            mem.write_byte(patch.location, patch.displaced as u8);
        }
        PatchWidth::Word => {
            mem.write_word(patch.location, patch.displaced);
        }
    }
}
