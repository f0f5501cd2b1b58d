//! Memory map seam and reference console bus
//!
//! The cheat engine never owns emulator memory. It reaches it through
//! [`MemoryMap`], which exposes the raw regions a patch can land in and the
//! lookup that turns a logical 8-bit address into the ROM byte currently
//! visible there.
//!
//! [`ConsoleBus`] is a plain implementation of that seam:
//! - 64 KiB work RAM ($FF0000-$FFFFFF on the 68000, $C000-$DFFF mirrored on the Z80)
//! - Optional Mega-CD PRG-RAM (512 KiB) and 2M Word-RAM (256 KiB at $200000)
//! - Cartridge ROM, flat or behind the Sega mapper

use crate::cartridge::{Cartridge, MAPPER_REGISTER_BASE, SLOT_COUNT};
use crate::decoder::HardwareFamily;

/// Work RAM size in bytes
pub const WORK_RAM_SIZE: usize = 0x10000;
/// Mega-CD PRG-RAM size in bytes
pub const PRG_RAM_SIZE: usize = 0x80000;
/// Mega-CD 2M Word-RAM size in bytes
pub const WORD_RAM_SIZE: usize = 0x40000;

/// Start of the 68000 work RAM window
pub const WORK_RAM_START: u32 = 0xFF0000;
/// Start of the Word-RAM window on the main CPU side
pub const WORD_RAM_START: u32 = 0x200000;
/// End (exclusive) of the Word-RAM window
pub const WORD_RAM_END: u32 = WORD_RAM_START + WORD_RAM_SIZE as u32;
/// End (exclusive) of PRG-RAM as addressed by cheat codes
pub const PRG_RAM_END: u32 = PRG_RAM_SIZE as u32;

/// Z80 system RAM size; the rest of $C000-$FFFF mirrors it
const Z80_RAM_MASK: u32 = 0x1FFF;

/// Backing store a patch can land in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryRegion {
    WorkRam,
    PrgRam,
    WordRam,
    CartridgeRom,
}

/// A byte position inside one memory region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Location {
    pub region: MemoryRegion,
    pub offset: usize,
}

impl Location {
    pub fn new(region: MemoryRegion, offset: usize) -> Self {
        Self { region, offset }
    }
}

/// Add-on hardware attached to the console
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddOn {
    #[default]
    None,
    /// Mega-CD, either running a disc or booting the cartridge
    MegaCd { cartridge_boot: bool },
}

impl AddOn {
    /// Whether the Mega-CD RAM windows are live (disc running, not cartridge boot)
    pub fn cd_ram_active(&self) -> bool {
        matches!(self, AddOn::MegaCd { cartridge_boot: false })
    }
}

/// A mapper register write that remapped a ROM window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BankSwitch {
    pub slot: usize,
    pub bank: u8,
}

/// What the cheat engine needs from emulated memory
pub trait MemoryMap {
    /// Console lineage currently emulated
    fn family(&self) -> HardwareFamily;

    /// Attached add-on and its boot mode
    fn add_on(&self) -> AddOn;

    /// Size of the loaded cartridge ROM
    fn rom_size(&self) -> usize;

    /// Raw contents of a region; empty if the region does not exist
    fn region(&self, region: MemoryRegion) -> &[u8];

    /// Mutable raw contents of a region
    fn region_mut(&mut self, region: MemoryRegion) -> &mut [u8];

    /// ROM location currently visible at a logical CPU address
    fn resolve_banked(&self, address: u32) -> Option<Location>;

    fn read_byte(&self, location: Location) -> Option<u8> {
        self.region(location.region).get(location.offset).copied()
    }

    /// Returns false if the location lies outside its region
    fn write_byte(&mut self, location: Location, value: u8) -> bool {
        match self.region_mut(location.region).get_mut(location.offset) {
            Some(byte) => {
                *byte = value;
                true
            }
            None => false,
        }
    }

    /// Big-endian word at `location`
    fn read_word(&self, location: Location) -> Option<u16> {
        let bytes = self
            .region(location.region)
            .get(location.offset..location.offset.checked_add(2)?)?;
        Some(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Big-endian word write; returns false if it would cross the region end
    fn write_word(&mut self, location: Location, value: u16) -> bool {
        let Some(end) = location.offset.checked_add(2) else {
            return false;
        };
        match self.region_mut(location.region).get_mut(location.offset..end) {
            Some(bytes) => {
                bytes.copy_from_slice(&value.to_be_bytes());
                true
            }
            None => false,
        }
    }
}

/// Reference console memory
#[derive(Debug, Clone)]
pub struct ConsoleBus {
    family: HardwareFamily,
    add_on: AddOn,
    work_ram: Vec<u8>,
    /// Empty unless a Mega-CD is attached
    prg_ram: Vec<u8>,
    /// Empty unless a Mega-CD is attached
    word_ram: Vec<u8>,
    cartridge: Cartridge,
}

impl ConsoleBus {
    /// Create a bus for `family` with the given cartridge
    pub fn new(family: HardwareFamily, cartridge: Cartridge) -> Self {
        Self {
            family,
            add_on: AddOn::None,
            work_ram: vec![0; WORK_RAM_SIZE],
            prg_ram: Vec::new(),
            word_ram: Vec::new(),
            cartridge,
        }
    }

    /// Mega Drive with a flat cartridge
    pub fn mega_drive(rom: Vec<u8>) -> Self {
        Self::new(HardwareFamily::MegaDrive, Cartridge::flat(rom))
    }

    /// Master System with a Sega mapper cartridge
    pub fn master_system(rom: Vec<u8>) -> Self {
        Self::new(HardwareFamily::MasterSystem, Cartridge::sega(rom))
    }

    /// Attach a Mega-CD
    pub fn with_mega_cd(mut self, cartridge_boot: bool) -> Self {
        self.add_on = AddOn::MegaCd { cartridge_boot };
        self.prg_ram = vec![0; PRG_RAM_SIZE];
        self.word_ram = vec![0; WORD_RAM_SIZE];
        self
    }

    pub fn cartridge(&self) -> &Cartridge {
        &self.cartridge
    }

    pub fn cartridge_mut(&mut self) -> &mut Cartridge {
        &mut self.cartridge
    }

    /// Read a byte as the main CPU sees it
    pub fn read(&self, address: u32) -> u8 {
        match self.family {
            HardwareFamily::MasterSystem => {
                let address = address & 0xFFFF;
                if address >= 0xC000 {
                    self.work_ram[(address & Z80_RAM_MASK) as usize]
                } else {
                    self.cartridge.read(address)
                }
            }
            HardwareFamily::MegaDrive => {
                let address = address & 0xFFFFFF;
                if address >= WORK_RAM_START {
                    self.work_ram[(address & 0xFFFF) as usize]
                } else if let Some(offset) = self.word_ram_offset(address) {
                    self.word_ram[offset]
                } else {
                    self.cartridge.read(address)
                }
            }
        }
    }

    /// Read a big-endian word as the main CPU sees it
    pub fn read_u16(&self, address: u32) -> u16 {
        u16::from_be_bytes([self.read(address), self.read(address.wrapping_add(1))])
    }

    /// Write a byte as the main CPU sees it.
    ///
    /// ROM writes are dropped. A write to a mapper register remaps a slot and
    /// is reported so the caller can run the bank-switch hook.
    pub fn write(&mut self, address: u32, value: u8) -> Option<BankSwitch> {
        match self.family {
            HardwareFamily::MasterSystem => {
                let address = address & 0xFFFF;
                if address < 0xC000 {
                    return None;
                }
                // Mapper registers are write-through to RAM
                self.work_ram[(address & Z80_RAM_MASK) as usize] = value;
                let slot = address.checked_sub(MAPPER_REGISTER_BASE)? as usize;
                if slot < SLOT_COUNT && self.cartridge.select_bank(slot, value) {
                    Some(BankSwitch { slot, bank: value })
                } else {
                    None
                }
            }
            HardwareFamily::MegaDrive => {
                let address = address & 0xFFFFFF;
                if address >= WORK_RAM_START {
                    self.work_ram[(address & 0xFFFF) as usize] = value;
                } else if let Some(offset) = self.word_ram_offset(address) {
                    self.word_ram[offset] = value;
                }
                None
            }
        }
    }

    fn word_ram_offset(&self, address: u32) -> Option<usize> {
        let in_window = (WORD_RAM_START..WORD_RAM_END).contains(&address);
        (in_window && !self.word_ram.is_empty()).then(|| (address - WORD_RAM_START) as usize)
    }

    /// Switch between disc and cartridge boot on an attached Mega-CD
    pub fn set_cartridge_boot(&mut self, cartridge_boot: bool) {
        if let AddOn::MegaCd { .. } = self.add_on {
            self.add_on = AddOn::MegaCd { cartridge_boot };
        }
    }
}

impl MemoryMap for ConsoleBus {
    fn family(&self) -> HardwareFamily {
        self.family
    }

    fn add_on(&self) -> AddOn {
        self.add_on
    }

    fn rom_size(&self) -> usize {
        self.cartridge.size()
    }

    fn region(&self, region: MemoryRegion) -> &[u8] {
        match region {
            MemoryRegion::WorkRam => &self.work_ram,
            MemoryRegion::PrgRam => &self.prg_ram,
            MemoryRegion::WordRam => &self.word_ram,
            MemoryRegion::CartridgeRom => self.cartridge.rom(),
        }
    }

    fn region_mut(&mut self, region: MemoryRegion) -> &mut [u8] {
        match region {
            MemoryRegion::WorkRam => &mut self.work_ram,
            MemoryRegion::PrgRam => &mut self.prg_ram,
            MemoryRegion::WordRam => &mut self.word_ram,
            MemoryRegion::CartridgeRom => self.cartridge.rom_mut(),
        }
    }

    fn resolve_banked(&self, address: u32) -> Option<Location> {
        self.cartridge
            .resolve(address)
            .map(|offset| Location::new(MemoryRegion::CartridgeRom, offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::BANK_SIZE;

    #[test]
    fn test_master_system_ram_mirroring() {
        let mut bus = ConsoleBus::master_system(vec![0; 4 * BANK_SIZE]);
        bus.write(0xC001, 0x43);
        assert_eq!(bus.read(0xE001), 0x43);
        assert_eq!(bus.region(MemoryRegion::WorkRam)[1], 0x43);
    }

    #[test]
    fn test_master_system_rom_is_read_only() {
        let mut bus = ConsoleBus::master_system(vec![0x11; 4 * BANK_SIZE]);
        assert_eq!(bus.write(0x0100, 0x22), None);
        assert_eq!(bus.read(0x0100), 0x11);
    }

    #[test]
    fn test_mapper_write_reports_bank_switch() {
        let rom: Vec<u8> = (0..4 * BANK_SIZE).map(|i| (i / BANK_SIZE) as u8).collect();
        let mut bus = ConsoleBus::master_system(rom);
        assert_eq!(bus.write(0xFFFF, 3), Some(BankSwitch { slot: 2, bank: 3 }));
        assert_eq!(bus.read(0x8000), 3);
        assert_eq!(bus.write(0xFFFC, 1), None);
    }

    #[test]
    fn test_mega_drive_map() {
        let mut rom = vec![0; 0x1000];
        rom[0x100] = 0x4E;
        rom[0x101] = 0x71;
        let mut bus = ConsoleBus::mega_drive(rom);
        assert_eq!(bus.read_u16(0x100), 0x4E71);

        bus.write(0xFF1234, 0x99);
        assert_eq!(bus.read(0xFF1234), 0x99);
        assert_eq!(bus.region(MemoryRegion::WorkRam)[0x1234], 0x99);

        // No Word-RAM without a Mega-CD
        assert_eq!(bus.write(WORD_RAM_START, 1), None);
        assert!(bus.region(MemoryRegion::WordRam).is_empty());
    }

    #[test]
    fn test_mega_cd_regions() {
        let mut bus = ConsoleBus::mega_drive(vec![0; 0x1000]).with_mega_cd(false);
        assert!(bus.add_on().cd_ram_active());
        assert_eq!(bus.region(MemoryRegion::PrgRam).len(), PRG_RAM_SIZE);

        bus.write(WORD_RAM_START + 5, 0x77);
        assert_eq!(bus.region(MemoryRegion::WordRam)[5], 0x77);

        bus.set_cartridge_boot(true);
        assert!(!bus.add_on().cd_ram_active());
    }

    #[test]
    fn test_word_access_bounds() {
        let mut bus = ConsoleBus::mega_drive(vec![0; 4]);
        let last = Location::new(MemoryRegion::CartridgeRom, 3);
        assert_eq!(bus.read_word(last), None);
        assert!(!bus.write_word(last, 0xFFFF));

        let first = Location::new(MemoryRegion::CartridgeRom, 0);
        assert!(bus.write_word(first, 0x1234));
        assert_eq!(bus.read_word(first), Some(0x1234));
    }
}
