//! Cartridge ROM and paging
//!
//! Mega Drive cartridges are addressed flat. Master System cartridges larger
//! than 48 KiB sit behind the Sega mapper, which splits $0000-$BFFF into
//! three 16 KiB slots selected through the registers at $FFFD-$FFFF. The
//! first 1 KiB never moves, so the interrupt vectors survive bank switches.

/// Size of a switchable ROM bank
pub const BANK_SIZE: usize = 0x4000;
/// Granularity of the page table
pub const PAGE_SIZE: usize = 0x400;
/// Number of switchable slots
pub const SLOT_COUNT: usize = 3;
/// Pages covering $0000-$BFFF
const PAGE_COUNT: usize = SLOT_COUNT * BANK_SIZE / PAGE_SIZE;
/// Mapper register for slot 0; slots 1 and 2 follow
pub const MAPPER_REGISTER_BASE: u32 = 0xFFFD;

/// Mapper types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mapper {
    /// Flat ROM, no bank switching
    Flat,
    /// Sega paging mapper, three 16 KiB slots
    Sega,
}

impl Default for Mapper {
    fn default() -> Self {
        Mapper::Flat
    }
}

/// Cartridge structure
#[derive(Debug, Clone)]
pub struct Cartridge {
    /// ROM image, in CPU byte order
    rom: Vec<u8>,
    /// Mapper type
    mapper: Mapper,
    /// Bank selected in each slot
    banks: [u8; SLOT_COUNT],
    /// ROM offset of every 1 KiB page in $0000-$BFFF
    pages: [usize; PAGE_COUNT],
}

impl Cartridge {
    /// Create a cartridge with the power-on bank layout (0, 1, 2)
    pub fn new(rom: Vec<u8>, mapper: Mapper) -> Self {
        let mut cartridge = Self {
            rom,
            mapper,
            banks: [0, 1, 2],
            pages: [0; PAGE_COUNT],
        };
        cartridge.rebuild_pages();
        cartridge
    }

    /// Flat, unbanked cartridge
    pub fn flat(rom: Vec<u8>) -> Self {
        Self::new(rom, Mapper::Flat)
    }

    /// Cartridge behind the Sega mapper
    pub fn sega(rom: Vec<u8>) -> Self {
        Self::new(rom, Mapper::Sega)
    }

    pub fn mapper(&self) -> Mapper {
        self.mapper
    }

    pub fn rom(&self) -> &[u8] {
        &self.rom
    }

    pub fn rom_mut(&mut self) -> &mut [u8] {
        &mut self.rom
    }

    /// ROM size in bytes
    pub fn size(&self) -> usize {
        self.rom.len()
    }

    /// Number of 16 KiB banks, rounding a partial last bank up
    pub fn bank_count(&self) -> usize {
        self.rom.len().div_ceil(BANK_SIZE).max(1)
    }

    /// Bank currently selected in `slot`
    pub fn bank(&self, slot: usize) -> Option<u8> {
        self.banks.get(slot).copied()
    }

    /// Select `bank` in `slot`. Returns false if the cartridge has no such slot.
    pub fn select_bank(&mut self, slot: usize, bank: u8) -> bool {
        if self.mapper != Mapper::Sega || slot >= SLOT_COUNT {
            return false;
        }
        self.banks[slot] = bank;
        self.rebuild_pages();
        true
    }

    /// ROM offset visible at a CPU address, if any
    pub fn resolve(&self, address: u32) -> Option<usize> {
        let address = address as usize;
        let offset = match self.mapper {
            Mapper::Flat => address,
            Mapper::Sega => {
                let page = self.pages.get(address / PAGE_SIZE)?;
                page + address % PAGE_SIZE
            }
        };
        (offset < self.rom.len()).then_some(offset)
    }

    /// Read the byte visible at a CPU address
    pub fn read(&self, address: u32) -> u8 {
        self.resolve(address).map_or(0xFF, |offset| self.rom[offset])
    }

    fn rebuild_pages(&mut self) {
        let bank_count = self.bank_count();
        let pages_per_bank = BANK_SIZE / PAGE_SIZE;

        for (page, offset) in self.pages.iter_mut().enumerate() {
            let slot = page / pages_per_bank;
            let bank = match self.mapper {
                Mapper::Flat => slot,
                Mapper::Sega => self.banks[slot] as usize % bank_count,
            };
            *offset = bank * BANK_SIZE + (page % pages_per_bank) * PAGE_SIZE;
        }

        if self.mapper == Mapper::Sega {
            // First 1 KiB is hardwired to the start of the ROM
            self.pages[0] = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// ROM whose every byte holds its bank number
    fn banked_rom(banks: usize) -> Vec<u8> {
        (0..banks * BANK_SIZE).map(|i| (i / BANK_SIZE) as u8).collect()
    }

    #[test]
    fn test_power_on_layout() {
        let cart = Cartridge::sega(banked_rom(8));
        assert_eq!(cart.read(0x0400), 0);
        assert_eq!(cart.read(0x4000), 1);
        assert_eq!(cart.read(0x8000), 2);
        assert_eq!(cart.bank_count(), 8);
    }

    #[test]
    fn test_select_bank() {
        let mut cart = Cartridge::sega(banked_rom(8));
        assert!(cart.select_bank(2, 5));
        assert_eq!(cart.read(0x8000), 5);
        assert_eq!(cart.read(0xBFFF), 5);
        assert_eq!(cart.resolve(0x8123), Some(5 * BANK_SIZE + 0x123));
        assert_eq!(cart.bank(2), Some(5));
    }

    #[test]
    fn test_bank_wraps_modulo_count() {
        let mut cart = Cartridge::sega(banked_rom(4));
        cart.select_bank(1, 6);
        assert_eq!(cart.read(0x4000), 2);
    }

    #[test]
    fn test_first_kilobyte_is_fixed() {
        let mut cart = Cartridge::sega(banked_rom(4));
        cart.select_bank(0, 3);
        assert_eq!(cart.read(0x03FF), 0);
        assert_eq!(cart.read(0x0400), 3);
    }

    #[test]
    fn test_flat_cartridge_ignores_bank_select() {
        let mut cart = Cartridge::flat(vec![0xAA; 0x100]);
        assert!(!cart.select_bank(0, 1));
        assert_eq!(cart.resolve(0xFF), Some(0xFF));
        assert_eq!(cart.resolve(0x100), None);
        assert_eq!(cart.read(0x100), 0xFF);
    }

    #[test]
    fn test_resolve_outside_window() {
        let cart = Cartridge::sega(banked_rom(4));
        assert_eq!(cart.resolve(0xC000), None);
    }
}
