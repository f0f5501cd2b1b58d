//! Cheat table
//!
//! Entries keep the order in which they were first added. Patches are laid
//! down in that order and removed in the opposite one, so table order matters
//! whenever two codes touch the same byte.

use crate::bus::Location;
use crate::decoder::{decode, DecodedCode, HardwareFamily};
use crate::error::TableError;

/// Default number of entries a table can hold
pub const MAX_CHEATS: usize = 150;

/// Separator between codes submitted together
pub const CODE_JOINER: char = '+';

/// Width of a ROM write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchWidth {
    /// Banked 8-bit ROM
    Byte,
    /// Flat 16-bit ROM, big-endian
    Word,
}

/// A ROM byte or word currently holding a patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LivePatch {
    /// Where the patch was written
    pub location: Location,
    pub width: PatchWidth,
    /// What was there before, written back on removal
    pub displaced: u16,
}

/// One decoded cheat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheatEntry {
    pub enabled: bool,
    /// Target address, not yet classified into a memory region
    pub address: u32,
    pub data: u16,
    /// Original value: supplied by the code, or captured from flat ROM on apply
    pub reference: Option<u16>,
    /// Location patched under the current mapping, if any
    pub live: Option<LivePatch>,
}

impl CheatEntry {
    /// Create a new entry from a decoded code
    pub fn new(code: DecodedCode, enabled: bool) -> Self {
        Self {
            enabled,
            address: code.address,
            data: code.data,
            reference: code.reference,
            live: None,
        }
    }

    /// Whether this entry patches the same target with the same value
    pub fn matches(&self, code: &DecodedCode) -> bool {
        self.address == code.address && self.data == code.data
    }

    /// Whether `value` passes the reference gate for an 8-bit ROM patch
    pub fn accepts(&self, value: u8) -> bool {
        self.reference.map_or(true, |reference| reference as u8 == value)
    }
}

/// Outcome of [`CheatTable::add_compound`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// New entries appended
    pub added: usize,
    /// Existing entries whose enable flag was overwritten
    pub updated: usize,
    /// Pieces that failed to decode
    pub rejected: usize,
    /// Valid new codes dropped because the table was full
    pub dropped: usize,
}

/// Bounded, ordered cheat collection
#[derive(Debug, Clone)]
pub struct CheatTable {
    entries: Vec<CheatEntry>,
    capacity: usize,
}

impl CheatTable {
    /// Create an empty table holding at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    pub fn entries(&self) -> &[CheatEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&CheatEntry> {
        self.entries.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut CheatEntry> {
        self.entries.get_mut(index)
    }

    pub(crate) fn entries_mut(&mut self) -> &mut [CheatEntry] {
        &mut self.entries
    }

    /// Index of the entry with the same `(address, data)` pair
    pub fn find(&self, code: &DecodedCode) -> Option<usize> {
        self.entries.iter().position(|entry| entry.matches(code))
    }

    /// Append an entry, returning its index
    pub fn push(&mut self, entry: CheatEntry) -> Result<usize, TableError> {
        if self.is_full() {
            return Err(TableError::CapacityExceeded {
                capacity: self.capacity,
            });
        }
        self.entries.push(entry);
        Ok(self.entries.len() - 1)
    }

    /// Decode every `+`-separated code in `raw` and merge it into the table.
    ///
    /// A code matching an existing entry only updates that entry's enable
    /// flag. Codes that fail to decode, and new codes arriving when the table
    /// is full, are skipped.
    pub fn add_compound(&mut self, raw: &str, enabled: bool, family: HardwareFamily) -> MergeSummary {
        let mut summary = MergeSummary::default();

        for piece in raw.split(CODE_JOINER) {
            let code = match decode(piece, family) {
                Ok(code) => code,
                Err(_) => {
                    summary.rejected += 1;
                    continue;
                }
            };

            if let Some(index) = self.find(&code) {
                self.entries[index].enabled = enabled;
                summary.updated += 1;
                tracing::debug!(index, address = code.address, enabled, "cheat updated");
                continue;
            }

            match self.push(CheatEntry::new(code, enabled)) {
                Ok(index) => {
                    summary.added += 1;
                    tracing::debug!(index, address = code.address, data = code.data, enabled, "cheat added");
                }
                Err(err) => {
                    summary.dropped += 1;
                    tracing::debug!(code = piece, %err, "cheat dropped");
                }
            }
        }

        summary
    }

    /// Forget every entry. Patches must already have been removed.
    pub fn reset(&mut self) {
        self.entries.clear();
    }
}

impl Default for CheatTable {
    fn default() -> Self {
        Self::new(MAX_CHEATS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MD: HardwareFamily = HardwareFamily::MegaDrive;

    #[test]
    fn test_add_single() {
        let mut table = CheatTable::default();
        let summary = table.add_compound("RFAA-A6VR", true, MD);

        assert_eq!(summary.added, 1);
        assert_eq!(table.len(), 1);
        let entry = table.get(0).unwrap();
        assert!(entry.enabled);
        assert_eq!((entry.address, entry.data), (0x00402E, 0x4E71));
        assert_eq!(entry.live, None);
    }

    #[test]
    fn test_add_compound_skips_bad_pieces() {
        let mut table = CheatTable::default();
        let summary = table.add_compound("RFAA-A6VR+bogus+FF0123:00FF", true, MD);

        assert_eq!(summary, MergeSummary { added: 2, updated: 0, rejected: 1, dropped: 0 });
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(1).unwrap().address, 0xFF0123);
    }

    #[test]
    fn test_duplicate_updates_flag() {
        let mut table = CheatTable::default();
        table.add_compound("RFAA-A6VR", true, MD);
        let summary = table.add_compound("RFAA-A6VR", false, MD);

        assert_eq!(summary.updated, 1);
        assert_eq!(table.len(), 1);
        assert!(!table.get(0).unwrap().enabled);
    }

    #[test]
    fn test_duplicate_within_one_string() {
        let mut table = CheatTable::default();
        let summary = table.add_compound("RFAA-A6VR+RFAA-A6VR", true, MD);

        assert_eq!(summary.added, 1);
        assert_eq!(summary.updated, 1);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_same_address_different_data_is_distinct() {
        let mut table = CheatTable::default();
        table.add_compound("FF0123:00FF+FF0123:0001", true, MD);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_capacity_drops_silently() {
        let mut table = CheatTable::new(2);
        let summary = table.add_compound("FF0000:0001+FF0000:0002+FF0000:0003", true, MD);

        assert_eq!(summary.added, 2);
        assert_eq!(summary.dropped, 1);
        assert_eq!(table.len(), 2);
        assert!(table.is_full());

        // Existing entries can still be toggled when full
        let summary = table.add_compound("FF0000:0001", false, MD);
        assert_eq!(summary.updated, 1);
        assert!(!table.get(0).unwrap().enabled);
    }

    #[test]
    fn test_push_when_full() {
        let mut table = CheatTable::new(0);
        let code = decode("FF0000:0001", MD).unwrap();
        assert_eq!(
            table.push(CheatEntry::new(code, true)),
            Err(TableError::CapacityExceeded { capacity: 0 })
        );
    }

    #[test]
    fn test_reference_gate() {
        let code = decode("2D0123:4F", HardwareFamily::MasterSystem).unwrap();
        let entry = CheatEntry::new(code, true);
        assert!(entry.accepts(0x2D));
        assert!(!entry.accepts(0x2E));

        let code = decode("3E5-1AF", HardwareFamily::MasterSystem).unwrap();
        let entry = CheatEntry::new(code, true);
        assert!(entry.accepts(0x00));
        assert!(entry.accepts(0xFF));
    }

    #[test]
    fn test_reset() {
        let mut table = CheatTable::default();
        table.add_compound("RFAA-A6VR+AJBA-AA3W", true, MD);
        table.reset();
        assert!(table.is_empty());
        assert_eq!(table.capacity(), MAX_CHEATS);
    }
}
