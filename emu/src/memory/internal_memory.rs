use serde::{Deserialize, Serialize};

/// Backing stores owned by the ARM7 side of the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Store {
    /// 36 `KBytes` of boot ROM.
    Bios,
    /// 4 `MBytes` shared with the other core.
    MainRam,
    /// 32 `KBytes` switchable between the two cores.
    SharedWram,
    /// 64 `KBytes` private to the ARM7.
    Wram,
    /// 8 `KBytes`.
    WifiRam,
    /// 656 `KBytes`.
    Vram,
    /// 4 `KBytes` of object attributes and palettes.
    OamPalette,
    /// 248 `KBytes` of geometry engine memory.
    Geometry,
    /// 4 `MBytes`.
    MatrixStack,
    /// 256 `KBytes` of flash.
    Firmware,
    /// Cartridge ROM in the GBA slot, sized by its image.
    GbaRom,
    /// 64 `KBytes` of cartridge SRAM.
    GbaRam,
}

impl Store {
    pub const ALL: [Self; 12] = [
        Self::Bios,
        Self::MainRam,
        Self::SharedWram,
        Self::Wram,
        Self::WifiRam,
        Self::Vram,
        Self::OamPalette,
        Self::Geometry,
        Self::MatrixStack,
        Self::Firmware,
        Self::GbaRom,
        Self::GbaRam,
    ];

    /// Minimum size in bytes. The GBA-slot ROM has no minimum.
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            Self::Bios => 0x9000,
            Self::MainRam | Self::MatrixStack => 0x40_0000,
            Self::SharedWram => 0x8000,
            Self::Wram => 0x1_0000,
            Self::WifiRam => 0x2000,
            Self::Vram => 0xA_4000,
            Self::OamPalette => 0x1000,
            Self::Geometry => 0x3_E000,
            Self::Firmware => 0x4_0000,
            Self::GbaRom => 0,
            Self::GbaRam => 0x1_0000,
        }
    }

    const fn is_read_only(self) -> bool {
        matches!(self, Self::Bios | Self::GbaRom | Self::Firmware)
    }
}

/// Opaque byte arrays the bus indexes into.
///
/// Offsets past the end of a store wrap around (mirroring), except for the
/// GBA-slot ROM whose unmapped area behaves like an open bus.
#[derive(Serialize, Deserialize)]
pub struct InternalMemory {
    stores: Vec<Vec<u8>>,
}

impl Default for InternalMemory {
    fn default() -> Self {
        Self::new(&[], Vec::new())
    }
}

impl InternalMemory {
    /// `bios` is copied at the start of the BIOS store, `gba_rom` becomes the
    /// GBA-slot ROM as is.
    #[must_use]
    pub fn new(bios: &[u8], gba_rom: Vec<u8>) -> Self {
        let mut stores: Vec<Vec<u8>> = Store::ALL.iter().map(|s| vec![0; s.size()]).collect();
        stores[Store::GbaRom as usize] = gba_rom;

        let mut memory = Self { stores };
        memory.load(Store::Bios, 0, bios);
        memory
    }

    #[must_use]
    pub fn store(&self, store: Store) -> &[u8] {
        &self.stores[store as usize]
    }

    /// Copies `bytes` into `store` starting at `offset`, bypassing the read
    /// only protection. Bytes falling past the end of the store grow it.
    pub fn load(&mut self, store: Store, offset: usize, bytes: &[u8]) {
        let target = &mut self.stores[store as usize];
        let end = offset + bytes.len();
        if end > target.len() {
            target.resize(end, 0);
        }
        target[offset..end].copy_from_slice(bytes);
    }

    #[must_use]
    pub fn read_at(&self, store: Store, offset: u32) -> u8 {
        let bytes = &self.stores[store as usize];
        let offset = offset as usize;

        if store == Store::GbaRom {
            return bytes
                .get(offset)
                .copied()
                .unwrap_or_else(|| Self::open_bus(offset));
        }

        if bytes.is_empty() {
            return 0;
        }
        bytes[offset % bytes.len()]
    }

    pub fn write_at(&mut self, store: Store, offset: u32, value: u8) {
        if store.is_read_only() {
            tracing::trace!("dropping write of 0x{value:02X} to read only {store:?}+0x{offset:X}");
            return;
        }

        let bytes = &mut self.stores[store as usize];
        if bytes.is_empty() {
            return;
        }
        let len = bytes.len();
        bytes[offset as usize % len] = value;
    }

    /// The cartridge bus multiplexes data with the low address lines, so
    /// reading past the end of the image returns the halfword address.
    fn open_bus(offset: usize) -> u8 {
        let halfword = ((offset >> 1) & 0xFFFF) as u16;
        halfword.to_le_bytes()[offset & 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn stores_have_documented_sizes() {
        let memory = InternalMemory::default();
        assert_eq!(memory.store(Store::Bios).len(), 36 * 1024);
        assert_eq!(memory.store(Store::MainRam).len(), 4 * 1024 * 1024);
        assert_eq!(memory.store(Store::Vram).len(), 656 * 1024);
        assert_eq!(memory.store(Store::OamPalette).len(), 4 * 1024);
        assert_eq!(memory.store(Store::Geometry).len(), 248 * 1024);
        assert_eq!(memory.store(Store::WifiRam).len(), 8 * 1024);
        assert_eq!(memory.store(Store::Firmware).len(), 256 * 1024);
        assert!(memory.store(Store::GbaRom).is_empty());
    }

    #[test]
    fn bios_image_is_loaded() {
        let memory = InternalMemory::new(&[0xEF, 0xBE, 0xAD, 0xDE], vec![]);
        assert_eq!(memory.read_at(Store::Bios, 0), 0xEF);
        assert_eq!(memory.read_at(Store::Bios, 3), 0xDE);
    }

    #[test]
    fn offsets_mirror() {
        let mut memory = InternalMemory::default();
        memory.write_at(Store::Wram, 0x10, 0xAB);
        assert_eq!(memory.read_at(Store::Wram, 0x1_0010), 0xAB);
        assert_eq!(memory.read_at(Store::Wram, 0x3_0010), 0xAB);
    }

    #[test]
    fn read_only_stores_ignore_writes() {
        let mut memory = InternalMemory::new(&[1, 2, 3], vec![4, 5]);
        memory.write_at(Store::Bios, 0, 0xFF);
        memory.write_at(Store::GbaRom, 1, 0xFF);
        assert_eq!(memory.read_at(Store::Bios, 0), 1);
        assert_eq!(memory.read_at(Store::GbaRom, 1), 5);
    }

    #[test]
    fn gba_rom_open_bus() {
        let memory = InternalMemory::new(&[], vec![0x11, 0x22]);
        assert_eq!(memory.read_at(Store::GbaRom, 0), 0x11);
        // Halfword address 0x1234 at byte offset 0x2468.
        assert_eq!(memory.read_at(Store::GbaRom, 0x2468), 0x34);
        assert_eq!(memory.read_at(Store::GbaRom, 0x2469), 0x12);
    }

    #[test]
    fn load_grows_store() {
        let mut memory = InternalMemory::default();
        memory.load(Store::GbaRom, 2, &[7, 8]);
        assert_eq!(memory.store(Store::GbaRom), &[0, 0, 7, 8]);
    }
}
