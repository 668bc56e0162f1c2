//! # System bus
//!
//! Everything the CPU touches goes through the bus. An address is first
//! classified into a region, which gives the backing store, the offset
//! inside it and the row of the timing table to bill the access to.
//!
//! ```text
//! 0x0000_0000 ┌──────────────────┐ BIOS            row 1
//! 0x0200_0000 ├──────────────────┤ Main RAM        row 0
//! 0x0300_0000 ├──────────────────┤ Shared WRAM     row 1
//! 0x0380_0000 ├──────────────────┤ ARM7 WRAM       row 1
//! 0x0400_0000 ├──────────────────┤ I/O (stub)      row 1
//! 0x0480_0000 ├──────────────────┤ WIFI RAM        row 1
//! 0x0480_8000 ├──────────────────┤ WIFI I/O (stub) row 1
//! 0x0600_0000 ├──────────────────┤ VRAM            row 2
//! 0x0800_0000 ├──────────────────┤ GBA-slot ROM    row 3
//! 0x0A00_0000 ├──────────────────┤ GBA-slot RAM    row 4
//! 0xFFFF_FFFF └──────────────────┘
//! ```
//!
//! ## Timing
//!
//! Before touching memory every access waits for as many clock ticks as the
//! timing table says. The column depends on the access width and on the
//! sequential hint set by the CPU (see [`AccessClass`]). Instruction
//! fetches and data accesses use separate tables.
//!
//! The I/O and WIFI I/O regions read as zero and drop writes: register
//! semantics are not part of the core.

use std::sync::Arc;

use crate::clock::Clock;
use crate::config::{AccessClass, AccessWidth, BusTimings};
use crate::memory::internal_memory::{InternalMemory, Store};

/// Data side of the bus.
pub trait DataBus {
    fn read_data8(&mut self, address: u32) -> u8;
    fn read_data16(&mut self, address: u32) -> u16;
    fn read_data32(&mut self, address: u32) -> u32;

    fn write_data8(&mut self, address: u32, value: u8);
    fn write_data16(&mut self, address: u32, value: u16);
    fn write_data32(&mut self, address: u32, value: u32);

    /// Whether the next access is billed as sequential.
    fn set_sequential(&mut self, sequential: bool);
}

/// Instruction fetch side of the bus.
pub trait CodeBus {
    fn read_code16(&mut self, address: u32) -> u16;
    fn read_code32(&mut self, address: u32) -> u32;
}

/// Everything a CPU needs from the system: memory and time.
pub trait SystemBus: DataBus + CodeBus {
    /// Pulse of the system clock.
    fn tick(&self);

    /// Blocks until one tick is available and consumes it.
    fn wait_for_tick(&self) -> u64;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusRegion {
    Bios,
    MainRam,
    SharedWram,
    Wram,
    Io,
    WifiRam,
    WifiIo,
    Vram,
    GbaRom,
    GbaRam,
}

impl BusRegion {
    /// `None` for the stubbed register regions.
    #[must_use]
    pub const fn store(self) -> Option<Store> {
        match self {
            Self::Bios => Some(Store::Bios),
            Self::MainRam => Some(Store::MainRam),
            Self::SharedWram => Some(Store::SharedWram),
            Self::Wram => Some(Store::Wram),
            Self::WifiRam => Some(Store::WifiRam),
            Self::Vram => Some(Store::Vram),
            Self::GbaRom => Some(Store::GbaRom),
            Self::GbaRam => Some(Store::GbaRam),
            Self::Io | Self::WifiIo => None,
        }
    }
}

/// Result of classifying an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionAccess {
    pub region: BusRegion,
    /// Offset from the start of the region.
    pub offset: u32,
    pub timing_row: usize,
}

/// `(end exclusive, region, base, timing row)`, ordered by address.
const REGIONS: [(u64, BusRegion, u32, usize); 10] = [
    (0x0200_0000, BusRegion::Bios, 0x0000_0000, 1),
    (0x0300_0000, BusRegion::MainRam, 0x0200_0000, 0),
    (0x0380_0000, BusRegion::SharedWram, 0x0300_0000, 1),
    (0x0400_0000, BusRegion::Wram, 0x0380_0000, 1),
    (0x0480_0000, BusRegion::Io, 0x0400_0000, 1),
    (0x0480_8000, BusRegion::WifiRam, 0x0480_0000, 1),
    (0x0600_0000, BusRegion::WifiIo, 0x0480_8000, 1),
    (0x0800_0000, BusRegion::Vram, 0x0600_0000, 2),
    (0x0A00_0000, BusRegion::GbaRom, 0x0800_0000, 3),
    (0x1_0000_0000, BusRegion::GbaRam, 0x0A00_0000, 4),
];

#[derive(Clone, Copy)]
enum AccessKind {
    Code,
    Data,
}

pub struct Arm7Bus {
    pub internal_memory: InternalMemory,
    timings: BusTimings,
    clock: Arc<dyn Clock>,
    sequential: bool,
    waited_ticks: u64,
}

impl Arm7Bus {
    #[must_use]
    pub fn new(internal_memory: InternalMemory, timings: BusTimings, clock: Arc<dyn Clock>) -> Self {
        Self {
            internal_memory,
            timings,
            clock,
            sequential: false,
            waited_ticks: 0,
        }
    }

    /// Classifies `address`. Total: every address belongs to a region.
    #[must_use]
    pub fn decode_address(address: u32) -> RegionAccess {
        let wide = u64::from(address);
        let (_, region, base, timing_row) = REGIONS
            .iter()
            .copied()
            .find(|(end, ..)| wide < *end)
            .unwrap_or(REGIONS[REGIONS.len() - 1]);

        RegionAccess {
            region,
            offset: address - base,
            timing_row,
        }
    }

    /// Ticks spent waiting on the bus so far.
    #[must_use]
    pub const fn waited_ticks(&self) -> u64 {
        self.waited_ticks
    }

    #[must_use]
    pub const fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    fn begin_access(&mut self, address: u32, width: AccessWidth, kind: AccessKind) -> RegionAccess {
        let access = Self::decode_address(address);
        let table = match kind {
            AccessKind::Code => &self.timings.code,
            AccessKind::Data => &self.timings.data,
        };
        let wait = table.wait_cycles(access.timing_row, AccessClass::new(width, self.sequential));

        for _ in 0..wait {
            self.clock.wait_for_tick();
        }
        self.waited_ticks += u64::from(wait);

        access
    }

    fn read_bytes<const N: usize>(&self, access: RegionAccess) -> [u8; N] {
        let mut bytes = [0; N];
        match access.region.store() {
            Some(store) => {
                for (i, byte) in bytes.iter_mut().enumerate() {
                    *byte = self
                        .internal_memory
                        .read_at(store, access.offset.wrapping_add(i as u32));
                }
            }
            None => tracing::trace!("read on stubbed {:?}+0x{:X}", access.region, access.offset),
        }
        bytes
    }

    fn write_bytes(&mut self, access: RegionAccess, bytes: &[u8]) {
        match access.region.store() {
            Some(store) => {
                for (i, byte) in bytes.iter().enumerate() {
                    self.internal_memory
                        .write_at(store, access.offset.wrapping_add(i as u32), *byte);
                }
            }
            None => tracing::trace!("write on stubbed {:?}+0x{:X}", access.region, access.offset),
        }
    }
}

impl DataBus for Arm7Bus {
    fn read_data8(&mut self, address: u32) -> u8 {
        let access = self.begin_access(address, AccessWidth::Byte, AccessKind::Data);
        self.read_bytes::<1>(access)[0]
    }

    fn read_data16(&mut self, address: u32) -> u16 {
        let access = self.begin_access(address & !1, AccessWidth::HalfWord, AccessKind::Data);
        u16::from_le_bytes(self.read_bytes(access))
    }

    fn read_data32(&mut self, address: u32) -> u32 {
        let access = self.begin_access(address & !3, AccessWidth::Word, AccessKind::Data);
        u32::from_le_bytes(self.read_bytes(access))
    }

    fn write_data8(&mut self, address: u32, value: u8) {
        let access = self.begin_access(address, AccessWidth::Byte, AccessKind::Data);
        self.write_bytes(access, &[value]);
    }

    fn write_data16(&mut self, address: u32, value: u16) {
        let access = self.begin_access(address & !1, AccessWidth::HalfWord, AccessKind::Data);
        self.write_bytes(access, &value.to_le_bytes());
    }

    fn write_data32(&mut self, address: u32, value: u32) {
        let access = self.begin_access(address & !3, AccessWidth::Word, AccessKind::Data);
        self.write_bytes(access, &value.to_le_bytes());
    }

    fn set_sequential(&mut self, sequential: bool) {
        self.sequential = sequential;
    }
}

impl CodeBus for Arm7Bus {
    fn read_code16(&mut self, address: u32) -> u16 {
        let access = self.begin_access(address & !1, AccessWidth::HalfWord, AccessKind::Code);
        u16::from_le_bytes(self.read_bytes(access))
    }

    fn read_code32(&mut self, address: u32) -> u32 {
        let access = self.begin_access(address & !3, AccessWidth::Word, AccessKind::Code);
        u32::from_le_bytes(self.read_bytes(access))
    }
}

impl SystemBus for Arm7Bus {
    fn tick(&self) {
        self.clock.tick();
    }

    fn wait_for_tick(&self) -> u64 {
        self.clock.wait_for_tick()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FreeRunningClock;
    use pretty_assertions::assert_eq;

    fn bus_with(timings: BusTimings) -> Arm7Bus {
        Arm7Bus::new(
            InternalMemory::default(),
            timings,
            Arc::new(FreeRunningClock::default()),
        )
    }

    #[test]
    fn decode_regions() {
        let cases = [
            (0x0000_0010, BusRegion::Bios, 0x10, 1),
            (0x01FF_FFFF, BusRegion::Bios, 0x01FF_FFFF, 1),
            (0x0200_0004, BusRegion::MainRam, 0x4, 0),
            (0x0300_0100, BusRegion::SharedWram, 0x100, 1),
            (0x0380_0100, BusRegion::Wram, 0x100, 1),
            (0x0400_0208, BusRegion::Io, 0x208, 1),
            (0x0480_0010, BusRegion::WifiRam, 0x10, 1),
            (0x0480_8000, BusRegion::WifiIo, 0x0, 1),
            (0x0600_0000, BusRegion::Vram, 0x0, 2),
            (0x0800_0002, BusRegion::GbaRom, 0x2, 3),
            (0x0A00_0001, BusRegion::GbaRam, 0x1, 4),
            (0xFFFF_FFFF, BusRegion::GbaRam, 0xF5FF_FFFF, 4),
        ];

        for (address, region, offset, timing_row) in cases {
            assert_eq!(
                Arm7Bus::decode_address(address),
                RegionAccess {
                    region,
                    offset,
                    timing_row
                },
                "address 0x{address:08X}"
            );
        }
    }

    #[test]
    fn little_endian_composition() {
        let mut bus = bus_with(BusTimings::zero_wait());
        bus.write_data32(0x0200_0000, 0x1234_5678);

        assert_eq!(bus.read_data8(0x0200_0000), 0x78);
        assert_eq!(bus.read_data8(0x0200_0003), 0x12);
        assert_eq!(bus.read_data16(0x0200_0002), 0x1234);
        assert_eq!(bus.read_code32(0x0200_0000), 0x1234_5678);
        assert_eq!(bus.read_code16(0x0200_0000), 0x5678);
    }

    #[test]
    fn accesses_are_forced_aligned() {
        let mut bus = bus_with(BusTimings::zero_wait());
        bus.write_data32(0x0200_0000, 0xAABB_CCDD);

        assert_eq!(bus.read_data32(0x0200_0001), 0xAABB_CCDD);
        assert_eq!(bus.read_data16(0x0200_0003), 0xAABB);

        bus.write_data16(0x0200_0001, 0x1122);
        assert_eq!(bus.read_data32(0x0200_0000), 0xAABB_1122);
    }

    #[test]
    fn io_is_stubbed() {
        let mut bus = bus_with(BusTimings::zero_wait());
        bus.write_data32(0x0400_0000, 0xFFFF_FFFF);
        assert_eq!(bus.read_data32(0x0400_0000), 0);
        bus.write_data8(0x0480_9000, 0xFF);
        assert_eq!(bus.read_data8(0x0480_9000), 0);
    }

    #[test]
    fn wait_states_follow_region_and_class() {
        let mut bus = bus_with(BusTimings::default());

        bus.set_sequential(false);
        bus.read_data32(0x0200_0000);
        assert_eq!(bus.waited_ticks(), 9);

        bus.set_sequential(true);
        bus.read_data32(0x0200_0004);
        assert_eq!(bus.waited_ticks(), 11);

        // Bytes use the halfword columns.
        bus.read_data8(0x0200_0008);
        assert_eq!(bus.waited_ticks(), 12);

        bus.set_sequential(false);
        bus.read_code16(0x0800_0000);
        assert_eq!(bus.waited_ticks(), 22);
    }

    #[test]
    fn code_and_data_tables_are_separate() {
        let mut timings = BusTimings::zero_wait();
        timings.code.0[1] = [3, 3, 3, 3];
        let mut bus = bus_with(timings);

        bus.read_data32(0x0000_0000);
        assert_eq!(bus.waited_ticks(), 0);
        bus.read_code32(0x0000_0000);
        assert_eq!(bus.waited_ticks(), 3);
    }

    #[test]
    fn waits_consume_clock_ticks() {
        let clock = Arc::new(FreeRunningClock::default());
        let mut bus = Arm7Bus::new(InternalMemory::default(), BusTimings::default(), clock.clone());

        bus.set_sequential(false);
        bus.write_data16(0x0800_0000, 0);
        assert_eq!(clock.ticks(), 10);
    }
}
