//! # Core configuration
//!
//! Everything the host chooses before the core starts: how many ticks make
//! a CPU cycle, which instruction set generation is emulated, where the
//! exception vectors live and how many wait states each bus region costs.
//! All of it is immutable once the CPU is built.

use serde::{Deserialize, Serialize};

/// Instruction set generation.
///
/// `V4` is the plain ARM7TDMI set. `V5` adds the `ARMv5TE` extensions: CLZ,
/// BLX, BKPT, the saturating/DSP instructions and LDRD/STRD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum Architecture {
    #[default]
    V4,
    V5,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CpuConfig {
    /// Ticks pushed to the CPU for every pulse of the system clock.
    pub clock_multiple: u32,

    pub architecture: Architecture,

    /// Vectors at `0xFFFF_0000` instead of `0x0000_0000`.
    pub high_vectors: bool,

    /// When set, the I bit only masks IRQ and Reset/SWI/UND/aborts are
    /// always taken. Otherwise the I bit masks every exception kind.
    pub architectural_exception_masking: bool,
}

impl Default for CpuConfig {
    fn default() -> Self {
        Self {
            clock_multiple: 1,
            architecture: Architecture::V4,
            high_vectors: false,
            architectural_exception_masking: false,
        }
    }
}

/// Timing table columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessClass {
    NonSequential32 = 0,
    Sequential32 = 1,
    NonSequential16 = 2,
    Sequential16 = 3,
}

impl AccessClass {
    /// Bytes are billed like halfwords.
    #[must_use]
    pub const fn new(width: AccessWidth, sequential: bool) -> Self {
        match (width, sequential) {
            (AccessWidth::Word, false) => Self::NonSequential32,
            (AccessWidth::Word, true) => Self::Sequential32,
            (AccessWidth::HalfWord | AccessWidth::Byte, false) => Self::NonSequential16,
            (AccessWidth::HalfWord | AccessWidth::Byte, true) => Self::Sequential16,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessWidth {
    Byte,
    HalfWord,
    Word,
}

/// Number of timing rows a bus region can select.
pub const TIMING_ROWS: usize = 5;

/// `[timing row][access class] -> wait ticks`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingTable(pub [[u32; 4]; TIMING_ROWS]);

impl TimingTable {
    #[must_use]
    pub const fn wait_cycles(&self, row: usize, class: AccessClass) -> u32 {
        self.0[row][class as usize]
    }
}

impl Default for TimingTable {
    fn default() -> Self {
        Self([
            // Main RAM
            [9, 2, 8, 1],
            // BIOS, WRAM, I/O, WIFI
            [1, 1, 1, 1],
            // VRAM
            [2, 2, 1, 1],
            // GBA-slot ROM
            [16, 12, 10, 6],
            // GBA-slot RAM
            [40, 40, 20, 20],
        ])
    }
}

/// Separate wait states for instruction fetches and data accesses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BusTimings {
    pub code: TimingTable,
    pub data: TimingTable,
}

impl BusTimings {
    /// Every access completes without waiting, handy for tests.
    #[must_use]
    pub const fn zero_wait() -> Self {
        Self {
            code: TimingTable([[0; 4]; TIMING_ROWS]),
            data: TimingTable([[0; 4]; TIMING_ROWS]),
        }
    }
}
