use thiserror::Error;

/// Malformed bit-field query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BitsError {
    /// `from` must be the higher index and stay within a 32-bit word.
    #[error("invalid bit range {from}..={to}, expected 31 >= from >= to")]
    InvalidRange { from: u8, to: u8 },
}

/// CPSR/SPSR mode bits that do not name a processor mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ModeError {
    #[error("invalid mode bits 0b{0:05b}")]
    InvalidBits(u32),
}

/// Defects found while building the dispatch table.
///
/// These are construction time failures: a table with holes is never handed
/// to a running CPU.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// No registered target claimed the cell.
    #[error("dispatch cell (row 0x{row:02X}, col 0x{col:X}) was not claimed by any target")]
    UnclaimedCell { row: u8, col: u8 },

    /// A target was registered with a mask that is not made of `0`, `1`, `x`
    /// or has the wrong length.
    #[error("target `{target}` has malformed mask `{mask}` (expected {expected} chars of 0/1/x)")]
    InvalidMask {
        target: &'static str,
        mask: &'static str,
        expected: usize,
    },
}
