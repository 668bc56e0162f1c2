//! Handler descriptors stored in the dispatch table.
//!
//! Every variant carries the sub-fields that are fixed by the cell it was
//! installed in (bits 27-20 and 7-4 of the instruction), so the handler
//! never needs to decode them again. Register numbers and immediates live
//! in the other bits and are extracted at execution time.

use crate::bitwise::Bits;
use crate::cpu::arm::alu_instruction::ArmModeAluInstruction;
use crate::cpu::flags::{Indexing, LoadStoreKind, Offsetting, ReadWriteKind, ShiftKind};

/// Where the second operand of a data processing instruction comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShifterOperand {
    /// 8-bit immediate rotated right by an even amount.
    Immediate,
    /// `Rm` shifted by a 5-bit immediate.
    ImmediateShift(ShiftKind),
    /// `Rm` shifted by the low byte of `Rs`.
    RegisterShift(ShiftKind),
}

/// Offset of a word/byte transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOffset {
    /// 12-bit immediate.
    Immediate,
    /// `Rm` shifted by a 5-bit immediate.
    ScaledRegister(ShiftKind),
}

/// Addressing fields common to every single register transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferAddressing {
    pub indexing: Indexing,
    pub offsetting: Offsetting,
    /// W bit. With post-indexing it selects the user mode (`T`) variant.
    pub write_back: bool,
}

impl TransferAddressing {
    pub(crate) fn from_bits(instruction: u32) -> Self {
        Self {
            indexing: instruction.get_bit(24).into(),
            offsetting: instruction.get_bit(23).into(),
            write_back: instruction.get_bit(21),
        }
    }
}

/// Data types of the halfword and signed transfers (bits 6-5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalfwordTransferKind {
    UnsignedHalfword,
    SignedByte,
    SignedHalfword,
}

/// Which 32-bit operation a saturating instruction performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaturatingOp {
    Qadd,
    Qsub,
    Qdadd,
    Qdsub,
}

/// Signed halfword multiplies, bits 22-21 (and bit 5 for the W forms).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalfwordMultiplyOp {
    /// `SMLA<x><y>`: 16x16 + 32.
    Smla,
    /// `SMLAW<y>`: top 32 bits of 32x16, + 32.
    Smlaw,
    /// `SMULW<y>`: top 32 bits of 32x16.
    Smulw,
    /// `SMLAL<x><y>`: 16x16 + 64.
    Smlal,
    /// `SMUL<x><y>`: 16x16.
    Smul,
}

/// Block transfer addressing modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockAddressing {
    IncrementAfter,
    IncrementBefore,
    DecrementAfter,
    DecrementBefore,
}

impl BlockAddressing {
    #[must_use]
    pub const fn new(pre: bool, up: bool) -> Self {
        match (pre, up) {
            (false, true) => Self::IncrementAfter,
            (true, true) => Self::IncrementBefore,
            (false, false) => Self::DecrementAfter,
            (true, false) => Self::DecrementBefore,
        }
    }
}

/// Why a cell executes as a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndefinedReason {
    /// Architecturally undefined encoding.
    Undefined,
    /// Coprocessor instruction, there is no coprocessor.
    Coprocessor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmHandler {
    DataProcessing {
        alu_instruction: ArmModeAluInstruction,
        set_conditions: bool,
        operand: ShifterOperand,
    },
    /// MRS
    MoveStatusToRegister {
        spsr: bool,
    },
    /// MSR, from a register or from a rotated immediate.
    MoveToStatusRegister {
        spsr: bool,
        immediate: bool,
    },
    BranchExchange,
    BranchLinkExchangeRegister,
    CountLeadingZeros,
    Saturating(SaturatingOp),
    Breakpoint,
    HalfwordMultiply {
        op: HalfwordMultiplyOp,
        /// Top half of the first operand.
        x: bool,
        /// Top half of the second operand.
        y: bool,
    },
    Multiply {
        accumulate: bool,
        set_conditions: bool,
    },
    MultiplyLong {
        signed: bool,
        accumulate: bool,
        set_conditions: bool,
    },
    Swap {
        kind: ReadWriteKind,
    },
    HalfwordTransfer {
        addressing: TransferAddressing,
        immediate: bool,
        kind: HalfwordTransferKind,
        load_store: LoadStoreKind,
    },
    /// LDRD/STRD
    DoublewordTransfer {
        addressing: TransferAddressing,
        immediate: bool,
        load_store: LoadStoreKind,
    },
    SingleDataTransfer {
        addressing: TransferAddressing,
        offset: TransferOffset,
        kind: ReadWriteKind,
        load_store: LoadStoreKind,
    },
    BlockDataTransfer {
        addressing: BlockAddressing,
        /// S bit: user bank transfer, or SPSR restore when loading PC.
        psr_or_user: bool,
        write_back: bool,
        load_store: LoadStoreKind,
    },
    Branch {
        link: bool,
    },
    SoftwareInterrupt,
    Undefined(UndefinedReason),
}
