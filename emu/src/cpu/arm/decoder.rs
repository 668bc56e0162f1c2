//! # ARM decode table
//!
//! Decoding happens once, when the CPU is built. Every ARM instruction is
//! classified by 12 of its bits: bits 27-20 select a row and bits 7-4 a
//! column, giving 256 × 16 cells. Each cell receives one [`ArmHandler`]
//! carrying the sub-fields the cell fixes, so executing an instruction is a
//! single table lookup.
//!
//! ```text
//!  31  28 27      20 19        8 7  4 3  0
//! ┌──────┬──────────┬───────────┬────┬────┐
//! │ cond │   row    │           │col │    │
//! └──────┴──────────┴───────────┴────┴────┘
//! ```
//!
//! The table is filled by walking a list of [`MaskTarget`]s in order. A
//! target matches a cell when both its row mask (8 chars) and column mask
//! (4 chars) agree with the cell index, `x` matching either bit. The first
//! matching target whose emitter accepts the cell claims it. Emitters may
//! decline: `TST`/`TEQ`/`CMP`/`CMN` without `S` are not data processing,
//! and those cells continue on to the status register and DSP targets.
//!
//! Emitters receive a probe word `(row << 20) | (col << 4)`, so they read
//! fields at the same bit positions as a real instruction.

use crate::bitwise::Bits;
use crate::config::Architecture;
use crate::cpu::arm::alu_instruction::ArmModeAluInstruction;
use crate::cpu::arm::handler::{
    ArmHandler, BlockAddressing, HalfwordMultiplyOp, HalfwordTransferKind, SaturatingOp,
    ShifterOperand, TransferAddressing, TransferOffset, UndefinedReason,
};
use crate::cpu::flags::{LoadStoreKind, ReadWriteKind, ShiftKind};
use crate::error::DecodeError;

pub const ROWS: usize = 256;
pub const COLS: usize = 16;

const ROW_MASK_LEN: usize = 8;
const COL_MASK_LEN: usize = 4;

type Emitter = fn(u32) -> Option<ArmHandler>;

/// An instruction family and the cells it may claim.
#[derive(Clone, Copy)]
pub struct MaskTarget {
    pub name: &'static str,
    /// Bits 27-20, most significant first.
    pub row_mask: &'static str,
    /// Bits 7-4, most significant first.
    pub col_mask: &'static str,
    pub min_arch: Architecture,
    pub emit: Emitter,
}

/// A parsed `0`/`1`/`x` mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitPattern {
    /// Value required on the cared bits.
    ones: u32,
    /// Bits that must match.
    care: u32,
}

impl BitPattern {
    pub fn parse(
        target: &'static str,
        mask: &'static str,
        expected: usize,
    ) -> Result<Self, DecodeError> {
        let invalid = DecodeError::InvalidMask {
            target,
            mask,
            expected,
        };

        if mask.len() != expected {
            return Err(invalid);
        }

        let mut pattern = Self { ones: 0, care: 0 };
        for c in mask.chars() {
            pattern.ones <<= 1;
            pattern.care <<= 1;
            match c {
                '0' => pattern.care |= 1,
                '1' => {
                    pattern.care |= 1;
                    pattern.ones |= 1;
                }
                'x' | 'X' => {}
                _ => return Err(invalid),
            }
        }

        Ok(pattern)
    }

    #[must_use]
    pub const fn matches(self, value: u32) -> bool {
        value & self.care == self.ones
    }
}

/// The 4096 decoded cells for one architecture.
#[derive(Debug, Clone)]
pub struct DispatchTable {
    architecture: Architecture,
    cells: Vec<ArmHandler>,
}

impl DispatchTable {
    #[must_use]
    pub const fn architecture(&self) -> Architecture {
        self.architecture
    }

    #[must_use]
    pub fn cell(&self, row: u8, col: u8) -> ArmHandler {
        self.cells[usize::from(row) * COLS + usize::from(col & 0xF)]
    }

    /// Handler for a full instruction word.
    #[must_use]
    pub fn lookup(&self, instruction: u32) -> ArmHandler {
        let row = instruction.get_bits(20..=27) as usize;
        let col = instruction.get_bits(4..=7) as usize;
        self.cells[row * COLS + col]
    }
}

/// Builds the table for `architecture` from the ARM target list.
pub fn build_dispatch_table(architecture: Architecture) -> Result<DispatchTable, DecodeError> {
    build_with_targets(architecture, &ARM_TARGETS)
}

pub fn build_with_targets(
    architecture: Architecture,
    targets: &[MaskTarget],
) -> Result<DispatchTable, DecodeError> {
    let mut patterns = Vec::with_capacity(targets.len());
    for target in targets {
        let row = BitPattern::parse(target.name, target.row_mask, ROW_MASK_LEN)?;
        let col = BitPattern::parse(target.name, target.col_mask, COL_MASK_LEN)?;
        patterns.push((target, row, col));
    }

    let mut cells = Vec::with_capacity(ROWS * COLS);
    let mut claims = vec![0_usize; targets.len()];

    for row in 0..ROWS as u32 {
        for col in 0..COLS as u32 {
            let probe = (row << 20) | (col << 4);

            let found = patterns
                .iter()
                .enumerate()
                .filter(|(_, (target, row_pattern, col_pattern))| {
                    architecture >= target.min_arch
                        && row_pattern.matches(row)
                        && col_pattern.matches(col)
                })
                .find_map(|(index, (target, _, _))| {
                    (target.emit)(probe).map(|handler| (index, target.name, handler))
                });

            let Some((index, name, handler)) = found else {
                tracing::error!("cell row=0x{row:02X} col=0x{col:X} unclaimed");
                return Err(DecodeError::UnclaimedCell {
                    row: row as u8,
                    col: col as u8,
                });
            };

            tracing::trace!("cell row=0x{row:02X} col=0x{col:X} found: {name}");
            claims[index] += 1;
            cells.push(handler);
        }
    }

    for (target, count) in targets.iter().zip(&claims) {
        tracing::debug!("{:<45} {count:>4} cells", target.name);
    }
    tracing::info!(
        "dispatch table for {architecture:?} built: {} cells, {} targets",
        cells.len(),
        targets.len()
    );

    Ok(DispatchTable {
        architecture,
        cells,
    })
}

const fn target(
    name: &'static str,
    row_mask: &'static str,
    col_mask: &'static str,
    min_arch: Architecture,
    emit: Emitter,
) -> MaskTarget {
    MaskTarget {
        name,
        row_mask,
        col_mask,
        min_arch,
        emit,
    }
}

use Architecture::{V4, V5};

#[rustfmt::skip]
const ARM_TARGETS: [MaskTarget; 31] = [
    target("Data processing immediate shift",           "000xxxxx", "xxx0", V4, emit_data_processing_immediate_shift),
    target("Move status register to register",          "00010x00", "0000", V4, emit_move_status_to_register),
    target("Move register to status register",          "00010x10", "0000", V4, emit_move_register_to_status),
    target("Data processing register shift",            "000xxxxx", "0xx1", V4, emit_data_processing_register_shift),
    target("Branch/exchange",                           "00010010", "0001", V4, |_| Some(ArmHandler::BranchExchange)),
    target("Count leading zeros",                       "00010110", "0001", V5, |_| Some(ArmHandler::CountLeadingZeros)),
    target("Branch link/exchange register",             "00010010", "0011", V5, |_| Some(ArmHandler::BranchLinkExchangeRegister)),
    target("Enhanced DSP add/subtract",                 "00010xx0", "0101", V5, emit_saturating),
    target("Breakpoint",                                "00010010", "0111", V5, |_| Some(ArmHandler::Breakpoint)),
    target("Enhanced DSP multiplies",                   "00010xx0", "1xx0", V5, emit_halfword_multiply),
    target("Multiply (accumulate)",                     "000000xx", "1001", V4, emit_multiply),
    target("Multiply (accumulate) long",                "00001xxx", "1001", V4, emit_multiply_long),
    target("Swap/swap byte",                            "00010x00", "1001", V4, emit_swap),
    target("Load/store halfword register offset",       "000xx0xx", "1011", V4, emit_halfword_transfer),
    target("Load/store halfword immediate offset",      "000xx1xx", "1011", V4, emit_halfword_transfer),
    target("Load/store two words register offset",      "000xx0x0", "11x1", V5, emit_doubleword_transfer),
    target("Load signed halfword/byte register offset", "000xx0x1", "11x1", V4, emit_signed_load),
    target("Load/store two words immediate offset",     "000xx1x0", "11x1", V5, emit_doubleword_transfer),
    target("Load signed halfword/byte immediate offset","000xx1x1", "11x1", V4, emit_signed_load),
    target("Data processing immediate",                 "001xxxxx", "xxxx", V4, emit_data_processing_immediate),
    target("Undefined instruction",                     "00110x00", "xxxx", V4, emit_undefined),
    target("Move immediate to status register",         "00110x10", "xxxx", V4, emit_move_immediate_to_status),
    target("Load/store immediate offset",               "010xxxxx", "xxxx", V4, emit_single_transfer_immediate),
    target("Load/store register offset",                "011xxxxx", "xxx0", V4, emit_single_transfer_register),
    target("Undefined instruction (media space)",       "011xxxxx", "xxx1", V4, emit_undefined),
    target("Undefined instruction",                     "0xxxxxxx", "xxxx", V4, emit_undefined),
    target("Load/store multiple",                       "100xxxxx", "xxxx", V4, emit_block_transfer),
    target("Branch and branch with link",               "101xxxxx", "xxxx", V4, emit_branch),
    target("Coprocessor load/store",                    "110xxxxx", "xxxx", V4, emit_coprocessor),
    target("Coprocessor data/register transfer",        "1110xxxx", "xxxx", V4, emit_coprocessor),
    target("Software interrupt",                        "1111xxxx", "xxxx", V4, |_| Some(ArmHandler::SoftwareInterrupt)),
];

fn emit_data_processing(probe: u32, operand: ShifterOperand) -> Option<ArmHandler> {
    let alu_instruction = ArmModeAluInstruction::from(probe.get_bits(21..=24));
    let set_conditions = probe.get_bit(20);

    // Compare opcodes only exist with S, the cells are reused by other families.
    if alu_instruction.is_test() && !set_conditions {
        return None;
    }

    Some(ArmHandler::DataProcessing {
        alu_instruction,
        set_conditions,
        operand,
    })
}

fn emit_data_processing_immediate_shift(probe: u32) -> Option<ArmHandler> {
    let shift = ShiftKind::from(probe.get_bits(5..=6));
    emit_data_processing(probe, ShifterOperand::ImmediateShift(shift))
}

fn emit_data_processing_register_shift(probe: u32) -> Option<ArmHandler> {
    let shift = ShiftKind::from(probe.get_bits(5..=6));
    emit_data_processing(probe, ShifterOperand::RegisterShift(shift))
}

fn emit_data_processing_immediate(probe: u32) -> Option<ArmHandler> {
    emit_data_processing(probe, ShifterOperand::Immediate)
}

fn emit_move_status_to_register(probe: u32) -> Option<ArmHandler> {
    Some(ArmHandler::MoveStatusToRegister {
        spsr: probe.get_bit(22),
    })
}

fn emit_move_register_to_status(probe: u32) -> Option<ArmHandler> {
    Some(ArmHandler::MoveToStatusRegister {
        spsr: probe.get_bit(22),
        immediate: false,
    })
}

fn emit_move_immediate_to_status(probe: u32) -> Option<ArmHandler> {
    Some(ArmHandler::MoveToStatusRegister {
        spsr: probe.get_bit(22),
        immediate: true,
    })
}

fn emit_saturating(probe: u32) -> Option<ArmHandler> {
    let op = match probe.get_bits(21..=22) {
        0b00 => SaturatingOp::Qadd,
        0b01 => SaturatingOp::Qsub,
        0b10 => SaturatingOp::Qdadd,
        _ => SaturatingOp::Qdsub,
    };
    Some(ArmHandler::Saturating(op))
}

fn emit_halfword_multiply(probe: u32) -> Option<ArmHandler> {
    let x = probe.get_bit(5);
    let y = probe.get_bit(6);

    let (op, x) = match probe.get_bits(21..=22) {
        0b00 => (HalfwordMultiplyOp::Smla, x),
        // Bit 5 tells SMULW from SMLAW, the first operand is always 32 bits.
        0b01 if x => (HalfwordMultiplyOp::Smulw, false),
        0b01 => (HalfwordMultiplyOp::Smlaw, false),
        0b10 => (HalfwordMultiplyOp::Smlal, x),
        _ => (HalfwordMultiplyOp::Smul, x),
    };

    Some(ArmHandler::HalfwordMultiply { op, x, y })
}

fn emit_multiply(probe: u32) -> Option<ArmHandler> {
    Some(ArmHandler::Multiply {
        accumulate: probe.get_bit(21),
        set_conditions: probe.get_bit(20),
    })
}

fn emit_multiply_long(probe: u32) -> Option<ArmHandler> {
    Some(ArmHandler::MultiplyLong {
        signed: probe.get_bit(22),
        accumulate: probe.get_bit(21),
        set_conditions: probe.get_bit(20),
    })
}

fn emit_swap(probe: u32) -> Option<ArmHandler> {
    Some(ArmHandler::Swap {
        kind: ReadWriteKind::from(probe.get_bit(22)),
    })
}

fn emit_halfword_transfer(probe: u32) -> Option<ArmHandler> {
    Some(ArmHandler::HalfwordTransfer {
        addressing: TransferAddressing::from_bits(probe),
        immediate: probe.get_bit(22),
        kind: HalfwordTransferKind::UnsignedHalfword,
        load_store: LoadStoreKind::from(probe.get_bit(20)),
    })
}

fn emit_signed_load(probe: u32) -> Option<ArmHandler> {
    let kind = if probe.get_bit(5) {
        HalfwordTransferKind::SignedHalfword
    } else {
        HalfwordTransferKind::SignedByte
    };

    Some(ArmHandler::HalfwordTransfer {
        addressing: TransferAddressing::from_bits(probe),
        immediate: probe.get_bit(22),
        kind,
        load_store: LoadStoreKind::Load,
    })
}

fn emit_doubleword_transfer(probe: u32) -> Option<ArmHandler> {
    // With L clear, SH = 10 is LDRD and SH = 11 is STRD.
    let load_store = if probe.get_bit(5) {
        LoadStoreKind::Store
    } else {
        LoadStoreKind::Load
    };

    Some(ArmHandler::DoublewordTransfer {
        addressing: TransferAddressing::from_bits(probe),
        immediate: probe.get_bit(22),
        load_store,
    })
}

fn emit_single_transfer(probe: u32, offset: TransferOffset) -> Option<ArmHandler> {
    Some(ArmHandler::SingleDataTransfer {
        addressing: TransferAddressing::from_bits(probe),
        offset,
        kind: ReadWriteKind::from(probe.get_bit(22)),
        load_store: LoadStoreKind::from(probe.get_bit(20)),
    })
}

fn emit_single_transfer_immediate(probe: u32) -> Option<ArmHandler> {
    emit_single_transfer(probe, TransferOffset::Immediate)
}

fn emit_single_transfer_register(probe: u32) -> Option<ArmHandler> {
    let shift = ShiftKind::from(probe.get_bits(5..=6));
    emit_single_transfer(probe, TransferOffset::ScaledRegister(shift))
}

fn emit_block_transfer(probe: u32) -> Option<ArmHandler> {
    Some(ArmHandler::BlockDataTransfer {
        addressing: BlockAddressing::new(probe.get_bit(24), probe.get_bit(23)),
        psr_or_user: probe.get_bit(22),
        write_back: probe.get_bit(21),
        load_store: LoadStoreKind::from(probe.get_bit(20)),
    })
}

fn emit_branch(probe: u32) -> Option<ArmHandler> {
    Some(ArmHandler::Branch {
        link: probe.get_bit(24),
    })
}

fn emit_coprocessor(_: u32) -> Option<ArmHandler> {
    Some(ArmHandler::Undefined(UndefinedReason::Coprocessor))
}

fn emit_undefined(_: u32) -> Option<ArmHandler> {
    Some(ArmHandler::Undefined(UndefinedReason::Undefined))
}
