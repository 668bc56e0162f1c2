//! ALU opcodes and the barrel shifter.
//!
//! The second operand of a data processing instruction goes through the
//! barrel shifter, which also produces the shifter carry out used by the
//! logical opcodes when S is set.
//!
//! Shift amounts encoded in the instruction (5 bits) reuse 0 for special
//! forms: `LSR #0` is `LSR #32`, `ASR #0` is `ASR #32` and `ROR #0` is `RRX`.
//! Amounts taken from a register use its low byte and 0 means "no shift".

use std::fmt::Display;

use crate::bitwise::{Bits, shift_right_signed};
use crate::cpu::flags::ShiftKind;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ArmModeAluInstruction {
    And = 0x0,
    Eor = 0x1,
    Sub = 0x2,
    Rsb = 0x3,
    Add = 0x4,
    Adc = 0x5,
    Sbc = 0x6,
    Rsc = 0x7,
    Tst = 0x8,
    Teq = 0x9,
    Cmp = 0xA,
    Cmn = 0xB,
    Orr = 0xC,
    Mov = 0xD,
    Bic = 0xE,
    Mvn = 0xF,
}

impl Display for ArmModeAluInstruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::And => f.write_str("AND"),
            Self::Eor => f.write_str("EOR"),
            Self::Sub => f.write_str("SUB"),
            Self::Rsb => f.write_str("RSB"),
            Self::Add => f.write_str("ADD"),
            Self::Adc => f.write_str("ADC"),
            Self::Sbc => f.write_str("SBC"),
            Self::Rsc => f.write_str("RSC"),
            Self::Tst => f.write_str("TST"),
            Self::Teq => f.write_str("TEQ"),
            Self::Cmp => f.write_str("CMP"),
            Self::Cmn => f.write_str("CMN"),
            Self::Orr => f.write_str("ORR"),
            Self::Mov => f.write_str("MOV"),
            Self::Bic => f.write_str("BIC"),
            Self::Mvn => f.write_str("MVN"),
        }
    }
}

#[derive(Eq, PartialEq, Debug)]
pub enum AluInstructionKind {
    Logical,
    Arithmetic,
}

impl ArmModeAluInstruction {
    #[must_use]
    pub const fn kind(self) -> AluInstructionKind {
        use ArmModeAluInstruction::{
            Adc, Add, And, Bic, Cmn, Cmp, Eor, Mov, Mvn, Orr, Rsb, Rsc, Sbc, Sub, Teq, Tst,
        };
        match self {
            And | Eor | Tst | Teq | Orr | Mov | Bic | Mvn => AluInstructionKind::Logical,
            Sub | Rsb | Add | Adc | Sbc | Rsc | Cmp | Cmn => AluInstructionKind::Arithmetic,
        }
    }

    /// TST, TEQ, CMP and CMN only exist to set flags and have no destination.
    #[must_use]
    pub const fn is_test(self) -> bool {
        matches!(self, Self::Tst | Self::Teq | Self::Cmp | Self::Cmn)
    }
}

impl From<u32> for ArmModeAluInstruction {
    /// Only the four low bits are looked at.
    fn from(alu_op_code: u32) -> Self {
        use ArmModeAluInstruction::{
            Adc, Add, And, Bic, Cmn, Cmp, Eor, Mov, Mvn, Orr, Rsb, Rsc, Sbc, Sub, Teq, Tst,
        };
        match alu_op_code & 0xF {
            0x0 => And,
            0x1 => Eor,
            0x2 => Sub,
            0x3 => Rsb,
            0x4 => Add,
            0x5 => Adc,
            0x6 => Sbc,
            0x7 => Rsc,
            0x8 => Tst,
            0x9 => Teq,
            0xA => Cmp,
            0xB => Cmn,
            0xC => Orr,
            0xD => Mov,
            0xE => Bic,
            _ => Mvn,
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ArithmeticOpResult {
    pub result: u32,
    pub carry: bool,
    pub overflow: bool,
    pub sign: bool,
    pub zero: bool,
}

impl ArithmeticOpResult {
    const fn shifted(result: u32, carry: bool) -> Self {
        Self {
            result,
            carry,
            overflow: false,
            sign: false,
            zero: false,
        }
    }
}

/// `first_op + second_op + carry_in`, with flags.
#[must_use]
pub fn add_with_carry(first_op: u32, second_op: u32, carry_in: bool) -> ArithmeticOpResult {
    // we do the sum in 64bits so that the 32nd bit is the carry
    let result_and_carry = u64::from(first_op) + u64::from(second_op) + u64::from(carry_in);
    let result = result_and_carry as u32;

    let sign_op1 = first_op.get_bit(31);
    let sign_op2 = second_op.get_bit(31);
    let sign_r = result.get_bit(31);

    ArithmeticOpResult {
        result,
        carry: result_and_carry > u64::from(u32::MAX),
        // overflow only occurs when operands have the same sign and result has the opposite one
        overflow: sign_op1 == sign_op2 && sign_op1 != sign_r,
        sign: sign_r,
        zero: result == 0,
    }
}

/// `first_op - second_op - !carry_in`. C is "no borrow" as on ARM.
#[must_use]
pub fn sub_with_carry(first_op: u32, second_op: u32, carry_in: bool) -> ArithmeticOpResult {
    add_with_carry(first_op, !second_op, carry_in)
}

/// Barrel shifter for amounts encoded as a 5-bit immediate.
#[must_use]
pub fn shift_by_immediate(kind: ShiftKind, amount: u32, rm: u32, carry: bool) -> ArithmeticOpResult {
    match (kind, amount) {
        // LSL#0: No shift performed, ie. directly value=Rm, the C flag is NOT affected.
        (ShiftKind::Lsl, 0) => ArithmeticOpResult::shifted(rm, carry),
        // LSR#0 and ASR#0 are used to encode shifts by 32.
        (ShiftKind::Lsr | ShiftKind::Asr, 0) => shift_by_register(kind, 32, rm, carry),
        // ROR#0 is RRX: rotate right by one through the carry.
        (ShiftKind::Ror, 0) => {
            ArithmeticOpResult::shifted((u32::from(carry) << 31) | (rm >> 1), rm.get_bit(0))
        }
        _ => shift_by_register(kind, amount, rm, carry),
    }
}

/// Barrel shifter for amounts taken from the low byte of a register.
#[must_use]
pub fn shift_by_register(kind: ShiftKind, amount: u32, rm: u32, carry: bool) -> ArithmeticOpResult {
    if amount == 0 {
        return ArithmeticOpResult::shifted(rm, carry);
    }

    match kind {
        ShiftKind::Lsl => match amount {
            1..=31 => ArithmeticOpResult::shifted(rm << amount, rm.get_bit((32 - amount) as u8)),
            32 => ArithmeticOpResult::shifted(0, rm.get_bit(0)),
            _ => ArithmeticOpResult::shifted(0, false),
        },
        ShiftKind::Lsr => match amount {
            1..=31 => ArithmeticOpResult::shifted(rm >> amount, rm.get_bit((amount - 1) as u8)),
            32 => ArithmeticOpResult::shifted(0, rm.get_bit(31)),
            _ => ArithmeticOpResult::shifted(0, false),
        },
        ShiftKind::Asr => match amount {
            1..=31 => ArithmeticOpResult::shifted(
                shift_right_signed(rm, amount),
                rm.get_bit((amount - 1) as u8),
            ),
            _ => ArithmeticOpResult::shifted(shift_right_signed(rm, 32), rm.get_bit(31)),
        },
        ShiftKind::Ror => match amount & 31 {
            0 => ArithmeticOpResult::shifted(rm, rm.get_bit(31)),
            rotation => ArithmeticOpResult::shifted(
                rm.rotate_right(rotation),
                rm.get_bit((rotation - 1) as u8),
            ),
        },
    }
}

/// 8-bit immediate rotated right by twice the 4-bit rotate field.
#[must_use]
pub fn rotated_immediate(imm: u32, rotate: u32, carry: bool) -> ArithmeticOpResult {
    let value = imm.rotate_right(rotate * 2);
    let carry = if rotate == 0 { carry } else { value.get_bit(31) };
    ArithmeticOpResult::shifted(value, carry)
}
