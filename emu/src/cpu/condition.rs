//! # Conditional execution
//!
//! Bits 31-28 of every ARM instruction hold a condition tested against the
//! CPSR flags before the instruction runs. A failed condition turns the
//! instruction into a no-op: no register, flag or memory is touched.
//!
//! ```text
//! ┌───────┬────────┬─────────────────────┬─────────────────┐
//! │ Code  │ Suffix │     Meaning         │  Flags Tested   │
//! ├───────┼────────┼─────────────────────┼─────────────────┤
//! │ 0000  │   EQ   │ Equal               │ Z=1             │
//! │ 0001  │   NE   │ Not equal           │ Z=0             │
//! │ 0010  │   CS   │ Carry set / ≥ (uns) │ C=1             │
//! │ 0011  │   CC   │ Carry clear / < (u) │ C=0             │
//! │ 0100  │   MI   │ Minus / negative    │ N=1             │
//! │ 0101  │   PL   │ Plus / non-negative │ N=0             │
//! │ 0110  │   VS   │ Overflow set        │ V=1             │
//! │ 0111  │   VC   │ Overflow clear      │ V=0             │
//! │ 1000  │   HI   │ Higher (unsigned)   │ C=1 AND Z=0     │
//! │ 1001  │   LS   │ Lower/same (unsig)  │ C=0 OR Z=1      │
//! │ 1010  │   GE   │ ≥ (signed)          │ N=V             │
//! │ 1011  │   LT   │ < (signed)          │ N≠V             │
//! │ 1100  │   GT   │ > (signed)          │ Z=0 AND N=V     │
//! │ 1101  │   LE   │ ≤ (signed)          │ Z=1 OR N≠V      │
//! │ 1110  │   AL   │ Always              │ -               │
//! │ 1111  │   NV   │ Never (reserved)    │ -               │
//! └───────┴────────┴─────────────────────┴─────────────────┘
//! ```
//!
//! On `ARMv5` the NV space of the branch rows encodes `BLX <imm>`, which is
//! unconditional. That is handled by the branch handler, the evaluator
//! itself never lets NV through.

use serde::{Deserialize, Serialize};

use crate::cpu::psr::Psr;

#[derive(Debug, Eq, PartialEq, Copy, Clone, Serialize, Deserialize)]
pub enum Condition {
    EQ = 0x0,
    NE = 0x1,
    CS = 0x2,
    CC = 0x3,
    MI = 0x4,
    PL = 0x5,
    VS = 0x6,
    VC = 0x7,
    HI = 0x8,
    LS = 0x9,
    GE = 0xA,
    LT = 0xB,
    GT = 0xC,
    LE = 0xD,
    AL = 0xE,
    NV = 0xF,
}

impl Condition {
    /// Whether an instruction guarded by `self` runs with the given flags.
    #[must_use]
    pub fn evaluate(self, flags: Psr) -> bool {
        flags.can_execute(self)
    }
}

impl From<u8> for Condition {
    /// Only the low nibble is looked at.
    fn from(item: u8) -> Self {
        match item & 0xF {
            0x0 => Self::EQ,
            0x1 => Self::NE,
            0x2 => Self::CS,
            0x3 => Self::CC,
            0x4 => Self::MI,
            0x5 => Self::PL,
            0x6 => Self::VS,
            0x7 => Self::VC,
            0x8 => Self::HI,
            0x9 => Self::LS,
            0xA => Self::GE,
            0xB => Self::LT,
            0xC => Self::GT,
            0xD => Self::LE,
            0xE => Self::AL,
            _ => Self::NV,
        }
    }
}

impl From<u32> for Condition {
    /// Takes the condition from bits 31-28 of an instruction.
    fn from(instruction: u32) -> Self {
        Self::from((instruction >> 28) as u8)
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EQ => f.write_str("EQ"),
            Self::NE => f.write_str("NE"),
            Self::CS => f.write_str("CS"),
            Self::CC => f.write_str("CC"),
            Self::MI => f.write_str("MI"),
            Self::PL => f.write_str("PL"),
            Self::VS => f.write_str("VS"),
            Self::VC => f.write_str("VC"),
            Self::HI => f.write_str("HI"),
            Self::LS => f.write_str("LS"),
            Self::GE => f.write_str("GE"),
            Self::LT => f.write_str("LT"),
            Self::GT => f.write_str("GT"),
            Self::LE => f.write_str("LE"),
            Self::AL => Ok(()),
            Self::NV => f.write_str("NV"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::psr::Flag;
    use pretty_assertions::assert_eq;

    fn flags(n: bool, z: bool, c: bool, v: bool) -> Psr {
        let mut psr = Psr::default();
        psr.set_flag(Flag::Negative, n);
        psr.set_flag(Flag::Zero, z);
        psr.set_flag(Flag::Carry, c);
        psr.set_flag(Flag::Overflow, v);
        psr
    }

    fn all_combinations() -> impl Iterator<Item = (bool, bool, bool, bool)> {
        (0..16_u8).map(|i| (i & 8 != 0, i & 4 != 0, i & 2 != 0, i & 1 != 0))
    }

    #[test]
    fn ge_al_nv_over_all_flags() {
        for (n, z, c, v) in all_combinations() {
            let psr = flags(n, z, c, v);
            assert_eq!(Condition::GE.evaluate(psr), n == v);
            assert!(Condition::AL.evaluate(psr));
            assert!(!Condition::NV.evaluate(psr));
        }
    }

    #[test]
    fn every_condition_over_all_flags() {
        for (n, z, c, v) in all_combinations() {
            let psr = flags(n, z, c, v);
            let expected = [
                z,
                !z,
                c,
                !c,
                n,
                !n,
                v,
                !v,
                c && !z,
                !c || z,
                n == v,
                n != v,
                !z && n == v,
                z || n != v,
                true,
                false,
            ];

            for (code, expected) in expected.into_iter().enumerate() {
                let cond = Condition::from(code as u8);
                assert_eq!(
                    cond.evaluate(psr),
                    expected,
                    "{cond:?} with N={n} Z={z} C={c} V={v}"
                );
            }
        }
    }

    #[test]
    fn condition_from_instruction() {
        assert_eq!(Condition::from(0xE3A0_0005_u32), Condition::AL);
        assert_eq!(Condition::from(0x0A00_0000_u32), Condition::EQ);
        assert_eq!(Condition::from(0xFA00_0000_u32), Condition::NV);
        assert_eq!(Condition::AL.to_string(), "");
        assert_eq!(Condition::LE.to_string(), "LE");
    }
}
