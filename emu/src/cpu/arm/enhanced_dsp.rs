//! # `ARMv5TE` DSP extensions
//!
//! Saturating arithmetic (QADD, QSUB, QDADD, QDSUB) and the signed
//! halfword multiplies.
//!
//! Saturation clamps to `i32::MIN..=i32::MAX` and sets Q. Q is sticky:
//! nothing here ever clears it, only an MSR to the flags lane does.
//!
//! ```text
//! SMLA<x><y>   Rd = Rm.x * Rs.y + Rn            Q on accumulate overflow
//! SMLAW<y>     Rd = (Rm * Rs.y) >> 16 + Rn      Q on accumulate overflow
//! SMULW<y>     Rd = (Rm * Rs.y) >> 16
//! SMLAL<x><y>  RdHi:RdLo += Rm.x * Rs.y
//! SMUL<x><y>   Rd = Rm.x * Rs.y
//! ```
//!
//! `.x`/`.y` select the bottom (0) or top (1) signed halfword.

use crate::bitwise::Bits;
use crate::bus::SystemBus;
use crate::cpu::arm::handler::{HalfwordMultiplyOp, SaturatingOp};
use crate::cpu::arm7::Arm7;
use crate::cpu::psr::Flag;

/// Clamps to a signed 32-bit value, the flag tells whether it had to.
#[must_use]
pub fn saturate(value: i64) -> (i32, bool) {
    match i32::try_from(value) {
        Ok(value) => (value, false),
        Err(_) if value < 0 => (i32::MIN, true),
        Err(_) => (i32::MAX, true),
    }
}

fn halfword(value: u32, top: bool) -> i32 {
    let half = if top { value >> 16 } else { value & 0xFFFF };
    i32::from(half as u16 as i16)
}

impl<B: SystemBus> Arm7<B> {
    fn set_saturation(&mut self) {
        self.registers.set_flag(Flag::Saturation, true);
    }

    pub(crate) fn saturating_add_sub(&mut self, instruction: u32, op: SaturatingOp) {
        let rn = instruction.get_bits(16..=19) as usize;
        let rd = instruction.get_bits(12..=15) as usize;
        let rm = instruction.get_bits(0..=3) as usize;

        let rm_value = i64::from(self.registers.read(rm) as i32);
        let rn_value = i64::from(self.registers.read(rn) as i32);

        let mut saturated = false;
        let rn_value = match op {
            SaturatingOp::Qadd | SaturatingOp::Qsub => rn_value,
            SaturatingOp::Qdadd | SaturatingOp::Qdsub => {
                let (doubled, clamped) = saturate(rn_value * 2);
                saturated |= clamped;
                i64::from(doubled)
            }
        };

        let (result, clamped) = match op {
            SaturatingOp::Qadd | SaturatingOp::Qdadd => saturate(rm_value + rn_value),
            SaturatingOp::Qsub | SaturatingOp::Qdsub => saturate(rm_value - rn_value),
        };
        saturated |= clamped;

        self.registers.write(rd, result as u32);
        if saturated {
            self.set_saturation();
        }
    }

    pub(crate) fn halfword_multiply(
        &mut self,
        instruction: u32,
        op: HalfwordMultiplyOp,
        x: bool,
        y: bool,
    ) {
        let rd = instruction.get_bits(16..=19) as usize;
        let rn = instruction.get_bits(12..=15) as usize;
        let rs = instruction.get_bits(8..=11) as usize;
        let rm = instruction.get_bits(0..=3) as usize;

        let rm_value = self.registers.read(rm);
        let rs_half = halfword(self.registers.read(rs), y);
        let accumulator = self.registers.read(rn) as i32;

        match op {
            HalfwordMultiplyOp::Smul => {
                let product = halfword(rm_value, x) * rs_half;
                self.registers.write(rd, product as u32);
            }
            HalfwordMultiplyOp::Smla => {
                let product = halfword(rm_value, x) * rs_half;
                self.accumulate_with_saturation_flag(rd, product, accumulator);
            }
            HalfwordMultiplyOp::Smulw => {
                let product = (i64::from(rm_value as i32) * i64::from(rs_half)) >> 16;
                self.registers.write(rd, product as u32);
            }
            HalfwordMultiplyOp::Smlaw => {
                let product = (i64::from(rm_value as i32) * i64::from(rs_half)) >> 16;
                self.accumulate_with_saturation_flag(rd, product as i32, accumulator);
            }
            HalfwordMultiplyOp::Smlal => {
                // Rn is RdLo, Rd is RdHi.
                let product = i64::from(halfword(rm_value, x) * rs_half);
                let hi = u64::from(self.registers.read(rd));
                let lo = u64::from(self.registers.read(rn));
                let result = (((hi << 32) | lo) as i64).wrapping_add(product) as u64;

                self.registers.write(rn, result as u32);
                self.registers.write(rd, (result >> 32) as u32);
            }
        }
    }

    /// The sum wraps, Q records that it did.
    fn accumulate_with_saturation_flag(&mut self, rd: usize, product: i32, accumulator: i32) {
        let (result, overflow) = product.overflowing_add(accumulator);
        self.registers.write(rd, result as u32);
        if overflow {
            self.set_saturation();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::arm7::tests::cpu_v5;
    use pretty_assertions::assert_eq;

    #[test]
    fn saturate_bounds() {
        assert_eq!(saturate(5), (5, false));
        assert_eq!(saturate(i64::from(i32::MAX) + 1), (i32::MAX, true));
        assert_eq!(saturate(i64::from(i32::MIN) - 1), (i32::MIN, true));
    }

    #[test]
    fn qadd_saturates_and_sets_q() {
        let mut cpu = cpu_v5();
        cpu.registers.write(1, 0x7FFF_FFFF);
        cpu.registers.write(2, 1);

        // QADD R0, R1, R2
        cpu.execute(0xE102_0051);
        assert_eq!(cpu.registers.read(0), 0x7FFF_FFFF);
        assert!(cpu.registers.is_flag(Flag::Saturation));
    }

    #[test]
    fn qadd_without_overflow_leaves_q_clear() {
        let mut cpu = cpu_v5();
        cpu.registers.set_flag(Flag::Saturation, false);
        cpu.registers.write(1, 1);
        cpu.registers.write(2, 1);

        // QADD R0, R1, R2
        cpu.execute(0xE102_0051);
        assert_eq!(cpu.registers.read(0), 2);
        assert!(!cpu.registers.is_flag(Flag::Saturation));
    }

    #[test]
    fn q_is_sticky() {
        let mut cpu = cpu_v5();
        cpu.registers.set_flag(Flag::Saturation, true);
        cpu.registers.write(1, 2);
        cpu.registers.write(2, 3);

        // QADD R0, R1, R2 does not saturate and leaves Q set.
        cpu.execute(0xE102_0051);
        assert_eq!(cpu.registers.read(0), 5);
        assert!(cpu.registers.is_flag(Flag::Saturation));
    }

    #[test]
    fn qsub_saturates_negative() {
        let mut cpu = cpu_v5();
        cpu.registers.write(1, 0x8000_0000);
        cpu.registers.write(2, 1);

        // QSUB R0, R1, R2: R1 - R2
        cpu.execute(0xE122_0051);
        assert_eq!(cpu.registers.read(0), 0x8000_0000);
        assert!(cpu.registers.is_flag(Flag::Saturation));
    }

    #[test]
    fn qdadd_saturates_the_doubling() {
        let mut cpu = cpu_v5();
        cpu.registers.write(1, (-10_i32) as u32);
        cpu.registers.write(2, 0x4000_0000);

        // QDADD R0, R1, R2: R1 + sat(2 * R2)
        cpu.execute(0xE142_0051);
        assert_eq!(cpu.registers.read(0), 0x7FFF_FFF5);
        assert!(cpu.registers.is_flag(Flag::Saturation));
    }

    #[test]
    fn qdsub() {
        let mut cpu = cpu_v5();
        cpu.registers.write(1, 100);
        cpu.registers.write(2, 20);

        // QDSUB R0, R1, R2
        cpu.execute(0xE162_0051);
        assert_eq!(cpu.registers.read(0), 60);
        assert!(!cpu.registers.is_flag(Flag::Saturation));
    }

    #[test]
    fn check_smulxy() {
        let mut cpu = cpu_v5();
        cpu.registers.write(1, 0xFFFE_0003);
        cpu.registers.write(2, 0x0004_FFFB);

        // SMULBB R0, R1, R2: 3 * -5
        cpu.execute(0xE160_0281);
        assert_eq!(cpu.registers.read(0), (-15_i32) as u32);

        // SMULTT R0, R1, R2: -2 * 4
        cpu.execute(0xE160_02E1);
        assert_eq!(cpu.registers.read(0), (-8_i32) as u32);
    }

    #[test]
    fn smla_sets_q_on_overflow() {
        let mut cpu = cpu_v5();
        cpu.registers.write(1, 1);
        cpu.registers.write(2, 1);
        cpu.registers.write(3, 0x7FFF_FFFF);

        // SMLABB R0, R1, R2, R3
        cpu.execute(0xE100_3281);
        assert_eq!(cpu.registers.read(0), 0x8000_0000);
        assert!(cpu.registers.is_flag(Flag::Saturation));
    }

    #[test]
    fn check_smulw_smlaw() {
        let mut cpu = cpu_v5();
        cpu.registers.write(1, 0x0001_0000);
        cpu.registers.write(2, 0x0000_0003);
        cpu.registers.write(3, 10);

        // SMULWB R0, R1, R2: (0x10000 * 3) >> 16
        cpu.execute(0xE120_02A1);
        assert_eq!(cpu.registers.read(0), 3);

        // SMLAWB R0, R1, R2, R3
        cpu.execute(0xE120_3281);
        assert_eq!(cpu.registers.read(0), 13);
    }

    #[test]
    fn check_smlal() {
        let mut cpu = cpu_v5();
        cpu.registers.write(1, 2);
        cpu.registers.write(2, (-3_i32) as u32);
        cpu.registers.write(4, 5);
        cpu.registers.write(5, 0);

        // SMLALBB R4, R5, R1, R2: RdHi:RdLo = 5 + 2 * -3
        cpu.execute(0xE145_4281);
        assert_eq!(cpu.registers.read(4), 0xFFFF_FFFF);
        assert_eq!(cpu.registers.read(5), 0xFFFF_FFFF);
    }
}
