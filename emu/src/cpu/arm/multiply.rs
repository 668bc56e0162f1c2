//! MUL, MLA and the 64-bit UMULL/UMLAL/SMULL/SMLAL.
//!
//! With S set, N and Z follow the result (bit 63 and all 64 bits for the
//! long forms). C and V are left alone.

use crate::bitwise::Bits;
use crate::bus::SystemBus;
use crate::cpu::arm7::Arm7;
use crate::cpu::psr::Flag;

impl<B: SystemBus> Arm7<B> {
    pub(crate) fn multiply(&mut self, instruction: u32, accumulate: bool, set_conditions: bool) {
        let rd = instruction.get_bits(16..=19) as usize;
        let rn = instruction.get_bits(12..=15) as usize;
        let rs = instruction.get_bits(8..=11) as usize;
        let rm = instruction.get_bits(0..=3) as usize;

        let mut result = self.registers.read(rm).wrapping_mul(self.registers.read(rs));
        if accumulate {
            result = result.wrapping_add(self.registers.read(rn));
        }

        self.registers.write(rd, result);

        if set_conditions {
            self.registers.set_flag(Flag::Negative, result.get_bit(31));
            self.registers.set_flag(Flag::Zero, result == 0);
        }
    }

    pub(crate) fn multiply_long(
        &mut self,
        instruction: u32,
        signed: bool,
        accumulate: bool,
        set_conditions: bool,
    ) {
        let rd_hi = instruction.get_bits(16..=19) as usize;
        let rd_lo = instruction.get_bits(12..=15) as usize;
        let rs = instruction.get_bits(8..=11) as usize;
        let rm = instruction.get_bits(0..=3) as usize;

        let op1 = self.registers.read(rm);
        let op2 = self.registers.read(rs);

        let mut result = if signed {
            (i64::from(op1 as i32) * i64::from(op2 as i32)) as u64
        } else {
            u64::from(op1) * u64::from(op2)
        };

        if accumulate {
            let hi = u64::from(self.registers.read(rd_hi));
            let lo = u64::from(self.registers.read(rd_lo));
            result = result.wrapping_add((hi << 32) | lo);
        }

        self.registers.write(rd_lo, result as u32);
        self.registers.write(rd_hi, (result >> 32) as u32);

        if set_conditions {
            self.registers.set_flag(Flag::Negative, result.get_bit(63));
            self.registers.set_flag(Flag::Zero, result == 0);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::cpu::arm7::tests::cpu;
    use crate::cpu::psr::Flag;
    use pretty_assertions::assert_eq;

    #[test]
    fn check_mul_mla() {
        let mut cpu = cpu();
        cpu.registers.write(1, 6);
        cpu.registers.write(2, 7);
        cpu.registers.write(3, 100);

        // MUL R0, R1, R2
        cpu.execute(0xE000_0291);
        assert_eq!(cpu.registers.read(0), 42);

        // MLA R4, R1, R2, R3
        cpu.execute(0xE024_3291);
        assert_eq!(cpu.registers.read(4), 142);
    }

    #[test]
    fn muls_sets_n_and_z_only() {
        let mut cpu = cpu();
        cpu.registers.write(1, 0);
        cpu.registers.write(2, 7);
        cpu.registers.set_flag(Flag::Carry, true);
        cpu.registers.set_flag(Flag::Overflow, true);

        // MULS R0, R1, R2
        cpu.execute(0xE010_0291);
        assert!(cpu.registers.is_flag(Flag::Zero));
        assert!(!cpu.registers.is_flag(Flag::Negative));
        assert!(cpu.registers.is_flag(Flag::Carry));
        assert!(cpu.registers.is_flag(Flag::Overflow));
    }

    #[test]
    fn check_umull_umlal() {
        let mut cpu = cpu();
        cpu.registers.write(2, 0xFFFF_FFFF);
        cpu.registers.write(3, 2);

        // UMULL R0, R1, R2, R3
        cpu.execute(0xE081_0392);
        assert_eq!(cpu.registers.read(0), 0xFFFF_FFFE);
        assert_eq!(cpu.registers.read(1), 1);

        // UMLAL R0, R1, R2, R3
        cpu.execute(0xE0A1_0392);
        assert_eq!(cpu.registers.read(0), 0xFFFF_FFFC);
        assert_eq!(cpu.registers.read(1), 3);
    }

    #[test]
    fn check_smull_smlal() {
        let mut cpu = cpu();
        cpu.registers.write(2, (-3_i32) as u32);
        cpu.registers.write(3, 5);

        // SMULLS R0, R1, R2, R3
        cpu.execute(0xE0D1_0392);
        assert_eq!(cpu.registers.read(0), (-15_i32) as u32);
        assert_eq!(cpu.registers.read(1), 0xFFFF_FFFF);
        assert!(cpu.registers.is_flag(Flag::Negative));

        // SMLALS R0, R1, R2, R3 with RdHi:RdLo = 15
        cpu.registers.write(0, 15);
        cpu.registers.write(1, 0);
        cpu.execute(0xE0F1_0392);
        assert_eq!(cpu.registers.read(0), 0);
        assert_eq!(cpu.registers.read(1), 0);
        assert!(cpu.registers.is_flag(Flag::Zero));
    }
}
