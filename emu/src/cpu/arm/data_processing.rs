//! # Data processing
//!
//! ```text
//!  31  28 27 26 25 24  21 20 19 16 15 12 11                0
//! ┌──────┬─────┬──┬──────┬──┬─────┬─────┬───────────────────┐
//! │ cond │ 0 0 │I │opcode│S │ Rn  │ Rd  │    Operand 2      │
//! └──────┴─────┴──┴──────┴──┴─────┴─────┴───────────────────┘
//! ```
//!
//! Logical opcodes take C from the barrel shifter, arithmetic opcodes take
//! C and V from the adder. V is left alone by logical opcodes.

use crate::bitwise::Bits;
use crate::bus::SystemBus;
use crate::cpu::arm::alu_instruction::{
    ArithmeticOpResult, ArmModeAluInstruction, add_with_carry, rotated_immediate,
    shift_by_immediate, shift_by_register, sub_with_carry,
};
use crate::cpu::arm::handler::ShifterOperand;
use crate::cpu::arm7::Arm7;
use crate::cpu::psr::Flag;
use crate::cpu::registers::REG_PROGRAM_COUNTER;

impl<B: SystemBus> Arm7<B> {
    pub(crate) fn data_processing(
        &mut self,
        instruction: u32,
        alu_instruction: ArmModeAluInstruction,
        set_conditions: bool,
        operand: ShifterOperand,
    ) {
        let rn = instruction.get_bits(16..=19) as usize;
        let rd = instruction.get_bits(12..=15) as usize;
        let carry = self.registers.is_flag(Flag::Carry);

        let op1 = self.read_alu_register(rn, operand);
        let shifter = self.shifter_operand(instruction, operand, carry);
        let op2 = shifter.result;

        use ArmModeAluInstruction::{
            Adc, Add, And, Bic, Cmn, Cmp, Eor, Mov, Mvn, Orr, Rsb, Rsc, Sbc, Sub, Teq, Tst,
        };
        let result = match alu_instruction {
            And | Tst => self.logical(op1 & op2, shifter.carry),
            Eor | Teq => self.logical(op1 ^ op2, shifter.carry),
            Orr => self.logical(op1 | op2, shifter.carry),
            Bic => self.logical(op1 & !op2, shifter.carry),
            Mov => self.logical(op2, shifter.carry),
            Mvn => self.logical(!op2, shifter.carry),
            Add | Cmn => add_with_carry(op1, op2, false),
            Adc => add_with_carry(op1, op2, carry),
            Sub | Cmp => sub_with_carry(op1, op2, true),
            Sbc => sub_with_carry(op1, op2, carry),
            Rsb => sub_with_carry(op2, op1, true),
            Rsc => sub_with_carry(op2, op1, carry),
        };

        if !alu_instruction.is_test() {
            self.registers.write(rd, result.result);
        }

        if !set_conditions {
            return;
        }

        if rd == REG_PROGRAM_COUNTER && !alu_instruction.is_test() {
            // Exception return: the saved status comes back with the jump.
            if let Some(spsr) = self.registers.read_spsr() {
                self.registers.write_cpsr(spsr);
                return;
            }
            tracing::debug!(
                "{alu_instruction}S PC in {:?} mode has no SPSR to restore",
                self.registers.current_mode()
            );
        }

        let mut cpsr = self.registers.cpsr();
        cpsr.set_flags(&result);
        self.registers.write_cpsr(cpsr.into());
    }

    /// Result of a logical opcode: C from the shifter, V unchanged.
    fn logical(&self, result: u32, shifter_carry: bool) -> ArithmeticOpResult {
        ArithmeticOpResult {
            result,
            carry: shifter_carry,
            overflow: self.registers.is_flag(Flag::Overflow),
            sign: result.get_bit(31),
            zero: result == 0,
        }
    }

    /// With a register specified shift the extra cycle makes PC read one
    /// more instruction ahead.
    pub(crate) const fn get_pc_offset_alu(operand: ShifterOperand) -> u32 {
        match operand {
            ShifterOperand::RegisterShift(_) => 4,
            ShifterOperand::Immediate | ShifterOperand::ImmediateShift(_) => 0,
        }
    }

    fn read_alu_register(&self, reg: usize, operand: ShifterOperand) -> u32 {
        let value = self.registers.read(reg);
        if reg == REG_PROGRAM_COUNTER {
            value.wrapping_add(Self::get_pc_offset_alu(operand))
        } else {
            value
        }
    }

    pub(crate) fn shifter_operand(
        &self,
        instruction: u32,
        operand: ShifterOperand,
        carry: bool,
    ) -> ArithmeticOpResult {
        match operand {
            ShifterOperand::Immediate => rotated_immediate(
                instruction.get_bits(0..=7),
                instruction.get_bits(8..=11),
                carry,
            ),
            ShifterOperand::ImmediateShift(kind) => {
                let rm = self.read_alu_register(instruction.get_bits(0..=3) as usize, operand);
                shift_by_immediate(kind, instruction.get_bits(7..=11), rm, carry)
            }
            ShifterOperand::RegisterShift(kind) => {
                let rm = self.read_alu_register(instruction.get_bits(0..=3) as usize, operand);
                let amount = self.registers.read(instruction.get_bits(8..=11) as usize) & 0xFF;
                shift_by_register(kind, amount, rm, carry)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::cpu::arm7::tests::cpu;
    use crate::cpu::cpu_modes::Mode;
    use crate::cpu::psr::Flag;
    use pretty_assertions::assert_eq;

    #[test]
    fn check_mov_rx_immediate() {
        let mut cpu = cpu();
        // MOV R12, #0xFF000000 (0xFF rotated right by 8)
        cpu.execute(0b1110_0011_1010_0000_1100_0100_1111_1111);
        assert_eq!(cpu.registers.read(12), 0xFF00_0000);
    }

    #[test]
    fn check_add() {
        let mut cpu = cpu();
        cpu.registers.write(1, 0x7FFF_FFFF);
        cpu.registers.write(2, 1);

        // ADDS R0, R1, R2
        cpu.execute(0xE091_0002);

        assert_eq!(cpu.registers.read(0), 0x8000_0000);
        assert!(cpu.registers.is_flag(Flag::Negative));
        assert!(cpu.registers.is_flag(Flag::Overflow));
        assert!(!cpu.registers.is_flag(Flag::Carry));
        assert!(!cpu.registers.is_flag(Flag::Zero));
    }

    #[test]
    fn check_add_carry_bit() {
        let mut cpu = cpu();
        cpu.registers.write(1, 0xFFFF_FFFF);
        cpu.registers.write(2, 1);

        // ADDS R0, R1, R2
        cpu.execute(0xE091_0002);
        assert_eq!(cpu.registers.read(0), 0);
        assert!(cpu.registers.is_flag(Flag::Carry));
        assert!(cpu.registers.is_flag(Flag::Zero));

        // ADC R3, R2, R2
        cpu.execute(0xE0A2_3002);
        assert_eq!(cpu.registers.read(3), 5);
    }

    #[test]
    fn check_cmp() {
        let mut cpu = cpu();
        cpu.registers.write(0, 5);

        // CMP R0, #5
        cpu.execute(0xE350_0005);
        assert!(cpu.registers.is_flag(Flag::Zero));
        assert!(cpu.registers.is_flag(Flag::Carry));
        assert_eq!(cpu.registers.read(0), 5);

        // CMP R0, #6
        cpu.execute(0xE350_0006);
        assert!(!cpu.registers.is_flag(Flag::Zero));
        assert!(!cpu.registers.is_flag(Flag::Carry));
        assert!(cpu.registers.is_flag(Flag::Negative));
    }

    #[test]
    fn check_teq() {
        let mut cpu = cpu();
        cpu.registers.write(0, 0x8000_0001);
        cpu.registers.set_flag(Flag::Overflow, true);

        // TEQ R0, R0, LSR #1: C comes from the shifter, V is left alone.
        cpu.execute(0xE130_00A0);
        assert!(cpu.registers.is_flag(Flag::Carry));
        assert!(cpu.registers.is_flag(Flag::Negative));
        assert!(cpu.registers.is_flag(Flag::Overflow));
    }

    #[test]
    fn check_rsb_and_sbc() {
        let mut cpu = cpu();
        cpu.registers.write(1, 3);

        // RSB R0, R1, #10
        cpu.execute(0xE261_000A);
        assert_eq!(cpu.registers.read(0), 7);

        // SBC R2, R1, #1 with C clear subtracts one more.
        cpu.registers.set_flag(Flag::Carry, false);
        cpu.execute(0xE2C1_2001);
        assert_eq!(cpu.registers.read(2), 1);
    }

    #[test]
    fn check_bic_mvn() {
        let mut cpu = cpu();
        cpu.registers.write(1, 0xFF);

        // BIC R0, R1, #0xF
        cpu.execute(0xE3C1_000F);
        assert_eq!(cpu.registers.read(0), 0xF0);

        // MVN R2, #0
        cpu.execute(0xE3E0_2000);
        assert_eq!(cpu.registers.read(2), 0xFFFF_FFFF);
    }

    #[test]
    fn rrx_through_ror_zero() {
        let mut cpu = cpu();
        cpu.registers.write(1, 0b11);
        cpu.registers.set_flag(Flag::Carry, true);

        // MOVS R0, R1, RRX
        cpu.execute(0xE1B0_0061);
        assert_eq!(cpu.registers.read(0), 0x8000_0001);
        assert!(cpu.registers.is_flag(Flag::Carry));
    }

    #[test]
    fn shift_from_register_is_0() {
        let mut cpu = cpu();
        cpu.registers.write(1, 0xF0);
        cpu.registers.write(2, 0x100);
        cpu.registers.set_flag(Flag::Carry, true);

        // MOVS R0, R1, LSL R2 with only the low byte of R2 (0) used.
        cpu.execute(0xE1B0_0211);
        assert_eq!(cpu.registers.read(0), 0xF0);
        assert!(cpu.registers.is_flag(Flag::Carry));
    }

    #[test]
    fn check_add_pc_operand_shift_register() {
        let mut cpu = cpu();
        cpu.registers.write_pc(0x0200_0000);
        cpu.registers.write(2, 0);

        // ADD R0, PC, PC, LSL R2
        cpu.execute(0xE08F_021F);
        assert_eq!(cpu.registers.read(0), 2 * 0x0200_000C);

        // ADD R1, PC, #0
        cpu.execute(0xE28F_1000);
        assert_eq!(cpu.registers.read(1), 0x0200_000C);
    }

    #[test]
    fn mov_to_pc_branches() {
        let mut cpu = cpu();
        cpu.registers.write(0, 0x0200_0100);

        // MOV PC, R0
        cpu.execute(0xE1A0_F000);
        assert_eq!(cpu.registers.read_pc(), 0x0200_0100);
    }

    #[test]
    fn movs_pc_lr_returns_from_exception() {
        let mut cpu = cpu();
        let user_cpsr = 0x2000_0010;
        cpu.registers.set_mode(Mode::Irq);
        cpu.registers.write_spsr(user_cpsr);
        cpu.registers.write(14, 0x0200_0040);

        // MOVS PC, LR
        cpu.execute(0xE1B0_F00E);

        assert_eq!(cpu.registers.current_mode(), Mode::User);
        assert_eq!(cpu.registers.read_cpsr(), user_cpsr);
        assert_eq!(cpu.registers.read_pc(), 0x0200_0040);
    }

    #[test]
    fn subs_pc_in_user_mode_sets_flags() {
        let mut cpu = cpu();
        cpu.registers.set_mode(Mode::User);
        cpu.registers.write(0, 0x0200_0000);

        // SUBS PC, R0, #0
        cpu.execute(0xE250_F000);
        assert_eq!(cpu.registers.read_pc(), 0x0200_0000);
        assert_eq!(cpu.registers.current_mode(), Mode::User);
        assert!(cpu.registers.is_flag(Flag::Carry));
    }
}
