//! B, BL, BX and BLX.
//!
//! ```text
//!  31  28 27 25 24 23                                      0
//! ┌──────┬─────┬──┬─────────────────────────────────────────┐
//! │ cond │1 0 1│L │           signed offset (words)         │
//! └──────┴─────┴──┴─────────────────────────────────────────┘
//! ```
//!
//! The offset is relative to R15, i.e. the branch address + 8. With the NV
//! condition on `ARMv5` the L bit becomes H, a halfword offset, and the
//! instruction is `BLX <imm>`, which always switches to Thumb.

use crate::bitwise::Bits;
use crate::bus::SystemBus;
use crate::config::Architecture;
use crate::cpu::arm7::Arm7;
use crate::cpu::psr::Flag;
use crate::cpu::registers::REG_LR;

fn branch_offset(instruction: u32) -> u32 {
    (instruction.get_bits(0..=23) << 2).sign_extended(26)
}

impl<B: SystemBus> Arm7<B> {
    pub(crate) fn branch(&mut self, instruction: u32, link: bool) {
        if link {
            let return_address = self.next_instruction_address();
            self.registers.write(REG_LR, return_address);
        }

        let target = self
            .registers
            .read_pc()
            .wrapping_add(branch_offset(instruction));
        self.registers.write_pc(target);
    }

    pub(crate) fn branch_link_exchange_immediate(&mut self, instruction: u32) {
        let halfword = u32::from(instruction.get_bit(24)) << 1;
        let target = self
            .registers
            .read_pc()
            .wrapping_add(branch_offset(instruction))
            .wrapping_add(halfword);

        let return_address = self.next_instruction_address();
        self.registers.write(REG_LR, return_address);
        self.registers.set_flag(Flag::Thumb, true);
        self.registers.write_pc(target);
    }

    /// BX and BLX with a register: bit 0 of the target selects the state.
    pub(crate) fn branch_and_exchange(&mut self, instruction: u32, link: bool) {
        let rm = instruction.get_bits(0..=3) as usize;
        let target = self.registers.read(rm);

        if link {
            let return_address = self.next_instruction_address();
            self.registers.write(REG_LR, return_address);
        }

        self.registers.set_flag(Flag::Thumb, target.get_bit(0));
        self.registers.write_pc(target & !1);
    }

    /// Writes a value loaded from memory into PC. From `ARMv5` on bit 0
    /// selects the state like BX does.
    pub(crate) fn load_program_counter(&mut self, value: u32) {
        if self.architecture() >= Architecture::V5 {
            self.registers.set_flag(Flag::Thumb, value.get_bit(0));
            self.registers.write_pc(value & !1);
        } else {
            self.registers.write_pc(value & !3);
        }
    }
}
