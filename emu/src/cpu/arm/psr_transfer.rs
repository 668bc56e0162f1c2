//! MRS and MSR.
//!
//! MSR writes the PSR one byte lane at a time, bits 19-16 of the
//! instruction select the lanes:
//!
//! ```text
//! bit 19  f  flags      31-24
//! bit 18  s  status     23-16
//! bit 17  x  extension  15-8
//! bit 16  c  control     7-0
//! ```

use crate::bitwise::Bits;
use crate::bus::SystemBus;
use crate::cpu::arm::alu_instruction::rotated_immediate;
use crate::cpu::arm7::Arm7;
use crate::cpu::psr::Flag;

const LANES: [(u8, u32); 4] = [
    (16, 0x0000_00FF),
    (17, 0x0000_FF00),
    (18, 0x00FF_0000),
    (19, 0xFF00_0000),
];

/// Byte mask of the lanes selected by the field mask of an MSR.
#[must_use]
pub fn field_mask(instruction: u32) -> u32 {
    LANES
        .iter()
        .filter(|(bit, _)| instruction.get_bit(*bit))
        .fold(0, |mask, (_, lane)| mask | lane)
}

impl<B: SystemBus> Arm7<B> {
    pub(crate) fn move_status_to_register(&mut self, instruction: u32, spsr: bool) {
        let rd = instruction.get_bits(12..=15) as usize;

        let value = if spsr {
            self.registers.read_spsr().unwrap_or_else(|| {
                tracing::debug!(
                    "MRS SPSR in {:?} mode reads CPSR",
                    self.registers.current_mode()
                );
                self.registers.read_cpsr()
            })
        } else {
            self.registers.read_cpsr()
        };

        self.registers.write(rd, value);
    }

    pub(crate) fn move_to_status_register(&mut self, instruction: u32, spsr: bool, immediate: bool) {
        let value = if immediate {
            rotated_immediate(
                instruction.get_bits(0..=7),
                instruction.get_bits(8..=11),
                false,
            )
            .result
        } else {
            self.registers.read(instruction.get_bits(0..=3) as usize)
        };
        let mask = field_mask(instruction);

        if spsr {
            match self.registers.read_spsr() {
                Some(old) => self.registers.write_spsr((old & !mask) | (value & mask)),
                None => tracing::debug!(
                    "MSR SPSR in {:?} mode ignored",
                    self.registers.current_mode()
                ),
            }
            return;
        }

        if !self.registers.current_mode().is_privileged() {
            tracing::debug!("MSR CPSR in User mode ignored");
            return;
        }

        let old = self.registers.read_cpsr();
        let new = (old & !mask) | (value & mask);

        if new.get_bit(Flag::Thumb.bit()) != old.get_bit(Flag::Thumb.bit()) {
            tracing::warn!("MSR changes the state bit, CPSR 0x{old:08X} -> 0x{new:08X}");
        }

        self.registers.write_cpsr(new);
    }
}
