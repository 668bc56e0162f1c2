//! CLZ, SWI, BKPT and the encodings that do nothing.

use crate::bitwise::Bits;
use crate::bus::SystemBus;
use crate::cpu::arm::handler::UndefinedReason;
use crate::cpu::arm7::Arm7;
use crate::cpu::exception::ExceptionKind;

impl<B: SystemBus> Arm7<B> {
    pub(crate) fn count_leading_zeros(&mut self, instruction: u32) {
        let rd = instruction.get_bits(12..=15) as usize;
        let rm = instruction.get_bits(0..=3) as usize;

        let zeros = self.registers.read(rm).leading_zeros();
        self.registers.write(rd, zeros);
    }

    pub(crate) fn software_interrupt(&mut self, instruction: u32) {
        let comment = instruction.get_bits(0..=23);
        tracing::debug!("SWI 0x{comment:06X}");

        self.request_exception(ExceptionKind::SoftwareInterrupt);
    }

    pub(crate) fn breakpoint(&mut self, instruction: u32) {
        let comment = (instruction.get_bits(8..=19) << 4) | instruction.get_bits(0..=3);
        tracing::debug!("BKPT 0x{comment:04X}");

        self.request_exception(ExceptionKind::PrefetchAbort);
    }

    pub(crate) fn undefined(&mut self, instruction: u32, reason: UndefinedReason) {
        match reason {
            UndefinedReason::Undefined => {
                tracing::debug!("0x{instruction:08X}: undefined instruction, skipped");
            }
            UndefinedReason::Coprocessor => {
                tracing::debug!("0x{instruction:08X}: no coprocessor, skipped");
            }
        }
    }
}
