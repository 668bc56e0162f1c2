//! # Exceptions
//!
//! | Exception      | Mode       | Vector | High vector | LR              |
//! |----------------|------------|--------|-------------|-----------------|
//! | Reset          | Supervisor | 0x00   | 0xFFFF0000  | -               |
//! | Undefined      | Undefined  | 0x04   | 0xFFFF0004  | instruction + 4 |
//! | SWI            | Supervisor | 0x08   | 0xFFFF0008  | instruction + 4 |
//! | Prefetch abort | Abort      | 0x0C   | 0xFFFF000C  | instruction + 4 |
//! | Data abort     | Abort      | 0x10   | 0xFFFF0010  | instruction + 8 |
//! | IRQ            | IRQ        | 0x18   | 0xFFFF0018  | next + 4        |
//! | FIQ            | FIQ        | 0x1C   | 0xFFFF001C  | next + 4        |
//!
//! On entry the CPSR is saved in the SPSR of the target mode, the core
//! switches to ARM state with IRQ disabled (and FIQ too for Reset and FIQ)
//! and jumps to the vector.

use serde::{Deserialize, Serialize};

use crate::bus::SystemBus;
use crate::cpu::arm7::Arm7;
use crate::cpu::cpu_modes::Mode;
use crate::cpu::psr::Flag;
use crate::cpu::registers::REG_LR;

const HIGH_VECTORS_BASE: u32 = 0xFFFF_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExceptionKind {
    Reset,
    Undefined,
    SoftwareInterrupt,
    PrefetchAbort,
    DataAbort,
    Irq,
    Fiq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExceptionDescriptor {
    pub kind: ExceptionKind,
    pub mode: Mode,
    pub normal_vector: u32,
    pub high_vector: u32,
    /// Added to the base address to form LR. `None` leaves LR alone.
    pub link_offset: Option<u32>,
}

impl ExceptionKind {
    pub const ALL: [Self; 7] = [
        Self::Reset,
        Self::Undefined,
        Self::SoftwareInterrupt,
        Self::PrefetchAbort,
        Self::DataAbort,
        Self::Irq,
        Self::Fiq,
    ];

    #[must_use]
    pub const fn descriptor(self) -> ExceptionDescriptor {
        let (mode, vector, link_offset) = match self {
            Self::Reset => (Mode::Supervisor, 0x00, None),
            Self::Undefined => (Mode::Undefined, 0x04, Some(4)),
            Self::SoftwareInterrupt => (Mode::Supervisor, 0x08, Some(4)),
            Self::PrefetchAbort => (Mode::Abort, 0x0C, Some(4)),
            Self::DataAbort => (Mode::Abort, 0x10, Some(8)),
            Self::Irq => (Mode::Irq, 0x18, Some(4)),
            Self::Fiq => (Mode::Fiq, 0x1C, Some(4)),
        };

        ExceptionDescriptor {
            kind: self,
            mode,
            normal_vector: vector,
            high_vector: HIGH_VECTORS_BASE | vector,
            link_offset,
        }
    }

    /// Whether entering this exception also disables FIQ.
    #[must_use]
    pub const fn disables_fiq(self) -> bool {
        matches!(self, Self::Reset | Self::Fiq)
    }
}

impl<B: SystemBus> Arm7<B> {
    /// Raises `kind` if the CPSR masks allow it. Returns whether it was taken.
    pub fn request_exception(&mut self, kind: ExceptionKind) -> bool {
        let cpsr = self.registers.cpsr();

        let masked = if self.config().architectural_exception_masking {
            match kind {
                ExceptionKind::Irq => cpsr.irq_disable(),
                ExceptionKind::Fiq => cpsr.fiq_disable(),
                _ => false,
            }
        } else {
            cpsr.irq_disable() || (kind == ExceptionKind::Fiq && cpsr.fiq_disable())
        };

        if masked {
            tracing::debug!("{kind:?} masked by CPSR 0x{:08X}", u32::from(cpsr));
            return false;
        }

        self.enter_exception(kind);
        true
    }

    pub(crate) fn enter_exception(&mut self, kind: ExceptionKind) {
        let descriptor = kind.descriptor();
        let old_cpsr = self.registers.read_cpsr();
        let base = self.exception_base();

        self.registers.set_mode(descriptor.mode);
        self.registers.write_spsr(old_cpsr);
        if let Some(offset) = descriptor.link_offset {
            self.registers.write(REG_LR, base.wrapping_add(offset));
        }

        self.registers.set_flag(Flag::Thumb, false);
        self.registers.set_flag(Flag::IrqDisable, true);
        if kind.disables_fiq() {
            self.registers.set_flag(Flag::FiqDisable, true);
        }

        let vector = if self.config().high_vectors {
            descriptor.high_vector
        } else {
            descriptor.normal_vector
        };

        tracing::debug!("{kind:?} from 0x{base:08X}, vector 0x{vector:08X}");
        self.registers.write_pc(vector);
    }
}
