//! # ARM7 register file
//!
//! 37 physical registers, of which 17 or 18 are visible at any time.
//!
//! ```text
//!  User/System  FIQ        IRQ        SVC        ABT        UND
//!  R0-R7 ──────────────────── shared ─────────────────────────────
//!  R8-R12       R8_fiq-R12_fiq  ────── shared with User ──────────
//!  R13          R13_fiq    R13_irq    R13_svc    R13_abt    R13_und
//!  R14          R14_fiq    R14_irq    R14_svc    R14_abt    R14_und
//!  R15 (PC) ───────────────── shared ─────────────────────────────
//!  CPSR ───────────────────── shared ─────────────────────────────
//!  -            SPSR_fiq   SPSR_irq   SPSR_svc   SPSR_abt   SPSR_und
//! ```
//!
//! The file keeps a small bank table telling which physical slot logical
//! R8-R14 and the SPSR resolve to in the current mode. The table is
//! recomputed every time the mode bits of the CPSR change, whatever the
//! path (mode switch, CPSR write, MSR, SPSR restore).
//!
//! R15 is only reachable through [`RegisterFile::read_pc`] and
//! [`RegisterFile::write_pc`]. Writes are recorded so the fetch pipeline
//! knows it has to refill.

use crate::cpu::cpu_modes::Mode;
use crate::cpu::psr::{Flag, Psr};

/// Stack Pointer register index.
pub const REG_SP: usize = 0xD;

/// Link Register index (return address for subroutines).
pub const REG_LR: usize = 0xE;

/// Program Counter register index.
pub const REG_PROGRAM_COUNTER: usize = 0xF;

/// Physical register slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    R0,
    R1,
    R2,
    R3,
    R4,
    R5,
    R6,
    R7,
    R8,
    R9,
    R10,
    R11,
    R12,
    R13,
    R14,
    Pc,
    R8Fiq,
    R9Fiq,
    R10Fiq,
    R11Fiq,
    R12Fiq,
    R13Fiq,
    R14Fiq,
    R13Irq,
    R14Irq,
    R13Svc,
    R14Svc,
    R13Abt,
    R14Abt,
    R13Und,
    R14Und,
    Cpsr,
    SpsrFiq,
    SpsrIrq,
    SpsrSvc,
    SpsrAbt,
    SpsrUnd,
}

const PHYSICAL_REGISTERS: usize = Register::SpsrUnd as usize + 1;

/// Physical slots of logical R8-R14 in `mode`.
const fn bank_for(mode: Mode) -> [Register; 7] {
    use Register::{
        R10, R10Fiq, R11, R11Fiq, R12, R12Fiq, R13, R13Abt, R13Fiq, R13Irq, R13Svc, R13Und, R14,
        R14Abt, R14Fiq, R14Irq, R14Svc, R14Und, R8, R8Fiq, R9, R9Fiq,
    };

    match mode {
        Mode::User | Mode::System => [R8, R9, R10, R11, R12, R13, R14],
        Mode::Fiq => [R8Fiq, R9Fiq, R10Fiq, R11Fiq, R12Fiq, R13Fiq, R14Fiq],
        Mode::Irq => [R8, R9, R10, R11, R12, R13Irq, R14Irq],
        Mode::Supervisor => [R8, R9, R10, R11, R12, R13Svc, R14Svc],
        Mode::Abort => [R8, R9, R10, R11, R12, R13Abt, R14Abt],
        Mode::Undefined => [R8, R9, R10, R11, R12, R13Und, R14Und],
    }
}

const fn spsr_for(mode: Mode) -> Option<Register> {
    match mode {
        Mode::User | Mode::System => None,
        Mode::Fiq => Some(Register::SpsrFiq),
        Mode::Irq => Some(Register::SpsrIrq),
        Mode::Supervisor => Some(Register::SpsrSvc),
        Mode::Abort => Some(Register::SpsrAbt),
        Mode::Undefined => Some(Register::SpsrUnd),
    }
}

#[derive(Debug, Clone)]
pub struct RegisterFile {
    slots: [u32; PHYSICAL_REGISTERS],
    mode: Mode,
    bank: [Register; 7],
    spsr_slot: Option<Register>,
    pc_written: bool,
}

impl Default for RegisterFile {
    /// Reset state: Supervisor mode, IRQ and FIQ disabled, ARM state.
    fn default() -> Self {
        let mut cpsr = Psr::from(Mode::Supervisor);
        cpsr.set_flag(Flag::IrqDisable, true);
        cpsr.set_flag(Flag::FiqDisable, true);

        let mut slots = [0; PHYSICAL_REGISTERS];
        slots[Register::Cpsr as usize] = cpsr.into();

        Self {
            slots,
            mode: Mode::Supervisor,
            bank: bank_for(Mode::Supervisor),
            spsr_slot: spsr_for(Mode::Supervisor),
            pc_written: false,
        }
    }
}

impl RegisterFile {
    /// Reads logical register `reg` (0-15) in the current mode.
    #[must_use]
    pub fn read(&self, reg: usize) -> u32 {
        match reg {
            0..=7 => self.slots[reg],
            8..=14 => self.slots[self.bank[reg - 8] as usize],
            _ => {
                debug_assert_eq!(reg, REG_PROGRAM_COUNTER, "invalid register index {reg}");
                self.read_pc()
            }
        }
    }

    /// Writes logical register `reg` (0-15) in the current mode.
    pub fn write(&mut self, reg: usize, value: u32) {
        match reg {
            0..=7 => self.slots[reg] = value,
            8..=14 => self.slots[self.bank[reg - 8] as usize] = value,
            _ => {
                debug_assert_eq!(reg, REG_PROGRAM_COUNTER, "invalid register index {reg}");
                self.write_pc(value);
            }
        }
    }

    /// Reads logical register `reg` as seen from User mode.
    #[must_use]
    pub fn read_user(&self, reg: usize) -> u32 {
        match reg {
            0..=14 => self.slots[reg],
            _ => self.read_pc(),
        }
    }

    /// Writes logical register `reg` as seen from User mode.
    pub fn write_user(&mut self, reg: usize, value: u32) {
        match reg {
            0..=14 => self.slots[reg] = value,
            _ => self.write_pc(value),
        }
    }

    #[must_use]
    pub const fn read_physical(&self, reg: Register) -> u32 {
        self.slots[reg as usize]
    }

    #[must_use]
    pub const fn read_pc(&self) -> u32 {
        self.slots[Register::Pc as usize]
    }

    pub const fn write_pc(&mut self, value: u32) {
        self.slots[Register::Pc as usize] = value;
        self.pc_written = true;
    }

    /// Moves PC without flagging a branch. Used by the fetch pipeline.
    pub(crate) const fn set_pc_unflagged(&mut self, value: u32) {
        self.slots[Register::Pc as usize] = value;
    }

    /// Returns whether PC was written since the last call and clears the flag.
    pub const fn take_pc_written(&mut self) -> bool {
        let written = self.pc_written;
        self.pc_written = false;
        written
    }

    #[must_use]
    pub const fn read_cpsr(&self) -> u32 {
        self.slots[Register::Cpsr as usize]
    }

    #[must_use]
    pub const fn cpsr(&self) -> Psr {
        Psr::new(self.read_cpsr())
    }

    /// Writes the whole CPSR. Mode bits that do not name a mode are replaced
    /// by the current mode so the bank table stays consistent.
    pub fn write_cpsr(&mut self, value: u32) {
        let mut psr = Psr::new(value);
        let mode = psr.mode().unwrap_or_else(|e| {
            tracing::warn!("CPSR write 0x{value:08X} with {e}, keeping {:?}", self.mode);
            self.mode
        });
        psr.set_mode(mode);

        self.slots[Register::Cpsr as usize] = psr.into();
        self.rebank(mode);
    }

    /// SPSR of the current mode, `None` in User and System mode.
    #[must_use]
    pub fn read_spsr(&self) -> Option<u32> {
        self.spsr_slot.map(|slot| self.slots[slot as usize])
    }

    /// Does nothing in User and System mode.
    pub fn write_spsr(&mut self, value: u32) {
        match self.spsr_slot {
            Some(slot) => self.slots[slot as usize] = value,
            None => tracing::debug!("SPSR write in {:?} mode ignored", self.mode),
        }
    }

    #[must_use]
    pub const fn current_mode(&self) -> Mode {
        self.mode
    }

    /// Changes the CPSR mode bits and switches bank.
    pub fn set_mode(&mut self, mode: Mode) {
        let mut psr = self.cpsr();
        psr.set_mode(mode);
        self.slots[Register::Cpsr as usize] = psr.into();
        self.rebank(mode);
    }

    #[must_use]
    pub fn is_flag(&self, flag: Flag) -> bool {
        self.cpsr().is_flag(flag)
    }

    pub fn set_flag(&mut self, flag: Flag, value: bool) {
        let mut psr = self.cpsr();
        psr.set_flag(flag, value);
        self.slots[Register::Cpsr as usize] = psr.into();
    }

    /// Overwrites N, Z, C and V.
    pub fn set_nzcv(&mut self, n: bool, z: bool, c: bool, v: bool) {
        let mut psr = self.cpsr();
        psr.set_flag(Flag::Negative, n);
        psr.set_flag(Flag::Zero, z);
        psr.set_flag(Flag::Carry, c);
        psr.set_flag(Flag::Overflow, v);
        self.slots[Register::Cpsr as usize] = psr.into();
    }

    fn rebank(&mut self, mode: Mode) {
        self.mode = mode;
        self.bank = bank_for(mode);
        self.spsr_slot = spsr_for(mode);
    }
}
