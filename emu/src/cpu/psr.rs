//! # Program Status Registers (CPSR and SPSR)
//!
//! The PSR contains condition flags (N, Z, C, V, Q) and control bits (mode, state, interrupts).
//!
//! ```text
//! 31 30 29 28 27 26      8 7 6 5 4   0
//! ┌──┬──┬──┬──┬──┬────────┬─┬─┬─┬─────┐
//! │N │Z │C │V │Q │Reserved│I│F│T│Mode │
//! └──┴──┴──┴──┴──┴────────┴─┴─┴─┴─────┘
//! ```
//!
//! - **Flags (28-31)**: See [`condition`](super::condition) for how these are tested
//! - **Q (27)**: sticky saturation flag, only cleared by an explicit MSR
//! - **Mode (0-4)**: See `cpu_modes` for operating modes
//! - **T bit (5)**: ARM (0) or Thumb (1) state
//! - **I/F bits (6-7)**: IRQ/FIQ disable
//!
//! Each exception mode has a **SPSR** to save CPSR on exception entry.

use serde::{Deserialize, Serialize};

use crate::bitwise::Bits;
use crate::cpu::arm::alu_instruction::ArithmeticOpResult;
use crate::cpu::{condition::Condition, cpu_modes::Mode};
use crate::error::ModeError;

/// Single bits of a PSR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    /// N, bit 31.
    Negative,
    /// Z, bit 30.
    Zero,
    /// C, bit 29.
    Carry,
    /// V, bit 28.
    Overflow,
    /// Q, bit 27.
    Saturation,
    /// I, bit 7.
    IrqDisable,
    /// F, bit 6.
    FiqDisable,
    /// T, bit 5.
    Thumb,
}

impl Flag {
    #[must_use]
    pub const fn bit(self) -> u8 {
        match self {
            Self::Negative => 31,
            Self::Zero => 30,
            Self::Carry => 29,
            Self::Overflow => 28,
            Self::Saturation => 27,
            Self::IrqDisable => 7,
            Self::FiqDisable => 6,
            Self::Thumb => 5,
        }
    }
}

/// Program Status Register (CPSR or SPSR).
///
/// The `Psr` struct wraps a raw `u32` and provides type-safe accessors for
/// each field. It's used for both CPSR (current) and SPSR (saved) registers.
///
/// # Example
///
/// ```
/// use emu::cpu::psr::{Flag, Psr};
///
/// let mut cpsr = Psr::default();
///
/// cpsr.set_flag(Flag::Zero, true);
/// assert!(cpsr.zero_flag());
/// assert!(cpsr.is_flag(Flag::Zero));
/// ```
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Psr(u32);

impl Psr {
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub fn can_execute(self, cond: Condition) -> bool {
        use Condition::{AL, CC, CS, EQ, GE, GT, HI, LE, LS, LT, MI, NE, NV, PL, VC, VS};
        match cond {
            EQ => self.zero_flag(),                         // Equal (Z=1)
            NE => !self.zero_flag(),                        // Not equal (Z=0)
            CS => self.carry_flag(),                        // Unsigned higher or same (C=1)
            CC => !self.carry_flag(),                       // Unsigned lower (C=0)
            MI => self.sign_flag(),                         // Negative (N=1)
            PL => !self.sign_flag(),                        // Positive or zero (N=0)
            VS => self.overflow_flag(),                     // Overflow (V=1)
            VC => !self.overflow_flag(),                    // No overflow (V=0)
            HI => self.carry_flag() && !self.zero_flag(),   // Unsigned higher (C=1 and Z=0)
            LS => !self.carry_flag() || self.zero_flag(),   // Unsigned lower or same (C=0 or Z=1)
            GE => self.sign_flag() == self.overflow_flag(), // Greater or equal (N=V)
            LT => self.sign_flag() != self.overflow_flag(), // Less than (N<>V)
            GT => !self.zero_flag() && (self.sign_flag() == self.overflow_flag()), // Greater than (Z=0 and N=V)
            LE => self.zero_flag() || (self.sign_flag() != self.overflow_flag()), // Less or equal (Z=1 or N<>V)
            AL => true,  // Always
            NV => false, // Never
        }
    }

    #[must_use]
    pub fn is_flag(self, flag: Flag) -> bool {
        self.0.get_bit(flag.bit())
    }

    pub fn set_flag(&mut self, flag: Flag, value: bool) {
        self.0.set_bit(flag.bit(), value);
    }

    /// N => Bit 31, (0=Not Signed, 1=Signed)
    #[must_use]
    pub fn sign_flag(self) -> bool {
        self.is_flag(Flag::Negative)
    }

    /// Z => Bit 30, (0=Not Zero, 1=Zero)
    #[must_use]
    pub fn zero_flag(self) -> bool {
        self.is_flag(Flag::Zero)
    }

    /// C => Bit 29, (0=Borrow/No Carry, 1=Carry/No Borrow)
    #[must_use]
    pub fn carry_flag(self) -> bool {
        self.is_flag(Flag::Carry)
    }

    /// V => Bit 28, (0=No Overflow, 1=Overflow)
    #[must_use]
    pub fn overflow_flag(self) -> bool {
        self.is_flag(Flag::Overflow)
    }

    /// Q => Bit 27, (1=Sticky Overflow, `ARMv5TE` and up only)
    #[must_use]
    pub fn sticky_overflow(self) -> bool {
        self.is_flag(Flag::Saturation)
    }

    /// I => Bit 7, (0=Enable, 1=Disable)
    #[must_use]
    pub fn irq_disable(self) -> bool {
        self.is_flag(Flag::IrqDisable)
    }

    /// F => Bit 6, (0=Enable, 1=Disable)
    #[must_use]
    pub fn fiq_disable(self) -> bool {
        self.is_flag(Flag::FiqDisable)
    }

    #[must_use]
    pub const fn mode_bits(self) -> u32 {
        self.0 & 0b1_1111
    }

    /// Fails when M4-M0 do not name a mode (the BIOS sometimes leaves such
    /// values in a SPSR).
    pub fn mode(self) -> Result<Mode, ModeError> {
        Mode::try_from(self.mode_bits())
    }

    /// The Mode Bits M4-M0 contain the current operating mode.
    pub const fn set_mode(&mut self, m: Mode) {
        self.0 &= !0b1_1111;
        self.0 |= m as u32;
    }

    /// Sets N, Z, C and V from an ALU result.
    pub fn set_flags(&mut self, op_result: &ArithmeticOpResult) {
        self.set_flag(Flag::Negative, op_result.sign);
        self.set_flag(Flag::Zero, op_result.zero);
        self.set_flag(Flag::Carry, op_result.carry);
        self.set_flag(Flag::Overflow, op_result.overflow);
    }
}

impl From<Mode> for Psr {
    fn from(m: Mode) -> Self {
        let mut s = Self(0);

        s.set_mode(m);

        s
    }
}

impl From<Psr> for u32 {
    fn from(p: Psr) -> Self {
        p.0
    }
}

impl From<u32> for Psr {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn flags_do_not_disturb_each_other() {
        let mut psr = Psr::from(Mode::Irq);
        for flag in [
            Flag::Negative,
            Flag::Zero,
            Flag::Carry,
            Flag::Overflow,
            Flag::Saturation,
            Flag::IrqDisable,
            Flag::FiqDisable,
            Flag::Thumb,
        ] {
            psr.set_flag(flag, true);
            assert!(psr.is_flag(flag));
        }
        assert_eq!(u32::from(psr), 0xF800_00F2);

        psr.set_flag(Flag::Carry, false);
        assert!(!psr.carry_flag());
        assert!(psr.zero_flag());
        assert!(psr.overflow_flag());
        assert_eq!(psr.mode(), Ok(Mode::Irq));
    }

    #[test]
    fn set_mode_keeps_other_bits() {
        let mut psr = Psr::new(0xF000_00DF);
        psr.set_mode(Mode::Fiq);
        assert_eq!(u32::from(psr), 0xF000_00D1);
    }

    #[test]
    fn invalid_mode_bits() {
        assert_eq!(Psr::new(0).mode(), Err(ModeError::InvalidBits(0)));
    }

    #[test]
    fn unsigned_lower_or_same() {
        let mut psr = Psr::default();
        // C=0, Z=0
        assert!(psr.can_execute(Condition::LS));
        psr.set_flag(Flag::Carry, true);
        assert!(!psr.can_execute(Condition::LS));
        psr.set_flag(Flag::Zero, true);
        assert!(psr.can_execute(Condition::LS));
    }
}
