//! # Processor modes
//!
//! | Mode       | M[4:0] | Banked registers | SPSR |
//! |------------|--------|------------------|------|
//! | User       | 10000  | -                | no   |
//! | FIQ        | 10001  | R8-R14           | yes  |
//! | IRQ        | 10010  | R13, R14         | yes  |
//! | Supervisor | 10011  | R13, R14         | yes  |
//! | Abort      | 10111  | R13, R14         | yes  |
//! | Undefined  | 11011  | R13, R14         | yes  |
//! | System     | 11111  | - (shares User)  | no   |

use serde::{Deserialize, Serialize};

use crate::error::ModeError;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum Mode {
    /// The normal ARM program execution state.
    User = 0b10000,

    /// Designed to support a data transfer or channel process.
    Fiq = 0b10001,

    /// Used for general-purpose interrupt handling.
    Irq = 0b10010,

    /// Protected mode for the operating system
    Supervisor = 0b10011,

    /// Entered after a data or instruction prefetch abort.
    Abort = 0b10111,

    /// Entered when an undefined instruction is executed
    Undefined = 0b11011,

    /// A privileged user mode for the operating system.
    System = 0b11111,
}

impl Mode {
    /// User and System share registers and have no SPSR.
    #[must_use]
    pub const fn has_spsr(self) -> bool {
        !matches!(self, Self::User | Self::System)
    }

    #[must_use]
    pub const fn is_privileged(self) -> bool {
        !matches!(self, Self::User)
    }
}

impl From<Mode> for u32 {
    fn from(m: Mode) -> Self {
        m as Self
    }
}

impl TryFrom<u32> for Mode {
    type Error = ModeError;

    fn try_from(n: u32) -> Result<Self, Self::Error> {
        match n {
            0b10000 => Ok(Self::User),
            0b10001 => Ok(Self::Fiq),
            0b10010 => Ok(Self::Irq),
            0b10011 => Ok(Self::Supervisor),
            0b10111 => Ok(Self::Abort),
            0b11011 => Ok(Self::Undefined),
            0b11111 => Ok(Self::System),
            _ => Err(ModeError::InvalidBits(n)),
        }
    }
}
