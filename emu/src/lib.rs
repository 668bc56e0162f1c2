#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
#[allow(clippy::cast_possible_wrap)]
pub mod bitwise;

#[allow(clippy::missing_panics_doc)]
#[allow(clippy::cast_lossless)]
#[allow(clippy::unreadable_literal)]
pub mod bus;

pub mod clock;
pub mod config;
pub mod cpu;
pub mod error;

#[allow(clippy::cast_possible_truncation)]
pub mod memory;
pub mod tick_queue;

pub use bus::{Arm7Bus, CodeBus, DataBus, SystemBus};
pub use clock::{Clock, ClockSync, FreeRunningClock};
pub use config::{Architecture, BusTimings, CpuConfig, TimingTable};
pub use cpu::arm7::Arm7;
pub use cpu::exception::ExceptionKind;
pub use error::{BitsError, DecodeError, ModeError};
