pub mod arm;

#[allow(clippy::module_name_repetitions)]
pub mod arm7;
pub mod condition;
pub mod cpu_modes;
pub mod exception;
pub mod flags;
pub mod psr;

#[allow(clippy::cast_possible_truncation)]
pub mod registers;
