#[allow(clippy::cast_possible_truncation)]
pub mod internal_memory;
