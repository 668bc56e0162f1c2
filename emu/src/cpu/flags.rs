//! Single-bit fields shared by the load/store encodings, as enums.

/// There are two different kinds of write or read for memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadWriteKind {
    #[default]
    Word,

    Byte,
}

impl From<bool> for ReadWriteKind {
    fn from(value: bool) -> Self {
        if value { Self::Byte } else { Self::Word }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStoreKind {
    Store,
    Load,
}

impl From<bool> for LoadStoreKind {
    fn from(b: bool) -> Self {
        if b { Self::Load } else { Self::Store }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indexing {
    /// Add offset after transfer, the base is always written back.
    Post,

    /// Add offset before transfer.
    Pre,
}

impl From<bool> for Indexing {
    fn from(state: bool) -> Self {
        if state { Self::Pre } else { Self::Post }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offsetting {
    /// Subtract the offset from base.
    Down,

    /// Add the offset to base.
    Up,
}

impl From<bool> for Offsetting {
    fn from(state: bool) -> Self {
        if state { Self::Up } else { Self::Down }
    }
}

impl Offsetting {
    #[must_use]
    pub const fn apply(self, base: u32, offset: u32) -> u32 {
        match self {
            Self::Down => base.wrapping_sub(offset),
            Self::Up => base.wrapping_add(offset),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftKind {
    Lsl,
    Lsr,
    Asr,
    Ror,
}

impl From<u32> for ShiftKind {
    /// Only the two low bits are looked at.
    fn from(op: u32) -> Self {
        match op & 0b11 {
            0 => Self::Lsl,
            1 => Self::Lsr,
            2 => Self::Asr,
            _ => Self::Ror,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn offsetting_wraps() {
        assert_eq!(Offsetting::Up.apply(0xFFFF_FFFC, 8), 4);
        assert_eq!(Offsetting::Down.apply(4, 8), 0xFFFF_FFFC);
    }

    #[test]
    fn from_bits() {
        assert_eq!(Indexing::from(true), Indexing::Pre);
        assert_eq!(LoadStoreKind::from(false), LoadStoreKind::Store);
        assert_eq!(ReadWriteKind::from(true), ReadWriteKind::Byte);
        assert_eq!(ShiftKind::from(0b110), ShiftKind::Asr);
    }
}
