//! # Bit manipulation helpers
//!
//! Every decoder and handler in the core speaks in terms of bit fields, so
//! these helpers are the common vocabulary. Two flavours exist:
//!
//! - the [`Bits`] trait, implemented for the unsigned integer types, with
//!   range based accessors (`word.get_bits(16..=19)`);
//! - free functions over `u32` using the `from`/`to` convention of the ARM
//!   reference manuals (`get_bits(word, 19, 16)`), which validate their
//!   input and return [`BitsError`] on a malformed range.
//!
//! Bit indexes go from lsb to msb (right to left).

use std::ops::RangeInclusive;

use crate::error::BitsError;

/// Contains some helper methods to manipulate bits,
/// the index (`bit_idx`) is supposed to be from lsb to msb (right to left)
pub trait Bits: Copy {
    fn is_bit_on(self, bit_idx: u8) -> bool;

    /// Clears the bit and then sets it to `value`.
    fn set_bit(&mut self, bit_idx: u8, value: bool);

    fn get_bits(self, bits_range: RangeInclusive<u8>) -> Self;

    /// Returns a sign-extended copy of the value.
    /// `number_of_bits` is the width of the two's complement value we
    /// want to widen, it must be at least 1.
    fn sign_extended(self, number_of_bits: u8) -> Self;

    fn is_bit_off(self, bit_idx: u8) -> bool {
        !self.is_bit_on(bit_idx)
    }

    fn get_bit(self, bit_idx: u8) -> bool {
        self.is_bit_on(bit_idx)
    }

    fn set_bit_on(&mut self, bit_idx: u8) {
        self.set_bit(bit_idx, true);
    }

    fn set_bit_off(&mut self, bit_idx: u8) {
        self.set_bit(bit_idx, false);
    }
}

macro_rules! impl_bits {
    ($($unsigned:ty => $signed:ty),* $(,)?) => {$(
        impl Bits for $unsigned {
            fn is_bit_on(self, bit_idx: u8) -> bool {
                debug_assert!(u32::from(bit_idx) < <$unsigned>::BITS);
                (self >> bit_idx) & 1 == 1
            }

            fn set_bit(&mut self, bit_idx: u8, value: bool) {
                debug_assert!(u32::from(bit_idx) < <$unsigned>::BITS);
                let mask: $unsigned = 1 << bit_idx;
                *self &= !mask;
                *self |= <$unsigned>::from(value) << bit_idx;
            }

            fn get_bits(self, bits_range: RangeInclusive<u8>) -> Self {
                let start = *bits_range.start();
                let end = *bits_range.end();
                debug_assert!(start <= end && u32::from(end) < <$unsigned>::BITS);

                let length = u32::from(end - start) + 1;
                let value = self >> start;
                if length >= <$unsigned>::BITS {
                    value
                } else {
                    let mask: $unsigned = (1 << length) - 1;
                    value & mask
                }
            }

            fn sign_extended(self, number_of_bits: u8) -> Self {
                debug_assert!(number_of_bits > 0 && u32::from(number_of_bits) <= <$unsigned>::BITS);
                let unused = <$unsigned>::BITS - u32::from(number_of_bits);
                (((self << unused) as $signed) >> unused) as $unsigned
            }
        }
    )*};
}

impl_bits!(u8 => i8, u16 => i16, u32 => i32, u64 => i64);

/// Extracts the inclusive bit range `from..=to` of `word`, where `from` is
/// the most significant index. `from == to` extracts a single bit.
pub const fn get_bits(word: u32, from: u8, to: u8) -> Result<u32, BitsError> {
    if from < to || from > 31 {
        return Err(BitsError::InvalidRange { from, to });
    }

    let length = (from - to) as u32 + 1;
    let value = word >> to;
    if length == 32 {
        Ok(value)
    } else {
        let mask: u32 = (1 << length) - 1;
        Ok(value & mask)
    }
}

/// Arithmetic shift right: the word is shifted logically and, if the
/// original sign bit was set, the vacated high bits are filled with ones.
/// Amounts of 32 or more leave only copies of the sign bit.
#[must_use]
pub const fn shift_right_signed(word: u32, amount: u32) -> u32 {
    let negative = word & 0x8000_0000 != 0;

    if amount >= 32 {
        return if negative { u32::MAX } else { 0 };
    }

    let shifted = word >> amount;
    if negative {
        shifted | !(u32::MAX >> amount)
    } else {
        shifted
    }
}

/// Population count, used to size register lists.
#[must_use]
pub const fn count_set_bits(word: u32) -> u32 {
    word.count_ones()
}
