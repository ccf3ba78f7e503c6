use std::fmt;
use std::ops::RangeInclusive;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OpcodeError {
    #[error("bit range {0}..={1} out of bounds, must be within [0, {2})")]
    RangeOutOfBounds(u32, u32, u32),
    #[error("bit range {0}..={1} is reversed")]
    RangeReversed(u32, u32),
}

pub type Result<T> = std::result::Result<T, OpcodeError>;

/// Mask covering `width` low-order bits.
pub const fn low_mask(width: u32) -> u32 {
    if width >= u32::BITS {
        u32::MAX
    } else {
        (1 << width) - 1
    }
}

/// Treats the low 16 bits of `value` as a two's-complement halfword.
pub const fn sign_extend16(value: u32) -> i32 {
    value as u16 as i16 as i32
}

/// A raw 32-bit instruction word.
///
/// Bits are numbered from 0 (least significant) to 31. Field accessors take
/// inclusive `hi..=lo` style ranges the way encoding tables are usually
/// written, e.g. `field(31, 26)` is the primary opcode.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Opcode32 {
    value: u32,
}

impl Opcode32 {
    pub const WIDTH_BITS: u32 = u32::BITS;

    pub const fn new(value: u32) -> Self {
        Self { value }
    }

    pub const fn value(&self) -> u32 {
        self.value
    }

    /// Extracts bits `hi` down to `lo`, both inclusive. Panics on a bad range;
    /// use [`Opcode32::try_field`] for runtime-supplied ranges.
    pub const fn field(&self, hi: u32, lo: u32) -> u32 {
        assert!(hi < Self::WIDTH_BITS && lo <= hi);
        (self.value >> lo) & low_mask(hi - lo + 1)
    }

    pub fn try_field(&self, hi: u32, lo: u32) -> Result<u32> {
        if hi >= Self::WIDTH_BITS {
            return Err(OpcodeError::RangeOutOfBounds(hi, lo, Self::WIDTH_BITS));
        }
        if lo > hi {
            return Err(OpcodeError::RangeReversed(hi, lo));
        }
        Ok(self.field(hi, lo))
    }

    pub fn try_field_range(&self, bits: RangeInclusive<u32>) -> Result<u32> {
        self.try_field(*bits.end(), *bits.start())
    }

    /// Returns a copy with bits `hi..=lo` replaced by the low bits of `field`.
    pub const fn with_field(self, hi: u32, lo: u32, field: u32) -> Self {
        assert!(hi < Self::WIDTH_BITS && lo <= hi);
        let mask = low_mask(hi - lo + 1) << lo;
        Self {
            value: (self.value & !mask) | ((field << lo) & mask),
        }
    }
}

impl From<u32> for Opcode32 {
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

impl From<Opcode32> for u32 {
    fn from(opcode: Opcode32) -> Self {
        opcode.value
    }
}

impl fmt::Debug for Opcode32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("0x{:08X}", self.value))
    }
}

impl fmt::Display for Opcode32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
