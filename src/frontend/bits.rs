//! Fixed-width immediates and bit extraction helpers.
//!
//! Decoders slice instruction words into [`Imm<N>`] fields. An `Imm<N>`
//! guarantees only that its value fits in `N` bits; whether a value is legal
//! for a given instruction is decided by the translator.

use std::fmt;

/// Bits `hi..=lo` of `word`, shifted down.
#[inline]
pub const fn bits(word: u32, hi: u32, lo: u32) -> u32 {
    (word >> lo) & (u32::MAX >> (31 - (hi - lo)))
}

#[inline]
pub const fn bit(word: u32, n: u32) -> bool {
    (word >> n) & 1 != 0
}

/// Sign-extend the low `width` bits of `value`.
#[inline]
pub const fn sign_extend(value: u64, width: u32) -> i64 {
    let shift = 64 - width;
    ((value << shift) as i64) >> shift
}

/// An unsigned immediate of exactly `N` bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Imm<const N: usize>(u32);

impl<const N: usize> Imm<N> {
    pub const MASK: u32 = if N >= 32 { u32::MAX } else { (1u32 << N) - 1 };

    /// Wrap `value`, which must fit in `N` bits.
    pub fn new(value: u32) -> Self {
        assert!(value & !Self::MASK == 0, "value {value:#x} does not fit in {N} bits");
        Self(value)
    }

    /// Extract `N` bits of `word` starting at bit `lsb`.
    pub const fn extract(word: u32, lsb: u32) -> Self {
        Self((word >> lsb) & Self::MASK)
    }

    pub const fn value(self) -> u32 {
        self.0
    }

    pub const fn zero_extend(self) -> u64 {
        self.0 as u64
    }

    pub const fn sign_extend(self) -> i64 {
        sign_extend(self.0 as u64, N as u32)
    }

    /// Sign-extend, reinterpreted as unsigned (two's complement offset).
    pub const fn sign_extend_u64(self) -> u64 {
        self.sign_extend() as u64
    }

    pub const fn bit(self, n: u32) -> bool {
        bit(self.0, n)
    }

    pub const fn width(self) -> usize {
        N
    }
}

impl<const N: usize> PartialEq<u32> for Imm<N> {
    fn eq(&self, other: &u32) -> bool {
        self.0 == *other
    }
}

impl<const N: usize> fmt::Display for Imm<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}
