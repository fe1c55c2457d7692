//! A64 register names.

use std::fmt;

/// A general-purpose register number, 0..=31.
///
/// Number 31 means SP or the zero register depending on the instruction; the
/// translator helpers resolve which.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Reg(u8);

impl Reg {
    pub const R30: Reg = Reg(30);
    pub const LR: Reg = Reg(30);
    pub const SP: Reg = Reg(31);
    pub const ZR: Reg = Reg(31);

    pub fn new(n: u8) -> Self {
        assert!(n < 32, "A64 register number out of range: {n}");
        Reg(n)
    }

    /// Register from a 5-bit field.
    pub const fn from_field(field: u32) -> Self {
        Reg((field & 0x1F) as u8)
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub const fn is_31(self) -> bool {
        self.0 == 31
    }
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 31 {
            f.write_str("R31")
        } else {
            write!(f, "X{}", self.0)
        }
    }
}

/// A SIMD&FP register number, 0..=31.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VReg(u8);

impl VReg {
    pub fn new(n: u8) -> Self {
        assert!(n < 32, "A64 vector register number out of range: {n}");
        VReg(n)
    }

    pub const fn from_field(field: u32) -> Self {
        VReg((field & 0x1F) as u8)
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for VReg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "V{}", self.0)
    }
}
