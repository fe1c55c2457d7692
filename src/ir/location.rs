//! Location descriptors: the cache key of a translated block.
//!
//! A descriptor captures the program counter and every piece of mode state
//! that changes what the guest code at that address means. Two descriptors
//! are equal exactly when they would translate identically, so only the
//! semantically relevant bits of control registers are kept.

use std::fmt;

/// FPCR bits that affect translation (AHP, DN, FZ, RMode, FZ16).
pub const A64_FPCR_MODE_MASK: u32 = 0x07C8_0000;

/// FPSCR bits that affect translation (AHP, DN, FZ, RMode, Stride, Len).
pub const A32_FPSCR_MODE_MASK: u32 = 0x07F7_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct A64LocationDescriptor {
    pc: u64,
    fpcr: u32,
    single_stepping: bool,
}

impl A64LocationDescriptor {
    pub fn new(pc: u64, fpcr: u32, single_stepping: bool) -> Self {
        Self {
            pc,
            fpcr: fpcr & A64_FPCR_MODE_MASK,
            single_stepping,
        }
    }

    pub fn pc(&self) -> u64 {
        self.pc
    }

    /// Translation-relevant FPCR bits.
    pub fn fpcr(&self) -> u32 {
        self.fpcr
    }

    pub fn single_stepping(&self) -> bool {
        self.single_stepping
    }

    pub fn with_pc(self, pc: u64) -> Self {
        Self { pc, ..self }
    }

    pub fn advance(self, bytes: u64) -> Self {
        self.with_pc(self.pc.wrapping_add(bytes))
    }

    pub fn with_fpcr(self, fpcr: u32) -> Self {
        Self::new(self.pc, fpcr, self.single_stepping)
    }

    pub fn with_single_stepping(self, single_stepping: bool) -> Self {
        Self { single_stepping, ..self }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct A32LocationDescriptor {
    pc: u32,
    thumb: bool,
    big_endian: bool,
    fpscr_mode: u32,
    single_stepping: bool,
}

impl A32LocationDescriptor {
    pub fn new(pc: u32, thumb: bool, big_endian: bool, fpscr: u32, single_stepping: bool) -> Self {
        Self {
            pc,
            thumb,
            big_endian,
            fpscr_mode: fpscr & A32_FPSCR_MODE_MASK,
            single_stepping,
        }
    }

    pub fn arm(pc: u32) -> Self {
        Self::new(pc, false, false, 0, false)
    }

    pub fn thumb(pc: u32) -> Self {
        Self::new(pc, true, false, 0, false)
    }

    pub fn pc(&self) -> u32 {
        self.pc
    }

    pub fn is_thumb(&self) -> bool {
        self.thumb
    }

    pub fn is_big_endian(&self) -> bool {
        self.big_endian
    }

    pub fn fpscr_mode(&self) -> u32 {
        self.fpscr_mode
    }

    pub fn single_stepping(&self) -> bool {
        self.single_stepping
    }

    pub fn with_pc(self, pc: u32) -> Self {
        Self { pc, ..self }
    }

    pub fn advance(self, bytes: u32) -> Self {
        self.with_pc(self.pc.wrapping_add(bytes))
    }

    pub fn with_thumb(self, thumb: bool) -> Self {
        Self { thumb, ..self }
    }

    pub fn with_single_stepping(self, single_stepping: bool) -> Self {
        Self { single_stepping, ..self }
    }
}

/// Cache key of a translated block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocationDescriptor {
    A64(A64LocationDescriptor),
    A32(A32LocationDescriptor),
}

impl LocationDescriptor {
    pub fn pc(&self) -> u64 {
        match self {
            LocationDescriptor::A64(loc) => loc.pc(),
            LocationDescriptor::A32(loc) => loc.pc() as u64,
        }
    }

    pub fn single_stepping(&self) -> bool {
        match self {
            LocationDescriptor::A64(loc) => loc.single_stepping(),
            LocationDescriptor::A32(loc) => loc.single_stepping(),
        }
    }

    /// Same mode state at a different guest address.
    pub fn with_pc(self, pc: u64) -> Self {
        match self {
            LocationDescriptor::A64(loc) => LocationDescriptor::A64(loc.with_pc(pc)),
            LocationDescriptor::A32(loc) => LocationDescriptor::A32(loc.with_pc(pc as u32)),
        }
    }

    pub fn advance(self, bytes: u64) -> Self {
        self.with_pc(self.pc().wrapping_add(bytes))
    }
}

impl From<A64LocationDescriptor> for LocationDescriptor {
    fn from(loc: A64LocationDescriptor) -> Self {
        LocationDescriptor::A64(loc)
    }
}

impl From<A32LocationDescriptor> for LocationDescriptor {
    fn from(loc: A32LocationDescriptor) -> Self {
        LocationDescriptor::A32(loc)
    }
}

impl fmt::Display for LocationDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationDescriptor::A64(loc) => {
                write!(f, "{{a64 pc={:#x}, fpcr={:#x}", loc.pc, loc.fpcr)?;
                if loc.single_stepping {
                    f.write_str(", step")?;
                }
                f.write_str("}")
            }
            LocationDescriptor::A32(loc) => {
                write!(
                    f,
                    "{{{} pc={:#x}, {}, fpscr={:#x}",
                    if loc.thumb { "thumb" } else { "arm" },
                    loc.pc,
                    if loc.big_endian { "be" } else { "le" },
                    loc.fpscr_mode
                )?;
                if loc.single_stepping {
                    f.write_str(", step")?;
                }
                f.write_str("}")
            }
        }
    }
}
