//! The IR type lattice.
//!
//! Every [`Value`](super::Value) has exactly one [`Type`]. Opcode signatures
//! accept a [`TypeSet`] per argument so width-polymorphic operations such as
//! `Add` can be declared once.

use std::fmt;

/// Type of an IR value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Void,
    U1,
    U8,
    U16,
    U32,
    U64,
    U128,
    /// A32 core register identifier (immediate only).
    A32Reg,
    /// A64 general purpose register identifier (immediate only).
    A64Reg,
    /// A64 SIMD&FP register identifier (immediate only).
    A64Vec,
    /// Memory access type tag (immediate only).
    AccType,
    /// Coprocessor callback descriptor (immediate only).
    CoprocCallback,
    /// Host word address for direct coprocessor access (immediate only).
    HostAddr,
}

impl Type {
    const ALL: [Type; 13] = [
        Type::Void,
        Type::U1,
        Type::U8,
        Type::U16,
        Type::U32,
        Type::U64,
        Type::U128,
        Type::A32Reg,
        Type::A64Reg,
        Type::A64Vec,
        Type::AccType,
        Type::CoprocCallback,
        Type::HostAddr,
    ];

    const fn bit(self) -> u32 {
        1 << (self as u32)
    }

    /// Width in bits of integer types.
    pub const fn bit_width(self) -> Option<usize> {
        match self {
            Type::U1 => Some(1),
            Type::U8 => Some(8),
            Type::U16 => Some(16),
            Type::U32 => Some(32),
            Type::U64 => Some(64),
            Type::U128 => Some(128),
            _ => None,
        }
    }

    /// Unsigned integer type of the given width.
    pub const fn from_bit_width(bits: usize) -> Option<Type> {
        match bits {
            1 => Some(Type::U1),
            8 => Some(Type::U8),
            16 => Some(Type::U16),
            32 => Some(Type::U32),
            64 => Some(Type::U64),
            128 => Some(Type::U128),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Type::Void => "Void",
            Type::U1 => "U1",
            Type::U8 => "U8",
            Type::U16 => "U16",
            Type::U32 => "U32",
            Type::U64 => "U64",
            Type::U128 => "U128",
            Type::A32Reg => "A32Reg",
            Type::A64Reg => "A64Reg",
            Type::A64Vec => "A64Vec",
            Type::AccType => "AccType",
            Type::CoprocCallback => "CoprocCallback",
            Type::HostAddr => "HostAddr",
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Set of types accepted by one opcode argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeSet(u32);

impl TypeSet {
    pub const U1: TypeSet = TypeSet::of(Type::U1);
    pub const U8: TypeSet = TypeSet::of(Type::U8);
    pub const U16: TypeSet = TypeSet::of(Type::U16);
    pub const U32: TypeSet = TypeSet::of(Type::U32);
    pub const U64: TypeSet = TypeSet::of(Type::U64);
    pub const U128: TypeSet = TypeSet::of(Type::U128);
    pub const U32_U64: TypeSet = TypeSet::U32.union(TypeSet::U64);
    pub const U8_U16: TypeSet = TypeSet::U8.union(TypeSet::U16);
    pub const U8_U16_U32: TypeSet = TypeSet::U8.union(TypeSet::U16).union(TypeSet::U32);
    pub const UANY: TypeSet = TypeSet::U8.union(TypeSet::U16).union(TypeSet::U32_U64);
    pub const A32_REG: TypeSet = TypeSet::of(Type::A32Reg);
    pub const A64_REG: TypeSet = TypeSet::of(Type::A64Reg);
    pub const A64_VEC: TypeSet = TypeSet::of(Type::A64Vec);
    pub const ACC_TYPE: TypeSet = TypeSet::of(Type::AccType);
    pub const COPROC_CALLBACK: TypeSet = TypeSet::of(Type::CoprocCallback);
    pub const HOST_ADDR: TypeSet = TypeSet::of(Type::HostAddr);

    pub const fn of(ty: Type) -> TypeSet {
        TypeSet(ty.bit())
    }

    pub const fn union(self, other: TypeSet) -> TypeSet {
        TypeSet(self.0 | other.0)
    }

    pub const fn contains(self, ty: Type) -> bool {
        self.0 & ty.bit() != 0
    }
}

impl fmt::Display for TypeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for ty in Type::ALL.iter().filter(|ty| self.contains(**ty)) {
            if !first {
                f.write_str("|")?;
            }
            f.write_str(ty.name())?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_set_membership() {
        assert!(TypeSet::U32_U64.contains(Type::U32));
        assert!(TypeSet::U32_U64.contains(Type::U64));
        assert!(!TypeSet::U32_U64.contains(Type::U128));
        assert!(TypeSet::UANY.contains(Type::U8));
        assert!(!TypeSet::UANY.contains(Type::U1));
    }

    #[test]
    fn test_type_set_display() {
        assert_eq!(TypeSet::U32_U64.to_string(), "U32|U64");
        assert_eq!(TypeSet::A64_REG.to_string(), "A64Reg");
    }

    #[test]
    fn test_width_round_trip() {
        for bits in [1, 8, 16, 32, 64, 128] {
            assert_eq!(Type::from_bit_width(bits).and_then(Type::bit_width), Some(bits));
        }
        assert_eq!(Type::from_bit_width(24), None);
    }
}
