//! IR values.
//!
//! A [`Value`] is either the result of an instruction in the same block
//! (referenced by [`InstRef`], produced exactly once) or an immediate. Values
//! are `Copy` and carry their type, so operand checking never has to look back
//! into the block.

use std::fmt;

use super::{AccType, Type};
use crate::frontend::a32::coprocessor::{CoprocCallback, HostAddr};
use crate::frontend::a32::Reg as A32Reg;
use crate::frontend::a64::{Reg as A64Reg, VReg};

/// Index of an instruction within its block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstRef(pub u32);

impl InstRef {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for InstRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    /// Result of an instruction that produces nothing.
    Void,
    Inst { inst: InstRef, ty: Type },
    U1(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    A32Reg(A32Reg),
    A64Reg(A64Reg),
    A64Vec(VReg),
    AccType(AccType),
    CoprocCallback(CoprocCallback),
    HostAddr(HostAddr),
}

impl Value {
    pub fn ty(&self) -> Type {
        match self {
            Value::Void => Type::Void,
            Value::Inst { ty, .. } => *ty,
            Value::U1(_) => Type::U1,
            Value::U8(_) => Type::U8,
            Value::U16(_) => Type::U16,
            Value::U32(_) => Type::U32,
            Value::U64(_) => Type::U64,
            Value::A32Reg(_) => Type::A32Reg,
            Value::A64Reg(_) => Type::A64Reg,
            Value::A64Vec(_) => Type::A64Vec,
            Value::AccType(_) => Type::AccType,
            Value::CoprocCallback(_) => Type::CoprocCallback,
            Value::HostAddr(_) => Type::HostAddr,
        }
    }

    pub fn is_immediate(&self) -> bool {
        !matches!(self, Value::Inst { .. } | Value::Void)
    }

    pub fn inst_ref(&self) -> Option<InstRef> {
        match self {
            Value::Inst { inst, .. } => Some(*inst),
            _ => None,
        }
    }

    /// Integer immediate zero-extended to 64 bits.
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Value::U1(v) => Some(v as u64),
            Value::U8(v) => Some(v as u64),
            Value::U16(v) => Some(v as u64),
            Value::U32(v) => Some(v as u64),
            Value::U64(v) => Some(v),
            _ => None,
        }
    }

    /// Build an integer immediate of type `ty`, truncating `value`.
    pub fn imm_of_type(ty: Type, value: u64) -> Option<Value> {
        match ty {
            Type::U1 => Some(Value::U1(value & 1 != 0)),
            Type::U8 => Some(Value::U8(value as u8)),
            Type::U16 => Some(Value::U16(value as u16)),
            Type::U32 => Some(Value::U32(value as u32)),
            Type::U64 => Some(Value::U64(value)),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => f.write_str("<void>"),
            Value::Inst { inst, .. } => write!(f, "{inst}"),
            Value::U1(v) => write!(f, "#{}", *v as u8),
            Value::U8(v) => write!(f, "#{v:#x}"),
            Value::U16(v) => write!(f, "#{v:#x}"),
            Value::U32(v) => write!(f, "#{v:#x}"),
            Value::U64(v) => write!(f, "#{v:#x}"),
            Value::A32Reg(r) => write!(f, "{r}"),
            Value::A64Reg(r) => write!(f, "{r}"),
            Value::A64Vec(v) => write!(f, "{v}"),
            Value::AccType(acc) => write!(f, "{acc}"),
            Value::CoprocCallback(cb) => write!(f, "{cb}"),
            Value::HostAddr(addr) => write!(f, "{addr}"),
        }
    }
}
