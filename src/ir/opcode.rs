//! IR opcodes and their static signatures.
//!
//! The opcode set is closed. Each opcode has an [`OpInfo`] entry describing the
//! argument types it accepts, the type it produces and whether it has side
//! effects. The emitter checks every instruction against this table.

use std::fmt;

use super::{Type, TypeSet};

/// How the result type of an instruction is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultType {
    Fixed(Type),
    /// Same type as the first argument.
    SameAsArg0,
}

#[derive(Debug, Clone, Copy)]
pub struct OpInfo {
    pub name: &'static str,
    pub result: ResultType,
    pub args: &'static [TypeSet],
    /// Every argument must have the same type as argument 0.
    pub uniform: bool,
    /// Must not be reordered, removed or folded.
    pub side_effects: bool,
}

const fn pure(name: &'static str, result: Type, args: &'static [TypeSet]) -> OpInfo {
    OpInfo { name, result: ResultType::Fixed(result), args, uniform: false, side_effects: false }
}

const fn effect(name: &'static str, result: Type, args: &'static [TypeSet]) -> OpInfo {
    OpInfo { name, result: ResultType::Fixed(result), args, uniform: false, side_effects: true }
}

const fn binary(name: &'static str) -> OpInfo {
    OpInfo {
        name,
        result: ResultType::SameAsArg0,
        args: &[TypeSet::U32_U64, TypeSet::U32_U64],
        uniform: true,
        side_effects: false,
    }
}

const fn shift(name: &'static str) -> OpInfo {
    OpInfo {
        name,
        result: ResultType::SameAsArg0,
        args: &[TypeSet::U32_U64, TypeSet::U8],
        uniform: false,
        side_effects: false,
    }
}

use TypeSet as T;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    // A64 context
    A64GetW,
    A64GetX,
    A64GetSP,
    A64GetD,
    A64GetQ,
    A64SetW,
    A64SetX,
    A64SetSP,
    A64SetD,
    A64SetQ,
    A64SetPC,
    A64CheckSpAlignment,

    // A64 system registers
    A64GetFPCR,
    A64SetFPCR,
    A64GetFPSR,
    A64SetFPSR,
    A64GetTPIDR,
    A64SetTPIDR,
    A64GetTPIDRRO,
    A64GetCNTPCT,
    A64GetCTR,
    A64GetDCZID,

    // A64 barriers and monitors
    A64DataSynchronizationBarrier,
    A64DataMemoryBarrier,
    A64InstructionSynchronizationBarrier,
    A64ClearExclusive,

    // A64 memory
    A64ReadMemory8,
    A64ReadMemory16,
    A64ReadMemory32,
    A64ReadMemory64,
    A64ReadMemory128,
    A64WriteMemory8,
    A64WriteMemory16,
    A64WriteMemory32,
    A64WriteMemory64,
    A64WriteMemory128,

    // A32 context
    A32GetRegister,
    A32SetRegister,
    A32GetCFlag,
    A32SetCFlag,
    A32SetNFlag,
    A32SetZFlag,
    A32BXWritePC,

    // A32 coprocessor
    A32CoprocInvoke,
    A32CoprocInvokeGet,
    A32HostRead32,
    A32HostWrite32,

    // Arithmetic and logic
    Add,
    Sub,
    And,
    Or,
    Eor,
    LogicalShiftLeft,
    LogicalShiftRight,
    ArithmeticShiftRight,
    RotateRight,
    TestBit,
    IsZero,
    MostSignificantBit,

    // Conversions
    LeastSignificantWord,
    LeastSignificantHalf,
    LeastSignificantByte,
    ZeroExtendToWord,
    ZeroExtendToLong,
    SignExtendWordToLong,
    ZeroExtendToQuad,
    VectorGetElement32,
    VectorGetElement64,
}

impl Opcode {
    pub const fn info(self) -> OpInfo {
        use Opcode::*;
        match self {
            A64GetW => effect("A64GetW", Type::U32, &[T::A64_REG]),
            A64GetX => effect("A64GetX", Type::U64, &[T::A64_REG]),
            A64GetSP => effect("A64GetSP", Type::U64, &[]),
            A64GetD => effect("A64GetD", Type::U64, &[T::A64_VEC]),
            A64GetQ => effect("A64GetQ", Type::U128, &[T::A64_VEC]),
            A64SetW => effect("A64SetW", Type::Void, &[T::A64_REG, T::U32]),
            A64SetX => effect("A64SetX", Type::Void, &[T::A64_REG, T::U64]),
            A64SetSP => effect("A64SetSP", Type::Void, &[T::U64]),
            A64SetD => effect("A64SetD", Type::Void, &[T::A64_VEC, T::U64]),
            A64SetQ => effect("A64SetQ", Type::Void, &[T::A64_VEC, T::U128]),
            A64SetPC => effect("A64SetPC", Type::Void, &[T::U64]),
            A64CheckSpAlignment => effect("A64CheckSpAlignment", Type::Void, &[T::U64]),

            A64GetFPCR => effect("A64GetFPCR", Type::U32, &[]),
            A64SetFPCR => effect("A64SetFPCR", Type::Void, &[T::U32]),
            A64GetFPSR => effect("A64GetFPSR", Type::U32, &[]),
            A64SetFPSR => effect("A64SetFPSR", Type::Void, &[T::U32]),
            A64GetTPIDR => effect("A64GetTPIDR", Type::U64, &[]),
            A64SetTPIDR => effect("A64SetTPIDR", Type::Void, &[T::U64]),
            A64GetTPIDRRO => effect("A64GetTPIDRRO", Type::U64, &[]),
            A64GetCNTPCT => effect("A64GetCNTPCT", Type::U64, &[]),
            A64GetCTR => effect("A64GetCTR", Type::U32, &[]),
            A64GetDCZID => effect("A64GetDCZID", Type::U32, &[]),

            A64DataSynchronizationBarrier => effect("A64DataSynchronizationBarrier", Type::Void, &[]),
            A64DataMemoryBarrier => effect("A64DataMemoryBarrier", Type::Void, &[]),
            A64InstructionSynchronizationBarrier => effect("A64InstructionSynchronizationBarrier", Type::Void, &[]),
            A64ClearExclusive => effect("A64ClearExclusive", Type::Void, &[]),

            A64ReadMemory8 => effect("A64ReadMemory8", Type::U8, &[T::U64, T::ACC_TYPE]),
            A64ReadMemory16 => effect("A64ReadMemory16", Type::U16, &[T::U64, T::ACC_TYPE]),
            A64ReadMemory32 => effect("A64ReadMemory32", Type::U32, &[T::U64, T::ACC_TYPE]),
            A64ReadMemory64 => effect("A64ReadMemory64", Type::U64, &[T::U64, T::ACC_TYPE]),
            A64ReadMemory128 => effect("A64ReadMemory128", Type::U128, &[T::U64, T::ACC_TYPE]),
            A64WriteMemory8 => effect("A64WriteMemory8", Type::Void, &[T::U64, T::U8, T::ACC_TYPE]),
            A64WriteMemory16 => effect("A64WriteMemory16", Type::Void, &[T::U64, T::U16, T::ACC_TYPE]),
            A64WriteMemory32 => effect("A64WriteMemory32", Type::Void, &[T::U64, T::U32, T::ACC_TYPE]),
            A64WriteMemory64 => effect("A64WriteMemory64", Type::Void, &[T::U64, T::U64, T::ACC_TYPE]),
            A64WriteMemory128 => effect("A64WriteMemory128", Type::Void, &[T::U64, T::U128, T::ACC_TYPE]),

            A32GetRegister => effect("A32GetRegister", Type::U32, &[T::A32_REG]),
            A32SetRegister => effect("A32SetRegister", Type::Void, &[T::A32_REG, T::U32]),
            A32GetCFlag => effect("A32GetCFlag", Type::U1, &[]),
            A32SetCFlag => effect("A32SetCFlag", Type::Void, &[T::U1]),
            A32SetNFlag => effect("A32SetNFlag", Type::Void, &[T::U1]),
            A32SetZFlag => effect("A32SetZFlag", Type::Void, &[T::U1]),
            A32BXWritePC => effect("A32BXWritePC", Type::Void, &[T::U32]),

            A32CoprocInvoke => effect("A32CoprocInvoke", Type::Void, &[T::COPROC_CALLBACK, T::U32, T::U32]),
            A32CoprocInvokeGet => effect("A32CoprocInvokeGet", Type::U64, &[T::COPROC_CALLBACK]),
            A32HostRead32 => effect("A32HostRead32", Type::U32, &[T::HOST_ADDR]),
            A32HostWrite32 => effect("A32HostWrite32", Type::Void, &[T::HOST_ADDR, T::U32]),

            Add => binary("Add"),
            Sub => binary("Sub"),
            And => binary("And"),
            Or => binary("Or"),
            Eor => binary("Eor"),
            LogicalShiftLeft => shift("LogicalShiftLeft"),
            LogicalShiftRight => shift("LogicalShiftRight"),
            ArithmeticShiftRight => shift("ArithmeticShiftRight"),
            RotateRight => shift("RotateRight"),
            TestBit => pure("TestBit", Type::U1, &[T::U32_U64, T::U8]),
            IsZero => pure("IsZero", Type::U1, &[T::U32_U64]),
            MostSignificantBit => pure("MostSignificantBit", Type::U1, &[T::U32_U64]),

            LeastSignificantWord => pure("LeastSignificantWord", Type::U32, &[T::U64]),
            LeastSignificantHalf => pure("LeastSignificantHalf", Type::U16, &[T::U32]),
            LeastSignificantByte => pure("LeastSignificantByte", Type::U8, &[T::U32]),
            ZeroExtendToWord => pure("ZeroExtendToWord", Type::U32, &[T::U8_U16]),
            ZeroExtendToLong => pure("ZeroExtendToLong", Type::U64, &[T::U8_U16_U32]),
            SignExtendWordToLong => pure("SignExtendWordToLong", Type::U64, &[T::U32]),
            ZeroExtendToQuad => pure("ZeroExtendToQuad", Type::U128, &[T::U32_U64]),
            VectorGetElement32 => pure("VectorGetElement32", Type::U32, &[T::U128, T::U8]),
            VectorGetElement64 => pure("VectorGetElement64", Type::U64, &[T::U128, T::U8]),
        }
    }

    pub const fn name(self) -> &'static str {
        self.info().name
    }

    pub const fn has_side_effects(self) -> bool {
        self.info().side_effects
    }

    /// Memory read opcode for an access of `bytes` bytes.
    pub const fn a64_read_memory(bytes: usize) -> Option<Opcode> {
        match bytes {
            1 => Some(Opcode::A64ReadMemory8),
            2 => Some(Opcode::A64ReadMemory16),
            4 => Some(Opcode::A64ReadMemory32),
            8 => Some(Opcode::A64ReadMemory64),
            16 => Some(Opcode::A64ReadMemory128),
            _ => None,
        }
    }

    /// Memory write opcode for an access of `bytes` bytes.
    pub const fn a64_write_memory(bytes: usize) -> Option<Opcode> {
        match bytes {
            1 => Some(Opcode::A64WriteMemory8),
            2 => Some(Opcode::A64WriteMemory16),
            4 => Some(Opcode::A64WriteMemory32),
            8 => Some(Opcode::A64WriteMemory64),
            16 => Some(Opcode::A64WriteMemory128),
            _ => None,
        }
    }

    pub fn is_memory_read(self) -> bool {
        matches!(
            self,
            Opcode::A64ReadMemory8
                | Opcode::A64ReadMemory16
                | Opcode::A64ReadMemory32
                | Opcode::A64ReadMemory64
                | Opcode::A64ReadMemory128
        )
    }

    pub fn is_memory_write(self) -> bool {
        matches!(
            self,
            Opcode::A64WriteMemory8
                | Opcode::A64WriteMemory16
                | Opcode::A64WriteMemory32
                | Opcode::A64WriteMemory64
                | Opcode::A64WriteMemory128
        )
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_ops_are_uniform() {
        for op in [Opcode::Add, Opcode::Sub, Opcode::And, Opcode::Or, Opcode::Eor] {
            let info = op.info();
            assert!(info.uniform);
            assert_eq!(info.result, ResultType::SameAsArg0);
            assert!(!info.side_effects);
        }
    }

    #[test]
    fn test_memory_opcodes_by_size() {
        assert_eq!(Opcode::a64_read_memory(8), Some(Opcode::A64ReadMemory64));
        assert_eq!(Opcode::a64_write_memory(16), Some(Opcode::A64WriteMemory128));
        assert_eq!(Opcode::a64_read_memory(3), None);
        assert!(Opcode::A64ReadMemory32.is_memory_read());
        assert!(Opcode::A64WriteMemory32.has_side_effects());
    }
}
