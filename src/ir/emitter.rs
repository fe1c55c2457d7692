// This module implements the IR emitter, the append-only builder that translator routines use
// to add instructions to the block under construction. Every instruction is checked against
// the static opcode signature table: argument count, per-argument type sets, uniform operand
// widths for binary operations, and that instruction results are only used after they are
// defined in the same block. A violation is a translator bug; the emitter latches the first
// such error, returns a void placeholder so the routine can unwind naturally, and the
// translation driver aborts the block. Pure operations whose operands are all immediates are
// folded to immediates, and a handful of identities (x + 0, x | 0, shift by 0) collapse to the
// operand. Nothing with side effects is ever folded, removed or reordered.

//! Append-only IR builder bound to one in-progress [`Block`].

use super::{AccType, Block, Inst, LocationDescriptor, Opcode, ResultType, Terminal, Type, TypeSet, Value};
use crate::core::error::{TranslateError, TranslateResult};

pub struct IrEmitter<'a> {
    block: &'a mut Block,
    error: Option<TranslateError>,
}

impl<'a> IrEmitter<'a> {
    pub fn new(block: &'a mut Block) -> Self {
        Self { block, error: None }
    }

    pub fn block(&self) -> &Block {
        self.block
    }

    pub fn location(&self) -> LocationDescriptor {
        self.block.location()
    }

    /// Number of IR instructions emitted so far.
    pub fn inst_count(&self) -> usize {
        self.block.len()
    }

    /// First contract violation, if any.
    pub fn error(&self) -> Option<&TranslateError> {
        self.error.as_ref()
    }

    pub fn take_error(&mut self) -> Option<TranslateError> {
        self.error.take()
    }

    fn fail(&mut self, error: TranslateError) -> Value {
        log::error!("IR contract violation: {error}");
        if self.error.is_none() {
            self.error = Some(error);
        }
        Value::Void
    }

    fn check(&self, opcode: Opcode, args: &[Value]) -> TranslateResult<Type> {
        let info = opcode.info();
        if args.len() != info.args.len() {
            return Err(TranslateError::ArgumentCount {
                opcode: info.name,
                expected: info.args.len(),
                actual: args.len(),
            });
        }

        for (index, (arg, expected)) in args.iter().zip(info.args).enumerate() {
            if let Some(inst) = arg.inst_ref() {
                let defined = self.block.inst(inst).map(|def| def.ty);
                if defined != Some(arg.ty()) {
                    return Err(TranslateError::UndefinedValue { opcode: info.name, inst });
                }
            }
            if !expected.contains(arg.ty()) {
                return Err(TranslateError::TypeMismatch {
                    opcode: info.name,
                    index,
                    expected: *expected,
                    actual: arg.ty(),
                });
            }
            if info.uniform && index > 0 && arg.ty() != args[0].ty() {
                return Err(TranslateError::TypeMismatch {
                    opcode: info.name,
                    index,
                    expected: TypeSet::of(args[0].ty()),
                    actual: arg.ty(),
                });
            }
        }

        Ok(match info.result {
            ResultType::Fixed(ty) => ty,
            ResultType::SameAsArg0 => args[0].ty(),
        })
    }

    /// Emit `opcode` with `args`, returning its result.
    pub fn inst(&mut self, opcode: Opcode, args: &[Value]) -> Value {
        let ty = match self.check(opcode, args) {
            Ok(ty) => ty,
            Err(error) => return self.fail(error),
        };

        if !opcode.has_side_effects() {
            if let Some(folded) = fold(opcode, args) {
                return folded;
            }
        }

        let inst = self.block.push(Inst {
            opcode,
            args: args.to_vec(),
            ty,
        });
        if ty == Type::Void {
            Value::Void
        } else {
            Value::Inst { inst, ty }
        }
    }

    pub fn set_term(&mut self, terminal: Terminal) {
        if let Err(error) = self.block.set_terminal(terminal) {
            self.fail(error);
        }
    }

    pub fn has_term(&self) -> bool {
        self.block.has_terminal()
    }

    /// Report a helper called with an operand width it does not support.
    pub fn invalid_width(&mut self, what: &'static str, bits: usize) -> Value {
        self.fail(TranslateError::InvalidWidth { what, bits })
    }

    pub(crate) fn record_guest_instruction(&mut self, bytes: u64) {
        self.block.record_guest_instruction(bytes);
    }

    // Immediates

    pub fn imm1(&self, value: bool) -> Value {
        Value::U1(value)
    }

    pub fn imm8(&self, value: u8) -> Value {
        Value::U8(value)
    }

    pub fn imm32(&self, value: u32) -> Value {
        Value::U32(value)
    }

    pub fn imm64(&self, value: u64) -> Value {
        Value::U64(value)
    }

    // Arithmetic and logic

    pub fn add(&mut self, a: Value, b: Value) -> Value {
        self.inst(Opcode::Add, &[a, b])
    }

    pub fn sub(&mut self, a: Value, b: Value) -> Value {
        self.inst(Opcode::Sub, &[a, b])
    }

    pub fn and(&mut self, a: Value, b: Value) -> Value {
        self.inst(Opcode::And, &[a, b])
    }

    pub fn or(&mut self, a: Value, b: Value) -> Value {
        self.inst(Opcode::Or, &[a, b])
    }

    pub fn eor(&mut self, a: Value, b: Value) -> Value {
        self.inst(Opcode::Eor, &[a, b])
    }

    pub fn logical_shift_left(&mut self, value: Value, amount: Value) -> Value {
        self.inst(Opcode::LogicalShiftLeft, &[value, amount])
    }

    pub fn logical_shift_right(&mut self, value: Value, amount: Value) -> Value {
        self.inst(Opcode::LogicalShiftRight, &[value, amount])
    }

    pub fn arithmetic_shift_right(&mut self, value: Value, amount: Value) -> Value {
        self.inst(Opcode::ArithmeticShiftRight, &[value, amount])
    }

    pub fn rotate_right(&mut self, value: Value, amount: Value) -> Value {
        self.inst(Opcode::RotateRight, &[value, amount])
    }

    pub fn test_bit(&mut self, value: Value, bit: u8) -> Value {
        self.inst(Opcode::TestBit, &[value, Value::U8(bit)])
    }

    pub fn is_zero(&mut self, value: Value) -> Value {
        self.inst(Opcode::IsZero, &[value])
    }

    pub fn most_significant_bit(&mut self, value: Value) -> Value {
        self.inst(Opcode::MostSignificantBit, &[value])
    }

    // Conversions

    pub fn least_significant_word(&mut self, value: Value) -> Value {
        self.inst(Opcode::LeastSignificantWord, &[value])
    }

    pub fn least_significant_half(&mut self, value: Value) -> Value {
        self.inst(Opcode::LeastSignificantHalf, &[value])
    }

    pub fn least_significant_byte(&mut self, value: Value) -> Value {
        self.inst(Opcode::LeastSignificantByte, &[value])
    }

    pub fn zero_extend_to_word(&mut self, value: Value) -> Value {
        self.inst(Opcode::ZeroExtendToWord, &[value])
    }

    pub fn zero_extend_to_long(&mut self, value: Value) -> Value {
        self.inst(Opcode::ZeroExtendToLong, &[value])
    }

    pub fn sign_extend_word_to_long(&mut self, value: Value) -> Value {
        self.inst(Opcode::SignExtendWordToLong, &[value])
    }

    pub fn zero_extend_to_quad(&mut self, value: Value) -> Value {
        self.inst(Opcode::ZeroExtendToQuad, &[value])
    }

    /// Element `index` of width `esize` bits from a 128-bit vector.
    pub fn vector_get_element(&mut self, esize: usize, vector: Value, index: u8) -> Value {
        match esize {
            32 => self.inst(Opcode::VectorGetElement32, &[vector, Value::U8(index)]),
            64 => self.inst(Opcode::VectorGetElement64, &[vector, Value::U8(index)]),
            _ => self.fail(TranslateError::TypeMismatch {
                opcode: "VectorGetElement",
                index: 0,
                expected: TypeSet::U32_U64,
                actual: Type::from_bit_width(esize).unwrap_or(Type::Void),
            }),
        }
    }

    // Memory

    pub fn read_memory(&mut self, bytes: usize, address: Value, acc: AccType) -> Value {
        match Opcode::a64_read_memory(bytes) {
            Some(opcode) => self.inst(opcode, &[address, Value::AccType(acc)]),
            None => self.fail(TranslateError::InvalidAccessSize { bytes }),
        }
    }

    pub fn write_memory(&mut self, bytes: usize, address: Value, value: Value, acc: AccType) {
        match Opcode::a64_write_memory(bytes) {
            Some(opcode) => {
                self.inst(opcode, &[address, value, Value::AccType(acc)]);
            }
            None => {
                self.fail(TranslateError::InvalidAccessSize { bytes });
            }
        }
    }
}

fn width_mask(ty: Type) -> u64 {
    match ty.bit_width() {
        Some(bits) if bits < 64 => (1u64 << bits) - 1,
        _ => u64::MAX,
    }
}

/// Shift and rotate semantics shared by folding and the reference evaluator:
/// logical shifts by at least the width produce zero, arithmetic shifts fill
/// with the sign bit, rotates use the amount modulo the width.
pub fn eval_shift(opcode: Opcode, ty: Type, value: u64, amount: u8) -> Option<u64> {
    let bits = ty.bit_width()? as u32;
    let amount = amount as u32;
    let mask = width_mask(ty);
    let value = value & mask;
    let result = match opcode {
        Opcode::LogicalShiftLeft => {
            if amount >= bits {
                0
            } else {
                value << amount
            }
        }
        Opcode::LogicalShiftRight => {
            if amount >= bits {
                0
            } else {
                value >> amount
            }
        }
        Opcode::ArithmeticShiftRight => {
            let signed = ((value << (64 - bits)) as i64) >> (64 - bits);
            (signed >> amount.min(bits - 1)) as u64
        }
        Opcode::RotateRight => {
            let amount = amount % bits;
            if amount == 0 {
                value
            } else {
                (value >> amount) | (value << (bits - amount))
            }
        }
        _ => return None,
    };
    Some(result & mask)
}

/// Constant-fold a pure instruction whose operands allow it.
fn fold(opcode: Opcode, args: &[Value]) -> Option<Value> {
    use Opcode::*;

    let ty = args.first()?.ty();
    let a = args[0].as_u64();
    let b = args.get(1).and_then(Value::as_u64);

    // Identities with a non-constant left operand.
    if a.is_none() {
        return match (opcode, b) {
            (Add | Sub | Or | Eor, Some(0)) => Some(args[0]),
            (LogicalShiftLeft | LogicalShiftRight | ArithmeticShiftRight | RotateRight, Some(0)) => {
                Some(args[0])
            }
            _ => None,
        };
    }

    let a = a?;
    let mask = width_mask(ty);
    let result = match opcode {
        Add => Value::imm_of_type(ty, a.wrapping_add(b?) & mask)?,
        Sub => Value::imm_of_type(ty, a.wrapping_sub(b?) & mask)?,
        And => Value::imm_of_type(ty, a & b?)?,
        Or => Value::imm_of_type(ty, a | b?)?,
        Eor => Value::imm_of_type(ty, a ^ b?)?,
        LogicalShiftLeft | LogicalShiftRight | ArithmeticShiftRight | RotateRight => {
            Value::imm_of_type(ty, eval_shift(opcode, ty, a, b? as u8)?)?
        }
        TestBit => {
            let bit = b?;
            Value::U1(bit < ty.bit_width()? as u64 && (a >> bit) & 1 != 0)
        }
        IsZero => Value::U1(a & mask == 0),
        MostSignificantBit => Value::U1((a >> (ty.bit_width()? - 1)) & 1 != 0),
        LeastSignificantWord => Value::U32(a as u32),
        LeastSignificantHalf => Value::U16(a as u16),
        LeastSignificantByte => Value::U8(a as u8),
        ZeroExtendToWord => Value::U32(a as u32),
        ZeroExtendToLong => Value::U64(a),
        SignExtendWordToLong => Value::U64(a as u32 as i32 as i64 as u64),
        _ => return None,
    };
    Some(result)
}
