// This module implements the A64 translation step and the register and memory helpers every
// A64 translator routine uses. Register 31 is resolved here: as a data operand it reads as
// zero and writes to it are discarded, and routines that mean SP call the sp helpers instead.
// 32-bit writes to general registers zero the upper half; scalar vector writes zero the rest
// of the 128-bit register. A failed instruction fetch compiles a FetchAbort exception.

//! A64 translator.

mod branch;
mod data_processing;
mod load_store;
mod simd_scalar_three_same;
mod system;

use super::decoder::{self, A64Inst};
use super::{Reg, VReg};
use crate::core::config::TranslationOptions;
use crate::core::error::TranslateResult;
use crate::core::stats::TranslationStats;
use crate::frontend::translate::{drive, Step};
use crate::frontend::{CodeReader, Exception, InstOutcome, Rejection};
use crate::ir::{A64LocationDescriptor, AccType, Block, IrEmitter, Opcode, Terminal, Value};

pub use system::SystemRegister;

/// Per-instruction translation context.
pub(crate) struct TranslatorVisitor<'v, 'a> {
    pub ir: &'v mut IrEmitter<'a>,
    pub location: A64LocationDescriptor,
    pub options: &'v TranslationOptions,
}

/// Translate the A64 block starting at `location`.
pub fn translate(
    location: A64LocationDescriptor,
    code: &dyn CodeReader,
    options: &TranslationOptions,
    stats: &mut TranslationStats,
) -> TranslateResult<Block> {
    drive(location, options, stats, |ir, location| {
        let mut visitor = TranslatorVisitor { ir, location, options };
        match code.read_code_u32(location.pc()) {
            Some(word) => visitor.step(word),
            None => Step {
                mnemonic: "<fetch abort>",
                bytes: 4,
                outcome: visitor.raise_exception(Exception::FetchAbort),
            },
        }
    })
}

/// Translate exactly one instruction word as if it were at `location`.
///
/// The block ends after this instruction whatever it is.
pub fn translate_single(
    location: A64LocationDescriptor,
    word: u32,
    options: &TranslationOptions,
) -> TranslateResult<Block> {
    let options = options.clone().with_max_block_instructions(1);
    let mut stats = TranslationStats::default();
    drive(location, &options, &mut stats, |ir, location| {
        TranslatorVisitor { ir, location, options: &options }.step(word)
    })
}

impl<'v, 'a> TranslatorVisitor<'v, 'a> {
    fn step(&mut self, word: u32) -> Step {
        let (mnemonic, outcome) = match decoder::decode(word) {
            Some((mnemonic, inst)) => (mnemonic, self.dispatch(inst)),
            None => ("UNALLOCATED", self.unallocated()),
        };
        Step { mnemonic, bytes: 4, outcome }
    }

    fn dispatch(&mut self, inst: A64Inst) -> InstOutcome {
        use A64Inst as I;
        match inst {
            I::AddSubImm { sf, sub, set_flags, shift, imm12, rn, rd } => {
                self.add_sub_imm(sf, sub, set_flags, shift, imm12, rn, rd)
            }
            I::MoveWide { op, sf, hw, imm16, rd } => self.move_wide(op, sf, hw, imm16, rd),
            I::OrrShiftedReg { sf, shift, rm, imm6, rn, rd } => self.orr_shifted_reg(sf, shift, rm, imm6, rn, rd),
            I::B { imm26 } => self.b(imm26),
            I::Bl { imm26 } => self.bl(imm26),
            I::Br { rn } => self.br(rn),
            I::Blr { rn } => self.blr(rn),
            I::Ret { rn } => self.ret(rn),
            I::Svc { imm16 } => self.svc(imm16),
            I::Brk { imm16 } => self.brk(imm16),
            I::Hint { .. } => InstOutcome::Continue,
            I::NamedHint(op) => self.named_hint(op),
            I::Barrier { op, .. } => self.barrier(op),
            I::Msr { sysreg, rt } => self.msr(sysreg, rt),
            I::Mrs { sysreg, rt } => self.mrs(sysreg, rt),
            I::LoadStorePair { opc, index, load, imm7, rt2, rn, rt } => {
                self.load_store_pair(opc, index, load, imm7, rt2, rn, rt)
            }
            I::LoadStorePairFpsimd { opc, index, load, imm7, vt2, rn, vt } => {
                self.load_store_pair_fpsimd(opc, index, load, imm7, vt2, rn, vt)
            }
            I::LoadStoreUnsignedImm { size, opc, imm12, rn, rt } => {
                self.load_store_unsigned_imm(size, opc, imm12, rn, rt)
            }
            I::SimdScalarAdd { size, vm, vn, vd } => self.simd_scalar_add_sub(false, size, vm, vn, vd),
            I::SimdScalarSub { size, vm, vn, vd } => self.simd_scalar_add_sub(true, size, vm, vn, vd),
        }
    }

    // Outcomes

    pub fn pc(&self) -> u64 {
        self.location.pc()
    }

    pub fn next_location(&self) -> A64LocationDescriptor {
        self.location.advance(4)
    }

    pub fn unallocated(&self) -> InstOutcome {
        InstOutcome::Reject(Rejection::Unallocated)
    }

    pub fn unpredictable(&self) -> InstOutcome {
        InstOutcome::Reject(Rejection::Unpredictable)
    }

    pub fn reserved_value(&self) -> InstOutcome {
        InstOutcome::Reject(Rejection::ReservedValue)
    }

    pub fn interpret_this_instruction(&self) -> InstOutcome {
        InstOutcome::Reject(Rejection::Unsupported)
    }

    pub fn raise_exception(&mut self, exception: Exception) -> InstOutcome {
        self.ir.set_term(Terminal::RaiseException {
            location: self.location.into(),
            exception,
            next: self.next_location().into(),
        });
        InstOutcome::EndBlock
    }

    // Operands

    pub fn imm(&mut self, bitsize: usize, value: u64) -> Value {
        match bitsize {
            32 => self.ir.imm32(value as u32),
            64 => self.ir.imm64(value),
            _ => self.ir.invalid_width("A64 immediate", bitsize),
        }
    }

    /// Read general register `reg`; register 31 reads as zero.
    pub fn x(&mut self, bitsize: usize, reg: Reg) -> Value {
        if reg.is_31() {
            return self.imm(bitsize, 0);
        }
        match bitsize {
            32 => self.ir.inst(Opcode::A64GetW, &[Value::A64Reg(reg)]),
            64 => self.ir.inst(Opcode::A64GetX, &[Value::A64Reg(reg)]),
            _ => self.ir.invalid_width("A64 register read", bitsize),
        }
    }

    /// Write general register `reg`; writes to register 31 are discarded.
    pub fn set_x(&mut self, bitsize: usize, reg: Reg, value: Value) {
        if reg.is_31() {
            return;
        }
        match bitsize {
            32 => {
                self.ir.inst(Opcode::A64SetW, &[Value::A64Reg(reg), value]);
            }
            64 => {
                self.ir.inst(Opcode::A64SetX, &[Value::A64Reg(reg), value]);
            }
            _ => {
                self.ir.invalid_width("A64 register write", bitsize);
            }
        }
    }

    pub fn sp(&mut self, bitsize: usize) -> Value {
        let sp = self.ir.inst(Opcode::A64GetSP, &[]);
        match bitsize {
            64 => sp,
            32 => self.ir.least_significant_word(sp),
            _ => self.ir.invalid_width("A64 SP read", bitsize),
        }
    }

    pub fn set_sp(&mut self, bitsize: usize, value: Value) {
        let value = match bitsize {
            64 => value,
            32 => self.ir.zero_extend_to_long(value),
            _ => self.ir.invalid_width("A64 SP write", bitsize),
        };
        self.ir.inst(Opcode::A64SetSP, &[value]);
    }

    /// Base register for an address: SP when `reg` is 31.
    pub fn base_address(&mut self, reg: Reg) -> Value {
        if reg == Reg::SP {
            self.sp(64)
        } else {
            self.x(64, reg)
        }
    }

    pub fn set_base_address(&mut self, reg: Reg, address: Value) {
        if reg == Reg::SP {
            self.set_sp(64, address);
        } else {
            self.set_x(64, reg, address);
        }
    }

    /// Read the low `bitsize` bits of vector register `vec`.
    pub fn v(&mut self, bitsize: usize, vec: VReg) -> Value {
        match bitsize {
            128 => self.ir.inst(Opcode::A64GetQ, &[Value::A64Vec(vec)]),
            64 => self.ir.inst(Opcode::A64GetD, &[Value::A64Vec(vec)]),
            32 => {
                let d = self.ir.inst(Opcode::A64GetD, &[Value::A64Vec(vec)]);
                self.ir.least_significant_word(d)
            }
            _ => self.ir.invalid_width("A64 vector read", bitsize),
        }
    }

    /// Write vector register `vec`, zeroing the bits above `bitsize`.
    pub fn set_v(&mut self, bitsize: usize, vec: VReg, value: Value) {
        match bitsize {
            128 => {
                self.ir.inst(Opcode::A64SetQ, &[Value::A64Vec(vec), value]);
            }
            64 => {
                self.ir.inst(Opcode::A64SetD, &[Value::A64Vec(vec), value]);
            }
            32 => {
                let wide = self.ir.zero_extend_to_long(value);
                self.ir.inst(Opcode::A64SetD, &[Value::A64Vec(vec), wide]);
            }
            _ => {
                self.ir.invalid_width("A64 vector write", bitsize);
            }
        }
    }

    pub fn mem(&mut self, address: Value, bytes: usize, acc: AccType) -> Value {
        self.ir.read_memory(bytes, address, acc)
    }

    pub fn set_mem(&mut self, address: Value, bytes: usize, acc: AccType, value: Value) {
        self.ir.write_memory(bytes, address, value, acc);
    }
}
