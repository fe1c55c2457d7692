// This module implements the A32 translation step for both ARM and Thumb state. The location
// descriptor's Thumb flag picks the instruction set; in Thumb state the first halfword decides
// whether a second one is fetched. Reading the PC as an operand yields the instruction address
// plus 8 (ARM) or plus 4 (Thumb). Encodings outside the supported subset are handed to the
// interpreter rather than raised, since the A32 tables cover only a slice of the architecture.

//! A32 and Thumb translator.

mod arm;
mod coprocessor;
mod thumb;

use super::decoder_thumb16::is_thumb32_prefix;
use super::Reg;
use crate::core::config::TranslationOptions;
use crate::core::error::TranslateResult;
use crate::core::stats::TranslationStats;
use crate::frontend::translate::{drive, Step};
use crate::frontend::{CodeReader, Exception, InstOutcome, Rejection};
use crate::ir::{A32LocationDescriptor, Block, IrEmitter, Opcode, Terminal, Value};

/// Per-instruction translation context.
pub(crate) struct TranslatorVisitor<'v, 'a> {
    pub ir: &'v mut IrEmitter<'a>,
    pub location: A32LocationDescriptor,
    pub options: &'v TranslationOptions,
    /// Size of the current instruction in bytes.
    pub size: u32,
}

/// Translate the ARM or Thumb block starting at `location`.
pub fn translate(
    location: A32LocationDescriptor,
    code: &dyn CodeReader,
    options: &TranslationOptions,
    stats: &mut TranslationStats,
) -> TranslateResult<Block> {
    drive(location, options, stats, |ir, location| {
        let mut visitor = TranslatorVisitor { ir, location, options, size: 4 };
        visitor.fetch_and_step(code)
    })
}

/// Translate exactly one instruction as if it were at `location`.
///
/// In Thumb state a 32-bit instruction is passed as
/// `(first_halfword << 16) | second_halfword`; otherwise only the low
/// halfword is used.
pub fn translate_single(
    location: A32LocationDescriptor,
    word: u32,
    options: &TranslationOptions,
) -> TranslateResult<Block> {
    let options = options.clone().with_max_block_instructions(1);
    let mut stats = TranslationStats::default();
    drive(location, &options, &mut stats, |ir, location| {
        let mut visitor = TranslatorVisitor { ir, location, options: &options, size: 4 };
        if !location.is_thumb() {
            visitor.arm_step(word)
        } else if is_thumb32_prefix((word >> 16) as u16) {
            visitor.thumb32_step(word)
        } else {
            visitor.thumb16_step(word as u16)
        }
    })
}

impl<'v, 'a> TranslatorVisitor<'v, 'a> {
    fn fetch_and_step(&mut self, code: &dyn CodeReader) -> Step {
        let pc = self.location.pc() as u64;
        if !self.location.is_thumb() {
            return match code.read_code_u32(pc) {
                Some(word) => self.arm_step(word),
                None => self.fetch_abort(4),
            };
        }

        let Some(first) = code.read_code_u16(pc) else {
            return self.fetch_abort(2);
        };
        if !is_thumb32_prefix(first) {
            return self.thumb16_step(first);
        }
        match code.read_code_u16(pc.wrapping_add(2)) {
            Some(second) => self.thumb32_step(((first as u32) << 16) | second as u32),
            None => self.fetch_abort(4),
        }
    }

    fn fetch_abort(&mut self, bytes: u32) -> Step {
        self.size = bytes;
        Step {
            mnemonic: "<fetch abort>",
            bytes: bytes as u64,
            outcome: self.raise_exception(Exception::FetchAbort),
        }
    }

    // Outcomes

    pub fn pc(&self) -> u32 {
        self.location.pc()
    }

    pub fn next_location(&self) -> A32LocationDescriptor {
        self.location.advance(self.size)
    }

    pub fn unallocated(&self) -> InstOutcome {
        InstOutcome::Reject(Rejection::Unallocated)
    }

    pub fn unpredictable(&self) -> InstOutcome {
        InstOutcome::Reject(Rejection::Unpredictable)
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

    pub fn undefined(&mut self) -> InstOutcome {
        self.raise_exception(Exception::UndefinedInstruction)
    }

    /// Branch to a statically known address in the current instruction set.
    pub fn link_block(&mut self, target: u32) -> InstOutcome {
        let next = self.location.with_pc(target);
        self.ir.set_term(Terminal::LinkBlock { next: next.into() });
        InstOutcome::EndBlock
    }

    /// Interworking branch to a register value; bit 0 selects Thumb.
    pub fn bx_write_pc(&mut self, target: Value) -> InstOutcome {
        self.ir.inst(Opcode::A32BXWritePC, &[target]);
        self.ir.set_term(Terminal::IndirectBranch);
        InstOutcome::EndBlock
    }

    // Registers

    /// Value of the PC as an operand.
    pub fn pc_operand(&self) -> u32 {
        let offset = if self.location.is_thumb() { 4 } else { 8 };
        self.pc().wrapping_add(offset)
    }

    pub fn reg(&mut self, reg: Reg) -> Value {
        if reg == Reg::PC {
            return self.ir.imm32(self.pc_operand());
        }
        self.ir.inst(Opcode::A32GetRegister, &[Value::A32Reg(reg)])
    }

    /// Write a core register. Callers handle PC destinations themselves.
    pub fn set_reg(&mut self, reg: Reg, value: Value) {
        self.ir.inst(Opcode::A32SetRegister, &[Value::A32Reg(reg), value]);
    }

    pub fn set_nz(&mut self, result: Value) {
        let n = self.ir.most_significant_bit(result);
        let z = self.ir.is_zero(result);
        self.ir.inst(Opcode::A32SetNFlag, &[n]);
        self.ir.inst(Opcode::A32SetZFlag, &[z]);
    }

    pub fn set_c(&mut self, carry: Value) {
        self.ir.inst(Opcode::A32SetCFlag, &[carry]);
    }
}
