//! Translated blocks.
//!
//! A [`Block`] is an ordered list of IR instructions plus one [`Terminal`],
//! keyed by the [`LocationDescriptor`] it was translated from. It also records
//! how many guest instructions it covers and the guest address range they
//! occupy, which drives invalidation.

use std::fmt;
use std::ops::Range;

use super::{InstRef, LocationDescriptor, Opcode, Terminal, Type, Value};
use crate::core::error::{TranslateError, TranslateResult};

/// One IR instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inst {
    pub opcode: Opcode,
    pub args: Vec<Value>,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    location: LocationDescriptor,
    instructions: Vec<Inst>,
    terminal: Terminal,
    guest_instructions: usize,
    end_pc: u64,
}

impl Block {
    pub fn new(location: LocationDescriptor) -> Self {
        Self {
            location,
            instructions: Vec::new(),
            terminal: Terminal::Invalid,
            guest_instructions: 0,
            end_pc: location.pc(),
        }
    }

    pub fn location(&self) -> LocationDescriptor {
        self.location
    }

    pub fn instructions(&self) -> &[Inst] {
        &self.instructions
    }

    pub fn inst(&self, inst: InstRef) -> Option<&Inst> {
        self.instructions.get(inst.index())
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn terminal(&self) -> &Terminal {
        &self.terminal
    }

    pub fn has_terminal(&self) -> bool {
        !self.terminal.is_invalid()
    }

    pub fn set_terminal(&mut self, terminal: Terminal) -> TranslateResult<()> {
        if self.has_terminal() {
            return Err(TranslateError::TerminalAlreadySet {
                location: self.location,
            });
        }
        self.terminal = terminal;
        Ok(())
    }

    /// Number of guest instructions covered.
    pub fn guest_instruction_count(&self) -> usize {
        self.guest_instructions
    }

    /// Guest address range `[start, end)` covered by this block.
    pub fn covered_range(&self) -> Range<u64> {
        self.location.pc()..self.end_pc
    }

    /// True if `[start, end)` overlaps the guest bytes of this block.
    pub fn intersects(&self, start: u64, end: u64) -> bool {
        let range = self.covered_range();
        start < range.end && range.start < end
    }

    /// Record one more guest instruction of `bytes` bytes.
    pub(crate) fn record_guest_instruction(&mut self, bytes: u64) {
        self.guest_instructions += 1;
        self.end_pc = self.end_pc.saturating_add(bytes);
    }

    pub(crate) fn push(&mut self, inst: Inst) -> InstRef {
        let index = InstRef(self.instructions.len() as u32);
        self.instructions.push(inst);
        index
    }

    /// Count of instructions using `opcode`.
    pub fn count_opcode(&self, opcode: Opcode) -> usize {
        self.instructions.iter().filter(|inst| inst.opcode == opcode).count()
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let range = self.covered_range();
        writeln!(
            f,
            "block {} [{:#x}, {:#x}) guest_insts={}",
            self.location, range.start, range.end, self.guest_instructions
        )?;
        for (index, inst) in self.instructions.iter().enumerate() {
            if inst.ty == Type::Void {
                write!(f, "  [{index:04}]        {}", inst.opcode)?;
            } else {
                write!(f, "  [{index:04}] %{index:<4} = {}", inst.opcode)?;
            }
            for (i, arg) in inst.args.iter().enumerate() {
                f.write_str(if i == 0 { " " } else { ", " })?;
                write!(f, "{arg}")?;
            }
            writeln!(f)?;
        }
        writeln!(f, "  terminal = {}", self.terminal)
    }
}
