//! Shared guest fixture for integration tests.
//!
//! [`Guest`] wraps the reference evaluator with a sparse byte memory that
//! holds both code and data, and records every interpreter call and guest
//! exception the dispatcher reports.

#![allow(dead_code)]

use hashbrown::HashMap;

use armdbt::frontend::a32::HostAddr;
use armdbt::frontend::{CodeReader, Exception};
use armdbt::ir::{AccType, Block, LocationDescriptor};
use armdbt::runtime::{
    Evaluator, ExceptionAction, ExceptionHandler, ExecutionStatus, Executor, Interpreter, MemoryCallbacks,
};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Sparse little-endian memory. Unwritten bytes read as zero for data but
/// are unmapped for instruction fetch.
#[derive(Debug, Default)]
pub struct Memory {
    pub bytes: HashMap<u64, u8>,
    pub host: HashMap<usize, u32>,
    pub accesses: Vec<(u64, usize, AccType)>,
}

impl Memory {
    pub fn load_words(&mut self, base: u64, words: &[u32]) {
        for (i, word) in words.iter().enumerate() {
            for (j, byte) in word.to_le_bytes().into_iter().enumerate() {
                self.bytes.insert(base + 4 * i as u64 + j as u64, byte);
            }
        }
    }

    pub fn load_halfwords(&mut self, base: u64, halfwords: &[u16]) {
        for (i, halfword) in halfwords.iter().enumerate() {
            for (j, byte) in halfword.to_le_bytes().into_iter().enumerate() {
                self.bytes.insert(base + 2 * i as u64 + j as u64, byte);
            }
        }
    }

    pub fn peek(&self, vaddr: u64, bytes: usize) -> u128 {
        (0..bytes).fold(0, |value, i| {
            value | (self.bytes.get(&(vaddr + i as u64)).copied().unwrap_or(0) as u128) << (8 * i)
        })
    }

    fn fetch(&self, vaddr: u64, bytes: u64) -> Option<u32> {
        let mut value = 0u32;
        for i in 0..bytes {
            value |= (*self.bytes.get(&(vaddr + i))? as u32) << (8 * i);
        }
        Some(value)
    }
}

impl MemoryCallbacks for Memory {
    fn read_u8(&mut self, vaddr: u64, _acc: AccType) -> u8 {
        self.bytes.get(&vaddr).copied().unwrap_or(0)
    }

    fn write_u8(&mut self, vaddr: u64, value: u8, _acc: AccType) {
        self.bytes.insert(vaddr, value);
    }

    fn host_read_u32(&mut self, addr: HostAddr) -> u32 {
        self.host.get(&addr.0).copied().unwrap_or(0)
    }

    fn host_write_u32(&mut self, addr: HostAddr, value: u32) {
        self.host.insert(addr.0, value);
    }

    fn read(&mut self, vaddr: u64, bytes: usize, acc: AccType) -> u128 {
        self.accesses.push((vaddr, bytes, acc));
        self.peek(vaddr, bytes)
    }
}

pub struct Guest {
    pub eval: Evaluator<Memory>,
    pub interpreted: Vec<(LocationDescriptor, usize)>,
    pub exceptions: Vec<(LocationDescriptor, Exception)>,
    pub on_exception: ExceptionAction,
}

impl Guest {
    pub fn new() -> Self {
        Self {
            eval: Evaluator::new(Memory::default()),
            interpreted: Vec::new(),
            exceptions: Vec::new(),
            on_exception: ExceptionAction::Halt,
        }
    }

    pub fn with_a64_code(base: u64, words: &[u32]) -> Self {
        let mut guest = Self::new();
        guest.eval.memory.load_words(base, words);
        guest.eval.state.pc = base;
        guest
    }
}

impl Default for Guest {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor for Guest {
    fn execute(&mut self, block: &Block) -> ExecutionStatus {
        self.eval.execute(block)
    }

    fn location(&self) -> LocationDescriptor {
        self.eval.location()
    }

    fn set_location(&mut self, location: LocationDescriptor) {
        self.eval.set_location(location)
    }

    fn halt_requested(&self) -> bool {
        self.eval.halt_requested()
    }
}

impl Interpreter for Guest {
    fn interpret(&mut self, location: LocationDescriptor, num_instructions: usize) -> LocationDescriptor {
        self.interpreted.push((location, num_instructions));
        let size = match location {
            LocationDescriptor::A32(loc) if loc.is_thumb() => 2,
            _ => 4,
        };
        location.with_pc(location.pc() + size * num_instructions as u64)
    }
}

impl ExceptionHandler for Guest {
    fn exception_raised(&mut self, location: LocationDescriptor, exception: Exception) -> ExceptionAction {
        self.exceptions.push((location, exception));
        self.on_exception
    }
}

impl CodeReader for Guest {
    fn read_code_u32(&self, vaddr: u64) -> Option<u32> {
        self.eval.memory.fetch(vaddr, 4)
    }

    fn read_code_u16(&self, vaddr: u64) -> Option<u16> {
        self.eval.memory.fetch(vaddr, 2).map(|halfword| halfword as u16)
    }
}
