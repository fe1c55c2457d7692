// This module defines the traits through which the dispatcher reaches its external
// collaborators: the executor that runs (or generates code for) a translated block, the
// interpreter fallback, and the host's exception handler. MemoryCallbacks is the typed memory
// interface that memory and host-word IR instructions are lowered against; the reference
// evaluator in this crate uses it, and a code generator would call the same methods from
// generated code. The implementing value is the opaque user context of every callback.

//! Host-side collaborator interfaces.

use crate::frontend::a32::HostAddr;
use crate::frontend::{CodeReader, Exception};
use crate::ir::{AccType, Block, LocationDescriptor};

/// How execution of a block ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStatus {
    /// The block ran to its terminal.
    Completed,
    /// The executor stopped inside the block; the terminal is not followed.
    Halted,
}

/// Runs translated blocks against live guest state.
pub trait Executor {
    /// Execute `block`. Indirect branches leave the new PC in guest state.
    fn execute(&mut self, block: &Block) -> ExecutionStatus;

    /// Location descriptor of the current guest state.
    fn location(&self) -> LocationDescriptor;

    fn set_location(&mut self, location: LocationDescriptor);

    /// Polled at `CheckHalt` terminals.
    fn halt_requested(&self) -> bool {
        false
    }
}

/// Fallback for instructions the translator leaves alone.
pub trait Interpreter {
    /// Execute `num_instructions` guest instructions from `location`,
    /// returning where execution continues.
    fn interpret(&mut self, location: LocationDescriptor, num_instructions: usize) -> LocationDescriptor;
}

/// What the host wants after a guest exception.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionAction {
    /// Continue from the location the handler left in guest state.
    Resume,
    /// Continue after the faulting instruction.
    Skip,
    /// Stop dispatching.
    Halt,
}

pub trait ExceptionHandler {
    fn exception_raised(&mut self, location: LocationDescriptor, exception: Exception) -> ExceptionAction;
}

/// Everything a dispatcher needs from its embedding.
pub trait Environment: Executor + Interpreter + ExceptionHandler + CodeReader {}

impl<T: Executor + Interpreter + ExceptionHandler + CodeReader> Environment for T {}

/// Guest data memory, accessed by width with an access-type tag.
///
/// Only the byte accessors are required; wider accesses are composed
/// little-endian from them unless an implementation overrides them.
pub trait MemoryCallbacks {
    fn read_u8(&mut self, vaddr: u64, acc: AccType) -> u8;

    fn write_u8(&mut self, vaddr: u64, value: u8, acc: AccType);

    /// Read a 32-bit word the host placed at `addr` for a coprocessor.
    fn host_read_u32(&mut self, addr: HostAddr) -> u32;

    fn host_write_u32(&mut self, addr: HostAddr, value: u32);

    fn read(&mut self, vaddr: u64, bytes: usize, acc: AccType) -> u128 {
        (0..bytes).fold(0u128, |value, i| {
            value | (self.read_u8(vaddr.wrapping_add(i as u64), acc) as u128) << (8 * i)
        })
    }

    fn write(&mut self, vaddr: u64, bytes: usize, value: u128, acc: AccType) {
        for i in 0..bytes {
            self.write_u8(vaddr.wrapping_add(i as u64), (value >> (8 * i)) as u8, acc);
        }
    }
}
