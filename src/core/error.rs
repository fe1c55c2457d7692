// This module defines the error types of the translation engine using the thiserror crate.
// Only engineering-bug conditions are errors here: IR construction that violates an opcode
// signature, a terminal set twice, a translator routine that emitted IR and then rejected its
// encoding, or a block that grew past its instruction limit. Guest-data conditions (unallocated,
// unpredictable and reserved encodings, instructions the engine does not implement) are not
// errors at all; they are lowered to exception or interpreter terminals by the translation
// driver. DispatchError wraps TranslateError for the dispatcher loop.

//! Error types for the translation engine.

use thiserror::Error;

use crate::ir::{InstRef, LocationDescriptor, Type, TypeSet};

/// Contract violation detected while building a block.
///
/// Any of these aborts construction of the current block. They indicate a bug
/// in a translator routine, never a property of the guest program.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranslateError {
    #[error("IR type mismatch in {opcode}: argument {index} is {actual}, expected {expected}")]
    TypeMismatch {
        opcode: &'static str,
        index: usize,
        expected: TypeSet,
        actual: Type,
    },

    #[error("{opcode} takes {expected} arguments, got {actual}")]
    ArgumentCount {
        opcode: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{opcode} uses {inst}, which is not defined earlier in the block")]
    UndefinedValue { opcode: &'static str, inst: InstRef },

    #[error("no memory access of {bytes} bytes")]
    InvalidAccessSize { bytes: usize },

    #[error("{what} has no {bits}-bit form")]
    InvalidWidth { what: &'static str, bits: usize },

    #[error("terminal set twice in block at {location}")]
    TerminalAlreadySet { location: LocationDescriptor },

    #[error("instruction at {pc:#x} emitted IR before rejecting its encoding")]
    RejectedAfterEmit { pc: u64 },

    #[error("block at {location} exceeded {limit} guest instructions")]
    BlockTooLarge {
        location: LocationDescriptor,
        limit: usize,
    },

    #[error("block at {location} has no terminal")]
    MissingTerminal { location: LocationDescriptor },
}

/// Result type alias for translation.
pub type TranslateResult<T> = Result<T, TranslateError>;

/// Failure of the dispatch loop.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error(transparent)]
    Translate(#[from] TranslateError),

    #[error("step limit of {0} reached")]
    StepLimit(usize),

    #[error("block at {location} has an invalid terminal")]
    InvalidTerminal { location: LocationDescriptor },
}
