//! Result of translating one guest instruction.

/// Why a translator routine refused an encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rejection {
    /// No defined meaning; compiled to an exception.
    Unallocated,
    /// Architecturally UNPREDICTABLE operands; handled per
    /// [`UnpredictablePolicy`](crate::core::config::UnpredictablePolicy).
    Unpredictable,
    /// Reserved field value; treated like `Unallocated`.
    ReservedValue,
    /// Recognized, but this engine leaves it to the interpreter.
    Unsupported,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstOutcome {
    /// More instructions may follow in this block.
    Continue,
    /// The routine set the block terminal.
    EndBlock,
    /// The routine emitted nothing and rejected the encoding.
    Reject(Rejection),
}
