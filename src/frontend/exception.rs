//! Guest exception classes surfaced through raise-exception terminals.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Exception {
    /// The encoding has no defined meaning.
    UnallocatedEncoding,
    /// A field holds a value reserved for future architecture revisions.
    ReservedValue,
    /// The operand combination is architecturally UNPREDICTABLE.
    UnpredictableInstruction,
    /// UDF, or a coprocessor instruction nobody services.
    UndefinedInstruction,
    /// SVC.
    SoftwareInterrupt { imm: u32 },
    /// BRK / BKPT.
    Breakpoint { imm: u32 },
    WaitForInterrupt,
    WaitForEvent,
    SendEvent,
    SendEventLocal,
    Yield,
    /// Instruction fetch failed.
    FetchAbort,
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exception::UnallocatedEncoding => f.write_str("UnallocatedEncoding"),
            Exception::ReservedValue => f.write_str("ReservedValue"),
            Exception::UnpredictableInstruction => f.write_str("UnpredictableInstruction"),
            Exception::UndefinedInstruction => f.write_str("UndefinedInstruction"),
            Exception::SoftwareInterrupt { imm } => write!(f, "SoftwareInterrupt({imm:#x})"),
            Exception::Breakpoint { imm } => write!(f, "Breakpoint({imm:#x})"),
            Exception::WaitForInterrupt => f.write_str("WaitForInterrupt"),
            Exception::WaitForEvent => f.write_str("WaitForEvent"),
            Exception::SendEvent => f.write_str("SendEvent"),
            Exception::SendEventLocal => f.write_str("SendEventLocal"),
            Exception::Yield => f.write_str("Yield"),
            Exception::FetchAbort => f.write_str("FetchAbort"),
        }
    }
}
