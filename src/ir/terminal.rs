//! Block terminals.
//!
//! Every completed block ends in exactly one terminal, which tells the
//! dispatcher where execution goes next.

use std::fmt;

use super::LocationDescriptor;
use crate::frontend::Exception;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Terminal {
    /// Placeholder while the block is under construction.
    Invalid,
    /// Fall through to the next sequential guest instruction. Used when the
    /// block was cut by the translation limit or by single stepping.
    Continue { next: LocationDescriptor },
    /// Direct branch to a statically known location; eligible for linking.
    LinkBlock { next: LocationDescriptor },
    /// Branch target is only known at run time; the executor has written the
    /// new PC and the dispatcher must look it up.
    IndirectBranch,
    /// Context changed in a way that affects translation; re-enter the
    /// dispatcher.
    ReturnToDispatch,
    /// Hand `num_instructions` guest instructions starting at `location` to
    /// the interpreter, then resume after them.
    Interpret {
        location: LocationDescriptor,
        num_instructions: usize,
    },
    /// Raise a guest exception for the instruction at `location`. `next` is
    /// where execution resumes if the host chooses to skip the instruction.
    RaiseException {
        location: LocationDescriptor,
        exception: Exception,
        next: LocationDescriptor,
    },
    /// Cooperative yield point: stop if the host requested a halt, otherwise
    /// continue with `else_`.
    CheckHalt { else_: Box<Terminal> },
}

impl Terminal {
    pub fn is_invalid(&self) -> bool {
        matches!(self, Terminal::Invalid)
    }

    /// Statically known successor, if this terminal (ignoring yield points)
    /// transfers control to one.
    pub fn static_successor(&self) -> Option<LocationDescriptor> {
        match self {
            Terminal::Continue { next } | Terminal::LinkBlock { next } => Some(*next),
            Terminal::CheckHalt { else_ } => else_.static_successor(),
            _ => None,
        }
    }
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Terminal::Invalid => f.write_str("<invalid>"),
            Terminal::Continue { next } => write!(f, "Continue{{{next}}}"),
            Terminal::LinkBlock { next } => write!(f, "LinkBlock{{{next}}}"),
            Terminal::IndirectBranch => f.write_str("IndirectBranch"),
            Terminal::ReturnToDispatch => f.write_str("ReturnToDispatch"),
            Terminal::Interpret { location, num_instructions } => {
                write!(f, "Interpret{{{location}, {num_instructions}}}")
            }
            Terminal::RaiseException { location, exception, .. } => {
                write!(f, "RaiseException{{{location}, {exception}}}")
            }
            Terminal::CheckHalt { else_ } => write!(f, "CheckHalt{{{else_}}}"),
        }
    }
}
