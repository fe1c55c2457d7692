// This module contains the guest-facing half of the engine: decoding instruction words through
// static mask/value tables and translating each decoded instruction into IR. The generic
// pieces (fixed-width immediates, the decode table, rejection outcomes, the translation driver)
// live here; the a64 and a32 submodules hold the per-architecture tables, translator routines
// and disassemblers.

//! Decoders and translators.
//!
//! The entry point is [`Translator::translate`] (or the free function
//! [`translate`]), which dispatches on the kind of
//! [`LocationDescriptor`](crate::ir::LocationDescriptor).

pub mod a32;
pub mod a64;
pub mod bits;
pub mod code;
pub mod decoder;
pub mod exception;
pub mod outcome;
pub mod translate;

pub use bits::Imm;
pub use code::CodeReader;
pub use decoder::{parse_pattern, DecodeTable, Matcher};
pub use exception::Exception;
pub use outcome::{InstOutcome, Rejection};
pub use translate::{translate, Translator};
