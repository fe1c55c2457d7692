// This module holds the 32-bit half of the frontend: ARM (A32 encoding) and Thumb (16- and
// 32-bit encodings) decode tables, the coprocessor capability trait through which the host
// services coprocessor instructions, the translator for both instruction sets, and a Thumb16
// disassembler for diagnostics.

//! A32 and Thumb frontend.

pub mod coprocessor;
pub mod decoder_arm;
pub mod decoder_thumb16;
pub mod decoder_thumb32;
pub mod disassembler_thumb;
pub mod translate;
mod types;

pub use coprocessor::{CoprocAction, CoprocCallback, Coprocessor, HostAddr};
pub use decoder_arm::{decode_arm, ArmInst, CoprocInst};
pub use decoder_thumb16::{decode_thumb16, is_thumb32_prefix, Thumb16Inst};
pub use decoder_thumb32::{decode_thumb32, Thumb32Inst};
pub use disassembler_thumb::disassemble_thumb16;
pub use translate::{translate, translate_single};
pub use types::{Cond, CoprocReg, Reg};
