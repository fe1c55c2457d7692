//! A64 frontend: decode table, translator routines and disassembler.

pub mod decoder;
pub mod disassembler;
pub mod translate;
mod types;

pub use decoder::{decode, A64Inst};
pub use disassembler::disassemble_a64;
pub use translate::{translate, translate_single, SystemRegister};
pub use types::{Reg, VReg};
