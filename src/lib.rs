//! armdbt - translation and block caching core for ARM guest code.
//!
//! Guest machine code (A64, A32 and Thumb) is decoded through static
//! mask/value tables, translated one instruction at a time into a typed SSA
//! intermediate representation, and cached as blocks keyed by a location
//! descriptor. Host code generation, the interpreter fallback and peripheral
//! callbacks live outside the crate and are reached through the traits in
//! [`runtime`].
//!
//! # Primary Usage
//!
//! ```ignore
//! use armdbt::core::TranslationOptions;
//! use armdbt::frontend::Translator;
//! use armdbt::ir::A64LocationDescriptor;
//!
//! let code = |vaddr: u64| (vaddr == 0x1000).then_some(0x9100_0820u32);
//! let mut translator = Translator::new(TranslationOptions::default());
//! let block = translator.translate(A64LocationDescriptor::new(0x1000, 0, false).into(), &code)?;
//! println!("{block}");
//! ```
//!
//! # Architecture
//!
//! - [`frontend`] - decode tables, disassemblers and per-instruction translators
//! - [`ir`] - blocks, opcodes, values, terminals and the IR emitter
//! - [`runtime`] - block caches, the dispatcher and host-facing traits
//! - [`core`] - options, statistics and error types

pub mod core;
pub mod frontend;
pub mod ir;
pub mod runtime;

pub use core::{
    CacheStats, DispatchError, DispatchStats, TranslateError, TranslateResult, TranslationOptions,
    TranslationStats, UnpredictablePolicy,
};
pub use frontend::{CodeReader, Exception, Translator};
pub use ir::{A32LocationDescriptor, A64LocationDescriptor, Block, LocationDescriptor, Terminal};
pub use runtime::{BlockCache, BlockStore, Dispatcher, SharedBlockCache};
