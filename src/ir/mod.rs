// This module is the architecture-neutral intermediate representation produced by the
// frontends and consumed by an external code generator. It defines the type lattice, immutable
// SSA values, the closed opcode set with its static signature table, memory access tags,
// location descriptors (the block cache key), terminals, the Block container, and the
// append-only IrEmitter that enforces signatures while translator routines build a block.

//! Intermediate representation.
//!
//! - [`types`] - the value type lattice and per-argument type sets
//! - [`value`] - SSA values and instruction references
//! - [`opcode`] - closed opcode set with static signatures
//! - [`location`] - location descriptors used as cache keys
//! - [`terminal`] - control-flow dispositions ending a block
//! - [`block`] - the translated unit
//! - [`emitter`] - the checked, append-only block builder

pub mod acc_type;
pub mod block;
pub mod emitter;
pub mod location;
pub mod opcode;
pub mod terminal;
pub mod types;
pub mod value;

pub use acc_type::AccType;
pub use block::{Block, Inst};
pub use emitter::IrEmitter;
pub use location::{A32LocationDescriptor, A64LocationDescriptor, LocationDescriptor};
pub use opcode::{OpInfo, Opcode, ResultType};
pub use terminal::Terminal;
pub use types::{Type, TypeSet};
pub use value::{InstRef, Value};
