// This module is the execution side of the engine: the traits through which the dispatcher
// talks to the host (executor, interpreter fallback, exception handler, memory callbacks), the
// per-context and shared block caches, the dispatch loop, and a reference IR evaluator that
// can stand in for a code generator.

//! Block caching and dispatch.

pub mod cache;
pub mod callbacks;
pub mod dispatcher;
pub mod evaluator;
pub mod shared_cache;

pub use cache::{BlockCache, BlockStore};
pub use callbacks::{
    Environment, ExceptionAction, ExceptionHandler, ExecutionStatus, Executor, Interpreter, MemoryCallbacks,
};
pub use dispatcher::{Dispatcher, HaltReason, StepResult};
pub use evaluator::{Evaluator, GuestState};
pub use shared_cache::SharedBlockCache;
