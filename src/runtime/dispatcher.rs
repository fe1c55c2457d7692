// This module implements the dispatch loop. Each step takes the current location from the
// executor, finds the block for it (through a recorded link when the previous block ended in a
// direct branch to an already-cached block, otherwise through the block store, translating on
// a miss), executes it, and resolves its terminal: sequential and direct-branch terminals set
// the next location, indirect branches leave it to the executor, interpreter terminals call
// the interpreter fallback, and exception terminals ask the host's exception handler what to
// do. CheckHalt terminals poll the executor for a halt request before continuing.

//! Dispatcher.

use std::sync::Arc;

use super::cache::{BlockCache, BlockStore};
use super::callbacks::{Environment, ExceptionAction, ExecutionStatus};
use crate::core::config::TranslationOptions;
use crate::core::error::DispatchError;
use crate::core::stats::{CacheStats, DispatchStats, TranslationStats};
use crate::frontend::{CodeReader, Exception, Translator};
use crate::ir::{Block, LocationDescriptor, Terminal};

/// Why dispatching stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltReason {
    /// A `CheckHalt` terminal found a pending halt request.
    Requested,
    /// The exception handler chose to halt.
    Exception {
        location: LocationDescriptor,
        exception: Exception,
    },
    /// The executor stopped inside a block.
    Executor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    Continue,
    Halted(HaltReason),
}

pub struct Dispatcher<S: BlockStore = BlockCache> {
    store: S,
    translator: Translator,
    /// Block reached through the last direct branch, and the block it came from.
    linked: Option<(LocationDescriptor, Arc<Block>)>,
    stats: DispatchStats,
}

impl Dispatcher<BlockCache> {
    /// Dispatcher with a private block cache.
    pub fn new(options: TranslationOptions) -> Self {
        Self::with_store(BlockCache::new(), options)
    }
}

impl<S: BlockStore> Dispatcher<S> {
    pub fn with_store(store: S, options: TranslationOptions) -> Self {
        Self {
            store,
            translator: Translator::new(options),
            linked: None,
            stats: DispatchStats::default(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn options(&self) -> &TranslationOptions {
        self.translator.options()
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    pub fn translation_stats(&self) -> &TranslationStats {
        self.translator.stats()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.store.stats()
    }

    /// Drop cached blocks overlapping guest memory that changed.
    pub fn invalidate_range(&mut self, start: u64, len: u64) -> Vec<LocationDescriptor> {
        let removed = self.store.invalidate_range(start, len);
        if let Some((_, block)) = &self.linked {
            if removed.contains(&block.location()) {
                self.linked = None;
            }
        }
        removed
    }

    /// Execute one block and resolve its terminal.
    pub fn step<E: Environment>(&mut self, env: &mut E) -> Result<StepResult, DispatchError> {
        let location = env.location();
        let block = self.block_for(location, env)?;

        self.stats.blocks_executed += 1;
        if env.execute(&block) == ExecutionStatus::Halted {
            log::debug!("{location}: executor halted");
            return Ok(StepResult::Halted(HaltReason::Executor));
        }
        self.resolve(&block, block.terminal(), env)
    }

    /// Step until something halts, failing after `max_steps` blocks.
    pub fn run<E: Environment>(&mut self, env: &mut E, max_steps: usize) -> Result<HaltReason, DispatchError> {
        for _ in 0..max_steps {
            if let StepResult::Halted(reason) = self.step(env)? {
                log::debug!("dispatch halted at {}: {reason:?}", env.location());
                return Ok(reason);
            }
        }
        Err(DispatchError::StepLimit(max_steps))
    }

    fn block_for<E: Environment>(
        &mut self,
        location: LocationDescriptor,
        env: &E,
    ) -> Result<Arc<Block>, DispatchError> {
        if let Some((from, block)) = self.linked.take() {
            if block.location() == location && self.store.is_linked(from, location) {
                self.stats.linked_entries += 1;
                return Ok(block);
            }
        }

        let translator = &mut self.translator;
        let code: &dyn CodeReader = env;
        let block = self
            .store
            .get_or_translate(location, |location| translator.translate(location, code))?;
        Ok(block)
    }

    fn resolve<E: Environment>(
        &mut self,
        block: &Block,
        terminal: &Terminal,
        env: &mut E,
    ) -> Result<StepResult, DispatchError> {
        match terminal {
            Terminal::Continue { next } => env.set_location(*next),
            Terminal::LinkBlock { next } => {
                env.set_location(*next);
                if self.options().enable_block_linking {
                    if let Some(target) = self.store.peek(*next) {
                        self.store.link(block.location(), *next);
                        self.linked = Some((block.location(), target));
                    }
                }
            }
            Terminal::IndirectBranch | Terminal::ReturnToDispatch => {}
            Terminal::Interpret { location, num_instructions } => {
                self.stats.interpreter_calls += 1;
                env.set_location(*location);
                let resume = env.interpret(*location, *num_instructions);
                env.set_location(resume);
            }
            Terminal::RaiseException { location, exception, next } => {
                self.stats.exceptions_raised += 1;
                env.set_location(*location);
                match env.exception_raised(*location, *exception) {
                    ExceptionAction::Resume => {}
                    ExceptionAction::Skip => env.set_location(*next),
                    ExceptionAction::Halt => {
                        return Ok(StepResult::Halted(HaltReason::Exception {
                            location: *location,
                            exception: *exception,
                        }))
                    }
                }
            }
            Terminal::CheckHalt { else_ } => {
                if env.halt_requested() {
                    return Ok(StepResult::Halted(HaltReason::Requested));
                }
                return self.resolve(block, else_, env);
            }
            Terminal::Invalid => return Err(DispatchError::InvalidTerminal { location: block.location() }),
        }
        Ok(StepResult::Continue)
    }
}
