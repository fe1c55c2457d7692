//! Translation options.

use std::fmt;
use std::sync::Arc;

use crate::frontend::a32::coprocessor::Coprocessor;

/// What to do with an architecturally UNPREDICTABLE encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnpredictablePolicy {
    /// Compile an `UnpredictableInstruction` exception terminal.
    #[default]
    RaiseException,
    /// Hand the instruction to the interpreter fallback.
    Interpret,
}

/// Knobs consulted by the translators and the dispatcher.
#[derive(Clone)]
pub struct TranslationOptions {
    /// Hard limit on guest instructions per block; reaching it ends the block
    /// with a `Continue` terminal.
    pub max_block_instructions: usize,
    pub unpredictable_policy: UnpredictablePolicy,
    /// Emit `A64CheckSpAlignment` ahead of SP-based paired transfers.
    pub check_sp_alignment: bool,
    /// Let the dispatcher follow `LinkBlock` terminals to cached blocks.
    pub enable_block_linking: bool,
    /// Coprocessor capabilities indexed by coprocessor number.
    pub coprocessors: [Option<Arc<dyn Coprocessor>>; 16],
}

impl Default for TranslationOptions {
    fn default() -> Self {
        Self {
            max_block_instructions: 64,
            unpredictable_policy: UnpredictablePolicy::RaiseException,
            check_sp_alignment: false,
            enable_block_linking: true,
            coprocessors: Default::default(),
        }
    }
}

impl TranslationOptions {
    pub fn with_max_block_instructions(mut self, max: usize) -> Self {
        self.max_block_instructions = max.max(1);
        self
    }

    pub fn with_unpredictable_policy(mut self, policy: UnpredictablePolicy) -> Self {
        self.unpredictable_policy = policy;
        self
    }

    pub fn with_sp_alignment_check(mut self, enabled: bool) -> Self {
        self.check_sp_alignment = enabled;
        self
    }

    pub fn with_block_linking(mut self, enabled: bool) -> Self {
        self.enable_block_linking = enabled;
        self
    }

    /// Install `coprocessor` as coprocessor number `num` (0..=15).
    pub fn with_coprocessor(mut self, num: usize, coprocessor: Arc<dyn Coprocessor>) -> Self {
        if let Some(slot) = self.coprocessors.get_mut(num) {
            *slot = Some(coprocessor);
        } else {
            log::warn!("ignoring coprocessor number {num}, only 0..=15 exist");
        }
        self
    }

    pub fn coprocessor(&self, num: usize) -> Option<&Arc<dyn Coprocessor>> {
        self.coprocessors.get(num).and_then(Option::as_ref)
    }

    /// Effective block limit; never zero.
    pub fn block_limit(&self) -> usize {
        self.max_block_instructions.max(1)
    }
}

impl fmt::Debug for TranslationOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let installed: Vec<usize> = (0..16).filter(|&n| self.coprocessors[n].is_some()).collect();
        f.debug_struct("TranslationOptions")
            .field("max_block_instructions", &self.max_block_instructions)
            .field("unpredictable_policy", &self.unpredictable_policy)
            .field("check_sp_alignment", &self.check_sp_alignment)
            .field("enable_block_linking", &self.enable_block_linking)
            .field("coprocessors", &installed)
            .finish()
    }
}
