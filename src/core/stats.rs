// Counters kept by the translator and the block cache. They are plain data, cheap to clone
// and print, and are reset only by replacing them. The Display impls produce the short report
// shown by the irdump tool and in debug logs.

//! Translation and cache statistics.

use std::fmt;

use hashbrown::HashMap;

use crate::frontend::Rejection;

/// Statistics accumulated by a [`Translator`](crate::frontend::Translator).
#[derive(Debug, Default, Clone)]
pub struct TranslationStats {
    /// Blocks translated successfully.
    pub blocks_translated: usize,

    /// Guest instructions decoded, including rejected ones.
    pub guest_instructions: usize,

    /// IR instructions emitted into completed blocks.
    pub ir_instructions: usize,

    /// Count of each decoded mnemonic.
    pub mnemonic_counts: HashMap<&'static str, usize>,

    pub unallocated: usize,
    pub unpredictable: usize,
    pub reserved: usize,

    /// Instructions left to the interpreter fallback.
    pub interpreter_fallbacks: usize,

    /// Blocks abandoned because of an IR contract violation.
    pub failed_blocks: usize,
}

impl TranslationStats {
    pub fn record_instruction(&mut self, mnemonic: &'static str) {
        self.guest_instructions += 1;
        *self.mnemonic_counts.entry(mnemonic).or_insert(0) += 1;
    }

    pub fn record_rejection(&mut self, rejection: Rejection) {
        match rejection {
            Rejection::Unallocated => self.unallocated += 1,
            Rejection::Unpredictable => self.unpredictable += 1,
            Rejection::ReservedValue => self.reserved += 1,
            Rejection::Unsupported => self.interpreter_fallbacks += 1,
        }
    }
}

impl fmt::Display for TranslationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Translation Statistics:")?;
        writeln!(f, "  Blocks translated: {}", self.blocks_translated)?;
        writeln!(f, "  Guest instructions: {}", self.guest_instructions)?;
        writeln!(f, "  IR instructions: {}", self.ir_instructions)?;
        writeln!(f, "  Unallocated: {}", self.unallocated)?;
        writeln!(f, "  Unpredictable: {}", self.unpredictable)?;
        writeln!(f, "  Reserved values: {}", self.reserved)?;
        writeln!(f, "  Interpreter fallbacks: {}", self.interpreter_fallbacks)?;
        if self.failed_blocks > 0 {
            writeln!(f, "  Failed blocks: {}", self.failed_blocks)?;
        }

        if !self.mnemonic_counts.is_empty() {
            writeln!(f, "  Mnemonic breakdown:")?;
            let mut sorted: Vec<_> = self.mnemonic_counts.iter().collect();
            sorted.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
            for (mnemonic, count) in sorted.into_iter().take(10) {
                writeln!(f, "    {}: {}", mnemonic, count)?;
            }
        }

        Ok(())
    }
}

/// Statistics kept by the block caches.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub insertions: usize,
    pub invalidated: usize,
    pub links: usize,
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Block Cache Statistics:")?;
        writeln!(f, "  Hits: {}", self.hits)?;
        writeln!(f, "  Misses: {}", self.misses)?;
        writeln!(f, "  Insertions: {}", self.insertions)?;
        writeln!(f, "  Blocks invalidated: {}", self.invalidated)?;
        writeln!(f, "  Links recorded: {}", self.links)
    }
}

/// Statistics kept by a [`Dispatcher`](crate::runtime::Dispatcher).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchStats {
    pub blocks_executed: usize,
    /// Blocks entered through a recorded link instead of a cache lookup.
    pub linked_entries: usize,
    pub interpreter_calls: usize,
    pub exceptions_raised: usize,
}

impl fmt::Display for DispatchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Dispatch Statistics:")?;
        writeln!(f, "  Blocks executed: {}", self.blocks_executed)?;
        writeln!(f, "  Linked entries: {}", self.linked_entries)?;
        writeln!(f, "  Interpreter calls: {}", self.interpreter_calls)?;
        writeln!(f, "  Exceptions raised: {}", self.exceptions_raised)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_sorts_mnemonics_by_count() {
        let mut stats = TranslationStats::default();
        stats.record_instruction("ADD_imm");
        stats.record_instruction("LDP");
        stats.record_instruction("LDP");
        stats.record_rejection(Rejection::Unsupported);

        let text = stats.to_string();
        let ldp = text.find("LDP: 2").unwrap();
        let add = text.find("ADD_imm: 1").unwrap();
        assert!(ldp < add);
        assert!(text.contains("Interpreter fallbacks: 1"));
    }
}
