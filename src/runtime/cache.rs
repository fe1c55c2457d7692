// This module implements the per-context block cache. Blocks are stored behind Arc so an
// executor can keep running a block after it has been invalidated; invalidation only affects
// the next lookup. A page index (4 KiB guest pages to the descriptors whose blocks touch them)
// narrows the candidates for a range invalidation, and exact range intersection decides which
// of them are removed. Links record which blocks branch directly to which, so that removing a
// block also severs every link into and out of it.

//! Block cache.

use std::sync::Arc;

use hashbrown::{HashMap, HashSet};

use crate::core::error::TranslateResult;
use crate::core::stats::CacheStats;
use crate::ir::{Block, LocationDescriptor};

pub const PAGE_BITS: u32 = 12;

/// Pages touched by the guest byte range `[start, end)`.
pub(crate) fn pages_of(start: u64, end: u64) -> std::ops::RangeInclusive<u64> {
    let last = end.max(start.saturating_add(1)) - 1;
    (start >> PAGE_BITS)..=(last >> PAGE_BITS)
}

/// Storage the dispatcher looks blocks up in.
pub trait BlockStore {
    /// Cached block for `location`, if any.
    fn get(&mut self, location: LocationDescriptor) -> Option<Arc<Block>>;

    /// Like `get`, without counting a hit or miss.
    fn peek(&self, location: LocationDescriptor) -> Option<Arc<Block>>;

    /// Cached block for `location`, translating and inserting it on a miss.
    fn get_or_translate<F>(&mut self, location: LocationDescriptor, translate: F) -> TranslateResult<Arc<Block>>
    where
        F: FnOnce(LocationDescriptor) -> TranslateResult<Block>;

    /// Remove every block overlapping `[start, start + len)`.
    fn invalidate_range(&mut self, start: u64, len: u64) -> Vec<LocationDescriptor>;

    /// Record that the block at `from` branches directly to `to`.
    fn link(&mut self, from: LocationDescriptor, to: LocationDescriptor);

    /// True if a link from `from` to `to` is recorded and `to` is still cached.
    fn is_linked(&self, from: LocationDescriptor, to: LocationDescriptor) -> bool;

    fn stats(&self) -> CacheStats;
}

/// Block cache owned by a single execution context.
#[derive(Debug, Default)]
pub struct BlockCache {
    blocks: HashMap<LocationDescriptor, Arc<Block>>,
    pages: HashMap<u64, HashSet<LocationDescriptor>>,
    /// Target to the sources that branch to it.
    links_in: HashMap<LocationDescriptor, HashSet<LocationDescriptor>>,
    /// Source to the targets it branches to.
    links_out: HashMap<LocationDescriptor, HashSet<LocationDescriptor>>,
    stats: CacheStats,
}

impl BlockCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn contains(&self, location: LocationDescriptor) -> bool {
        self.blocks.contains_key(&location)
    }

    /// Look up without touching statistics.
    pub fn peek(&self, location: LocationDescriptor) -> Option<&Arc<Block>> {
        self.blocks.get(&location)
    }

    pub fn get(&mut self, location: LocationDescriptor) -> Option<Arc<Block>> {
        match self.blocks.get(&location) {
            Some(block) => {
                self.stats.hits += 1;
                log::trace!("cache hit {location}");
                Some(Arc::clone(block))
            }
            None => {
                self.stats.misses += 1;
                log::trace!("cache miss {location}");
                None
            }
        }
    }

    /// Insert `block` under its own location.
    ///
    /// If a block is already cached there, it is kept and returned instead.
    pub fn insert(&mut self, block: Block) -> Arc<Block> {
        let location = block.location();
        if let Some(existing) = self.blocks.get(&location) {
            return Arc::clone(existing);
        }

        let range = block.covered_range();
        for page in pages_of(range.start, range.end) {
            self.pages.entry(page).or_default().insert(location);
        }
        let block = Arc::new(block);
        self.blocks.insert(location, Arc::clone(&block));
        self.stats.insertions += 1;
        block
    }

    pub fn get_or_translate<F>(&mut self, location: LocationDescriptor, translate: F) -> TranslateResult<Arc<Block>>
    where
        F: FnOnce(LocationDescriptor) -> TranslateResult<Block>,
    {
        if let Some(block) = self.get(location) {
            return Ok(block);
        }
        let block = translate(location)?;
        Ok(self.insert(block))
    }

    /// Remove every block whose guest bytes overlap `[start, start + len)`.
    ///
    /// Returns the removed locations ordered by PC.
    pub fn invalidate_range(&mut self, start: u64, len: u64) -> Vec<LocationDescriptor> {
        if len == 0 {
            return Vec::new();
        }
        let end = start.saturating_add(len);

        let page_range = pages_of(start, end);
        let page_count = page_range.end() - page_range.start() + 1;
        let candidates: HashSet<LocationDescriptor> = if page_count > self.pages.len() as u64 {
            self.pages
                .iter()
                .filter(|(page, _)| page_range.contains(page))
                .flat_map(|(_, locations)| locations.iter().copied())
                .collect()
        } else {
            page_range
                .filter_map(|page| self.pages.get(&page))
                .flat_map(|locations| locations.iter().copied())
                .collect()
        };

        let mut removed: Vec<LocationDescriptor> = candidates
            .into_iter()
            .filter(|location| {
                self.blocks
                    .get(location)
                    .is_some_and(|block| block.intersects(start, end))
            })
            .collect();
        removed.sort_by_key(|location| location.pc());

        for &location in &removed {
            self.remove(location);
        }
        self.stats.invalidated += removed.len();

        log::debug!(
            "invalidated [{start:#x}, {end:#x}): {} blocks removed, {} remain",
            removed.len(),
            self.blocks.len()
        );
        removed
    }

    fn remove(&mut self, location: LocationDescriptor) {
        let Some(block) = self.blocks.remove(&location) else {
            return;
        };

        let range = block.covered_range();
        for page in pages_of(range.start, range.end) {
            if let Some(locations) = self.pages.get_mut(&page) {
                locations.remove(&location);
                if locations.is_empty() {
                    self.pages.remove(&page);
                }
            }
        }

        for source in self.links_in.remove(&location).unwrap_or_default() {
            if let Some(targets) = self.links_out.get_mut(&source) {
                targets.remove(&location);
            }
        }
        for target in self.links_out.remove(&location).unwrap_or_default() {
            if let Some(sources) = self.links_in.get_mut(&target) {
                sources.remove(&location);
            }
        }
    }

    pub fn clear(&mut self) {
        let count = self.blocks.len();
        self.blocks.clear();
        self.pages.clear();
        self.links_in.clear();
        self.links_out.clear();
        self.stats.invalidated += count;
        log::debug!("cache cleared: {count} blocks removed");
    }

    /// Record a direct branch from `from` to `to`. Both must be cached.
    pub fn link(&mut self, from: LocationDescriptor, to: LocationDescriptor) {
        if !self.contains(from) || !self.contains(to) {
            return;
        }
        if self.links_out.entry(from).or_default().insert(to) {
            self.links_in.entry(to).or_default().insert(from);
            self.stats.links += 1;
        }
    }

    pub fn is_linked(&self, from: LocationDescriptor, to: LocationDescriptor) -> bool {
        self.links_out.get(&from).is_some_and(|targets| targets.contains(&to))
    }

    /// Locations whose blocks are linked to `location`.
    pub fn links_to(&self, location: LocationDescriptor) -> Vec<LocationDescriptor> {
        let mut sources: Vec<_> = self
            .links_in
            .get(&location)
            .map(|sources| sources.iter().copied().collect())
            .unwrap_or_default();
        sources.sort_by_key(|location| location.pc());
        sources
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

impl BlockStore for BlockCache {
    fn get(&mut self, location: LocationDescriptor) -> Option<Arc<Block>> {
        BlockCache::get(self, location)
    }

    fn peek(&self, location: LocationDescriptor) -> Option<Arc<Block>> {
        BlockCache::peek(self, location).cloned()
    }

    fn get_or_translate<F>(&mut self, location: LocationDescriptor, translate: F) -> TranslateResult<Arc<Block>>
    where
        F: FnOnce(LocationDescriptor) -> TranslateResult<Block>,
    {
        BlockCache::get_or_translate(self, location, translate)
    }

    fn invalidate_range(&mut self, start: u64, len: u64) -> Vec<LocationDescriptor> {
        BlockCache::invalidate_range(self, start, len)
    }

    fn link(&mut self, from: LocationDescriptor, to: LocationDescriptor) {
        BlockCache::link(self, from, to)
    }

    fn is_linked(&self, from: LocationDescriptor, to: LocationDescriptor) -> bool {
        BlockCache::is_linked(self, from, to)
    }

    fn stats(&self) -> CacheStats {
        BlockCache::stats(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{A64LocationDescriptor, Terminal};

    /// A block of `count` 4-byte instructions at `pc` ending in a branch to itself.
    fn block(pc: u64, count: usize) -> Block {
        let location: LocationDescriptor = A64LocationDescriptor::new(pc, 0, false).into();
        let mut block = Block::new(location);
        for _ in 0..count {
            block.record_guest_instruction(4);
        }
        block.set_terminal(Terminal::LinkBlock { next: location }).unwrap();
        block
    }

    fn loc(pc: u64) -> LocationDescriptor {
        A64LocationDescriptor::new(pc, 0, false).into()
    }

    #[test]
    fn test_insert_is_memoized() {
        let mut cache = BlockCache::new();
        let first = cache.insert(block(0x1000, 2));
        let second = cache.insert(block(0x1000, 5));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.guest_instruction_count(), 2);
        assert_eq!(cache.stats().insertions, 1);
    }

    #[test]
    fn test_get_counts_hits_and_misses() {
        let mut cache = BlockCache::new();
        assert!(cache.get(loc(0x1000)).is_none());
        cache.insert(block(0x1000, 1));
        assert!(cache.get(loc(0x1000)).is_some());
        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses), (1, 1));
    }

    #[test]
    fn test_get_or_translate_translates_once() {
        let mut cache = BlockCache::new();
        let mut calls = 0;
        for _ in 0..3 {
            cache
                .get_or_translate(loc(0x2000), |_| {
                    calls += 1;
                    Ok(block(0x2000, 1))
                })
                .unwrap();
        }
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_invalidate_exact_intersection() {
        let mut cache = BlockCache::new();
        cache.insert(block(0x1000, 4)); // [0x1000, 0x1010)
        cache.insert(block(0x1010, 4)); // [0x1010, 0x1020)
        cache.insert(block(0x3000, 1));

        assert!(cache.invalidate_range(0x1020, 0x10).is_empty());
        assert_eq!(cache.invalidate_range(0x100C, 8), vec![loc(0x1000), loc(0x1010)]);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(loc(0x3000)));
        assert_eq!(cache.stats().invalidated, 2);
    }

    #[test]
    fn test_block_spanning_pages() {
        let mut cache = BlockCache::new();
        cache.insert(block(0x0FF8, 4)); // [0xff8, 0x1008)
        assert_eq!(cache.invalidate_range(0x1004, 1), vec![loc(0x0FF8)]);
    }

    #[test]
    fn test_huge_range_uses_index_scan() {
        let mut cache = BlockCache::new();
        cache.insert(block(0x1000, 1));
        cache.insert(block(0xFFFF_0000, 1));
        assert_eq!(cache.invalidate_range(0, u64::MAX).len(), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_links_severed_on_invalidate() {
        let mut cache = BlockCache::new();
        cache.insert(block(0x1000, 1));
        cache.insert(block(0x2000, 1));
        cache.link(loc(0x1000), loc(0x2000));
        cache.link(loc(0x1000), loc(0x2000));
        assert_eq!(cache.stats().links, 1);
        assert_eq!(cache.links_to(loc(0x2000)), vec![loc(0x1000)]);

        cache.invalidate_range(0x2000, 4);
        assert!(!cache.is_linked(loc(0x1000), loc(0x2000)));
        assert!(cache.links_to(loc(0x2000)).is_empty());
    }

    #[test]
    fn test_link_requires_cached_blocks() {
        let mut cache = BlockCache::new();
        cache.insert(block(0x1000, 1));
        cache.link(loc(0x1000), loc(0x5000));
        assert_eq!(cache.stats().links, 0);
    }
}
