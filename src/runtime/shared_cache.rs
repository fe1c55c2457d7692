// This module implements a block cache shared by several execution contexts. Lookups take a
// read lock and proceed concurrently. A miss takes a per-descriptor build lock, so at most one
// context translates a given descriptor while the others wait and then find the finished block;
// translations of different descriptors run in parallel outside the cache lock. Every range
// invalidation bumps an epoch under the write lock; a block whose translation started before
// the current epoch is returned to its caller but not cached, because the guest bytes it was
// built from may have changed while it was being built.

//! Block cache shared between execution contexts.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::{Mutex, RwLock};

use super::cache::{BlockCache, BlockStore};
use crate::core::error::TranslateResult;
use crate::core::stats::CacheStats;
use crate::ir::{Block, LocationDescriptor};

#[derive(Debug, Default)]
pub struct SharedBlockCache {
    cache: RwLock<BlockCache>,
    building: Mutex<HashMap<LocationDescriptor, Arc<Mutex<()>>>>,
    epoch: AtomicU64,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl SharedBlockCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }

    pub fn contains(&self, location: LocationDescriptor) -> bool {
        self.cache.read().contains(location)
    }

    /// Number of range invalidations performed so far.
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    pub fn get(&self, location: LocationDescriptor) -> Option<Arc<Block>> {
        let found = self.cache.read().peek(location).cloned();
        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    pub fn insert(&self, block: Block) -> Arc<Block> {
        self.cache.write().insert(block)
    }

    pub fn get_or_translate<F>(&self, location: LocationDescriptor, translate: F) -> TranslateResult<Arc<Block>>
    where
        F: FnOnce(LocationDescriptor) -> TranslateResult<Block>,
    {
        if let Some(block) = self.get(location) {
            return Ok(block);
        }

        let build_lock = Arc::clone(self.building.lock().entry(location).or_default());
        let result = self.build(location, &build_lock, translate);

        let mut building = self.building.lock();
        if building.get(&location).is_some_and(|lock| Arc::ptr_eq(lock, &build_lock)) {
            building.remove(&location);
        }
        result
    }

    fn build<F>(&self, location: LocationDescriptor, build_lock: &Mutex<()>, translate: F) -> TranslateResult<Arc<Block>>
    where
        F: FnOnce(LocationDescriptor) -> TranslateResult<Block>,
    {
        let _building = build_lock.lock();
        // Another context may have finished this block while we waited.
        if let Some(block) = self.cache.read().peek(location).cloned() {
            return Ok(block);
        }

        let started = self.epoch();
        let block = translate(location)?;

        let mut cache = self.cache.write();
        if self.epoch() == started {
            Ok(cache.insert(block))
        } else {
            log::debug!("{location}: invalidated during translation, not cached");
            Ok(Arc::new(block))
        }
    }

    pub fn invalidate_range(&self, start: u64, len: u64) -> Vec<LocationDescriptor> {
        let mut cache = self.cache.write();
        self.epoch.fetch_add(1, Ordering::AcqRel);
        cache.invalidate_range(start, len)
    }

    pub fn clear(&self) {
        let mut cache = self.cache.write();
        self.epoch.fetch_add(1, Ordering::AcqRel);
        cache.clear();
    }

    pub fn link(&self, from: LocationDescriptor, to: LocationDescriptor) {
        self.cache.write().link(from, to);
    }

    pub fn is_linked(&self, from: LocationDescriptor, to: LocationDescriptor) -> bool {
        self.cache.read().is_linked(from, to)
    }

    pub fn links_to(&self, location: LocationDescriptor) -> Vec<LocationDescriptor> {
        self.cache.read().links_to(location)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            ..self.cache.read().stats()
        }
    }
}

impl BlockStore for Arc<SharedBlockCache> {
    fn get(&mut self, location: LocationDescriptor) -> Option<Arc<Block>> {
        SharedBlockCache::get(self, location)
    }

    fn peek(&self, location: LocationDescriptor) -> Option<Arc<Block>> {
        self.cache.read().peek(location).cloned()
    }

    fn get_or_translate<F>(&mut self, location: LocationDescriptor, translate: F) -> TranslateResult<Arc<Block>>
    where
        F: FnOnce(LocationDescriptor) -> TranslateResult<Block>,
    {
        SharedBlockCache::get_or_translate(self, location, translate)
    }

    fn invalidate_range(&mut self, start: u64, len: u64) -> Vec<LocationDescriptor> {
        SharedBlockCache::invalidate_range(self, start, len)
    }

    fn link(&mut self, from: LocationDescriptor, to: LocationDescriptor) {
        SharedBlockCache::link(self, from, to)
    }

    fn is_linked(&self, from: LocationDescriptor, to: LocationDescriptor) -> bool {
        SharedBlockCache::is_linked(self, from, to)
    }

    fn stats(&self) -> CacheStats {
        SharedBlockCache::stats(self)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;

    use super::*;
    use crate::ir::{A64LocationDescriptor, Terminal};

    fn block(location: LocationDescriptor) -> Block {
        let mut block = Block::new(location);
        block.record_guest_instruction(4);
        block.set_terminal(Terminal::ReturnToDispatch).unwrap();
        block
    }

    fn loc(pc: u64) -> LocationDescriptor {
        A64LocationDescriptor::new(pc, 0, false).into()
    }

    #[test]
    fn test_concurrent_misses_translate_once() {
        let cache = Arc::new(SharedBlockCache::new());
        let translations = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let mut cache = Arc::clone(&cache);
                let translations = Arc::clone(&translations);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    cache
                        .get_or_translate(loc(0x4000), |location| {
                            translations.fetch_add(1, Ordering::SeqCst);
                            thread::sleep(Duration::from_millis(20));
                            Ok(block(location))
                        })
                        .unwrap()
                })
            })
            .collect();

        let blocks: Vec<Arc<Block>> = handles.into_iter().map(|handle| handle.join().unwrap()).collect();
        assert_eq!(translations.load(Ordering::SeqCst), 1);
        assert!(blocks.iter().all(|b| Arc::ptr_eq(b, &blocks[0])));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().insertions, 1);
    }

    #[test]
    fn test_invalidation_during_translation_is_not_cached() {
        let cache = SharedBlockCache::new();
        let result = cache
            .get_or_translate(loc(0x1000), |location| {
                cache.invalidate_range(0x1000, 4);
                Ok(block(location))
            })
            .unwrap();
        assert_eq!(result.location(), loc(0x1000));
        assert!(!cache.contains(loc(0x1000)));
        assert_eq!(cache.epoch(), 1);
    }

    #[test]
    fn test_invalidate_and_stats() {
        let cache = SharedBlockCache::new();
        cache.insert(block(loc(0x1000)));
        cache.insert(block(loc(0x2000)));
        assert!(cache.get(loc(0x1000)).is_some());
        assert!(cache.get(loc(0x3000)).is_none());

        assert_eq!(cache.invalidate_range(0x1000, 0x10), vec![loc(0x1000)]);
        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.invalidated), (1, 1, 1));
        assert_eq!(cache.len(), 1);
    }
}
