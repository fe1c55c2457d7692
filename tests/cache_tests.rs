//! Block cache invalidation properties.

mod common;

use armdbt::core::TranslationOptions;
use armdbt::frontend::Translator;
use armdbt::ir::{A32LocationDescriptor, A64LocationDescriptor, Block, LocationDescriptor, Terminal};
use armdbt::runtime::{BlockCache, BlockStore, SharedBlockCache};
use proptest::prelude::*;

const NOP: u32 = 0xD503_201F;

/// A straight-line block of `len` NOPs at `pc`.
fn nop_block(pc: u64, len: usize) -> Block {
    let reader = |_vaddr: u64| Some(NOP);
    let mut translator = Translator::new(TranslationOptions::default().with_max_block_instructions(len));
    translator
        .translate(A64LocationDescriptor::new(pc, 0, false).into(), &reader)
        .unwrap()
}

fn block_shape() -> impl Strategy<Value = (u64, usize)> {
    // Up to a few pages so blocks straddle page boundaries.
    ((0u64..0x4000).prop_map(|pc| pc & !3), 1usize..64)
}

proptest! {
    #[test]
    fn invalidation_removes_exactly_overlapping_blocks(
        shapes in prop::collection::vec(block_shape(), 1..24),
        start in 0u64..0x5000,
        len in 0u64..0x2000,
    ) {
        let mut cache = BlockCache::new();
        let blocks: Vec<_> = shapes.iter().map(|&(pc, n)| cache.insert(nop_block(pc, n))).collect();

        let removed = cache.invalidate_range(start, len);

        let mut expected: Vec<LocationDescriptor> = blocks
            .iter()
            .filter(|block| len > 0 && block.intersects(start, start + len))
            .map(|block| block.location())
            .collect();
        expected.sort_by_key(|location| location.pc());
        expected.dedup();
        prop_assert_eq!(&removed, &expected);

        for block in &blocks {
            prop_assert_eq!(cache.contains(block.location()), !removed.contains(&block.location()));
        }
    }

    #[test]
    fn invalidation_severs_links(
        a in block_shape(),
        b in block_shape(),
        start in 0u64..0x5000,
        len in 1u64..0x100,
    ) {
        let mut cache = BlockCache::new();
        let first = cache.insert(nop_block(a.0, a.1)).location();
        let second = cache.insert(nop_block(b.0, b.1)).location();
        cache.link(first, second);

        let removed = cache.invalidate_range(start, len);
        let linked = cache.is_linked(first, second);
        if removed.contains(&first) || removed.contains(&second) {
            prop_assert!(!linked);
        } else {
            prop_assert!(linked);
        }
    }
}

#[test]
fn test_get_or_translate_memoizes() {
    common::init_logging();
    let mut cache = BlockCache::new();
    let location: LocationDescriptor = A64LocationDescriptor::new(0x1000, 0, false).into();
    let mut calls = 0;
    for _ in 0..3 {
        let block = cache
            .get_or_translate(location, |_| {
                calls += 1;
                Ok(nop_block(0x1000, 4))
            })
            .unwrap();
        assert_eq!(block.location(), location);
    }
    assert_eq!(calls, 1);
    let stats = cache.stats();
    assert_eq!((stats.hits, stats.misses, stats.insertions), (2, 1, 1));
}

#[test]
fn test_translation_error_is_not_cached() {
    let mut cache = BlockCache::new();
    let location: LocationDescriptor = A64LocationDescriptor::new(0x1000, 0, false).into();
    let error = armdbt::core::TranslateError::MissingTerminal { location };
    assert_eq!(cache.get_or_translate(location, |_| Err(error.clone())).unwrap_err(), error);
    assert!(cache.is_empty());
}

#[test]
fn test_shared_cache_invalidate_bumps_epoch() {
    let cache = SharedBlockCache::new();
    cache.insert(nop_block(0x1000, 2));
    cache.insert(nop_block(0x3000, 2));
    let epoch = cache.epoch();

    let removed = cache.invalidate_range(0x1004, 1);
    assert_eq!(removed, vec![LocationDescriptor::from(A64LocationDescriptor::new(0x1000, 0, false))]);
    assert!(cache.epoch() > epoch);
    assert_eq!(cache.len(), 1);

    let mut store = std::sync::Arc::new(cache);
    assert!(BlockStore::peek(&store, A64LocationDescriptor::new(0x3000, 0, false).into()).is_some());
    assert!(BlockStore::get(&mut store, A64LocationDescriptor::new(0x1000, 0, false).into()).is_none());
}

#[test]
fn test_block_stops_at_address_space_wrap() {
    common::init_logging();
    // nop at the last word, svc #0 at address zero.
    let reader = |vaddr: u64| match vaddr {
        0xFFFF_FFFC => Some(0xE320_F000u32),
        0 => Some(0xEF00_0000u32),
        _ => None,
    };
    let mut translator = Translator::new(TranslationOptions::default());
    let location: LocationDescriptor = A32LocationDescriptor::arm(0xFFFF_FFFC).into();
    let block = translator.translate(location, &reader).unwrap();

    assert_eq!(block.guest_instruction_count(), 1);
    assert_eq!(block.covered_range(), 0xFFFF_FFFC..0x1_0000_0000);
    assert_eq!(
        *block.terminal(),
        Terminal::Continue {
            next: A32LocationDescriptor::arm(0).into()
        }
    );

    let mut cache = BlockCache::new();
    cache.insert(block);
    let wrapped = cache.insert(translator.translate(A32LocationDescriptor::arm(0).into(), &reader).unwrap());
    assert_eq!(cache.invalidate_range(0, 4), vec![wrapped.location()]);
    assert!(cache.contains(location));
    assert_eq!(cache.invalidate_range(0xFFFF_FFFC, 4), vec![location]);
    assert!(cache.is_empty());
}
