//! Dispatcher behaviour with the reference evaluator as executor.

mod common;

use std::sync::Arc;
use std::thread;

use armdbt::core::{DispatchError, TranslationOptions};
use armdbt::frontend::Exception;
use armdbt::ir::{A64LocationDescriptor, LocationDescriptor};
use armdbt::runtime::{Dispatcher, Executor, HaltReason, SharedBlockCache, StepResult};
use common::Guest;

// add x2, x2, #3
const ADD_3: u32 = 0x9100_0C42;
// b #-4
const B_BACK: u32 = 0x17FF_FFFF;
// subs x0, x0, #1 (left to the interpreter)
const SUBS: u32 = 0xF100_0400;
// movz x0, #5
const MOVZ_5: u32 = 0xD280_00A0;
// movz x0, #7
const MOVZ_7: u32 = 0xD280_00E0;
const BRK_0: u32 = 0xD420_0000;

fn a64(pc: u64) -> LocationDescriptor {
    A64LocationDescriptor::new(pc, 0, false).into()
}

#[test]
fn test_self_loop_uses_block_link() {
    common::init_logging();
    // loop: add x2, x2, #3; b loop
    let mut guest = Guest::with_a64_code(0x1000, &[ADD_3, B_BACK]);
    let mut dispatcher = Dispatcher::new(TranslationOptions::default());

    assert_eq!(dispatcher.run(&mut guest, 10), Err(DispatchError::StepLimit(10)));
    assert_eq!(guest.eval.state.x[2], 30);

    let stats = dispatcher.stats();
    assert_eq!(stats.blocks_executed, 10);
    assert_eq!(stats.linked_entries, 9);
    assert_eq!(dispatcher.translation_stats().blocks_translated, 1);
    assert!(dispatcher.store().is_linked(a64(0x1000), a64(0x1000)));
    assert_eq!(dispatcher.cache_stats().misses, 1);
}

#[test]
fn test_linking_disabled_goes_through_cache() {
    let mut guest = Guest::with_a64_code(0x1000, &[ADD_3, B_BACK]);
    let mut dispatcher = Dispatcher::new(TranslationOptions::default().with_block_linking(false));

    assert!(dispatcher.run(&mut guest, 10).is_err());
    assert_eq!(guest.eval.state.x[2], 30);
    assert_eq!(dispatcher.stats().linked_entries, 0);
    assert_eq!(dispatcher.cache_stats().hits, 9);
    assert_eq!(dispatcher.cache_stats().links, 0);
}

#[test]
fn test_invalidation_retranslates_modified_code() {
    let mut guest = Guest::with_a64_code(0x1000, &[MOVZ_5, BRK_0]);
    let mut dispatcher = Dispatcher::new(TranslationOptions::default());

    dispatcher.run(&mut guest, 4).unwrap();
    assert_eq!(guest.eval.state.x[0], 5);

    // Patch the code without telling the dispatcher: the cached block still runs.
    guest.eval.memory.load_words(0x1000, &[MOVZ_7]);
    guest.set_location(a64(0x1000));
    dispatcher.run(&mut guest, 4).unwrap();
    assert_eq!(guest.eval.state.x[0], 5);

    assert_eq!(dispatcher.invalidate_range(0x1000, 4), vec![a64(0x1000)]);
    guest.set_location(a64(0x1000));
    dispatcher.run(&mut guest, 4).unwrap();
    assert_eq!(guest.eval.state.x[0], 7);
    assert_eq!(dispatcher.translation_stats().blocks_translated, 2);
    assert_eq!(dispatcher.cache_stats().invalidated, 1);
}

#[test]
fn test_invalidating_other_range_keeps_block() {
    let mut guest = Guest::with_a64_code(0x1000, &[MOVZ_5, BRK_0]);
    let mut dispatcher = Dispatcher::new(TranslationOptions::default());
    dispatcher.run(&mut guest, 4).unwrap();

    assert!(dispatcher.invalidate_range(0x1008, 0x100).is_empty());
    assert!(dispatcher.invalidate_range(0x0, 0x1000).is_empty());
    assert!(dispatcher.store().contains(a64(0x1000)));
}

#[test]
fn test_interpreter_fallback_resumes_after_instruction() {
    let mut guest = Guest::with_a64_code(0x1000, &[ADD_3, SUBS, ADD_3, BRK_0]);
    let mut dispatcher = Dispatcher::new(TranslationOptions::default());

    let reason = dispatcher.run(&mut guest, 8).unwrap();
    assert_eq!(
        reason,
        HaltReason::Exception { location: a64(0x100C), exception: Exception::Breakpoint { imm: 0 } }
    );
    assert_eq!(guest.interpreted, vec![(a64(0x1004), 1)]);
    assert_eq!(guest.eval.state.x[2], 6);
    assert_eq!(dispatcher.stats().interpreter_calls, 1);
    assert_eq!(dispatcher.stats().blocks_executed, 2);
}

#[test]
fn test_single_step_honours_halt_request() {
    let mut guest = Guest::with_a64_code(0x1000, &[ADD_3, ADD_3, BRK_0]);
    guest.eval.state.single_stepping = true;
    let mut dispatcher = Dispatcher::new(TranslationOptions::default());

    assert_eq!(dispatcher.step(&mut guest).unwrap(), StepResult::Continue);
    assert_eq!(guest.location(), A64LocationDescriptor::new(0x1004, 0, true).into());

    guest.eval.halt = true;
    assert_eq!(dispatcher.step(&mut guest).unwrap(), StepResult::Halted(HaltReason::Requested));
    assert_eq!(guest.eval.state.x[2], 6);
    assert_eq!(dispatcher.translation_stats().guest_instructions, 2);
}

#[test]
fn test_shared_cache_translates_each_block_once() {
    common::init_logging();
    let cache = Arc::new(SharedBlockCache::new());
    let program = [ADD_3, ADD_3, 0x1400_0002, BRK_0, MOVZ_5, BRK_0];

    let translated: usize = (0..6)
        .map(|_| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                let mut guest = Guest::with_a64_code(0x1000, &program);
                let mut dispatcher = Dispatcher::with_store(cache, TranslationOptions::default());
                let reason = dispatcher.run(&mut guest, 8).unwrap();
                assert!(matches!(reason, HaltReason::Exception { location, .. } if location == a64(0x1014)));
                assert_eq!((guest.eval.state.x[0], guest.eval.state.x[2]), (5, 6));
                dispatcher.translation_stats().blocks_translated
            })
        })
        .collect::<Vec<_>>()
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .sum();

    // add; add; b +8 and movz; brk
    assert_eq!(translated, 2);
    assert_eq!(cache.len(), 2);
    assert_eq!(cache.stats().insertions, 2);
}
