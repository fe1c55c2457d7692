//! End-to-end A64 translation: IR shape of representative instructions and
//! their effect when run through the reference evaluator.

mod common;

use armdbt::core::TranslationOptions;
use armdbt::frontend::a64::{self, Reg};
use armdbt::frontend::{Exception, Translator};
use armdbt::ir::{A64LocationDescriptor, AccType, Block, LocationDescriptor, Opcode, Terminal, Value};
use armdbt::runtime::evaluator::Fault;
use armdbt::runtime::{Dispatcher, ExceptionAction, ExecutionStatus, Executor, HaltReason};
use common::Guest;

// ldp x1, x2, [x0], #16
const LDP_POST: u32 = 0xA8C1_0801;
// stp x1, x2, [sp, #-16]!
const STP_PRE_SP: u32 = 0xA9BF_0BE1;
// ldp x1, x2, [sp, #16]
const LDP_SP: u32 = 0xA941_0BE1;
// movz x1, #0xc0, lsl #16
const MOVZ_RMODE: u32 = 0xD2A0_1801;
// msr fpcr, x1
const MSR_FPCR: u32 = 0xD51B_4401;
// mrs x2, fpcr
const MRS_FPCR: u32 = 0xD53B_4402;
const SVC_0: u32 = 0xD400_0001;

fn single(pc: u64, word: u32, options: &TranslationOptions) -> Block {
    a64::translate_single(A64LocationDescriptor::new(pc, 0, false), word, options).unwrap()
}

#[test]
fn test_post_indexed_pair_load() {
    common::init_logging();
    let block = single(0x1000, LDP_POST, &TranslationOptions::default());
    assert!(matches!(
        block.terminal(),
        Terminal::Continue { next } if *next == A64LocationDescriptor::new(0x1004, 0, false).into()
    ));

    let reads: Vec<_> = block.instructions().iter().filter(|inst| inst.opcode.is_memory_read()).collect();
    assert_eq!(reads.len(), 2);
    assert!(reads.iter().all(|inst| inst.args[1] == Value::AccType(AccType::Normal)));
    let writes: Vec<_> = block
        .instructions()
        .iter()
        .filter(|inst| inst.opcode == Opcode::A64SetX)
        .map(|inst| inst.args[0])
        .collect();
    assert_eq!(
        writes,
        vec![Value::A64Reg(Reg::new(1)), Value::A64Reg(Reg::new(2)), Value::A64Reg(Reg::new(0))]
    );

    let mut guest = Guest::new();
    guest.eval.memory.load_words(0x4000, &[0x1111_1111, 0x2222_2222, 0x3333_3333, 0x4444_4444]);
    guest.eval.state.x[0] = 0x4000;
    assert_eq!(guest.execute(&block), ExecutionStatus::Completed);
    assert_eq!(guest.eval.state.x[1], 0x2222_2222_1111_1111);
    assert_eq!(guest.eval.state.x[2], 0x4444_4444_3333_3333);
    assert_eq!(guest.eval.state.x[0], 0x4010);
    // Both accesses use the address before writeback.
    let addresses: Vec<_> = guest.eval.memory.accesses.iter().map(|access| access.0).collect();
    assert_eq!(addresses, vec![0x4000, 0x4008]);
}

#[test]
fn test_pair_load_32_bit() {
    // ldp w1, w2, [x0], #8
    let block = single(0x1000, 0x28C1_0801, &TranslationOptions::default());
    let mut guest = Guest::new();
    guest.eval.memory.load_words(0x4000, &[7, 9]);
    guest.eval.state.x[0] = 0x4000;
    guest.eval.state.x[1] = u64::MAX;
    guest.execute(&block);
    assert_eq!((guest.eval.state.x[1], guest.eval.state.x[2]), (7, 9));
    assert_eq!(guest.eval.state.x[0], 0x4008);
}

// SP alignment checking on paired transfers is opt-in. Without it a
// misaligned SP is used as-is; with it the access faults before memory is
// touched.
#[test]
fn test_sp_alignment_unchecked_by_default() {
    let block = single(0x1000, STP_PRE_SP, &TranslationOptions::default());
    assert_eq!(block.count_opcode(Opcode::A64CheckSpAlignment), 0);

    let mut guest = Guest::new();
    guest.eval.state.sp = 0x8008;
    guest.eval.state.x[1] = 1;
    guest.eval.state.x[2] = 2;
    assert_eq!(guest.execute(&block), ExecutionStatus::Completed);
    assert_eq!(guest.eval.state.sp, 0x7FF8);
    assert_eq!(guest.eval.memory.peek(0x7FF8, 8), 1);
    assert_eq!(guest.eval.memory.peek(0x8000, 8), 2);
}

#[test]
fn test_sp_alignment_checked_when_enabled() {
    let options = TranslationOptions::default().with_sp_alignment_check(true);
    let block = single(0x1000, STP_PRE_SP, &options);
    assert_eq!(block.count_opcode(Opcode::A64CheckSpAlignment), 1);
    // The check guards the base, before the pre-index offset is applied.
    assert_eq!(block.instructions()[1].opcode, Opcode::A64CheckSpAlignment);

    let mut guest = Guest::new();
    guest.eval.state.sp = 0x8008;
    assert_eq!(guest.execute(&block), ExecutionStatus::Halted);
    assert_eq!(guest.eval.fault, Some(Fault::SpAlignment { address: 0x8008 }));
    assert!(guest.eval.memory.bytes.is_empty());
    assert_eq!(guest.eval.state.sp, 0x8008);

    guest.eval.state.sp = 0x8000;
    assert_eq!(guest.execute(&block), ExecutionStatus::Completed);
    assert_eq!(guest.eval.state.sp, 0x7FF0);

    // Non-SP bases are never checked.
    let block = single(0x1000, LDP_POST, &options);
    assert_eq!(block.count_opcode(Opcode::A64CheckSpAlignment), 0);
    let block = single(0x1000, LDP_SP, &options);
    assert_eq!(block.count_opcode(Opcode::A64CheckSpAlignment), 1);
}

#[test]
fn test_fpcr_write_changes_translation_context() {
    common::init_logging();
    let mut guest = Guest::with_a64_code(0x1000, &[MOVZ_RMODE, MSR_FPCR, MRS_FPCR, SVC_0]);
    let mut dispatcher = Dispatcher::new(TranslationOptions::default());

    let reason = dispatcher.run(&mut guest, 16).unwrap();
    let svc_location: LocationDescriptor = A64LocationDescriptor::new(0x100C, 0x00C0_0000, false).into();
    assert_eq!(
        reason,
        HaltReason::Exception { location: svc_location, exception: Exception::SoftwareInterrupt { imm: 0 } }
    );
    assert_eq!(guest.eval.state.fpcr, 0x00C0_0000);
    assert_eq!(guest.eval.state.x[2], 0x00C0_0000);

    // The block after the write is keyed by the new rounding mode.
    let after: LocationDescriptor = A64LocationDescriptor::new(0x1008, 0x00C0_0000, false).into();
    let stale: LocationDescriptor = A64LocationDescriptor::new(0x1008, 0, false).into();
    assert!(dispatcher.store().contains(after));
    assert!(!dispatcher.store().contains(stale));
    assert_eq!(dispatcher.stats().blocks_executed, 2);
}

#[test]
fn test_fpcr_bits_outside_mode_do_not_split_cache() {
    let a = A64LocationDescriptor::new(0x1000, 0x0000_009F, false);
    let b = A64LocationDescriptor::new(0x1000, 0, false);
    assert_eq!(a, b);
    let c = A64LocationDescriptor::new(0x1000, 0x0100_0000, false);
    assert_ne!(b, c);
}

#[test]
fn test_translation_is_deterministic() {
    let code = [MOVZ_RMODE, LDP_POST, STP_PRE_SP, 0x9100_0C42, 0xD100_0400, 0x17FF_FFFB];
    let reader = |vaddr: u64| {
        let index = vaddr.checked_sub(0x2000)? / 4;
        code.get(index as usize).copied()
    };
    let location: LocationDescriptor = A64LocationDescriptor::new(0x2000, 0, false).into();

    let first = Translator::new(TranslationOptions::default()).translate(location, &reader).unwrap();
    let second = Translator::new(TranslationOptions::default()).translate(location, &reader).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.to_string(), second.to_string());
    assert_eq!(first.guest_instruction_count(), code.len());
    assert!(matches!(first.terminal(), Terminal::LinkBlock { next } if next.pc() == 0x2000));
}

#[test]
fn test_block_limit_splits_straight_line_code() {
    let words = vec![0x9100_0C42u32; 10];
    let reader = |vaddr: u64| words.get(((vaddr - 0x3000) / 4) as usize).copied();
    let options = TranslationOptions::default().with_max_block_instructions(4);
    let mut translator = Translator::new(options);
    let block = translator.translate(A64LocationDescriptor::new(0x3000, 0, false).into(), &reader).unwrap();
    assert_eq!(block.guest_instruction_count(), 4);
    assert!(matches!(block.terminal(), Terminal::Continue { next } if next.pc() == 0x3010));

    // Running off the end of mapped code ends in a fetch abort.
    let block = translator.translate(A64LocationDescriptor::new(0x3020, 0, false).into(), &reader).unwrap();
    assert_eq!(block.guest_instruction_count(), 3);
    assert!(matches!(
        block.terminal(),
        Terminal::RaiseException { location, exception: Exception::FetchAbort, .. } if location.pc() == 0x3028
    ));
    assert_eq!(translator.stats().blocks_translated, 2);
}

#[test]
fn test_exception_skip_continues_after_svc() {
    // svc #0; add x2, x2, #3; brk #0
    let mut guest = Guest::with_a64_code(0x1000, &[SVC_0, 0x9100_0C42, 0xD420_0000]);
    guest.on_exception = ExceptionAction::Skip;
    let mut dispatcher = Dispatcher::new(TranslationOptions::default());
    assert_eq!(dispatcher.step(&mut guest).unwrap(), armdbt::runtime::StepResult::Continue);
    assert_eq!(guest.location().pc(), 0x1004);

    guest.on_exception = ExceptionAction::Halt;
    let reason = dispatcher.run(&mut guest, 8).unwrap();
    assert!(matches!(reason, HaltReason::Exception { exception: Exception::Breakpoint { imm: 0 }, .. }));
    assert_eq!(guest.eval.state.x[2], 3);
    assert_eq!(guest.exceptions.len(), 2);
}
