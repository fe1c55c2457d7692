//! A32 and Thumb translation run end to end through the dispatcher.

mod common;

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use armdbt::core::TranslationOptions;
use armdbt::frontend::a32::{
    disassemble_thumb16, CoprocAction, CoprocCallback, CoprocReg, Coprocessor, HostAddr,
};
use armdbt::frontend::Exception;
use armdbt::ir::{A32LocationDescriptor, LocationDescriptor, Opcode};
use armdbt::runtime::{Dispatcher, Executor, HaltReason};
use common::Guest;

fn arm_guest(base: u32, words: &[u32]) -> Guest {
    let mut guest = Guest::new();
    guest.eval.memory.load_words(base as u64, words);
    guest.set_location(A32LocationDescriptor::arm(base).into());
    guest
}

fn thumb_guest(base: u32, halfwords: &[u16]) -> Guest {
    let mut guest = Guest::new();
    guest.eval.memory.load_halfwords(base as u64, halfwords);
    guest.set_location(A32LocationDescriptor::thumb(base).into());
    guest
}

fn halted_at(reason: HaltReason) -> (LocationDescriptor, Exception) {
    match reason {
        HaltReason::Exception { location, exception } => (location, exception),
        other => panic!("unexpected halt {other:?}"),
    }
}

#[test]
fn test_thumb_shift_program() {
    common::init_logging();
    // movs r0, #5; lsls r1, r0, #2; svc #1
    let mut guest = thumb_guest(0x2000, &[0x2005, 0x0081, 0xDF01]);
    let mut dispatcher = Dispatcher::new(TranslationOptions::default());

    let (location, exception) = halted_at(dispatcher.run(&mut guest, 4).unwrap());
    assert_eq!(location, A32LocationDescriptor::thumb(0x2004).into());
    assert_eq!(exception, Exception::SoftwareInterrupt { imm: 1 });
    assert_eq!((guest.eval.state.r[0], guest.eval.state.r[1]), (5, 20));
    assert!(!guest.eval.state.n && !guest.eval.state.z && !guest.eval.state.c);
    assert_eq!(dispatcher.translation_stats().guest_instructions, 3);
}

#[test]
fn test_arm_call_and_return() {
    // 0x1000: bl 0x1010; 0x1004: svc #0; 0x1010: bx lr
    let mut guest = arm_guest(0x1000, &[0xEB00_0002, 0xEF00_0000]);
    guest.eval.memory.load_words(0x1010, &[0xE12F_FF1E]);
    let mut dispatcher = Dispatcher::new(TranslationOptions::default());

    let (location, exception) = halted_at(dispatcher.run(&mut guest, 8).unwrap());
    assert_eq!(location, A32LocationDescriptor::arm(0x1004).into());
    assert_eq!(exception, Exception::SoftwareInterrupt { imm: 0 });
    assert_eq!(guest.eval.state.r[14], 0x1004);
    assert!(!guest.eval.state.thumb);
    assert_eq!(dispatcher.stats().blocks_executed, 3);
}

#[test]
fn test_thumb32_bl_sets_thumb_return_address() {
    // bl #+0x100 at 0x2000 lands on svc #3
    let mut guest = thumb_guest(0x2000, &[0xF000, 0xF880]);
    guest.eval.memory.load_halfwords(0x2104, &[0xDF03]);
    let mut dispatcher = Dispatcher::new(TranslationOptions::default());

    let (location, exception) = halted_at(dispatcher.run(&mut guest, 4).unwrap());
    assert_eq!(location, A32LocationDescriptor::thumb(0x2104).into());
    assert_eq!(exception, Exception::SoftwareInterrupt { imm: 3 });
    assert_eq!(guest.eval.state.r[14], 0x2005);
}

#[test]
fn test_it_block_goes_to_interpreter() {
    // it eq; moveq r0, #1; svc #2
    let mut guest = thumb_guest(0x2000, &[0xBF08, 0x2001, 0xDF02]);
    let mut dispatcher = Dispatcher::new(TranslationOptions::default());

    let (location, _) = halted_at(dispatcher.run(&mut guest, 4).unwrap());
    assert_eq!(guest.interpreted, vec![(A32LocationDescriptor::thumb(0x2000).into(), 2)]);
    assert_eq!(location, A32LocationDescriptor::thumb(0x2004).into());
    assert_eq!(guest.eval.state.r[0], 0);
}

#[test]
fn test_conditional_arm_instruction_goes_to_interpreter() {
    // svcne #0; svc #9
    let mut guest = arm_guest(0x1000, &[0x1F00_0000, 0xEF00_0009]);
    let mut dispatcher = Dispatcher::new(TranslationOptions::default());

    let (location, exception) = halted_at(dispatcher.run(&mut guest, 4).unwrap());
    assert_eq!(guest.interpreted, vec![(A32LocationDescriptor::arm(0x1000).into(), 1)]);
    assert_eq!(location, A32LocationDescriptor::arm(0x1004).into());
    assert_eq!(exception, Exception::SoftwareInterrupt { imm: 9 });
}

static SENT: AtomicU32 = AtomicU32::new(0);

fn record_word(user_arg: u64, word: u32, _: u32) -> u64 {
    SENT.store(word ^ user_arg as u32, Ordering::SeqCst);
    0
}

/// CP15 stand-in: MCR goes through a callback, MRC reads a host word.
struct SystemControl;

impl Coprocessor for SystemControl {
    fn compile_internal_operation(
        &self,
        _two: bool,
        _opc1: u32,
        _crd: CoprocReg,
        _crn: CoprocReg,
        _crm: CoprocReg,
        _opc2: u32,
    ) -> Option<CoprocCallback> {
        None
    }

    fn compile_send_one_word(&self, _: bool, _: u32, _: CoprocReg, _: CoprocReg, _: u32) -> CoprocAction<HostAddr> {
        CoprocAction::Callback(CoprocCallback::new(record_word, Some(0xFF)))
    }

    fn compile_send_two_words(&self, _: bool, _: u32, _: CoprocReg) -> CoprocAction<[HostAddr; 2]> {
        CoprocAction::Unavailable
    }

    fn compile_get_one_word(&self, _: bool, _: u32, _: CoprocReg, _: CoprocReg, _: u32) -> CoprocAction<HostAddr> {
        CoprocAction::Direct(HostAddr(0x40))
    }

    fn compile_get_two_words(&self, _: bool, _: u32, _: CoprocReg) -> CoprocAction<[HostAddr; 2]> {
        CoprocAction::Unavailable
    }

    fn compile_load_words(&self, _: bool, _: bool, _: CoprocReg, _: Option<u8>) -> Option<CoprocCallback> {
        None
    }

    fn compile_store_words(&self, _: bool, _: bool, _: CoprocReg, _: Option<u8>) -> Option<CoprocCallback> {
        None
    }
}

#[test]
fn test_coprocessor_transfers() {
    // mcr p15, 0, r0, c7, c5, 4; mrc p15, 0, r1, c13, c0, 3; cdp p15, ...; svc #0
    let options = TranslationOptions::default().with_coprocessor(15, Arc::new(SystemControl));
    let mut guest = arm_guest(0x1000, &[0xEE07_0F95, 0xEE1D_1F70, 0xEE00_0F00, 0xEF00_0000]);
    guest.eval.state.r[0] = 0x1234;
    guest.eval.memory.host.insert(0x40, 0xCAFE);
    guest.on_exception = armdbt::runtime::ExceptionAction::Skip;
    let mut dispatcher = Dispatcher::new(options);

    // The declined CDP raises undefined; skipping it reaches the SVC.
    dispatcher.step(&mut guest).unwrap();
    assert_eq!(SENT.load(Ordering::SeqCst), 0x1234 ^ 0xFF);
    assert_eq!(guest.eval.state.r[1], 0xCAFE);
    assert_eq!(guest.exceptions, vec![(A32LocationDescriptor::arm(0x1008).into(), Exception::UndefinedInstruction)]);
    assert_eq!(guest.location(), A32LocationDescriptor::arm(0x100C).into());

    let block = dispatcher.store().peek(A32LocationDescriptor::arm(0x1000).into()).unwrap();
    assert_eq!(block.count_opcode(Opcode::A32CoprocInvoke), 1);
    assert_eq!(block.count_opcode(Opcode::A32HostRead32), 1);
}

#[test]
fn test_thumb_listing() {
    let listing: Vec<_> = [0x2005u16, 0x0081, 0xBF08, 0x4770, 0xDF01].into_iter().map(disassemble_thumb16).collect();
    assert_eq!(listing, vec!["movs r0, #5", "lsls r1, r0, #2", "it eq", "bx lr", "svc #1"]);
}
