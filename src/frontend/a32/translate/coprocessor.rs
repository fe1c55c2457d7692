// This module translates the coprocessor instruction family shared by ARM and Thumb32. The
// installed coprocessor for the instruction's number is asked how to compile the call site
// before any IR is emitted: a missing coprocessor or a declined hook compiles an undefined
// instruction exception; a callback becomes an A32CoprocInvoke(Get) instruction carrying the
// callback; a direct answer becomes host word reads or writes at the supplied addresses.

//! Coprocessor instructions.

use super::TranslatorVisitor;
use crate::frontend::a32::coprocessor::{CoprocAction, Coprocessor};
use crate::frontend::a32::decoder_arm::CoprocInst;
use crate::frontend::a32::Reg;
use crate::frontend::InstOutcome;
use crate::ir::{LocationDescriptor, Opcode, Value};

impl TranslatorVisitor<'_, '_> {
    pub(super) fn coprocessor(&mut self, inst: CoprocInst) -> InstOutcome {
        use CoprocInst as C;

        // Encoding checks come before the coprocessor is consulted.
        match inst {
            C::Mcr { rt, .. } if rt == Reg::PC => return self.unpredictable(),
            // MRC to PC transfers flags; left to the interpreter.
            C::Mrc { rt, .. } if rt == Reg::PC => return self.interpret_this_instruction(),
            C::Mcrr { rt, rt2, .. } if rt == Reg::PC || rt2 == Reg::PC => return self.unpredictable(),
            C::Mrrc { rt, rt2, .. } if rt == Reg::PC || rt2 == Reg::PC || rt == rt2 => {
                return self.unpredictable()
            }
            C::LoadStore { p: false, u: false, w: false, .. } => return self.unallocated(),
            C::LoadStore { w: true, rn, .. } if rn == Reg::PC => return self.unpredictable(),
            _ => {}
        }

        let Some(coproc) = self.options.coprocessor(inst.coproc()).cloned() else {
            log::debug!("{}: no coprocessor p{}", LocationDescriptor::from(self.location), inst.coproc());
            return self.undefined();
        };
        let coproc: &dyn Coprocessor = coproc.as_ref();

        match inst {
            C::Cdp { two, opc1, crn, crd, coproc: _, opc2, crm } => {
                match coproc.compile_internal_operation(two, opc1.value(), crd, crn, crm, opc2.value()) {
                    Some(callback) => {
                        let zero = self.ir.imm32(0);
                        self.ir.inst(Opcode::A32CoprocInvoke, &[Value::CoprocCallback(callback), zero, zero]);
                        InstOutcome::Continue
                    }
                    None => self.undefined(),
                }
            }
            C::Mcr { two, opc1, crn, rt, coproc: _, opc2, crm } => {
                match coproc.compile_send_one_word(two, opc1.value(), crn, crm, opc2.value()) {
                    CoprocAction::Unavailable => self.undefined(),
                    CoprocAction::Callback(callback) => {
                        let word = self.reg(rt);
                        let zero = self.ir.imm32(0);
                        self.ir.inst(Opcode::A32CoprocInvoke, &[Value::CoprocCallback(callback), word, zero]);
                        InstOutcome::Continue
                    }
                    CoprocAction::Direct(addr) => {
                        let word = self.reg(rt);
                        self.ir.inst(Opcode::A32HostWrite32, &[Value::HostAddr(addr), word]);
                        InstOutcome::Continue
                    }
                }
            }
            C::Mrc { two, opc1, crn, rt, coproc: _, opc2, crm } => {
                match coproc.compile_get_one_word(two, opc1.value(), crn, crm, opc2.value()) {
                    CoprocAction::Unavailable => self.undefined(),
                    CoprocAction::Callback(callback) => {
                        let result = self.ir.inst(Opcode::A32CoprocInvokeGet, &[Value::CoprocCallback(callback)]);
                        let word = self.ir.least_significant_word(result);
                        self.set_reg(rt, word);
                        InstOutcome::Continue
                    }
                    CoprocAction::Direct(addr) => {
                        let word = self.ir.inst(Opcode::A32HostRead32, &[Value::HostAddr(addr)]);
                        self.set_reg(rt, word);
                        InstOutcome::Continue
                    }
                }
            }
            C::Mcrr { two, rt2, rt, coproc: _, opc, crm } => match coproc.compile_send_two_words(two, opc.value(), crm) {
                CoprocAction::Unavailable => self.undefined(),
                CoprocAction::Callback(callback) => {
                    let first = self.reg(rt);
                    let second = self.reg(rt2);
                    self.ir.inst(Opcode::A32CoprocInvoke, &[Value::CoprocCallback(callback), first, second]);
                    InstOutcome::Continue
                }
                CoprocAction::Direct([addr1, addr2]) => {
                    let first = self.reg(rt);
                    let second = self.reg(rt2);
                    self.ir.inst(Opcode::A32HostWrite32, &[Value::HostAddr(addr1), first]);
                    self.ir.inst(Opcode::A32HostWrite32, &[Value::HostAddr(addr2), second]);
                    InstOutcome::Continue
                }
            },
            C::Mrrc { two, rt2, rt, coproc: _, opc, crm } => match coproc.compile_get_two_words(two, opc.value(), crm) {
                CoprocAction::Unavailable => self.undefined(),
                CoprocAction::Callback(callback) => {
                    let result = self.ir.inst(Opcode::A32CoprocInvokeGet, &[Value::CoprocCallback(callback)]);
                    let low = self.ir.least_significant_word(result);
                    let shift = self.ir.imm8(32);
                    let high = self.ir.logical_shift_right(result, shift);
                    let high = self.ir.least_significant_word(high);
                    self.set_reg(rt, low);
                    self.set_reg(rt2, high);
                    InstOutcome::Continue
                }
                CoprocAction::Direct([addr1, addr2]) => {
                    let first = self.ir.inst(Opcode::A32HostRead32, &[Value::HostAddr(addr1)]);
                    let second = self.ir.inst(Opcode::A32HostRead32, &[Value::HostAddr(addr2)]);
                    self.set_reg(rt, first);
                    self.set_reg(rt2, second);
                    InstOutcome::Continue
                }
            },
            C::LoadStore { two, load, p, u, d, w, rn, crd, coproc: _, imm8 } => {
                let option = (!p && !w && u).then_some(imm8.value() as u8);
                let callback = if load {
                    coproc.compile_load_words(two, d, crd, option)
                } else {
                    coproc.compile_store_words(two, d, crd, option)
                };
                let Some(callback) = callback else {
                    return self.undefined();
                };

                let base = self.reg(rn);
                let offset = self.ir.imm32(imm8.value() << 2);
                let offset_address = if u { self.ir.add(base, offset) } else { self.ir.sub(base, offset) };
                let address = if p { offset_address } else { base };
                let zero = self.ir.imm32(0);
                self.ir.inst(Opcode::A32CoprocInvoke, &[Value::CoprocCallback(callback), address, zero]);
                if w {
                    self.set_reg(rn, offset_address);
                }
                InstOutcome::Continue
            }
        }
    }
}
