//! Thumb state instructions.
//!
//! Flag-setting forms here are the outside-IT-block variants. An IT
//! instruction hands itself and the instructions it covers to the
//! interpreter, so no conditional Thumb code is ever translated.

use super::TranslatorVisitor;
use crate::frontend::a32::decoder_thumb16::{decode_thumb16, ThumbHint, Thumb16Inst};
use crate::frontend::a32::decoder_thumb32::{decode_thumb32, Thumb32Inst};
use crate::frontend::a32::Reg;
use crate::frontend::translate::Step;
use crate::frontend::bits::sign_extend;
use crate::frontend::{Exception, Imm, InstOutcome};
use crate::ir::{Opcode, Terminal, Value};

impl TranslatorVisitor<'_, '_> {
    pub(super) fn thumb16_step(&mut self, halfword: u16) -> Step {
        self.size = 2;
        let (mnemonic, outcome) = match decode_thumb16(halfword) {
            Some((mnemonic, inst)) => (mnemonic, self.thumb16_dispatch(inst)),
            None => ("<unknown thumb16>", self.interpret_this_instruction()),
        };
        Step { mnemonic, bytes: 2, outcome }
    }

    pub(super) fn thumb32_step(&mut self, word: u32) -> Step {
        self.size = 4;
        let (mnemonic, outcome) = match decode_thumb32(word) {
            Some((mnemonic, inst)) => (mnemonic, self.thumb32_dispatch(inst)),
            None => ("<unknown thumb32>", self.interpret_this_instruction()),
        };
        Step { mnemonic, bytes: 4, outcome }
    }

    fn thumb16_dispatch(&mut self, inst: Thumb16Inst) -> InstOutcome {
        use Thumb16Inst as I;
        match inst {
            I::LslImm { imm5, rm, rd } => self.thumb16_lsl_imm(imm5, rm, rd),
            I::LsrImm { imm5, rm, rd } => self.thumb16_shift_right_imm(false, imm5, rm, rd),
            I::AsrImm { imm5, rm, rd } => self.thumb16_shift_right_imm(true, imm5, rm, rd),
            I::LslReg { .. } | I::LsrReg { .. } | I::AsrReg { .. } => self.interpret_this_instruction(),
            I::MovImm { rd, imm8 } => {
                let value = self.ir.imm32(imm8.value());
                self.set_reg(rd, value);
                let n = self.ir.imm1(false);
                let z = self.ir.imm1(imm8 == 0);
                self.ir.inst(Opcode::A32SetNFlag, &[n]);
                self.ir.inst(Opcode::A32SetZFlag, &[z]);
                InstOutcome::Continue
            }
            I::BCond { .. } => self.interpret_this_instruction(),
            I::B { imm11 } => {
                let offset = sign_extend((imm11.value() << 1) as u64, 12) as u32;
                self.link_block(self.pc().wrapping_add(4).wrapping_add(offset))
            }
            I::Bx { rm } => {
                let target = self.reg(rm);
                self.bx_write_pc(target)
            }
            I::Udf { .. } => self.undefined(),
            I::Svc { imm8 } => self.raise_exception(Exception::SoftwareInterrupt { imm: imm8.value() }),
            I::Hint(hint) => self.thumb_hint(hint),
            I::UnknownHint { .. } => InstOutcome::Continue,
            I::It { mask, .. } => {
                self.ir.set_term(Terminal::Interpret {
                    location: self.location.into(),
                    num_instructions: 1 + Thumb16Inst::it_block_len(mask),
                });
                InstOutcome::EndBlock
            }
        }
    }

    fn thumb32_dispatch(&mut self, inst: Thumb32Inst) -> InstOutcome {
        match inst {
            Thumb32Inst::Bl { s, j1, j2, imm10, imm11 } => {
                let offset = Thumb32Inst::bl_offset(s, j1, j2, imm10, imm11) as u32;
                let link = self.ir.imm32(self.pc().wrapping_add(4) | 1);
                self.set_reg(Reg::LR, link);
                self.link_block(self.pc().wrapping_add(4).wrapping_add(offset))
            }
            Thumb32Inst::Udf { .. } => self.undefined(),
            Thumb32Inst::Coproc(inst) => self.coprocessor(inst),
        }
    }

    fn thumb16_lsl_imm(&mut self, imm5: Imm<5>, rm: Reg, rd: Reg) -> InstOutcome {
        let operand = self.reg(rm);
        if imm5 == 0 {
            // MOVS rd, rm: carry is unchanged.
            self.set_reg(rd, operand);
            self.set_nz(operand);
            return InstOutcome::Continue;
        }

        let amount = imm5.value() as u8;
        let carry = self.ir.test_bit(operand, 32 - amount);
        let shift = self.ir.imm8(amount);
        let result = self.ir.logical_shift_left(operand, shift);
        self.set_reg(rd, result);
        self.set_nz(result);
        self.set_c(carry);
        InstOutcome::Continue
    }

    fn thumb16_shift_right_imm(&mut self, arithmetic: bool, imm5: Imm<5>, rm: Reg, rd: Reg) -> InstOutcome {
        let amount: u8 = if imm5 == 0 { 32 } else { imm5.value() as u8 };
        let operand = self.reg(rm);
        let carry = self.ir.test_bit(operand, amount - 1);
        let shift = self.ir.imm8(amount);
        let result: Value = if arithmetic {
            self.ir.arithmetic_shift_right(operand, shift)
        } else {
            self.ir.logical_shift_right(operand, shift)
        };
        self.set_reg(rd, result);
        self.set_nz(result);
        self.set_c(carry);
        InstOutcome::Continue
    }

    fn thumb_hint(&mut self, hint: ThumbHint) -> InstOutcome {
        match hint {
            ThumbHint::Nop => InstOutcome::Continue,
            ThumbHint::Yield => self.raise_exception(Exception::Yield),
            ThumbHint::Wfe => self.raise_exception(Exception::WaitForEvent),
            ThumbHint::Wfi => self.raise_exception(Exception::WaitForInterrupt),
            ThumbHint::Sev => self.raise_exception(Exception::SendEvent),
        }
    }
}
