//! ARM state instructions.

use super::TranslatorVisitor;
use crate::frontend::a32::decoder_arm::{decode_arm, ArmInst};
use crate::frontend::a32::{Cond, Reg};
use crate::frontend::translate::Step;
use crate::frontend::{Exception, Imm, InstOutcome};

impl TranslatorVisitor<'_, '_> {
    pub(super) fn arm_step(&mut self, word: u32) -> Step {
        self.size = 4;
        let (mnemonic, outcome) = match decode_arm(word) {
            Some((mnemonic, inst)) => (mnemonic, self.arm_dispatch(inst)),
            None => ("<unknown arm>", self.interpret_this_instruction()),
        };
        Step { mnemonic, bytes: 4, outcome }
    }

    fn arm_dispatch(&mut self, inst: ArmInst) -> InstOutcome {
        use ArmInst as I;
        match inst {
            // NV space on B/BL is BLX (immediate).
            I::B { cond: Cond::Nv, .. } | I::Bl { cond: Cond::Nv, .. } => self.interpret_this_instruction(),
            I::Udf { .. } => self.undefined(),
            I::Coproc { inst, .. } if inst.is_unconditional() => self.coprocessor(inst),
            _ => match self.arm_condition(inst) {
                Cond::Al => self.arm_unconditional(inst),
                Cond::Nv => self.unallocated(),
                _ => self.interpret_this_instruction(),
            },
        }
    }

    fn arm_condition(&self, inst: ArmInst) -> Cond {
        use ArmInst as I;
        match inst {
            I::B { cond, .. }
            | I::Bl { cond, .. }
            | I::Bx { cond, .. }
            | I::Svc { cond, .. }
            | I::Nop { cond }
            | I::Coproc { cond, .. } => cond,
            I::Udf { .. } => Cond::Al,
        }
    }

    fn arm_unconditional(&mut self, inst: ArmInst) -> InstOutcome {
        use ArmInst as I;
        match inst {
            I::B { imm24, .. } => self.arm_b(imm24),
            I::Bl { imm24, .. } => self.arm_bl(imm24),
            I::Bx { rm, .. } => {
                let target = self.reg(rm);
                self.bx_write_pc(target)
            }
            I::Svc { imm24, .. } => self.raise_exception(Exception::SoftwareInterrupt { imm: imm24.value() }),
            I::Udf { .. } => self.undefined(),
            I::Nop { .. } => InstOutcome::Continue,
            I::Coproc { inst, .. } => self.coprocessor(inst),
        }
    }

    fn arm_b(&mut self, imm24: Imm<24>) -> InstOutcome {
        let offset = (imm24.sign_extend() << 2) as u32;
        let target = self.pc().wrapping_add(8).wrapping_add(offset);
        self.link_block(target)
    }

    fn arm_bl(&mut self, imm24: Imm<24>) -> InstOutcome {
        let link = self.ir.imm32(self.pc().wrapping_add(4));
        self.set_reg(Reg::LR, link);
        self.arm_b(imm24)
    }
}
