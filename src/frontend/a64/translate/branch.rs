//! Branches and exception generation.

use super::TranslatorVisitor;
use crate::frontend::a64::Reg;
use crate::frontend::{Exception, Imm, InstOutcome};
use crate::ir::{Opcode, Terminal};

impl TranslatorVisitor<'_, '_> {
    fn branch_target(&self, imm26: Imm<26>) -> u64 {
        self.pc().wrapping_add(imm26.sign_extend_u64() << 2)
    }

    pub(super) fn b(&mut self, imm26: Imm<26>) -> InstOutcome {
        let target = self.location.with_pc(self.branch_target(imm26));
        self.ir.set_term(Terminal::LinkBlock { next: target.into() });
        InstOutcome::EndBlock
    }

    pub(super) fn bl(&mut self, imm26: Imm<26>) -> InstOutcome {
        let link = self.ir.imm64(self.pc().wrapping_add(4));
        self.set_x(64, Reg::LR, link);
        self.b(imm26)
    }

    pub(super) fn br(&mut self, rn: Reg) -> InstOutcome {
        let target = self.x(64, rn);
        self.ir.inst(Opcode::A64SetPC, &[target]);
        self.ir.set_term(Terminal::IndirectBranch);
        InstOutcome::EndBlock
    }

    pub(super) fn blr(&mut self, rn: Reg) -> InstOutcome {
        // Read the target before LR is overwritten: blr x30 is legal.
        let target = self.x(64, rn);
        let link = self.ir.imm64(self.pc().wrapping_add(4));
        self.set_x(64, Reg::LR, link);
        self.ir.inst(Opcode::A64SetPC, &[target]);
        self.ir.set_term(Terminal::IndirectBranch);
        InstOutcome::EndBlock
    }

    pub(super) fn ret(&mut self, rn: Reg) -> InstOutcome {
        self.br(rn)
    }

    pub(super) fn svc(&mut self, imm16: Imm<16>) -> InstOutcome {
        self.raise_exception(Exception::SoftwareInterrupt { imm: imm16.value() })
    }

    pub(super) fn brk(&mut self, imm16: Imm<16>) -> InstOutcome {
        self.raise_exception(Exception::Breakpoint { imm: imm16.value() })
    }
}

#[cfg(test)]
mod tests {
    use crate::core::config::TranslationOptions;
    use crate::frontend::a64::{translate_single, Reg};
    use crate::frontend::Exception;
    use crate::ir::{A64LocationDescriptor, Block, Opcode, Terminal, Value};

    fn at(pc: u64, word: u32) -> Block {
        let location = A64LocationDescriptor::new(pc, 0, false);
        translate_single(location, word, &TranslationOptions::default()).unwrap()
    }

    #[test]
    fn test_b_links_to_target() {
        // b #-8
        let block = at(0x1000, 0x17FF_FFFE);
        assert!(block.is_empty());
        assert_eq!(
            block.terminal(),
            &Terminal::LinkBlock { next: A64LocationDescriptor::new(0xFF8, 0, false).into() }
        );
    }

    #[test]
    fn test_bl_writes_link_register() {
        // bl #0x100
        let block = at(0x1000, 0x9400_0040);
        assert_eq!(block.instructions()[0].args, vec![Value::A64Reg(Reg::LR), Value::U64(0x1004)]);
        assert_eq!(
            block.terminal().static_successor(),
            Some(A64LocationDescriptor::new(0x1100, 0, false).into())
        );
    }

    #[test]
    fn test_blr_x30_reads_before_link() {
        // blr x30
        let block = at(0x1000, 0xD63F_03C0);
        let opcodes: Vec<_> = block.instructions().iter().map(|inst| inst.opcode).collect();
        assert_eq!(opcodes, vec![Opcode::A64GetX, Opcode::A64SetX, Opcode::A64SetPC]);
        assert_eq!(block.terminal(), &Terminal::IndirectBranch);
    }

    #[test]
    fn test_svc_raises_with_immediate() {
        // svc #0x42
        let block = at(0x1000, 0xD400_0841);
        assert_eq!(
            block.terminal(),
            &Terminal::RaiseException {
                location: A64LocationDescriptor::new(0x1000, 0, false).into(),
                exception: Exception::SoftwareInterrupt { imm: 0x42 },
                next: A64LocationDescriptor::new(0x1004, 0, false).into(),
            }
        );
    }
}
