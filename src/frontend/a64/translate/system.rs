// This module translates hints, barriers and system register moves. Hints that ask the host to
// wait or signal compile to exception terminals so the host can decide what to do; other hints
// are NOPs. Writing FPCR changes the translation context (the FPCR mode bits are part of the
// location descriptor), so the block ends with the PC set to the following instruction and a
// ReturnToDispatch terminal. ISB ends the block the same way. Unknown system registers go to
// the interpreter.

//! Hints, barriers and system registers.

use std::fmt;

use super::TranslatorVisitor;
use crate::frontend::a64::decoder::{BarrierOp, HintOp};
use crate::frontend::a64::Reg;
use crate::frontend::{Exception, InstOutcome};
use crate::ir::{Opcode, Terminal};

/// System registers known to the translator, by op0:op1:CRn:CRm:op2 encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemRegister {
    /// Counter-timer physical count.
    CntpctEl0,
    /// Cache type.
    CtrEl0,
    /// Data cache zero ID.
    DczidEl0,
    Fpcr,
    Fpsr,
    /// Read/write software thread ID.
    TpidrEl0,
    /// Read-only software thread ID.
    TpidrroEl0,
}

impl SystemRegister {
    pub const fn encoding(self) -> u32 {
        match self {
            SystemRegister::CntpctEl0 => 0b11_011_1110_0000_001,
            SystemRegister::CtrEl0 => 0b11_011_0000_0000_001,
            SystemRegister::DczidEl0 => 0b11_011_0000_0000_111,
            SystemRegister::Fpcr => 0b11_011_0100_0100_000,
            SystemRegister::Fpsr => 0b11_011_0100_0100_001,
            SystemRegister::TpidrEl0 => 0b11_011_1101_0000_010,
            SystemRegister::TpidrroEl0 => 0b11_011_1101_0000_011,
        }
    }

    pub fn from_encoding(encoding: u32) -> Option<Self> {
        const ALL: [SystemRegister; 7] = [
            SystemRegister::CntpctEl0,
            SystemRegister::CtrEl0,
            SystemRegister::DczidEl0,
            SystemRegister::Fpcr,
            SystemRegister::Fpsr,
            SystemRegister::TpidrEl0,
            SystemRegister::TpidrroEl0,
        ];
        ALL.into_iter().find(|reg| reg.encoding() == encoding)
    }

    pub const fn name(self) -> &'static str {
        match self {
            SystemRegister::CntpctEl0 => "cntpct_el0",
            SystemRegister::CtrEl0 => "ctr_el0",
            SystemRegister::DczidEl0 => "dczid_el0",
            SystemRegister::Fpcr => "fpcr",
            SystemRegister::Fpsr => "fpsr",
            SystemRegister::TpidrEl0 => "tpidr_el0",
            SystemRegister::TpidrroEl0 => "tpidrro_el0",
        }
    }
}

impl fmt::Display for SystemRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TranslatorVisitor<'_, '_> {
    pub(super) fn named_hint(&mut self, op: HintOp) -> InstOutcome {
        match op {
            HintOp::Nop => InstOutcome::Continue,
            HintOp::Yield => self.raise_exception(Exception::Yield),
            HintOp::Wfe => self.raise_exception(Exception::WaitForEvent),
            HintOp::Wfi => self.raise_exception(Exception::WaitForInterrupt),
            HintOp::Sev => self.raise_exception(Exception::SendEvent),
            HintOp::Sevl => self.raise_exception(Exception::SendEventLocal),
        }
    }

    pub(super) fn barrier(&mut self, op: BarrierOp) -> InstOutcome {
        match op {
            BarrierOp::Clrex => {
                self.ir.inst(Opcode::A64ClearExclusive, &[]);
            }
            BarrierOp::Dsb => {
                self.ir.inst(Opcode::A64DataSynchronizationBarrier, &[]);
            }
            BarrierOp::Dmb => {
                self.ir.inst(Opcode::A64DataMemoryBarrier, &[]);
            }
            BarrierOp::Isb => {
                self.ir.inst(Opcode::A64InstructionSynchronizationBarrier, &[]);
                return self.return_to_dispatch();
            }
        }
        InstOutcome::Continue
    }

    fn return_to_dispatch(&mut self) -> InstOutcome {
        let next_pc = self.ir.imm64(self.pc().wrapping_add(4));
        self.ir.inst(Opcode::A64SetPC, &[next_pc]);
        self.ir.set_term(Terminal::ReturnToDispatch);
        InstOutcome::EndBlock
    }

    pub(super) fn msr(&mut self, sysreg: u32, rt: Reg) -> InstOutcome {
        match SystemRegister::from_encoding(sysreg) {
            Some(SystemRegister::TpidrEl0) => {
                let value = self.x(64, rt);
                self.ir.inst(Opcode::A64SetTPIDR, &[value]);
                InstOutcome::Continue
            }
            Some(SystemRegister::Fpcr) => {
                let value = self.x(32, rt);
                self.ir.inst(Opcode::A64SetFPCR, &[value]);
                self.return_to_dispatch()
            }
            Some(SystemRegister::Fpsr) => {
                let value = self.x(32, rt);
                self.ir.inst(Opcode::A64SetFPSR, &[value]);
                InstOutcome::Continue
            }
            _ => self.interpret_this_instruction(),
        }
    }

    pub(super) fn mrs(&mut self, sysreg: u32, rt: Reg) -> InstOutcome {
        let Some(register) = SystemRegister::from_encoding(sysreg) else {
            return self.interpret_this_instruction();
        };
        let (bitsize, opcode) = match register {
            SystemRegister::TpidrEl0 => (64, Opcode::A64GetTPIDR),
            SystemRegister::TpidrroEl0 => (64, Opcode::A64GetTPIDRRO),
            SystemRegister::DczidEl0 => (32, Opcode::A64GetDCZID),
            SystemRegister::CtrEl0 => (32, Opcode::A64GetCTR),
            SystemRegister::CntpctEl0 => (64, Opcode::A64GetCNTPCT),
            SystemRegister::Fpcr => (32, Opcode::A64GetFPCR),
            SystemRegister::Fpsr => (32, Opcode::A64GetFPSR),
        };
        let value = self.ir.inst(opcode, &[]);
        self.set_x(bitsize, rt, value);
        InstOutcome::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::TranslationOptions;
    use crate::frontend::a64::translate_single;
    use crate::ir::{A64LocationDescriptor, Block, Value};

    fn single(word: u32) -> Block {
        let location = A64LocationDescriptor::new(0x4000, 0, false);
        translate_single(location, word, &TranslationOptions::default()).unwrap()
    }

    #[test]
    fn test_encoding_round_trip() {
        for reg in [SystemRegister::Fpcr, SystemRegister::TpidrroEl0, SystemRegister::CntpctEl0] {
            assert_eq!(SystemRegister::from_encoding(reg.encoding()), Some(reg));
        }
        assert_eq!(SystemRegister::from_encoding(0), None);
    }

    #[test]
    fn test_msr_fpcr_returns_to_dispatch() {
        // msr fpcr, x1
        let block = single(0xD51B_4401);
        let opcodes: Vec<_> = block.instructions().iter().map(|inst| inst.opcode).collect();
        assert_eq!(opcodes, vec![Opcode::A64GetW, Opcode::A64SetFPCR, Opcode::A64SetPC]);
        assert_eq!(block.instructions()[2].args, vec![Value::U64(0x4004)]);
        assert_eq!(block.terminal(), &Terminal::ReturnToDispatch);
    }

    #[test]
    fn test_mrs_tpidrro() {
        // mrs x5, tpidrro_el0
        let block = single(0xD53B_D065);
        assert_eq!(block.instructions()[0].opcode, Opcode::A64GetTPIDRRO);
        assert_eq!(block.instructions()[1].opcode, Opcode::A64SetX);
    }

    #[test]
    fn test_unknown_sysreg_interprets() {
        // mrs x0, midr_el1
        let block = single(0xD538_0000);
        assert!(matches!(block.terminal(), Terminal::Interpret { .. }));
    }

    #[test]
    fn test_wfi_raises() {
        let block = single(0xD503_207F);
        assert!(matches!(
            block.terminal(),
            Terminal::RaiseException { exception: Exception::WaitForInterrupt, .. }
        ));
    }

    #[test]
    fn test_dmb_continues() {
        // dmb ish
        let block = single(0xD503_3BBF);
        assert_eq!(block.instructions()[0].opcode, Opcode::A64DataMemoryBarrier);
        assert!(matches!(block.terminal(), Terminal::Continue { .. }));
    }
}
