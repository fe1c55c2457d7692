//! Data processing: ADD/SUB (immediate), move wide, ORR (shifted register).

use super::TranslatorVisitor;
use crate::frontend::a64::decoder::MoveWideOp;
use crate::frontend::a64::Reg;
use crate::frontend::{Imm, InstOutcome};
use crate::ir::{Opcode, Value};

impl TranslatorVisitor<'_, '_> {
    #[allow(clippy::too_many_arguments)]
    pub(super) fn add_sub_imm(
        &mut self,
        sf: bool,
        sub: bool,
        set_flags: bool,
        shift: Imm<2>,
        imm12: Imm<12>,
        rn: Reg,
        rd: Reg,
    ) -> InstOutcome {
        let datasize = if sf { 64 } else { 32 };
        let imm = match shift.value() {
            0b00 => imm12.zero_extend(),
            0b01 => imm12.zero_extend() << 12,
            _ => return self.reserved_value(),
        };
        if set_flags {
            // NZCV is not modelled in IR
            return self.interpret_this_instruction();
        }

        let operand1 = if rn == Reg::SP { self.sp(datasize) } else { self.x(datasize, rn) };
        let operand2 = self.imm(datasize, imm);
        let result = if sub {
            self.ir.sub(operand1, operand2)
        } else {
            self.ir.add(operand1, operand2)
        };

        if rd == Reg::SP {
            self.set_sp(datasize, result);
        } else {
            self.set_x(datasize, rd, result);
        }
        InstOutcome::Continue
    }

    pub(super) fn move_wide(&mut self, op: MoveWideOp, sf: bool, hw: Imm<2>, imm16: Imm<16>, rd: Reg) -> InstOutcome {
        if !sf && hw.bit(1) {
            return self.unallocated();
        }
        let datasize = if sf { 64 } else { 32 };
        let mask = if sf { u64::MAX } else { u32::MAX as u64 };
        let pos = hw.value() * 16;
        let shifted = imm16.zero_extend() << pos;

        let result = match op {
            MoveWideOp::Movz => self.imm(datasize, shifted),
            MoveWideOp::Movn => self.imm(datasize, !shifted & mask),
            MoveWideOp::Movk => {
                let previous = self.x(datasize, rd);
                let keep = self.imm(datasize, !(0xFFFFu64 << pos) & mask);
                let kept = self.ir.and(previous, keep);
                let inserted = self.imm(datasize, shifted);
                self.ir.or(kept, inserted)
            }
        };
        self.set_x(datasize, rd, result);
        InstOutcome::Continue
    }

    pub(super) fn orr_shifted_reg(
        &mut self,
        sf: bool,
        shift: Imm<2>,
        rm: Reg,
        imm6: Imm<6>,
        rn: Reg,
        rd: Reg,
    ) -> InstOutcome {
        if !sf && imm6.bit(5) {
            return self.reserved_value();
        }
        let datasize = if sf { 64 } else { 32 };

        let operand1 = self.x(datasize, rn);
        let operand2 = self.shift_reg(datasize, rm, shift, imm6.value() as u8);
        let result = self.ir.or(operand1, operand2);
        self.set_x(datasize, rd, result);
        InstOutcome::Continue
    }

    /// Register operand shifted by an immediate: LSL, LSR, ASR or ROR.
    fn shift_reg(&mut self, bitsize: usize, reg: Reg, shift: Imm<2>, amount: u8) -> Value {
        let value = self.x(bitsize, reg);
        let opcode = match shift.value() {
            0b00 => Opcode::LogicalShiftLeft,
            0b01 => Opcode::LogicalShiftRight,
            0b10 => Opcode::ArithmeticShiftRight,
            _ => Opcode::RotateRight,
        };
        self.ir.inst(opcode, &[value, Value::U8(amount)])
    }
}

#[cfg(test)]
mod tests {
    use crate::core::config::TranslationOptions;
    use crate::frontend::a64::translate_single;
    use crate::frontend::a64::Reg;
    use crate::frontend::Exception;
    use crate::ir::{A64LocationDescriptor, Block, Opcode, Terminal, Value};

    fn single(word: u32) -> Block {
        let location = A64LocationDescriptor::new(0x1000, 0, false);
        translate_single(location, word, &TranslationOptions::default()).unwrap()
    }

    #[test]
    fn test_add_imm_to_sp() {
        // add sp, sp, #0x10
        let block = single(0x9100_43FF);
        let opcodes: Vec<_> = block.instructions().iter().map(|inst| inst.opcode).collect();
        assert_eq!(opcodes, vec![Opcode::A64GetSP, Opcode::Add, Opcode::A64SetSP]);
    }

    #[test]
    fn test_sub_imm_shifted() {
        // sub w1, w2, #1, lsl #12
        let block = single(0x5140_0441);
        let add = &block.instructions()[1];
        assert_eq!(add.opcode, Opcode::Sub);
        assert_eq!(add.args[1], Value::U32(0x1000));
        assert_eq!(block.instructions()[2].opcode, Opcode::A64SetW);
    }

    #[test]
    fn test_reserved_shift() {
        // add x0, x0, #0 with shift=0b10
        let block = single(0x9180_0000);
        assert!(matches!(
            block.terminal(),
            Terminal::RaiseException { exception: Exception::ReservedValue, .. }
        ));
    }

    #[test]
    fn test_adds_falls_back_to_interpreter() {
        // adds x0, x0, #1
        let block = single(0xB100_0400);
        assert!(matches!(block.terminal(), Terminal::Interpret { num_instructions: 1, .. }));
        assert!(block.is_empty());
    }

    #[test]
    fn test_movz_movk_movn() {
        // movz x3, #0x1234, lsl #16
        let block = single(0xD2A2_4683);
        assert_eq!(
            block.instructions()[0].args,
            vec![Value::A64Reg(Reg::new(3)), Value::U64(0x1234_0000)]
        );

        // movn w0, #0
        let block = single(0x1280_0000);
        assert_eq!(block.instructions()[0].args[1], Value::U32(0xFFFF_FFFF));

        // movk x0, #0xbeef
        let block = single(0xF297_DDE0);
        let opcodes: Vec<_> = block.instructions().iter().map(|inst| inst.opcode).collect();
        assert_eq!(opcodes, vec![Opcode::A64GetX, Opcode::And, Opcode::Or, Opcode::A64SetX]);
    }

    #[test]
    fn test_move_wide_32bit_high_hw_unallocated() {
        // movz w0, #1, lsl #32 is not encodable
        let block = single(0x52C0_0020);
        assert!(matches!(
            block.terminal(),
            Terminal::RaiseException { exception: Exception::UnallocatedEncoding, .. }
        ));
    }

    #[test]
    fn test_orr_32bit_large_shift_reserved() {
        // orr w0, w1, w2, lsl #32
        let block = single(0x2A02_8020);
        assert!(matches!(
            block.terminal(),
            Terminal::RaiseException { exception: Exception::ReservedValue, .. }
        ));
    }
}
