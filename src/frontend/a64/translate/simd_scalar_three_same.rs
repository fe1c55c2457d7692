//! SIMD scalar three-same: ADD and SUB on the 64-bit scalar.

use super::TranslatorVisitor;
use crate::frontend::a64::VReg;
use crate::frontend::{Imm, InstOutcome};

impl TranslatorVisitor<'_, '_> {
    pub(super) fn simd_scalar_add_sub(&mut self, sub: bool, size: Imm<2>, vm: VReg, vn: VReg, vd: VReg) -> InstOutcome {
        if size != 0b11 {
            return self.reserved_value();
        }
        let datasize = 64;

        let operand1 = self.v(datasize, vn);
        let operand2 = self.v(datasize, vm);
        let result = if sub {
            self.ir.sub(operand1, operand2)
        } else {
            self.ir.add(operand1, operand2)
        };
        self.set_v(datasize, vd, result);
        InstOutcome::Continue
    }
}
