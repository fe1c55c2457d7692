// This module translates the paired and single-register load/store forms. For paired transfers
// the address is computed from the pre-writeback base, the two accesses are one element width
// apart, and writeback stores the address after any post-index offset. Writeback with a data
// register equal to the base (other than SP) and a load of the same register twice are
// UNPREDICTABLE. Non-temporal forms never write back. SIMD&FP pairs use the Vec access tag and
// loads narrower than 128 bits zero the rest of the register.

//! Load/store register pair and load/store register (unsigned immediate).

use super::TranslatorVisitor;
use crate::frontend::a64::decoder::PairIndex;
use crate::frontend::a64::{Reg, VReg};
use crate::frontend::{Imm, InstOutcome};
use crate::ir::{AccType, Opcode, Value};

impl TranslatorVisitor<'_, '_> {
    /// Base address of a paired transfer, with the optional SP alignment check.
    fn pair_base(&mut self, rn: Reg) -> Value {
        let address = self.base_address(rn);
        if rn == Reg::SP && self.options.check_sp_alignment {
            self.ir.inst(Opcode::A64CheckSpAlignment, &[address]);
        }
        address
    }

    fn pair_writeback(&mut self, rn: Reg, index: PairIndex, address: Value, offset: u64) {
        if !index.wback() {
            return;
        }
        let address = if index.postindex() {
            let offset = self.ir.imm64(offset);
            self.ir.add(address, offset)
        } else {
            address
        };
        self.set_base_address(rn, address);
    }

    #[allow(clippy::too_many_arguments)]
    pub(super) fn load_store_pair(
        &mut self,
        opc: Imm<2>,
        index: PairIndex,
        load: bool,
        imm7: Imm<7>,
        rt2: Reg,
        rn: Reg,
        rt: Reg,
    ) -> InstOutcome {
        let non_temporal = index == PairIndex::NonTemporal;
        if (!load && opc.bit(0)) || opc == 0b11 || (non_temporal && opc.bit(0)) {
            return self.unallocated();
        }
        let signed = opc.bit(0);
        let scale = 2 + opc.bit(1) as u32;
        let datasize = 8usize << scale;
        let dbytes = datasize / 8;
        let offset = imm7.sign_extend_u64() << scale;
        let wback = index.wback();

        if wback && (rt == rn || rt2 == rn) && rn != Reg::SP {
            return self.unpredictable();
        }
        if load && rt == rt2 {
            return self.unpredictable();
        }

        let acc = if non_temporal { AccType::Streaming } else { AccType::Normal };
        let mut address = self.pair_base(rn);
        if !index.postindex() {
            let offset = self.ir.imm64(offset);
            address = self.ir.add(address, offset);
        }
        let step = self.ir.imm64(dbytes as u64);
        let second = self.ir.add(address, step);

        if load {
            let data1 = self.mem(address, dbytes, acc);
            let data2 = self.mem(second, dbytes, acc);
            if signed {
                let data1 = self.ir.sign_extend_word_to_long(data1);
                let data2 = self.ir.sign_extend_word_to_long(data2);
                self.set_x(64, rt, data1);
                self.set_x(64, rt2, data2);
            } else {
                self.set_x(datasize, rt, data1);
                self.set_x(datasize, rt2, data2);
            }
        } else {
            let data1 = self.x(datasize, rt);
            let data2 = self.x(datasize, rt2);
            self.set_mem(address, dbytes, acc, data1);
            self.set_mem(second, dbytes, acc, data2);
        }

        self.pair_writeback(rn, index, address, offset);
        InstOutcome::Continue
    }

    #[allow(clippy::too_many_arguments)]
    pub(super) fn load_store_pair_fpsimd(
        &mut self,
        opc: Imm<2>,
        index: PairIndex,
        load: bool,
        imm7: Imm<7>,
        vt2: VReg,
        rn: Reg,
        vt: VReg,
    ) -> InstOutcome {
        if opc == 0b11 {
            return self.unallocated();
        }
        let scale = 2 + opc.value();
        let datasize = 8usize << scale;
        let dbytes = datasize / 8;
        let offset = imm7.sign_extend_u64() << scale;

        if load && vt == vt2 {
            return self.unpredictable();
        }

        let mut address = self.pair_base(rn);
        if !index.postindex() {
            let offset = self.ir.imm64(offset);
            address = self.ir.add(address, offset);
        }
        let step = self.ir.imm64(dbytes as u64);
        let second = self.ir.add(address, step);

        if load {
            let mut data1 = self.mem(address, dbytes, AccType::Vec);
            let mut data2 = self.mem(second, dbytes, AccType::Vec);
            if datasize != 128 {
                data1 = self.ir.zero_extend_to_quad(data1);
                data2 = self.ir.zero_extend_to_quad(data2);
            }
            self.set_v(128, vt, data1);
            self.set_v(128, vt2, data2);
        } else {
            let mut data1 = self.v(128, vt);
            let mut data2 = self.v(128, vt2);
            if datasize != 128 {
                data1 = self.ir.vector_get_element(datasize, data1, 0);
                data2 = self.ir.vector_get_element(datasize, data2, 0);
            }
            self.set_mem(address, dbytes, AccType::Vec, data1);
            self.set_mem(second, dbytes, AccType::Vec, data2);
        }

        self.pair_writeback(rn, index, address, offset);
        InstOutcome::Continue
    }

    pub(super) fn load_store_unsigned_imm(
        &mut self,
        size: Imm<2>,
        opc: Imm<2>,
        imm12: Imm<12>,
        rn: Reg,
        rt: Reg,
    ) -> InstOutcome {
        if opc.bit(1) {
            // LDRSB/LDRSH/LDRSW and PRFM
            return self.interpret_this_instruction();
        }
        let scale = size.value();
        let dbytes = 1usize << scale;
        let regsize = if scale == 3 { 64 } else { 32 };
        let offset = imm12.zero_extend() << scale;

        let base = self.base_address(rn);
        let offset = self.ir.imm64(offset);
        let address = self.ir.add(base, offset);

        if opc.bit(0) {
            let data = self.mem(address, dbytes, AccType::Normal);
            let data = match dbytes {
                1 | 2 => self.ir.zero_extend_to_word(data),
                _ => data,
            };
            self.set_x(regsize, rt, data);
        } else {
            let data = self.x(regsize, rt);
            let data = match dbytes {
                1 => self.ir.least_significant_byte(data),
                2 => self.ir.least_significant_half(data),
                _ => data,
            };
            self.set_mem(address, dbytes, AccType::Normal, data);
        }
        InstOutcome::Continue
    }
}
