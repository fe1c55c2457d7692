// This module holds the A64 decode table. Each entry pairs a 32-character pattern with a field
// extractor that produces an A64Inst; fixed bits are '0'/'1', fields are written as letters for
// readability. Entries are ordered by specificity inside the generic DecodeTable, so for
// example the non-temporal pair forms (which fix the index bits) win over the general pair
// forms, and the named hints win over the catch-all HINT. Encodings that match no entry are
// unallocated as far as this engine is concerned.

//! A64 decoder.

use std::sync::OnceLock;

use super::{Reg, VReg};
use crate::frontend::bits::{bit, bits, Imm};
use crate::frontend::decoder::{DecodeTable, Matcher};

/// Index mode of a paired transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairIndex {
    /// Non-temporal: offset addressing, no writeback.
    NonTemporal,
    PostIndex,
    Offset,
    PreIndex,
}

impl PairIndex {
    fn from_bits(idx: u32) -> Self {
        match idx & 3 {
            0b00 => PairIndex::NonTemporal,
            0b01 => PairIndex::PostIndex,
            0b10 => PairIndex::Offset,
            _ => PairIndex::PreIndex,
        }
    }

    pub fn wback(self) -> bool {
        matches!(self, PairIndex::PostIndex | PairIndex::PreIndex)
    }

    pub fn postindex(self) -> bool {
        self == PairIndex::PostIndex
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveWideOp {
    Movn,
    Movz,
    Movk,
}

/// Named hint instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintOp {
    Nop,
    Yield,
    Wfe,
    Wfi,
    Sev,
    Sevl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarrierOp {
    Clrex,
    Dsb,
    Dmb,
    Isb,
}

/// A decoded A64 instruction with its raw fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum A64Inst {
    AddSubImm {
        sf: bool,
        sub: bool,
        set_flags: bool,
        shift: Imm<2>,
        imm12: Imm<12>,
        rn: Reg,
        rd: Reg,
    },
    MoveWide {
        op: MoveWideOp,
        sf: bool,
        hw: Imm<2>,
        imm16: Imm<16>,
        rd: Reg,
    },
    OrrShiftedReg {
        sf: bool,
        shift: Imm<2>,
        rm: Reg,
        imm6: Imm<6>,
        rn: Reg,
        rd: Reg,
    },
    B { imm26: Imm<26> },
    Bl { imm26: Imm<26> },
    Br { rn: Reg },
    Blr { rn: Reg },
    Ret { rn: Reg },
    Svc { imm16: Imm<16> },
    Brk { imm16: Imm<16> },
    /// Hint space not covered by a named hint; architecturally a NOP.
    Hint { crm: Imm<4>, op2: Imm<3> },
    NamedHint(HintOp),
    Barrier { op: BarrierOp, crm: Imm<4> },
    Msr { sysreg: u32, rt: Reg },
    Mrs { sysreg: u32, rt: Reg },
    LoadStorePair {
        opc: Imm<2>,
        index: PairIndex,
        load: bool,
        imm7: Imm<7>,
        rt2: Reg,
        rn: Reg,
        rt: Reg,
    },
    LoadStorePairFpsimd {
        opc: Imm<2>,
        index: PairIndex,
        load: bool,
        imm7: Imm<7>,
        vt2: VReg,
        rn: Reg,
        vt: VReg,
    },
    LoadStoreUnsignedImm {
        size: Imm<2>,
        opc: Imm<2>,
        imm12: Imm<12>,
        rn: Reg,
        rt: Reg,
    },
    SimdScalarAdd { size: Imm<2>, vm: VReg, vn: VReg, vd: VReg },
    SimdScalarSub { size: Imm<2>, vm: VReg, vn: VReg, vd: VReg },
}

fn rd(word: u32) -> Reg {
    Reg::from_field(bits(word, 4, 0))
}

fn rn(word: u32) -> Reg {
    Reg::from_field(bits(word, 9, 5))
}

fn add_sub_imm(word: u32) -> A64Inst {
    A64Inst::AddSubImm {
        sf: bit(word, 31),
        sub: bit(word, 30),
        set_flags: bit(word, 29),
        shift: Imm::extract(word, 22),
        imm12: Imm::extract(word, 10),
        rn: rn(word),
        rd: rd(word),
    }
}

fn move_wide(op: MoveWideOp, word: u32) -> A64Inst {
    A64Inst::MoveWide {
        op,
        sf: bit(word, 31),
        hw: Imm::extract(word, 21),
        imm16: Imm::extract(word, 5),
        rd: rd(word),
    }
}

fn pair(word: u32) -> A64Inst {
    A64Inst::LoadStorePair {
        opc: Imm::extract(word, 30),
        index: PairIndex::from_bits(bits(word, 24, 23)),
        load: bit(word, 22),
        imm7: Imm::extract(word, 15),
        rt2: Reg::from_field(bits(word, 14, 10)),
        rn: rn(word),
        rt: rd(word),
    }
}

fn pair_fpsimd(word: u32) -> A64Inst {
    A64Inst::LoadStorePairFpsimd {
        opc: Imm::extract(word, 30),
        index: PairIndex::from_bits(bits(word, 24, 23)),
        load: bit(word, 22),
        imm7: Imm::extract(word, 15),
        vt2: VReg::from_field(bits(word, 14, 10)),
        rn: rn(word),
        vt: VReg::from_field(bits(word, 4, 0)),
    }
}

fn system_register(word: u32) -> u32 {
    // op0 is 1:o0, followed by op1, CRn, CRm and op2.
    (1 << 15) | bits(word, 19, 5)
}

fn barrier(op: BarrierOp, word: u32) -> A64Inst {
    A64Inst::Barrier { op, crm: Imm::extract(word, 8) }
}

fn vregs(word: u32) -> (Imm<2>, VReg, VReg, VReg) {
    (
        Imm::extract(word, 22),
        VReg::from_field(bits(word, 20, 16)),
        VReg::from_field(bits(word, 9, 5)),
        VReg::from_field(bits(word, 4, 0)),
    )
}

fn build_table() -> DecodeTable<A64Inst> {
    use A64Inst as I;

    DecodeTable::new(
        32,
        vec![
            // Data processing (immediate)
            Matcher::new("ADD_imm", b"z0010001ssiiiiiiiiiiiinnnnnddddd", add_sub_imm),
            Matcher::new("ADDS_imm", b"z0110001ssiiiiiiiiiiiinnnnnddddd", add_sub_imm),
            Matcher::new("SUB_imm", b"z1010001ssiiiiiiiiiiiinnnnnddddd", add_sub_imm),
            Matcher::new("SUBS_imm", b"z1110001ssiiiiiiiiiiiinnnnnddddd", add_sub_imm),
            Matcher::new("MOVN", b"z00100101hhiiiiiiiiiiiiiiiiddddd", |w| move_wide(MoveWideOp::Movn, w)),
            Matcher::new("MOVZ", b"z10100101hhiiiiiiiiiiiiiiiiddddd", |w| move_wide(MoveWideOp::Movz, w)),
            Matcher::new("MOVK", b"z11100101hhiiiiiiiiiiiiiiiiddddd", |w| move_wide(MoveWideOp::Movk, w)),
            // Data processing (register)
            Matcher::new("ORR_shift", b"z0101010ss0mmmmmiiiiiinnnnnddddd", |w| I::OrrShiftedReg {
                sf: bit(w, 31),
                shift: Imm::extract(w, 22),
                rm: Reg::from_field(bits(w, 20, 16)),
                imm6: Imm::extract(w, 10),
                rn: rn(w),
                rd: rd(w),
            }),
            // Branches
            Matcher::new("B", b"000101iiiiiiiiiiiiiiiiiiiiiiiiii", |w| I::B { imm26: Imm::extract(w, 0) }),
            Matcher::new("BL", b"100101iiiiiiiiiiiiiiiiiiiiiiiiii", |w| I::Bl { imm26: Imm::extract(w, 0) }),
            Matcher::new("BR", b"1101011000011111000000nnnnn00000", |w| I::Br { rn: rn(w) }),
            Matcher::new("BLR", b"1101011000111111000000nnnnn00000", |w| I::Blr { rn: rn(w) }),
            Matcher::new("RET", b"1101011001011111000000nnnnn00000", |w| I::Ret { rn: rn(w) }),
            // Exception generation
            Matcher::new("SVC", b"11010100000iiiiiiiiiiiiiiii00001", |w| I::Svc { imm16: Imm::extract(w, 5) }),
            Matcher::new("BRK", b"11010100001iiiiiiiiiiiiiiii00000", |w| I::Brk { imm16: Imm::extract(w, 5) }),
            // Hints and barriers
            Matcher::new("HINT", b"11010101000000110010MMMMooo11111", |w| I::Hint {
                crm: Imm::extract(w, 8),
                op2: Imm::extract(w, 5),
            }),
            Matcher::new("NOP", b"11010101000000110010000000011111", |_| I::NamedHint(HintOp::Nop)),
            Matcher::new("YIELD", b"11010101000000110010000000111111", |_| I::NamedHint(HintOp::Yield)),
            Matcher::new("WFE", b"11010101000000110010000001011111", |_| I::NamedHint(HintOp::Wfe)),
            Matcher::new("WFI", b"11010101000000110010000001111111", |_| I::NamedHint(HintOp::Wfi)),
            Matcher::new("SEV", b"11010101000000110010000010011111", |_| I::NamedHint(HintOp::Sev)),
            Matcher::new("SEVL", b"11010101000000110010000010111111", |_| I::NamedHint(HintOp::Sevl)),
            Matcher::new("CLREX", b"11010101000000110011MMMM01011111", |w| barrier(BarrierOp::Clrex, w)),
            Matcher::new("DSB", b"11010101000000110011MMMM10011111", |w| barrier(BarrierOp::Dsb, w)),
            Matcher::new("DMB", b"11010101000000110011MMMM10111111", |w| barrier(BarrierOp::Dmb, w)),
            Matcher::new("ISB", b"11010101000000110011MMMM11011111", |w| barrier(BarrierOp::Isb, w)),
            // System register moves
            Matcher::new("MSR_reg", b"110101010001poooNNNNMMMMooottttt", |w| I::Msr {
                sysreg: system_register(w),
                rt: rd(w),
            }),
            Matcher::new("MRS", b"110101010011poooNNNNMMMMooottttt", |w| I::Mrs {
                sysreg: system_register(w),
                rt: rd(w),
            }),
            // Loads and stores
            Matcher::new("STNP_LDNP_gen", b"oo1010000Liiiiiiiuuuuunnnnnttttt", pair),
            Matcher::new("STP_LDP_gen", b"oo10100xxLiiiiiiiuuuuunnnnnttttt", pair),
            Matcher::new("STNP_LDNP_fpsimd", b"oo1011000Liiiiiiiuuuuunnnnnttttt", pair_fpsimd),
            Matcher::new("STP_LDP_fpsimd", b"oo10110xxLiiiiiiiuuuuunnnnnttttt", pair_fpsimd),
            Matcher::new("STRx_LDRx_imm_2", b"zz111001ooiiiiiiiiiiiinnnnnttttt", |w| I::LoadStoreUnsignedImm {
                size: Imm::extract(w, 30),
                opc: Imm::extract(w, 22),
                imm12: Imm::extract(w, 10),
                rn: rn(w),
                rt: rd(w),
            }),
            // SIMD scalar three same
            Matcher::new("ADD_1", b"01011110zz1mmmmm100001nnnnnddddd", |w| {
                let (size, vm, vn, vd) = vregs(w);
                I::SimdScalarAdd { size, vm, vn, vd }
            }),
            Matcher::new("SUB_1", b"01111110zz1mmmmm100001nnnnnddddd", |w| {
                let (size, vm, vn, vd) = vregs(w);
                I::SimdScalarSub { size, vm, vn, vd }
            }),
        ],
    )
}

/// The A64 decode table.
pub fn table() -> &'static DecodeTable<A64Inst> {
    static TABLE: OnceLock<DecodeTable<A64Inst>> = OnceLock::new();
    TABLE.get_or_init(build_table)
}

/// Decode `word`; `None` means unallocated.
pub fn decode(word: u32) -> Option<(&'static str, A64Inst)> {
    table().decode(word)
}
