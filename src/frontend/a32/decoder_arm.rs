// This module holds the ARM (A32 encoding) decode table and the coprocessor instruction fields
// shared with the Thumb32 table. Coprocessor encodings are identical in bits 27:0 between the
// two instruction sets; only the top nibble differs (a condition in ARM, 1110/1111 in Thumb),
// so both tables decode them through the same field extractors. The unconditional "2" forms
// are separate entries with a fixed 1111 top nibble, which makes them more specific than the
// conditional entries they would otherwise tie with.

//! ARM decoder.

use std::sync::OnceLock;

use super::{Cond, CoprocReg, Reg};
use crate::frontend::bits::{bit, bits, Imm};
use crate::frontend::decoder::{DecodeTable, Matcher};

/// A coprocessor instruction, common to ARM and Thumb32.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoprocInst {
    Cdp {
        two: bool,
        opc1: Imm<4>,
        crn: CoprocReg,
        crd: CoprocReg,
        coproc: usize,
        opc2: Imm<3>,
        crm: CoprocReg,
    },
    Mcr {
        two: bool,
        opc1: Imm<3>,
        crn: CoprocReg,
        rt: Reg,
        coproc: usize,
        opc2: Imm<3>,
        crm: CoprocReg,
    },
    Mrc {
        two: bool,
        opc1: Imm<3>,
        crn: CoprocReg,
        rt: Reg,
        coproc: usize,
        opc2: Imm<3>,
        crm: CoprocReg,
    },
    Mcrr {
        two: bool,
        rt2: Reg,
        rt: Reg,
        coproc: usize,
        opc: Imm<4>,
        crm: CoprocReg,
    },
    Mrrc {
        two: bool,
        rt2: Reg,
        rt: Reg,
        coproc: usize,
        opc: Imm<4>,
        crm: CoprocReg,
    },
    /// LDC/STC; `load` distinguishes them.
    LoadStore {
        two: bool,
        load: bool,
        p: bool,
        u: bool,
        d: bool,
        w: bool,
        rn: Reg,
        crd: CoprocReg,
        coproc: usize,
        imm8: Imm<8>,
    },
}

impl CoprocInst {
    pub fn coproc(&self) -> usize {
        match *self {
            CoprocInst::Cdp { coproc, .. }
            | CoprocInst::Mcr { coproc, .. }
            | CoprocInst::Mrc { coproc, .. }
            | CoprocInst::Mcrr { coproc, .. }
            | CoprocInst::Mrrc { coproc, .. }
            | CoprocInst::LoadStore { coproc, .. } => coproc,
        }
    }

    /// True for the "2" forms, which ignore the condition field.
    pub fn is_unconditional(&self) -> bool {
        match *self {
            CoprocInst::Cdp { two, .. }
            | CoprocInst::Mcr { two, .. }
            | CoprocInst::Mrc { two, .. }
            | CoprocInst::Mcrr { two, .. }
            | CoprocInst::Mrrc { two, .. }
            | CoprocInst::LoadStore { two, .. } => two,
        }
    }
}

fn coproc_num(word: u32) -> usize {
    bits(word, 11, 8) as usize
}

fn two(word: u32) -> bool {
    bits(word, 31, 28) == 0b1111
}

pub(crate) fn cdp(word: u32) -> CoprocInst {
    CoprocInst::Cdp {
        two: two(word),
        opc1: Imm::extract(word, 20),
        crn: CoprocReg::from_field(bits(word, 19, 16)),
        crd: CoprocReg::from_field(bits(word, 15, 12)),
        coproc: coproc_num(word),
        opc2: Imm::extract(word, 5),
        crm: CoprocReg::from_field(bits(word, 3, 0)),
    }
}

pub(crate) fn mcr_mrc(word: u32) -> CoprocInst {
    let two = two(word);
    let opc1 = Imm::extract(word, 21);
    let crn = CoprocReg::from_field(bits(word, 19, 16));
    let rt = Reg::from_field(bits(word, 15, 12));
    let coproc = coproc_num(word);
    let opc2 = Imm::extract(word, 5);
    let crm = CoprocReg::from_field(bits(word, 3, 0));
    if bit(word, 20) {
        CoprocInst::Mrc { two, opc1, crn, rt, coproc, opc2, crm }
    } else {
        CoprocInst::Mcr { two, opc1, crn, rt, coproc, opc2, crm }
    }
}

pub(crate) fn mcrr_mrrc(word: u32) -> CoprocInst {
    let two = two(word);
    let rt2 = Reg::from_field(bits(word, 19, 16));
    let rt = Reg::from_field(bits(word, 15, 12));
    let coproc = coproc_num(word);
    let opc = Imm::extract(word, 4);
    let crm = CoprocReg::from_field(bits(word, 3, 0));
    if bit(word, 20) {
        CoprocInst::Mrrc { two, rt2, rt, coproc, opc, crm }
    } else {
        CoprocInst::Mcrr { two, rt2, rt, coproc, opc, crm }
    }
}

pub(crate) fn ldc_stc(word: u32) -> CoprocInst {
    CoprocInst::LoadStore {
        two: two(word),
        load: bit(word, 20),
        p: bit(word, 24),
        u: bit(word, 23),
        d: bit(word, 22),
        w: bit(word, 21),
        rn: Reg::from_field(bits(word, 19, 16)),
        crd: CoprocReg::from_field(bits(word, 15, 12)),
        coproc: coproc_num(word),
        imm8: Imm::extract(word, 0),
    }
}

/// A decoded ARM instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmInst {
    B { cond: Cond, imm24: Imm<24> },
    Bl { cond: Cond, imm24: Imm<24> },
    Bx { cond: Cond, rm: Reg },
    Svc { cond: Cond, imm24: Imm<24> },
    Udf { imm16: u32 },
    Nop { cond: Cond },
    Coproc { cond: Cond, inst: CoprocInst },
}

fn cond(word: u32) -> Cond {
    Cond::from_field(bits(word, 31, 28))
}

fn coproc(decode: fn(u32) -> CoprocInst, word: u32) -> ArmInst {
    ArmInst::Coproc { cond: cond(word), inst: decode(word) }
}

fn build_table() -> DecodeTable<ArmInst> {
    use ArmInst as I;

    DecodeTable::new(
        32,
        vec![
            // Branches and exception generation
            Matcher::new("B", b"cccc1010vvvvvvvvvvvvvvvvvvvvvvvv", |w| I::B { cond: cond(w), imm24: Imm::extract(w, 0) }),
            Matcher::new("BL", b"cccc1011vvvvvvvvvvvvvvvvvvvvvvvv", |w| I::Bl { cond: cond(w), imm24: Imm::extract(w, 0) }),
            Matcher::new("BX", b"cccc000100101111111111110001mmmm", |w| I::Bx {
                cond: cond(w),
                rm: Reg::from_field(bits(w, 3, 0)),
            }),
            Matcher::new("SVC", b"cccc1111vvvvvvvvvvvvvvvvvvvvvvvv", |w| I::Svc { cond: cond(w), imm24: Imm::extract(w, 0) }),
            Matcher::new("UDF", b"111001111111vvvvvvvvvvvv1111vvvv", |w| I::Udf {
                imm16: (bits(w, 19, 8) << 4) | bits(w, 3, 0),
            }),
            Matcher::new("NOP", b"cccc0011001000001111000000000000", |w| I::Nop { cond: cond(w) }),
            // Coprocessor
            Matcher::new("CDP", b"cccc1110ooooNNNNDDDDppppooo0MMMM", |w| coproc(cdp, w)),
            Matcher::new("CDP2", b"11111110ooooNNNNDDDDppppooo0MMMM", |w| coproc(cdp, w)),
            Matcher::new("MCR", b"cccc1110ooo0NNNNttttppppooo1MMMM", |w| coproc(mcr_mrc, w)),
            Matcher::new("MCR2", b"11111110ooo0NNNNttttppppooo1MMMM", |w| coproc(mcr_mrc, w)),
            Matcher::new("MRC", b"cccc1110ooo1NNNNttttppppooo1MMMM", |w| coproc(mcr_mrc, w)),
            Matcher::new("MRC2", b"11111110ooo1NNNNttttppppooo1MMMM", |w| coproc(mcr_mrc, w)),
            Matcher::new("MCRR", b"cccc11000100uuuuttttppppooooMMMM", |w| coproc(mcrr_mrrc, w)),
            Matcher::new("MCRR2", b"111111000100uuuuttttppppooooMMMM", |w| coproc(mcrr_mrrc, w)),
            Matcher::new("MRRC", b"cccc11000101uuuuttttppppooooMMMM", |w| coproc(mcrr_mrrc, w)),
            Matcher::new("MRRC2", b"111111000101uuuuttttppppooooMMMM", |w| coproc(mcrr_mrrc, w)),
            Matcher::new("STC", b"cccc110pudw0nnnnDDDDppppvvvvvvvv", |w| coproc(ldc_stc, w)),
            Matcher::new("STC2", b"1111110pudw0nnnnDDDDppppvvvvvvvv", |w| coproc(ldc_stc, w)),
            Matcher::new("LDC", b"cccc110pudw1nnnnDDDDppppvvvvvvvv", |w| coproc(ldc_stc, w)),
            Matcher::new("LDC2", b"1111110pudw1nnnnDDDDppppvvvvvvvv", |w| coproc(ldc_stc, w)),
        ],
    )
}

/// The ARM decode table.
pub fn table() -> &'static DecodeTable<ArmInst> {
    static TABLE: OnceLock<DecodeTable<ArmInst>> = OnceLock::new();
    TABLE.get_or_init(build_table)
}

pub fn decode_arm(word: u32) -> Option<(&'static str, ArmInst)> {
    table().decode(word)
}
