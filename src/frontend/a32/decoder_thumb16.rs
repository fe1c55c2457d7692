//! Thumb 16-bit decoder.

use std::sync::OnceLock;

use super::{Cond, Reg};
use crate::frontend::bits::{bits, Imm};
use crate::frontend::decoder::{DecodeTable, Matcher};

/// Hints in the IT/hint space with a zero mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbHint {
    Nop,
    Yield,
    Wfe,
    Wfi,
    Sev,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Thumb16Inst {
    LslImm { imm5: Imm<5>, rm: Reg, rd: Reg },
    LsrImm { imm5: Imm<5>, rm: Reg, rd: Reg },
    AsrImm { imm5: Imm<5>, rm: Reg, rd: Reg },
    LslReg { rm: Reg, rdn: Reg },
    LsrReg { rm: Reg, rdn: Reg },
    AsrReg { rm: Reg, rdn: Reg },
    MovImm { rd: Reg, imm8: Imm<8> },
    /// Conditional branch (T1).
    BCond { cond: Cond, imm8: Imm<8> },
    /// Unconditional branch (T2).
    B { imm11: Imm<11> },
    Bx { rm: Reg },
    Udf { imm8: Imm<8> },
    Svc { imm8: Imm<8> },
    Hint(ThumbHint),
    /// Unrecognized hint, treated as NOP.
    UnknownHint { op: Imm<4> },
    It { firstcond: Cond, mask: Imm<4> },
}

impl Thumb16Inst {
    /// Number of instructions an IT instruction makes conditional.
    pub fn it_block_len(mask: Imm<4>) -> usize {
        4 - mask.value().trailing_zeros().min(4) as usize
    }
}

fn low3(word: u32, lsb: u32) -> Reg {
    Reg::from_field(bits(word, lsb + 2, lsb))
}

fn shift_imm(word: u32) -> (Imm<5>, Reg, Reg) {
    (Imm::extract(word, 6), low3(word, 3), low3(word, 0))
}

fn build_table() -> DecodeTable<Thumb16Inst> {
    use Thumb16Inst as I;

    DecodeTable::new(
        16,
        vec![
            // Shift (immediate), move
            Matcher::new("LSL_imm", b"00000vvvvvmmmddd", |w| {
                let (imm5, rm, rd) = shift_imm(w);
                I::LslImm { imm5, rm, rd }
            }),
            Matcher::new("LSR_imm", b"00001vvvvvmmmddd", |w| {
                let (imm5, rm, rd) = shift_imm(w);
                I::LsrImm { imm5, rm, rd }
            }),
            Matcher::new("ASR_imm", b"00010vvvvvmmmddd", |w| {
                let (imm5, rm, rd) = shift_imm(w);
                I::AsrImm { imm5, rm, rd }
            }),
            Matcher::new("MOV_imm", b"00100dddvvvvvvvv", |w| I::MovImm {
                rd: low3(w, 8),
                imm8: Imm::extract(w, 0),
            }),
            // Data processing (register)
            Matcher::new("LSL_reg", b"0100000010mmmddd", |w| I::LslReg { rm: low3(w, 3), rdn: low3(w, 0) }),
            Matcher::new("LSR_reg", b"0100000011mmmddd", |w| I::LsrReg { rm: low3(w, 3), rdn: low3(w, 0) }),
            Matcher::new("ASR_reg", b"0100000100mmmddd", |w| I::AsrReg { rm: low3(w, 3), rdn: low3(w, 0) }),
            // Branches
            Matcher::new("BX", b"010001110mmmm000", |w| I::Bx { rm: Reg::from_field(bits(w, 6, 3)) }),
            Matcher::new("B_t1", b"1101ccccvvvvvvvv", |w| I::BCond {
                cond: Cond::from_field(bits(w, 11, 8)),
                imm8: Imm::extract(w, 0),
            }),
            Matcher::new("B_t2", b"11100vvvvvvvvvvv", |w| I::B { imm11: Imm::extract(w, 0) }),
            // Exception generation
            Matcher::new("UDF", b"11011110vvvvvvvv", |w| I::Udf { imm8: Imm::extract(w, 0) }),
            Matcher::new("SVC", b"11011111vvvvvvvv", |w| I::Svc { imm8: Imm::extract(w, 0) }),
            // IT and hints
            Matcher::new("IT", b"10111111ccccmmmm", |w| I::It {
                firstcond: Cond::from_field(bits(w, 7, 4)),
                mask: Imm::extract(w, 0),
            }),
            Matcher::new("HINT", b"10111111oooo0000", |w| I::UnknownHint { op: Imm::extract(w, 4) }),
            Matcher::new("NOP", b"1011111100000000", |_| I::Hint(ThumbHint::Nop)),
            Matcher::new("YIELD", b"1011111100010000", |_| I::Hint(ThumbHint::Yield)),
            Matcher::new("WFE", b"1011111100100000", |_| I::Hint(ThumbHint::Wfe)),
            Matcher::new("WFI", b"1011111100110000", |_| I::Hint(ThumbHint::Wfi)),
            Matcher::new("SEV", b"1011111101000000", |_| I::Hint(ThumbHint::Sev)),
        ],
    )
}

/// The Thumb16 decode table.
pub fn table() -> &'static DecodeTable<Thumb16Inst> {
    static TABLE: OnceLock<DecodeTable<Thumb16Inst>> = OnceLock::new();
    TABLE.get_or_init(build_table)
}

pub fn decode_thumb16(halfword: u16) -> Option<(&'static str, Thumb16Inst)> {
    table().decode(halfword as u32)
}

/// True if `halfword` is the first half of a 32-bit Thumb instruction.
pub fn is_thumb32_prefix(halfword: u16) -> bool {
    matches!(halfword >> 11, 0b11101 | 0b11110 | 0b11111)
}
