//! Thumb 32-bit decoder. Words are `(first_halfword << 16) | second_halfword`.

use std::sync::OnceLock;

use super::decoder_arm::{cdp, ldc_stc, mcr_mrc, mcrr_mrrc, CoprocInst};
use crate::frontend::bits::{bit, bits, Imm};
use crate::frontend::decoder::{DecodeTable, Matcher};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Thumb32Inst {
    Bl { s: bool, j1: bool, j2: bool, imm10: Imm<10>, imm11: Imm<11> },
    Udf { imm16: u32 },
    Coproc(CoprocInst),
}

impl Thumb32Inst {
    /// Sign-extended BL offset, relative to the instruction address plus 4.
    pub fn bl_offset(s: bool, j1: bool, j2: bool, imm10: Imm<10>, imm11: Imm<11>) -> i32 {
        let i1 = !(j1 ^ s) as u32;
        let i2 = !(j2 ^ s) as u32;
        let raw = ((s as u32) << 24) | (i1 << 23) | (i2 << 22) | (imm10.value() << 12) | (imm11.value() << 1);
        ((raw << 7) as i32) >> 7
    }
}

fn build_table() -> DecodeTable<Thumb32Inst> {
    use Thumb32Inst as I;

    DecodeTable::new(
        32,
        vec![
            Matcher::new("BL", b"11110Svvvvvvvvvv11j1jvvvvvvvvvvv", |w| I::Bl {
                s: bit(w, 26),
                j1: bit(w, 13),
                j2: bit(w, 11),
                imm10: Imm::extract(w, 16),
                imm11: Imm::extract(w, 0),
            }),
            Matcher::new("UDF", b"111101111111vvvv1010vvvvvvvvvvvv", |w| I::Udf {
                imm16: (bits(w, 19, 16) << 12) | bits(w, 11, 0),
            }),
            // Coprocessor, T=0 then T=1 forms
            Matcher::new("CDP", b"11101110ooooNNNNDDDDppppooo0MMMM", |w| I::Coproc(cdp(w))),
            Matcher::new("CDP2", b"11111110ooooNNNNDDDDppppooo0MMMM", |w| I::Coproc(cdp(w))),
            Matcher::new("MCR", b"11101110ooo0NNNNttttppppooo1MMMM", |w| I::Coproc(mcr_mrc(w))),
            Matcher::new("MCR2", b"11111110ooo0NNNNttttppppooo1MMMM", |w| I::Coproc(mcr_mrc(w))),
            Matcher::new("MRC", b"11101110ooo1NNNNttttppppooo1MMMM", |w| I::Coproc(mcr_mrc(w))),
            Matcher::new("MRC2", b"11111110ooo1NNNNttttppppooo1MMMM", |w| I::Coproc(mcr_mrc(w))),
            Matcher::new("MCRR", b"111011000100uuuuttttppppooooMMMM", |w| I::Coproc(mcrr_mrrc(w))),
            Matcher::new("MCRR2", b"111111000100uuuuttttppppooooMMMM", |w| I::Coproc(mcrr_mrrc(w))),
            Matcher::new("MRRC", b"111011000101uuuuttttppppooooMMMM", |w| I::Coproc(mcrr_mrrc(w))),
            Matcher::new("MRRC2", b"111111000101uuuuttttppppooooMMMM", |w| I::Coproc(mcrr_mrrc(w))),
            Matcher::new("STC", b"1110110pudw0nnnnDDDDppppvvvvvvvv", |w| I::Coproc(ldc_stc(w))),
            Matcher::new("STC2", b"1111110pudw0nnnnDDDDppppvvvvvvvv", |w| I::Coproc(ldc_stc(w))),
            Matcher::new("LDC", b"1110110pudw1nnnnDDDDppppvvvvvvvv", |w| I::Coproc(ldc_stc(w))),
            Matcher::new("LDC2", b"1111110pudw1nnnnDDDDppppvvvvvvvv", |w| I::Coproc(ldc_stc(w))),
        ],
    )
}

/// The Thumb32 decode table.
pub fn table() -> &'static DecodeTable<Thumb32Inst> {
    static TABLE: OnceLock<DecodeTable<Thumb32Inst>> = OnceLock::new();
    TABLE.get_or_init(build_table)
}

pub fn decode_thumb32(word: u32) -> Option<(&'static str, Thumb32Inst)> {
    table().decode(word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bl_offset() {
        // bl #+0x100 : f000 f880
        let (name, inst) = decode_thumb32(0xF000_F880).unwrap();
        assert_eq!(name, "BL");
        let Thumb32Inst::Bl { s, j1, j2, imm10, imm11 } = inst else {
            panic!("expected BL, got {inst:?}");
        };
        assert_eq!(Thumb32Inst::bl_offset(s, j1, j2, imm10, imm11), 0x100);

        // bl #-4 : f7ff fffe
        let (_, inst) = decode_thumb32(0xF7FF_FFFE).unwrap();
        let Thumb32Inst::Bl { s, j1, j2, imm10, imm11 } = inst else {
            panic!("expected BL, got {inst:?}");
        };
        assert_eq!(Thumb32Inst::bl_offset(s, j1, j2, imm10, imm11), -4);
    }

    #[test]
    fn test_coprocessor_forms() {
        // mcr p15, 0, r0, c7, c5, 4
        let (name, inst) = decode_thumb32(0xEE07_0F95).unwrap();
        assert_eq!(name, "MCR");
        assert!(matches!(inst, Thumb32Inst::Coproc(CoprocInst::Mcr { two: false, coproc: 15, .. })));
    }
}
