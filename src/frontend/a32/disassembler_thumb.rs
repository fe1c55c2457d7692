//! Thumb16 disassembly for diagnostics.

use super::decoder_thumb16::{self, ThumbHint, Thumb16Inst};
use super::Cond;
use crate::frontend::bits::{sign_extend, Imm};

/// Branch offset as printed, relative to the instruction address.
fn branch_offset(raw: u32, width: u32) -> i64 {
    sign_extend(raw as u64, width) + 4
}

fn it_suffix(firstcond: Cond, mask: Imm<4>) -> String {
    let then_bit = (firstcond as u32) & 1 == 1;
    let len = Thumb16Inst::it_block_len(mask);
    (1..len)
        .map(|i| if mask.bit(4 - i as u32) == then_bit { 't' } else { 'e' })
        .collect()
}

fn format(inst: Thumb16Inst) -> String {
    use Thumb16Inst as I;
    match inst {
        I::LslImm { imm5, rm, rd } => format!("lsls {rd}, {rm}, #{}", imm5.value()),
        // imm5 == 0 encodes a shift by 32; the raw field is printed.
        I::LsrImm { imm5, rm, rd } => format!("lsrs {rd}, {rm}, #{}", imm5.value()),
        I::AsrImm { imm5, rm, rd } => format!("asrs {rd}, {rm}, #{}", imm5.value()),
        I::LslReg { rm, rdn } => format!("lsls {rdn}, {rm}"),
        I::LsrReg { rm, rdn } => format!("lsrs {rdn}, {rm}"),
        I::AsrReg { rm, rdn } => format!("asrs {rdn}, {rm}"),
        I::MovImm { rd, imm8 } => format!("movs {rd}, #{}", imm8.value()),
        I::BCond { cond, imm8 } => format!("b{cond} #{:+}", branch_offset(imm8.value() << 1, 9)),
        I::B { imm11 } => format!("b #{:+}", branch_offset(imm11.value() << 1, 12)),
        I::Bx { rm } => format!("bx {rm}"),
        I::Udf { .. } => "udf".to_string(),
        I::Svc { imm8 } => format!("svc #{}", imm8.value()),
        I::Hint(hint) => match hint {
            ThumbHint::Nop => "nop",
            ThumbHint::Yield => "yield",
            ThumbHint::Wfe => "wfe",
            ThumbHint::Wfi => "wfi",
            ThumbHint::Sev => "sev",
        }
        .to_string(),
        I::UnknownHint { op } => format!("hint #{}", op.value()),
        I::It { firstcond, mask } => format!("it{} {}", it_suffix(firstcond, mask), firstcond.suffix()),
    }
}

/// Disassemble a 16-bit Thumb instruction.
pub fn disassemble_thumb16(halfword: u16) -> String {
    match decoder_thumb16::decode_thumb16(halfword) {
        Some((_, inst)) => format(inst),
        None => format!("UNKNOWN: {halfword:x}"),
    }
}
