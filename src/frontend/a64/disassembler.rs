//! A64 disassembly for diagnostics.
//!
//! Output follows the usual assembler syntax closely enough to read IR dumps
//! against; it is not meant to round-trip through an assembler.

use super::decoder::{self, A64Inst, BarrierOp, HintOp, MoveWideOp, PairIndex};
use super::translate::SystemRegister;
use super::{Reg, VReg};

/// General register name where 31 is the zero register.
fn reg_zr(sf: bool, reg: Reg) -> String {
    match (sf, reg.is_31()) {
        (true, true) => "xzr".to_string(),
        (false, true) => "wzr".to_string(),
        (true, false) => format!("x{}", reg.index()),
        (false, false) => format!("w{}", reg.index()),
    }
}

/// General register name where 31 is the stack pointer.
fn reg_sp(sf: bool, reg: Reg) -> String {
    match (sf, reg.is_31()) {
        (true, true) => "sp".to_string(),
        (false, true) => "wsp".to_string(),
        _ => reg_zr(sf, reg),
    }
}

fn vreg(prefix: char, vec: VReg) -> String {
    format!("{prefix}{}", vec.index())
}

fn signed_hex(value: i64) -> String {
    if value < 0 {
        format!("#-{:#x}", value.unsigned_abs())
    } else {
        format!("#{value:#x}")
    }
}

fn barrier_option(crm: u32) -> String {
    match crm {
        0b1111 => "sy".to_string(),
        0b1110 => "st".to_string(),
        0b1101 => "ld".to_string(),
        0b1011 => "ish".to_string(),
        0b1010 => "ishst".to_string(),
        0b1001 => "ishld".to_string(),
        0b0111 => "nsh".to_string(),
        0b0011 => "osh".to_string(),
        other => format!("#{other}"),
    }
}

fn sysreg_name(encoding: u32) -> String {
    match SystemRegister::from_encoding(encoding) {
        Some(reg) => reg.name().to_string(),
        None => format!(
            "s{}_{}_c{}_c{}_{}",
            (encoding >> 14) & 3,
            (encoding >> 11) & 7,
            (encoding >> 7) & 0xF,
            (encoding >> 3) & 0xF,
            encoding & 7
        ),
    }
}

fn address(base: Reg, index: PairIndex, offset: i64) -> String {
    let base = reg_sp(true, base);
    match index {
        PairIndex::PostIndex => format!("[{base}], {}", signed_hex(offset)),
        PairIndex::PreIndex => format!("[{base}, {}]!", signed_hex(offset)),
        PairIndex::Offset | PairIndex::NonTemporal if offset == 0 => format!("[{base}]"),
        PairIndex::Offset | PairIndex::NonTemporal => format!("[{base}, {}]", signed_hex(offset)),
    }
}

/// Disassemble one A64 instruction word.
pub fn disassemble_a64(word: u32) -> String {
    let Some((_, inst)) = decoder::decode(word) else {
        return format!("UNKNOWN: {word:x}");
    };
    format_inst(inst).unwrap_or_else(|| format!("UNKNOWN: {word:x}"))
}

fn format_inst(inst: A64Inst) -> Option<String> {
    use A64Inst as I;
    let text = match inst {
        I::AddSubImm { sf, sub, set_flags, shift, imm12, rn, rd } => {
            let mnemonic = match (sub, set_flags) {
                (false, false) => "add",
                (false, true) => "adds",
                (true, false) => "sub",
                (true, true) => "subs",
            };
            let rd = if set_flags { reg_zr(sf, rd) } else { reg_sp(sf, rd) };
            let lsl = match shift.value() {
                0 => "",
                1 => ", lsl #12",
                _ => return None,
            };
            format!("{mnemonic} {rd}, {}, #{:#x}{lsl}", reg_sp(sf, rn), imm12.value())
        }
        I::MoveWide { op, sf, hw, imm16, rd } => {
            if !sf && hw.bit(1) {
                return None;
            }
            let mnemonic = match op {
                MoveWideOp::Movn => "movn",
                MoveWideOp::Movz => "movz",
                MoveWideOp::Movk => "movk",
            };
            let mut text = format!("{mnemonic} {}, #{:#x}", reg_zr(sf, rd), imm16.value());
            if hw.value() != 0 {
                text.push_str(&format!(", lsl #{}", hw.value() * 16));
            }
            text
        }
        I::OrrShiftedReg { sf, shift, rm, imm6, rn, rd } => {
            if !sf && imm6.bit(5) {
                return None;
            }
            let mut text = format!("orr {}, {}, {}", reg_zr(sf, rd), reg_zr(sf, rn), reg_zr(sf, rm));
            if imm6.value() != 0 {
                let kind = ["lsl", "lsr", "asr", "ror"][shift.value() as usize];
                text.push_str(&format!(", {kind} #{}", imm6.value()));
            }
            text
        }
        I::B { imm26 } => format!("b {}", signed_hex(imm26.sign_extend() << 2)),
        I::Bl { imm26 } => format!("bl {}", signed_hex(imm26.sign_extend() << 2)),
        I::Br { rn } => format!("br {}", reg_zr(true, rn)),
        I::Blr { rn } => format!("blr {}", reg_zr(true, rn)),
        I::Ret { rn } if rn == Reg::LR => "ret".to_string(),
        I::Ret { rn } => format!("ret {}", reg_zr(true, rn)),
        I::Svc { imm16 } => format!("svc #{:#x}", imm16.value()),
        I::Brk { imm16 } => format!("brk #{:#x}", imm16.value()),
        I::Hint { crm, op2 } => format!("hint #{}", (crm.value() << 3) | op2.value()),
        I::NamedHint(op) => match op {
            HintOp::Nop => "nop",
            HintOp::Yield => "yield",
            HintOp::Wfe => "wfe",
            HintOp::Wfi => "wfi",
            HintOp::Sev => "sev",
            HintOp::Sevl => "sevl",
        }
        .to_string(),
        I::Barrier { op, crm } => match op {
            BarrierOp::Clrex => "clrex".to_string(),
            BarrierOp::Dsb => format!("dsb {}", barrier_option(crm.value())),
            BarrierOp::Dmb => format!("dmb {}", barrier_option(crm.value())),
            BarrierOp::Isb => "isb".to_string(),
        },
        I::Msr { sysreg, rt } => format!("msr {}, {}", sysreg_name(sysreg), reg_zr(true, rt)),
        I::Mrs { sysreg, rt } => format!("mrs {}, {}", reg_zr(true, rt), sysreg_name(sysreg)),
        I::LoadStorePair { opc, index, load, imm7, rt2, rn, rt } => {
            let non_temporal = index == PairIndex::NonTemporal;
            let mnemonic = match (load, opc.value(), non_temporal) {
                (false, 0b00 | 0b10, false) => "stp",
                (true, 0b00 | 0b10, false) => "ldp",
                (true, 0b01, false) => "ldpsw",
                (false, 0b00 | 0b10, true) => "stnp",
                (true, 0b00 | 0b10, true) => "ldnp",
                _ => return None,
            };
            let scale = 2 + opc.bit(1) as u32;
            let sf = opc.bit(1) || opc.bit(0);
            let offset = imm7.sign_extend() << scale;
            format!(
                "{mnemonic} {}, {}, {}",
                reg_zr(sf, rt),
                reg_zr(sf, rt2),
                address(rn, index, offset)
            )
        }
        I::LoadStorePairFpsimd { opc, index, load, imm7, vt2, rn, vt } => {
            let prefix = match opc.value() {
                0b00 => 's',
                0b01 => 'd',
                0b10 => 'q',
                _ => return None,
            };
            let mnemonic = match (load, index == PairIndex::NonTemporal) {
                (false, false) => "stp",
                (true, false) => "ldp",
                (false, true) => "stnp",
                (true, true) => "ldnp",
            };
            let offset = imm7.sign_extend() << (2 + opc.value());
            format!(
                "{mnemonic} {}, {}, {}",
                vreg(prefix, vt),
                vreg(prefix, vt2),
                address(rn, index, offset)
            )
        }
        I::LoadStoreUnsignedImm { size, opc, imm12, rn, rt } => {
            let (mnemonic, sf) = match (size.value(), opc.value()) {
                (0b00, 0b00) => ("strb", false),
                (0b00, 0b01) => ("ldrb", false),
                (0b00, 0b10) => ("ldrsb", true),
                (0b00, 0b11) => ("ldrsb", false),
                (0b01, 0b00) => ("strh", false),
                (0b01, 0b01) => ("ldrh", false),
                (0b01, 0b10) => ("ldrsh", true),
                (0b01, 0b11) => ("ldrsh", false),
                (0b10, 0b00) => ("str", false),
                (0b10, 0b01) => ("ldr", false),
                (0b10, 0b10) => ("ldrsw", true),
                (0b11, 0b00) => ("str", true),
                (0b11, 0b01) => ("ldr", true),
                (0b11, 0b10) => {
                    let offset = imm12.value() << 3;
                    return Some(format!("prfm #{}, [{}, #{offset:#x}]", rt.index(), reg_sp(true, rn)));
                }
                _ => return None,
            };
            let offset = imm12.value() << size.value();
            let base = reg_sp(true, rn);
            if offset == 0 {
                format!("{mnemonic} {}, [{base}]", reg_zr(sf, rt))
            } else {
                format!("{mnemonic} {}, [{base}, #{offset:#x}]", reg_zr(sf, rt))
            }
        }
        I::SimdScalarAdd { size, vm, vn, vd } | I::SimdScalarSub { size, vm, vn, vd } => {
            if size != 0b11 {
                return None;
            }
            let mnemonic = if matches!(inst, I::SimdScalarAdd { .. }) { "add" } else { "sub" };
            format!("{mnemonic} {}, {}, {}", vreg('d', vd), vreg('d', vn), vreg('d', vm))
        }
    };
    Some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_forms() {
        assert_eq!(disassemble_a64(0xD503_201F), "nop");
        assert_eq!(disassemble_a64(0xD65F_03C0), "ret");
        assert_eq!(disassemble_a64(0x9100_43FF), "add sp, sp, #0x10");
        assert_eq!(disassemble_a64(0xA8C1_0861), "ldp x1, x2, [x3], #0x10");
        assert_eq!(disassemble_a64(0xA9BF_0BE1), "stp x1, x2, [sp, #-0x10]!");
        assert_eq!(disassemble_a64(0xD53B_D040), "mrs x0, tpidr_el0");
        assert_eq!(disassemble_a64(0x17FF_FFFE), "b #-0x8");
        assert_eq!(disassemble_a64(0xB940_0420), "ldr w0, [x1, #0x4]");
    }

    #[test]
    fn test_unknown() {
        assert_eq!(disassemble_a64(0), "UNKNOWN: 0");
        assert_eq!(disassemble_a64(0x7EA2_8420), "UNKNOWN: 7ea28420");
    }
}
