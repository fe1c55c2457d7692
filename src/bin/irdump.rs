//! Translate guest instruction words and print the resulting IR blocks.
//!
//! Words are given in hex on the command line and laid out contiguously from
//! `--pc`. For Thumb each argument is one halfword, so a 32-bit Thumb
//! instruction takes two arguments.

use std::process;

use armdbt::core::{TranslationOptions, UnpredictablePolicy};
use armdbt::frontend::a32::{decode_arm, decode_thumb32, disassemble_thumb16, is_thumb32_prefix};
use armdbt::frontend::a64::disassemble_a64;
use armdbt::frontend::{CodeReader, Translator};
use armdbt::ir::{A32LocationDescriptor, A64LocationDescriptor, LocationDescriptor};
use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Arch {
    A64,
    Arm,
    Thumb,
}

#[derive(Debug, Parser)]
#[command(name = "irdump", version, about = "Dump the IR translated from ARM guest code")]
struct Args {
    /// Instruction set of the input words.
    #[arg(long, value_enum, default_value = "a64")]
    arch: Arch,

    /// Guest address of the first word.
    #[arg(long, default_value = "0x1000", value_parser = parse_hex)]
    pc: u64,

    /// Maximum guest instructions per block.
    #[arg(long, default_value_t = 64)]
    max_block: usize,

    /// Check 16-byte SP alignment on SP-based A64 accesses.
    #[arg(long)]
    sp_check: bool,

    /// Hand unpredictable encodings to the interpreter instead of raising.
    #[arg(long)]
    interpret_unpredictable: bool,

    /// Translate each instruction as its own block.
    #[arg(long)]
    single: bool,

    /// Print translation statistics at the end.
    #[arg(long)]
    stats: bool,

    /// Instruction words in hex.
    #[arg(required = true, value_parser = parse_hex)]
    words: Vec<u64>,
}

fn parse_hex(text: &str) -> Result<u64, String> {
    let digits = text.trim_start_matches("0x").trim_start_matches("0X").replace('_', "");
    u64::from_str_radix(&digits, 16).map_err(|e| format!("invalid hex value {text:?}: {e}"))
}

/// Contiguous little-endian guest code.
struct Image {
    base: u64,
    bytes: Vec<u8>,
}

impl Image {
    fn byte(&self, vaddr: u64) -> Option<u8> {
        let offset = usize::try_from(vaddr.checked_sub(self.base)?).ok()?;
        self.bytes.get(offset).copied()
    }

    fn end(&self) -> u64 {
        self.base + self.bytes.len() as u64
    }
}

impl CodeReader for Image {
    fn read_code_u32(&self, vaddr: u64) -> Option<u32> {
        let mut word = 0u32;
        for i in 0..4 {
            word |= (self.byte(vaddr + i)? as u32) << (8 * i);
        }
        Some(word)
    }

    fn read_code_u16(&self, vaddr: u64) -> Option<u16> {
        Some(self.byte(vaddr)? as u16 | (self.byte(vaddr + 1)? as u16) << 8)
    }
}

fn build_image(args: &Args) -> Result<Image, String> {
    let mut bytes = Vec::new();
    for &word in &args.words {
        match args.arch {
            Arch::Thumb => {
                let halfword = u16::try_from(word).map_err(|_| format!("{word:#x} is not a halfword"))?;
                bytes.extend_from_slice(&halfword.to_le_bytes());
            }
            Arch::A64 | Arch::Arm => {
                let word = u32::try_from(word).map_err(|_| format!("{word:#x} is not a 32-bit word"))?;
                bytes.extend_from_slice(&word.to_le_bytes());
            }
        }
    }
    Ok(Image { base: args.pc, bytes })
}

fn location_at(arch: Arch, pc: u64) -> LocationDescriptor {
    match arch {
        Arch::A64 => A64LocationDescriptor::new(pc, 0, false).into(),
        Arch::Arm => A32LocationDescriptor::arm(pc as u32).into(),
        Arch::Thumb => A32LocationDescriptor::thumb(pc as u32).into(),
    }
}

fn print_listing(arch: Arch, image: &Image) {
    let mut pc = image.base;
    while pc < image.end() {
        let (size, text) = match arch {
            Arch::A64 | Arch::Arm => {
                let Some(word) = image.read_code_u32(pc) else { break };
                let text = if arch == Arch::A64 {
                    disassemble_a64(word)
                } else {
                    decode_arm(word).map_or_else(|| format!("UNKNOWN: {word:08x}"), |(name, _)| name.to_string())
                };
                println!("{pc:#010x}: {word:08x}  {text}");
                (4, text)
            }
            Arch::Thumb => {
                let Some(first) = image.read_code_u16(pc) else { break };
                match image.read_code_u16(pc + 2).filter(|_| is_thumb32_prefix(first)) {
                    Some(second) => {
                        let word = (first as u32) << 16 | second as u32;
                        let text = decode_thumb32(word)
                            .map_or_else(|| format!("UNKNOWN: {word:08x}"), |(name, _)| name.to_string());
                        println!("{pc:#010x}: {first:04x} {second:04x}  {text}");
                        (4, text)
                    }
                    None => {
                        let text = disassemble_thumb16(first);
                        println!("{pc:#010x}: {first:04x}       {text}");
                        (2, text)
                    }
                }
            }
        };
        log::trace!("listed {size}-byte instruction at {pc:#x}: {text}");
        pc += size;
    }
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let image = match build_image(&args) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(2);
        }
    };

    let mut options = TranslationOptions::default()
        .with_max_block_instructions(if args.single { 1 } else { args.max_block })
        .with_sp_alignment_check(args.sp_check);
    if args.interpret_unpredictable {
        options = options.with_unpredictable_policy(UnpredictablePolicy::Interpret);
    }

    print_listing(args.arch, &image);
    println!();

    let mut translator = Translator::new(options);
    let mut pc = image.base;
    while pc < image.end() {
        match translator.translate(location_at(args.arch, pc), &image) {
            Ok(block) => {
                println!("{block}");
                let end = block.covered_range().end;
                if end <= pc {
                    break;
                }
                pc = end;
            }
            Err(e) => {
                eprintln!("Error: {e}");
                process::exit(1);
            }
        }
    }

    if args.stats {
        print!("{}", translator.stats());
    }
}
