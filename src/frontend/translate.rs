// This module implements the translation driver shared by the A64 and A32/Thumb frontends.
// The driver owns the block under construction and repeatedly asks the architecture-specific
// step function to decode and translate one guest instruction at the current location. After
// every step it checks the emitter for a latched contract violation, lowers rejection outcomes
// to exception or interpreter terminals, and enforces the block size limit and single-step
// mode by forcing a Continue (or CheckHalt) terminal. Rejections are guest-data conditions and
// never fail translation; only contract violations surface as TranslateError.

//! Translation entry point.

use super::{a32, a64, CodeReader, Exception, InstOutcome, Rejection};
use crate::core::config::{TranslationOptions, UnpredictablePolicy};
use crate::core::error::{TranslateError, TranslateResult};
use crate::core::stats::TranslationStats;
use crate::ir::{A32LocationDescriptor, A64LocationDescriptor, Block, IrEmitter, LocationDescriptor, Terminal};

/// What one architecture step did.
pub(crate) struct Step {
    pub mnemonic: &'static str,
    /// Size of the guest instruction in bytes.
    pub bytes: u64,
    pub outcome: InstOutcome,
}

/// Architecture-specific location type the driver steps through.
pub(crate) trait GuestLocation: Copy + Into<LocationDescriptor> {
    fn advance_by(self, bytes: u64) -> Self;
}

impl GuestLocation for A64LocationDescriptor {
    fn advance_by(self, bytes: u64) -> Self {
        self.advance(bytes)
    }
}

impl GuestLocation for A32LocationDescriptor {
    fn advance_by(self, bytes: u64) -> Self {
        self.advance(bytes as u32)
    }
}

/// Translates guest code into blocks, accumulating statistics.
#[derive(Debug, Default)]
pub struct Translator {
    options: TranslationOptions,
    stats: TranslationStats,
}

impl Translator {
    pub fn new(options: TranslationOptions) -> Self {
        Self { options, stats: TranslationStats::default() }
    }

    pub fn options(&self) -> &TranslationOptions {
        &self.options
    }

    pub fn stats(&self) -> &TranslationStats {
        &self.stats
    }

    /// Translate the block starting at `location`.
    pub fn translate(&mut self, location: LocationDescriptor, code: &dyn CodeReader) -> TranslateResult<Block> {
        translate(location, code, &self.options, &mut self.stats)
    }
}

/// Translate the block starting at `location` with explicit options.
pub fn translate(
    location: LocationDescriptor,
    code: &dyn CodeReader,
    options: &TranslationOptions,
    stats: &mut TranslationStats,
) -> TranslateResult<Block> {
    match location {
        LocationDescriptor::A64(loc) => a64::translate(loc, code, options, stats),
        LocationDescriptor::A32(loc) => a32::translate(loc, code, options, stats),
    }
}

/// Terminal for a rejected instruction at `location`.
pub(crate) fn rejection_terminal(
    rejection: Rejection,
    location: LocationDescriptor,
    next: LocationDescriptor,
    policy: UnpredictablePolicy,
) -> Terminal {
    let raise = |exception| Terminal::RaiseException { location, exception, next };
    match rejection {
        Rejection::Unallocated => raise(Exception::UnallocatedEncoding),
        Rejection::ReservedValue => raise(Exception::ReservedValue),
        Rejection::Unpredictable => match policy {
            UnpredictablePolicy::RaiseException => raise(Exception::UnpredictableInstruction),
            UnpredictablePolicy::Interpret => Terminal::Interpret { location, num_instructions: 1 },
        },
        Rejection::Unsupported => Terminal::Interpret { location, num_instructions: 1 },
    }
}

/// Run the per-instruction loop from `start` until a terminal is set.
pub(crate) fn drive<L, F>(
    start: L,
    options: &TranslationOptions,
    stats: &mut TranslationStats,
    step: F,
) -> TranslateResult<Block>
where
    L: GuestLocation,
    F: FnMut(&mut IrEmitter<'_>, L) -> Step,
{
    let limit = options.block_limit();
    let descriptor: LocationDescriptor = start.into();
    let mut block = Block::new(descriptor);

    let checked = run_steps(&mut block, start, options, stats, step).and_then(|()| {
        if !block.has_terminal() {
            Err(TranslateError::MissingTerminal { location: descriptor })
        } else if block.guest_instruction_count() > limit {
            Err(TranslateError::BlockTooLarge { location: descriptor, limit })
        } else {
            Ok(())
        }
    });
    if let Err(error) = checked {
        stats.failed_blocks += 1;
        return Err(error);
    }

    stats.blocks_translated += 1;
    stats.ir_instructions += block.len();
    log::debug!(
        "translated {}: {} guest instructions, {} IR instructions, terminal {}",
        descriptor,
        block.guest_instruction_count(),
        block.len(),
        block.terminal()
    );
    Ok(block)
}

fn run_steps<L, F>(
    block: &mut Block,
    start: L,
    options: &TranslationOptions,
    stats: &mut TranslationStats,
    mut step: F,
) -> TranslateResult<()>
where
    L: GuestLocation,
    F: FnMut(&mut IrEmitter<'_>, L) -> Step,
{
    let limit = options.block_limit();
    let origin: LocationDescriptor = start.into();
    let start_pc = origin.pc();
    let single_stepping = origin.single_stepping();
    let mut ir = IrEmitter::new(block);
    let mut location = start;

    loop {
        let before = ir.inst_count();
        let Step { mnemonic, bytes, outcome } = step(&mut ir, location);
        ir.record_guest_instruction(bytes);
        stats.record_instruction(mnemonic);
        let here: LocationDescriptor = location.into();
        log::trace!("{here}: {mnemonic}");

        if let Some(error) = ir.take_error() {
            return Err(error);
        }

        let following = location.advance_by(bytes);
        let next: LocationDescriptor = following.into();
        let outcome = match outcome {
            InstOutcome::Reject(rejection) => {
                if ir.inst_count() != before || ir.has_term() {
                    return Err(TranslateError::RejectedAfterEmit { pc: here.pc() });
                }
                if rejection != Rejection::Unsupported {
                    log::warn!("{here}: {mnemonic} rejected as {rejection:?}");
                }
                stats.record_rejection(rejection);
                ir.set_term(rejection_terminal(rejection, here, next, options.unpredictable_policy));
                InstOutcome::EndBlock
            }
            other => other,
        };

        if outcome == InstOutcome::EndBlock || ir.has_term() {
            break;
        }

        if single_stepping {
            ir.set_term(Terminal::CheckHalt {
                else_: Box::new(Terminal::Continue { next }),
            });
            break;
        }
        // A block never spans the top of the address space.
        if ir.block().guest_instruction_count() >= limit || next.pc() < start_pc {
            ir.set_term(Terminal::Continue { next });
            break;
        }
        location = following;
    }

    match ir.take_error() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
