// This module is a reference executor: it interprets a block's IR directly against a plain
// guest register file and a MemoryCallbacks implementation. It stands in for a code generator
// in tests and in the irdump tool, and doubles as an executable statement of what each opcode
// means. Values are held as u128 and masked to their IR type after every operation. A block
// that references an operand it cannot evaluate, or an SP alignment check that fails, stops
// execution and leaves the reason in `fault`.

//! Reference IR evaluator.

use crate::ir::emitter::eval_shift;
use crate::ir::{A32LocationDescriptor, A64LocationDescriptor, Block, Inst, LocationDescriptor, Opcode, Type, Value};

use super::callbacks::{ExecutionStatus, Executor, MemoryCallbacks};

/// Architectural state the evaluator reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestState {
    /// True while executing A64 code.
    pub aarch64: bool,
    pub single_stepping: bool,

    pub x: [u64; 31],
    pub sp: u64,
    pub pc: u64,
    pub q: [u128; 32],
    pub fpcr: u32,
    pub fpsr: u32,
    pub tpidr: u64,
    pub tpidrro: u64,
    pub ctr: u32,
    pub dczid: u32,
    pub cntpct: u64,

    /// A32 core registers; `r[15]` is the PC.
    pub r: [u32; 16],
    pub thumb: bool,
    pub n: bool,
    pub z: bool,
    pub c: bool,
}

impl Default for GuestState {
    fn default() -> Self {
        Self {
            aarch64: true,
            single_stepping: false,
            x: [0; 31],
            sp: 0,
            pc: 0,
            q: [0; 32],
            fpcr: 0,
            fpsr: 0,
            tpidr: 0,
            tpidrro: 0,
            ctr: 0x8444_C004,
            dczid: 4,
            cntpct: 0,
            r: [0; 16],
            thumb: false,
            n: false,
            z: false,
            c: false,
        }
    }
}

/// Why the evaluator stopped inside a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// `A64CheckSpAlignment` saw an address that is not 16-byte aligned.
    SpAlignment { address: u64 },
    /// Instruction `index` has an operand the evaluator cannot use.
    Malformed { index: usize },
}

pub struct Evaluator<M: MemoryCallbacks> {
    pub state: GuestState,
    pub memory: M,
    /// Set by the host to stop at the next `CheckHalt`.
    pub halt: bool,
    pub fault: Option<Fault>,
}

impl<M: MemoryCallbacks> Evaluator<M> {
    pub fn new(memory: M) -> Self {
        Self { state: GuestState::default(), memory, halt: false, fault: None }
    }

    fn eval(&mut self, index: usize, inst: &Inst, values: &[u128]) -> Result<u128, Fault> {
        use Opcode::*;

        let malformed = Fault::Malformed { index };
        let arg = |i: usize| -> Result<u128, Fault> {
            match inst.args.get(i) {
                Some(Value::Inst { inst, .. }) => values.get(inst.index()).copied().ok_or(malformed),
                Some(value) => value.as_u64().map(u128::from).ok_or(malformed),
                None => Err(malformed),
            }
        };
        let x_index = |i: usize| match inst.args.get(i) {
            Some(Value::A64Reg(reg)) if !reg.is_31() => Ok(reg.index()),
            _ => Err(malformed),
        };
        let v_index = |i: usize| match inst.args.get(i) {
            Some(Value::A64Vec(vec)) => Ok(vec.index()),
            _ => Err(malformed),
        };
        let r_index = |i: usize| match inst.args.get(i) {
            Some(Value::A32Reg(reg)) => Ok(reg.index()),
            _ => Err(malformed),
        };
        let acc = |i: usize| match inst.args.get(i) {
            Some(Value::AccType(acc)) => Ok(*acc),
            _ => Err(malformed),
        };
        let arg_width = |i: usize| inst.args.get(i).and_then(|value| value.ty().bit_width()).ok_or(malformed);

        let state = &mut self.state;
        let result: u128 = match inst.opcode {
            A64GetW => state.x[x_index(0)?] as u32 as u128,
            A64GetX => state.x[x_index(0)?] as u128,
            A64GetSP => state.sp as u128,
            A64GetD => state.q[v_index(0)?] as u64 as u128,
            A64GetQ => state.q[v_index(0)?],
            A64SetW => {
                state.x[x_index(0)?] = arg(1)? as u32 as u64;
                0
            }
            A64SetX => {
                state.x[x_index(0)?] = arg(1)? as u64;
                0
            }
            A64SetSP => {
                state.sp = arg(0)? as u64;
                0
            }
            A64SetD => {
                state.q[v_index(0)?] = arg(1)? as u64 as u128;
                0
            }
            A64SetQ => {
                state.q[v_index(0)?] = arg(1)?;
                0
            }
            A64SetPC => {
                state.pc = arg(0)? as u64;
                0
            }
            A64CheckSpAlignment => {
                let address = arg(0)? as u64;
                if address & 0xF != 0 {
                    return Err(Fault::SpAlignment { address });
                }
                0
            }

            A64GetFPCR => state.fpcr as u128,
            A64SetFPCR => {
                state.fpcr = arg(0)? as u32;
                0
            }
            A64GetFPSR => state.fpsr as u128,
            A64SetFPSR => {
                state.fpsr = arg(0)? as u32;
                0
            }
            A64GetTPIDR => state.tpidr as u128,
            A64SetTPIDR => {
                state.tpidr = arg(0)? as u64;
                0
            }
            A64GetTPIDRRO => state.tpidrro as u128,
            A64GetCNTPCT => state.cntpct as u128,
            A64GetCTR => state.ctr as u128,
            A64GetDCZID => state.dczid as u128,

            A64DataSynchronizationBarrier
            | A64DataMemoryBarrier
            | A64InstructionSynchronizationBarrier
            | A64ClearExclusive => 0,

            A64ReadMemory8 | A64ReadMemory16 | A64ReadMemory32 | A64ReadMemory64 | A64ReadMemory128 => {
                let bytes = inst.ty.bit_width().ok_or(malformed)? / 8;
                self.memory.read(arg(0)? as u64, bytes, acc(1)?)
            }
            A64WriteMemory8 | A64WriteMemory16 | A64WriteMemory32 | A64WriteMemory64 | A64WriteMemory128 => {
                let bytes = arg_width(1)? / 8;
                self.memory.write(arg(0)? as u64, bytes, arg(1)?, acc(2)?);
                0
            }

            A32GetRegister => state.r[r_index(0)?] as u128,
            A32SetRegister => {
                state.r[r_index(0)?] = arg(1)? as u32;
                0
            }
            A32GetCFlag => state.c as u128,
            A32SetCFlag => {
                state.c = arg(0)? != 0;
                0
            }
            A32SetNFlag => {
                state.n = arg(0)? != 0;
                0
            }
            A32SetZFlag => {
                state.z = arg(0)? != 0;
                0
            }
            A32BXWritePC => {
                let target = arg(0)? as u32;
                state.thumb = target & 1 != 0;
                state.r[15] = if state.thumb { target & !1 } else { target & !3 };
                0
            }

            A32CoprocInvoke => {
                let Some(Value::CoprocCallback(callback)) = inst.args.first() else {
                    return Err(malformed);
                };
                callback.invoke(arg(1)? as u32, arg(2)? as u32);
                0
            }
            A32CoprocInvokeGet => {
                let Some(Value::CoprocCallback(callback)) = inst.args.first() else {
                    return Err(malformed);
                };
                callback.invoke(0, 0) as u128
            }
            A32HostRead32 => {
                let Some(Value::HostAddr(addr)) = inst.args.first() else {
                    return Err(malformed);
                };
                self.memory.host_read_u32(*addr) as u128
            }
            A32HostWrite32 => {
                let Some(Value::HostAddr(addr)) = inst.args.first() else {
                    return Err(malformed);
                };
                self.memory.host_write_u32(*addr, arg(1)? as u32);
                0
            }

            Add => arg(0)?.wrapping_add(arg(1)?),
            Sub => arg(0)?.wrapping_sub(arg(1)?),
            And => arg(0)? & arg(1)?,
            Or => arg(0)? | arg(1)?,
            Eor => arg(0)? ^ arg(1)?,
            LogicalShiftLeft | LogicalShiftRight | ArithmeticShiftRight | RotateRight => {
                eval_shift(inst.opcode, inst.ty, arg(0)? as u64, arg(1)? as u8).ok_or(malformed)? as u128
            }
            TestBit => (arg(0)? >> arg(1)?.min(127)) & 1,
            IsZero => (arg(0)? == 0) as u128,
            MostSignificantBit => (arg(0)? >> (arg_width(0)? - 1)) & 1,

            LeastSignificantWord | LeastSignificantHalf | LeastSignificantByte | ZeroExtendToWord
            | ZeroExtendToLong | ZeroExtendToQuad => arg(0)?,
            SignExtendWordToLong => arg(0)? as u32 as i32 as i64 as u64 as u128,
            VectorGetElement32 => arg(0)? >> (32 * arg(1)?.min(3)),
            VectorGetElement64 => arg(0)? >> (64 * arg(1)?.min(1)),
        };

        Ok(mask(inst.ty, result))
    }
}

fn mask(ty: Type, value: u128) -> u128 {
    match ty.bit_width() {
        Some(bits) if bits < 128 => value & ((1u128 << bits) - 1),
        Some(_) => value,
        None => 0,
    }
}

impl<M: MemoryCallbacks> Executor for Evaluator<M> {
    fn execute(&mut self, block: &Block) -> ExecutionStatus {
        self.fault = None;
        let mut values = Vec::with_capacity(block.len());
        for (index, inst) in block.instructions().iter().enumerate() {
            match self.eval(index, inst, &values) {
                Ok(value) => values.push(value),
                Err(fault) => {
                    log::warn!("{}: evaluation stopped at %{index}: {fault:?}", block.location());
                    self.fault = Some(fault);
                    return ExecutionStatus::Halted;
                }
            }
        }
        ExecutionStatus::Completed
    }

    fn location(&self) -> LocationDescriptor {
        let state = &self.state;
        if state.aarch64 {
            A64LocationDescriptor::new(state.pc, state.fpcr, state.single_stepping).into()
        } else {
            A32LocationDescriptor::new(state.r[15], state.thumb, false, 0, state.single_stepping).into()
        }
    }

    fn set_location(&mut self, location: LocationDescriptor) {
        let state = &mut self.state;
        match location {
            LocationDescriptor::A64(loc) => {
                state.aarch64 = true;
                state.pc = loc.pc();
            }
            LocationDescriptor::A32(loc) => {
                state.aarch64 = false;
                state.r[15] = loc.pc();
                state.thumb = loc.is_thumb();
            }
        }
        state.single_stepping = location.single_stepping();
    }

    fn halt_requested(&self) -> bool {
        self.halt
    }
}
