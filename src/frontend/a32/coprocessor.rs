// This module defines the capability interface through which a host plugs coprocessors into
// A32/Thumb translation. Each hook is consulted once per call site while the block is being
// translated, and its answer decides what IR is emitted: no capability compiles an undefined
// instruction exception, a callback compiles a call that receives the user argument back
// unchanged, and for single/double word transfers a host word address compiles a direct load
// or store. The hooks take &self and the trait requires Send + Sync so one implementation can
// serve many execution contexts.

//! Coprocessor capability interface.

use std::fmt;

use super::CoprocReg;

/// A host function compiled into the block, plus its opaque argument.
#[derive(Debug, Clone, Copy)]
pub struct CoprocCallback {
    /// Called as `function(user_arg, arg0, arg1)`. The meaning of the
    /// arguments and the return value depends on the hook that produced the
    /// callback.
    pub function: fn(u64, u32, u32) -> u64,
    /// Passed back unchanged; zero when `None`.
    pub user_arg: Option<u64>,
}

impl CoprocCallback {
    pub fn new(function: fn(u64, u32, u32) -> u64, user_arg: Option<u64>) -> Self {
        Self { function, user_arg }
    }

    pub fn invoke(&self, arg0: u32, arg1: u32) -> u64 {
        (self.function)(self.user_arg.unwrap_or(0), arg0, arg1)
    }

    fn address(&self) -> usize {
        self.function as usize
    }
}

impl PartialEq for CoprocCallback {
    fn eq(&self, other: &Self) -> bool {
        self.address() == other.address() && self.user_arg == other.user_arg
    }
}

impl Eq for CoprocCallback {}

impl fmt::Display for CoprocCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.user_arg {
            Some(arg) => write!(f, "callback@{:#x}({arg:#x})", self.address()),
            None => write!(f, "callback@{:#x}", self.address()),
        }
    }
}

/// Address of a host `u32` that a direct transfer reads or writes.
///
/// The coprocessor guarantees the address stays valid and suitably aligned
/// for as long as blocks compiled against it may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HostAddr(pub usize);

impl HostAddr {
    pub fn of(word: &u32) -> Self {
        HostAddr(word as *const u32 as usize)
    }
}

impl fmt::Display for HostAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "host@{:#x}", self.0)
    }
}

/// Answer of a transfer hook. `A` is one [`HostAddr`] for single-word
/// transfers and two for double-word transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoprocAction<A> {
    /// Compile an undefined instruction exception.
    Unavailable,
    Callback(CoprocCallback),
    Direct(A),
}

/// A coprocessor implementation supplied by the host.
///
/// `two` is set for the unconditional "2" encodings (CDP2, MCR2 and so on).
#[allow(clippy::too_many_arguments)]
pub trait Coprocessor: Send + Sync {
    /// CDP/CDP2. Callback arguments and return value are ignored.
    fn compile_internal_operation(
        &self,
        two: bool,
        opc1: u32,
        crd: CoprocReg,
        crn: CoprocReg,
        crm: CoprocReg,
        opc2: u32,
    ) -> Option<CoprocCallback>;

    /// MCR/MCR2. A callback receives the word in `arg0`.
    fn compile_send_one_word(
        &self,
        two: bool,
        opc1: u32,
        crn: CoprocReg,
        crm: CoprocReg,
        opc2: u32,
    ) -> CoprocAction<HostAddr>;

    /// MCRR/MCRR2. A callback receives Rt in `arg0` and Rt2 in `arg1`.
    fn compile_send_two_words(&self, two: bool, opc: u32, crm: CoprocReg) -> CoprocAction<[HostAddr; 2]>;

    /// MRC/MRC2. A callback returns the word in the low half of its result.
    fn compile_get_one_word(
        &self,
        two: bool,
        opc1: u32,
        crn: CoprocReg,
        crm: CoprocReg,
        opc2: u32,
    ) -> CoprocAction<HostAddr>;

    /// MRRC/MRRC2. A callback returns Rt in the low and Rt2 in the high half.
    fn compile_get_two_words(&self, two: bool, opc: u32, crm: CoprocReg) -> CoprocAction<[HostAddr; 2]>;

    /// LDC/LDC2. A callback receives the start address in `arg0`.
    fn compile_load_words(
        &self,
        two: bool,
        long_transfer: bool,
        crd: CoprocReg,
        option: Option<u8>,
    ) -> Option<CoprocCallback>;

    /// STC/STC2. A callback receives the start address in `arg0`.
    fn compile_store_words(
        &self,
        two: bool,
        long_transfer: bool,
        crd: CoprocReg,
        option: Option<u8>,
    ) -> Option<CoprocCallback>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo(user_arg: u64, arg0: u32, arg1: u32) -> u64 {
        user_arg + arg0 as u64 + arg1 as u64
    }

    #[test]
    fn test_callback_passes_user_arg_back() {
        let callback = CoprocCallback::new(echo, Some(100));
        assert_eq!(callback.invoke(1, 2), 103);
        assert_eq!(CoprocCallback::new(echo, None).invoke(1, 2), 3);
    }

    #[test]
    fn test_callback_equality() {
        assert_eq!(CoprocCallback::new(echo, Some(1)), CoprocCallback::new(echo, Some(1)));
        assert_ne!(CoprocCallback::new(echo, Some(1)), CoprocCallback::new(echo, None));
    }
}
