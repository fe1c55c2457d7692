//! Memory access type tags.
//!
//! Every memory IR instruction carries one of these so the code generator can
//! pick host-side ordering and alignment behavior.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccType {
    /// Ordinary load or store.
    Normal,
    /// SIMD&FP register transfer.
    Vec,
    /// Non-temporal hint (LDNP/STNP).
    Streaming,
    /// Unprivileged access.
    Unpriv,
    /// Load-acquire / store-release.
    Ordered,
    /// Exclusive or atomic access.
    Atomic,
}

impl fmt::Display for AccType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AccType::Normal => "NORMAL",
            AccType::Vec => "VEC",
            AccType::Streaming => "STREAM",
            AccType::Unpriv => "UNPRIV",
            AccType::Ordered => "ORDERED",
            AccType::Atomic => "ATOMIC",
        };
        f.write_str(name)
    }
}
