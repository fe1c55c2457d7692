//! Guest instruction fetch.

/// Read access to guest code memory used during translation.
///
/// Returning `None` means the fetch faulted; the translator compiles a
/// `FetchAbort` exception for that address.
pub trait CodeReader {
    /// Read the little-endian 32-bit word at `vaddr` (4-byte aligned for A64
    /// and ARM code).
    fn read_code_u32(&self, vaddr: u64) -> Option<u32>;

    /// Read the halfword at `vaddr` (2-byte aligned Thumb code).
    fn read_code_u16(&self, vaddr: u64) -> Option<u16> {
        let word = self.read_code_u32(vaddr & !3)?;
        Some(if vaddr & 2 != 0 { (word >> 16) as u16 } else { word as u16 })
    }
}

impl<F> CodeReader for F
where
    F: Fn(u64) -> Option<u32>,
{
    fn read_code_u32(&self, vaddr: u64) -> Option<u32> {
        self(vaddr)
    }
}
