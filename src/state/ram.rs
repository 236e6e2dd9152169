//! Boot token kept in a word of uninitialized RAM.
//!
//! The word must be placed in a section the runtime neither zeroes nor initializes
//! (for example `.uninit`), otherwise the token is lost during startup.

use core::ptr::NonNull;

use crate::state::BootToken;

/// Volatile access to a single RAM word holding the boot token.
pub struct RamToken {
    cell: NonNull<u32>,
}

impl RamToken {
    /// # Safety
    /// `cell` must be valid for volatile reads and writes of a `u32` for the lifetime of the
    /// token, and must not be accessed through any other path meanwhile.
    pub const unsafe fn new(cell: NonNull<u32>) -> Self {
        Self { cell }
    }
}

impl BootToken for RamToken {
    fn read(&self) -> u32 {
        unsafe { self.cell.as_ptr().read_volatile() }
    }

    fn write(&mut self, value: u32) {
        unsafe { self.cell.as_ptr().write_volatile(value) }
    }
}
