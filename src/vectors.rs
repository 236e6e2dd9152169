//! The application's exception vector table, as placed in flash by whoever programmed it.

use serde::{Deserialize, Serialize};

use crate::Error;

/// Number of words in the application vector table.
pub const VECTOR_COUNT: usize = 128;

/// Exception vector table of the installed application.
///
/// Slot 0 holds the initial stack pointer, slot 1 the reset handler (entry point).
/// The alignment satisfies the VTOR requirements for a table of this size.
#[repr(C, align(512))]
pub struct VectorTable([u32; VECTOR_COUNT]);

impl VectorTable {
    pub const fn new(words: [u32; VECTOR_COUNT]) -> Self {
        Self(words)
    }

    /// A table which is not backed by anything but erased flash.
    pub const fn erased() -> Self {
        Self([0xffff_ffff; VECTOR_COUNT])
    }

    /// Read a single slot.
    ///
    /// Reads are volatile: the table is written by the flash programmer, not by this program,
    /// so its content must never be assumed from the initializer.
    pub fn word(&self, index: usize) -> u32 {
        let slot: &u32 = &self.0[index];
        unsafe { core::ptr::read_volatile(slot) }
    }

    pub fn stack_pointer(&self) -> u32 {
        self.word(0)
    }

    pub fn entry(&self) -> u32 {
        self.word(1)
    }

    /// Address of the table, as to be written into the vector table base register.
    pub fn address(&self) -> usize {
        self as *const Self as usize
    }
}

/// Range of flash within which a valid application entry point resides.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppRegion {
    /// First valid address; everything below belongs to the bootstrap.
    pub start: u32,
    /// One past the last valid address.
    pub end: u32,
}

impl AppRegion {
    /// Application flash from 16KiB up to the end of a 256KiB part.
    pub const DEFAULT: Self = Self {
        start: 0x0000_4000,
        end: 256 * 1024,
    };

    pub fn new(start: u32, end: u32) -> Result<Self, Error> {
        let region = Self { start, end };
        region.validate()?;
        Ok(region)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.start >= self.end {
            return Err(Error::EmptyRegion);
        }
        Ok(())
    }

    pub fn contains(&self, addr: u32) -> bool {
        (self.start..self.end).contains(&addr)
    }
}

impl Default for AppRegion {
    fn default() -> Self {
        Self::DEFAULT
    }
}
