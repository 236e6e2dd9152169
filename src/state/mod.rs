//! Boot intent handed from the application to the bootstrap across a warm reset.

pub mod ram;

pub use ram::RamToken;

/// Token value by which the application asks for update mode on the next boot ("tbCF").
pub const UPDATE_REQUESTED: u32 = 0x7462_4346;

/// Value of a consumed or never-written token.
pub const CLEARED: u32 = 0;

/// Persisted boot intent.
///
/// Lives in memory which survives a soft reset, but not a power cycle.
/// The application requests update mode by writing [`UPDATE_REQUESTED`] and resetting;
/// the bootstrap clears it once consumed, so it is acted upon at most once.
pub trait BootToken {
    fn read(&self) -> u32;

    fn write(&mut self, value: u32);

    fn is_requested(&self) -> bool {
        self.read() == UPDATE_REQUESTED
    }

    fn clear(&mut self) {
        self.write(CLEARED)
    }

    fn request(&mut self) {
        self.write(UPDATE_REQUESTED)
    }
}

impl<T: BootToken + ?Sized> BootToken for &mut T {
    fn read(&self) -> u32 {
        (**self).read()
    }

    fn write(&mut self, value: u32) {
        (**self).write(value)
    }
}
