//! One-way transfer of control from the bootstrap into the installed application.

#[cfg(all(feature = "cortex_m", target_arch = "arm"))]
pub mod cortex_m;

use crate::{Watchdog, fmt, state::BootToken, vectors::VectorTable};

/// Link register value handed to the application.
///
/// The application's reset handler never returns; if it does, the branch to this address
/// faults instead of resuming stale bootstrap state.
pub const RETURN_TRAP: u32 = 0xffff_ffff;

/// Processor operations needed to hand over to an application image.
pub trait Boot {
    /// Mask all configurable interrupts and exceptions.
    fn disable_interrupts(&mut self);

    /// Point the live vector table base register at `table`.
    ///
    /// # Safety
    /// Interrupts must be disabled; any exception taken afterwards dispatches through `table`.
    unsafe fn relocate_vectors(&mut self, table: &VectorTable);

    /// Load `stack_pointer`, set the link register to [`RETURN_TRAP`] and branch to `entry`.
    ///
    /// # Safety
    /// `entry` must be the address of executable code expecting a fresh stack at `stack_pointer`.
    unsafe fn jump(&mut self, stack_pointer: u32, entry: u32) -> !;
}

impl<B: Boot + ?Sized> Boot for &mut B {
    fn disable_interrupts(&mut self) {
        (**self).disable_interrupts()
    }

    unsafe fn relocate_vectors(&mut self, table: &VectorTable) {
        unsafe { (**self).relocate_vectors(table) }
    }

    unsafe fn jump(&mut self, stack_pointer: u32, entry: u32) -> ! {
        unsafe { (**self).jump(stack_pointer, entry) }
    }
}

/// Launch the application described by `vectors`. Never returns.
///
/// The order is fixed: no interrupt may be taken while the vector table moves, the watchdog
/// grants the application a full period, and the token is cleared so that a later voluntary
/// reset of the application does not bounce back into update mode.
///
/// # Safety
/// The entry point must have been validated, i.e. the evaluator decided
/// [`Decision::LaunchApplication`](crate::Decision::LaunchApplication) for `vectors`.
pub unsafe fn launch(
    cpu: &mut impl Boot,
    watchdog: &mut impl Watchdog,
    token: &mut impl BootToken,
    vectors: &VectorTable,
) -> ! {
    let stack_pointer = vectors.stack_pointer();
    let entry = vectors.entry();
    fmt::info!("launching application at {:#x}", entry);

    cpu.disable_interrupts();
    unsafe { cpu.relocate_vectors(vectors) };
    watchdog.refresh();
    token.clear();

    unsafe { cpu.jump(stack_pointer, entry) }
}
