//! Cortex-M (ARMv7-M) implementation of the launch sequence and its linker contract.
//!
//! The memory layout must provide two symbols:
//! * `_boot_token`: a `u32` in RAM that is neither zeroed nor initialized at startup;
//! * `_app_vectors`: the start of the application vector table in flash.

use core::ptr::NonNull;

use cortex_m::{asm, interrupt, peripheral::SCB};

use crate::{
    boot::{Boot, RETURN_TRAP},
    state::{BootToken, RamToken},
    vectors::VectorTable,
};

unsafe extern "C" {
    #[link_name = "_boot_token"]
    static mut BOOT_TOKEN: u32;

    #[link_name = "_app_vectors"]
    static APP_VECTORS: VectorTable;
}

/// Simple launch mechanism for Cortex-M without support for TrustZone.
pub struct SimpleCortexM;

impl Boot for SimpleCortexM {
    fn disable_interrupts(&mut self) {
        interrupt::disable();
    }

    unsafe fn relocate_vectors(&mut self, table: &VectorTable) {
        unsafe { (*SCB::PTR).vtor.write(table.address() as u32) };
        asm::dsb();
        asm::isb();
    }

    unsafe fn jump(&mut self, stack_pointer: u32, entry: u32) -> ! {
        unsafe {
            core::arch::asm!(
                "mov lr, r0",
                "msr msp, r1",
                "bx r2",
                in("r0") RETURN_TRAP,
                in("r1") stack_pointer,
                in("r2") entry,
                options(noreturn, nomem, nostack),
            )
        }
    }
}

/// The boot token shared with the application.
///
/// # Safety
/// Only one handle may be alive at a time.
pub unsafe fn boot_token() -> RamToken {
    unsafe { RamToken::new(NonNull::new_unchecked(&raw mut BOOT_TOKEN)) }
}

/// The vector table of the installed application.
pub fn app_vectors() -> &'static VectorTable {
    unsafe { &*(&raw const APP_VECTORS) }
}

/// Application side: ask for update mode and reset into the bootstrap.
pub fn reset_into_updater(token: &mut impl BootToken) -> ! {
    interrupt::disable();
    token.request();
    SCB::sys_reset()
}
