//! Bootstrap deciding between a DFU update loader and a previously flashed application.
//!
//! On reset, [`Bootstrap`] asks an [`Evaluator`] whether update mode is required. If not, the
//! application is launched through [`boot::launch`], which never returns. Otherwise
//! [`update::UpdateMode`] keeps the watchdog fed while an external DFU service receives the new
//! image, and lets the watchdog reset the device once the transfer has completed.
//!
//! All hardware is reached through traits so the whole sequence can be exercised on a host.
//! The `cortex_m` feature provides the register-level implementation.
#![no_std]

use serde::{Deserialize, Serialize};

pub(crate) mod fmt;

pub mod boot;
pub mod bootstrap;
pub mod decide;
pub mod state;
pub mod update;
pub mod vectors;

pub use bootstrap::Bootstrap;
pub use decide::{Decision, Evaluator};
pub use state::BootToken;
pub use vectors::{AppRegion, VectorTable};

#[cfg(test)]
extern crate std;

#[cfg(test)]
mod mock;

/// Configuration errors. The boot path itself never fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// A banner of zero bytes would be echoed trivially.
    EmptyBanner,
    /// The application region does not contain a single address.
    EmptyRegion,
    /// The watchdog refresh interval must be at least one microsecond.
    ZeroRefreshInterval,
    /// Value reported by a DFU engine is not a DFU 1.1 state.
    UnknownDfuState(u8),
}

/// Hardware watchdog that resets the device unless refreshed in time.
pub trait Watchdog {
    fn refresh(&mut self);
}

impl<W: Watchdog + ?Sized> Watchdog for &mut W {
    fn refresh(&mut self) {
        (**self).refresh()
    }
}

/// Tunables for one bootstrap image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Range a valid application entry point must fall within.
    pub region: AppRegion,
    /// Indicator and watchdog pacing while in update mode.
    pub timing: update::BlinkTiming,
}

impl Config {
    pub fn validate(&self) -> Result<(), Error> {
        self.region.validate()?;
        self.timing.validate()
    }
}
