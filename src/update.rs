//! Update mode: keep the device alive while an external DFU engine receives a new image,
//! then let the watchdog reset into it.
//!
//! The DFU protocol itself is not handled here. This loop only polls the engine's state,
//! signals progress on the status indicator, and refreshes the watchdog. Once the transfer is
//! complete it stops refreshing on purpose: a watchdog reset re-initializes every peripheral,
//! which a jump back to the reset handler would not.

use embedded_hal::digital::StatefulOutputPin;
use embedded_hal_async::delay::DelayNs;
use serde::{Deserialize, Serialize};

use crate::{Error, Watchdog, boot::Boot, fmt, state::BootToken};

/// Device state as defined by the USB DFU 1.1 class specification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum DfuState {
    AppIdle = 0,
    AppDetach = 1,
    Idle = 2,
    DnloadSync = 3,
    DnBusy = 4,
    DnloadIdle = 5,
    ManifestSync = 6,
    /// The image has been received and committed; safe to reset.
    Manifest = 7,
    ManifestWaitReset = 8,
    UploadIdle = 9,
    DfuError = 10,
}

impl TryFrom<u8> for DfuState {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Error> {
        Ok(match value {
            0 => DfuState::AppIdle,
            1 => DfuState::AppDetach,
            2 => DfuState::Idle,
            3 => DfuState::DnloadSync,
            4 => DfuState::DnBusy,
            5 => DfuState::DnloadIdle,
            6 => DfuState::ManifestSync,
            7 => DfuState::Manifest,
            8 => DfuState::ManifestWaitReset,
            9 => DfuState::UploadIdle,
            10 => DfuState::DfuError,
            other => return Err(Error::UnknownDfuState(other)),
        })
    }
}

/// The USB DFU engine, driven by its own interrupts or polled through [`DfuService::state`].
pub trait DfuService {
    /// Bring up the DFU class and attach to the bus.
    fn init(&mut self);

    fn state(&mut self) -> DfuState;

    /// Detach from the bus, so the host notices the coming reset.
    fn disconnect(&mut self);
}

/// Pacing of the status indicator and the watchdog in update mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlinkTiming {
    /// Time between indicator toggles while waiting for a transfer.
    pub slow_half_period_ms: u32,
    /// Time between indicator toggles once the transfer completed.
    pub fast_half_period_ms: u32,
    /// Number of fast toggles before the watchdog is left to expire.
    pub fast_toggles: u16,
    /// Maximum time between two watchdog refreshes. Must be well below the watchdog period.
    pub refresh_interval_us: u32,
}

impl BlinkTiming {
    pub fn validate(&self) -> Result<(), Error> {
        if self.refresh_interval_us == 0 {
            return Err(Error::ZeroRefreshInterval);
        }
        Ok(())
    }

    /// Number of refresh intervals covering `half_period_ms`.
    pub fn refreshes(&self, half_period_ms: u32) -> u32 {
        let interval = self.refresh_interval_us.max(1);
        half_period_ms.saturating_mul(1000).div_ceil(interval).max(1)
    }
}

impl Default for BlinkTiming {
    fn default() -> Self {
        Self {
            slow_half_period_ms: 500,
            fast_half_period_ms: 50,
            fast_toggles: 30,
            refresh_interval_us: 1000,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// Slow blinking until the DFU engine reports [`DfuState::Manifest`].
    AwaitingTransfer,
    /// Fast blinking, `remaining` toggles left.
    Complete { remaining: u16 },
    /// Watchdog no longer refreshed; the device resets once it expires.
    AwaitingReset,
}

/// Update mode driver.
pub struct UpdateMode<D, L, Y, W, T, C> {
    dfu: D,
    led: L,
    delay: Y,
    watchdog: W,
    token: T,
    cpu: C,
    timing: BlinkTiming,
    phase: Phase,
}

impl<D, L, Y, W, T, C> UpdateMode<D, L, Y, W, T, C>
where
    D: DfuService,
    L: StatefulOutputPin,
    Y: DelayNs,
    W: Watchdog,
    T: BootToken,
    C: Boot,
{
    /// Light the indicator and start the DFU engine.
    pub fn new(
        mut dfu: D,
        mut led: L,
        delay: Y,
        watchdog: W,
        token: T,
        cpu: C,
        timing: BlinkTiming,
    ) -> Self {
        if led.set_high().is_err() {
            fmt::warn!("status indicator unavailable");
        }
        dfu.init();
        fmt::info!("awaiting firmware transfer");

        Self {
            dfu,
            led,
            delay,
            watchdog,
            token,
            cpu,
            timing,
            phase: Phase::AwaitingTransfer,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Advance by one indicator period, or one refresh interval once awaiting reset.
    pub async fn step(&mut self) -> Phase {
        self.phase = match self.phase {
            Phase::AwaitingTransfer => {
                if self.dfu.state() == DfuState::Manifest {
                    fmt::info!("transfer complete");
                    self.token.clear();
                    Phase::Complete {
                        remaining: self.timing.fast_toggles,
                    }
                } else {
                    self.blink(self.timing.slow_half_period_ms).await;
                    Phase::AwaitingTransfer
                }
            }
            Phase::Complete { remaining: 0 } => {
                self.watchdog.refresh();
                self.cpu.disable_interrupts();
                self.dfu.disconnect();
                fmt::info!("waiting for watchdog reset");
                Phase::AwaitingReset
            }
            Phase::Complete { remaining } => {
                self.blink(self.timing.fast_half_period_ms).await;
                Phase::Complete {
                    remaining: remaining - 1,
                }
            }
            Phase::AwaitingReset => {
                self.delay.delay_us(self.timing.refresh_interval_us).await;
                Phase::AwaitingReset
            }
        };
        self.phase
    }

    /// Toggle the indicator, then keep the watchdog fed for `half_period_ms`.
    async fn blink(&mut self, half_period_ms: u32) {
        if self.led.toggle().is_err() {
            fmt::warn!("status indicator toggle failed");
        }
        for _ in 0..self.timing.refreshes(half_period_ms) {
            self.watchdog.refresh();
            self.delay.delay_us(self.timing.refresh_interval_us).await;
        }
    }

    /// Run until the watchdog resets the device.
    pub async fn run(mut self) -> ! {
        loop {
            self.step().await;
        }
    }
}
