//! Power-on entry: decide once, then either launch the application or serve an update.

use embedded_hal::digital::StatefulOutputPin;
use embedded_hal_async::delay::DelayNs;

use crate::{
    Config, Error, Watchdog,
    boot::{self, Boot},
    decide::{BannerCheck, Decision, Evaluator, NoBanner},
    state::BootToken,
    update::{BlinkTiming, DfuService, UpdateMode},
    vectors::VectorTable,
};

/// Platform handles and policy of the bootstrap.
pub struct Bootstrap<'a, T, W, C, B = NoBanner> {
    token: T,
    watchdog: W,
    cpu: C,
    vectors: &'a VectorTable,
    evaluator: Evaluator<B>,
    timing: BlinkTiming,
}

impl<'a, T, W, C> Bootstrap<'a, T, W, C>
where
    T: BootToken,
    W: Watchdog,
    C: Boot,
{
    /// # Safety
    /// `vectors` must be the table at which the application is linked. Once its entry point
    /// passes the evaluator, [`Bootstrap::run`] branches to it.
    pub unsafe fn new(
        token: T,
        watchdog: W,
        cpu: C,
        vectors: &'a VectorTable,
        config: Config,
    ) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self {
            token,
            watchdog,
            cpu,
            vectors,
            evaluator: Evaluator::new(config.region),
            timing: config.timing,
        })
    }
}

impl<'a, T, W, C, B> Bootstrap<'a, T, W, C, B>
where
    T: BootToken,
    W: Watchdog,
    C: Boot,
    B: BannerCheck,
{
    /// Check for the recovery banner echo before anything else.
    pub fn with_banner<N: BannerCheck>(self, banner: N) -> Bootstrap<'a, T, W, C, N> {
        Bootstrap {
            token: self.token,
            watchdog: self.watchdog,
            cpu: self.cpu,
            vectors: self.vectors,
            evaluator: self.evaluator.with_banner(banner),
            timing: self.timing,
        }
    }

    pub fn decide(&mut self) -> Decision {
        self.evaluator.decide(self.vectors, &self.token)
    }

    /// Decide and act on the decision. The DFU engine, indicator and delay are only touched
    /// in update mode.
    pub async fn run<D, L, Y>(mut self, dfu: D, led: L, delay: Y) -> !
    where
        D: DfuService,
        L: StatefulOutputPin,
        Y: DelayNs,
    {
        match self.decide() {
            Decision::LaunchApplication => unsafe {
                boot::launch(
                    &mut self.cpu,
                    &mut self.watchdog,
                    &mut self.token,
                    self.vectors,
                )
            },
            Decision::EnterUpdateMode => {
                UpdateMode::new(
                    dfu,
                    led,
                    delay,
                    self.watchdog,
                    self.token,
                    self.cpu,
                    self.timing,
                )
                .run()
                .await
            }
        }
    }
}
