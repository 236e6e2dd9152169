//! Deciding, once per boot, between update mode and launching the application.

use serde::{Deserialize, Serialize};

use crate::{
    Error, fmt,
    state::BootToken,
    vectors::{AppRegion, VectorTable},
};

pub mod banner;

pub use banner::{BannerCheck, BannerEcho, NoBanner, SerialTransport};

/// Outcome of the boot decision. Never persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Decision {
    EnterUpdateMode,
    LaunchApplication,
}

/// The check which sent the device into update mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Trigger {
    BannerEcho,
    MissingApplication,
    BootToken,
}

/// Boot decision evaluator.
///
/// Checks, in order, with the first hit winning:
/// 1. the banner echo, if `B` performs one;
/// 2. whether the entry point lies outside the application region;
/// 3. whether the application left an update request in the boot token.
///
/// Each check runs exactly once per [`Evaluator::decide`].
pub struct Evaluator<B = NoBanner> {
    banner: B,
    region: AppRegion,
}

impl Evaluator<NoBanner> {
    pub fn new(region: AppRegion) -> Self {
        Self {
            banner: NoBanner,
            region,
        }
    }
}

impl Default for Evaluator<NoBanner> {
    fn default() -> Self {
        Self::new(AppRegion::DEFAULT)
    }
}

impl<B: BannerCheck> Evaluator<B> {
    /// Same evaluator, with `banner` checked ahead of everything else.
    pub fn with_banner<N: BannerCheck>(self, banner: N) -> Evaluator<N> {
        Evaluator {
            banner,
            region: self.region,
        }
    }

    pub fn banner(&self) -> &B {
        &self.banner
    }

    pub fn region(&self) -> AppRegion {
        self.region
    }

    /// Find the first check requiring update mode, if any.
    pub fn trigger(&mut self, vectors: &VectorTable, token: &impl BootToken) -> Option<Trigger> {
        if self.banner.echoed() {
            return Some(Trigger::BannerEcho);
        }

        let entry = vectors.entry();
        if !self.region.contains(entry) {
            fmt::debug!("entry {:#x} outside application region", entry);
            return Some(Trigger::MissingApplication);
        }

        if token.is_requested() {
            return Some(Trigger::BootToken);
        }

        None
    }

    pub fn decide(&mut self, vectors: &VectorTable, token: &impl BootToken) -> Decision {
        match self.trigger(vectors, token) {
            Some(trigger) => {
                fmt::info!("update mode ({:?})", trigger);
                Decision::EnterUpdateMode
            }
            None => Decision::LaunchApplication,
        }
    }
}

impl<B> Evaluator<B> {
    /// Evaluator for a validated region; see [`AppRegion::new`].
    pub fn try_with(banner: B, region: AppRegion) -> Result<Self, Error> {
        region.validate()?;
        Ok(Self { banner, region })
    }
}
