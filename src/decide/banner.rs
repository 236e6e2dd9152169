//! Recovery trapdoor over the serial port.
//!
//! The bootstrap prints a banner and listens for it to come back. A host that echoes the
//! banner (or a loopback plug on the serial pins) forces update mode, regardless of what else
//! is connected to the port or installed in flash.

use embedded_io::{Read, ReadReady, Write};

use crate::{Error, fmt};

pub const DEFAULT_BANNER: &[u8] = b"FC-Boot";
pub const DEFAULT_BAUD: u32 = 9600;

/// Serial port owned by the bootstrap for the duration of a single banner exchange.
pub trait SerialTransport: Read + Write + ReadReady {
    fn begin(&mut self, baud: u32);

    /// Release the port. Called after every exchange, whatever its outcome.
    fn end(&mut self);
}

/// First, optional, step of the boot decision.
pub trait BannerCheck {
    /// Whether the recovery handshake requests update mode.
    fn echoed(&mut self) -> bool;
}

/// Variant without serial handshake.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoBanner;

impl BannerCheck for NoBanner {
    fn echoed(&mut self) -> bool {
        false
    }
}

/// Variant which writes a banner and expects it echoed back verbatim.
pub struct BannerEcho<S> {
    port: S,
    banner: &'static [u8],
    baud: u32,
}

impl<S: SerialTransport> BannerEcho<S> {
    pub fn new(port: S, banner: &'static [u8], baud: u32) -> Result<Self, Error> {
        if banner.is_empty() {
            return Err(Error::EmptyBanner);
        }
        Ok(Self { port, banner, baud })
    }

    pub fn with_defaults(port: S) -> Result<Self, Error> {
        Self::new(port, DEFAULT_BANNER, DEFAULT_BAUD)
    }

    pub fn port(&self) -> &S {
        &self.port
    }

    pub fn release(self) -> S {
        self.port
    }

    /// Number of leading banner bytes echoed back.
    fn exchange(&mut self) -> Result<usize, S::Error> {
        self.port.write_all(self.banner)?;
        // The newline is not compared; by the time it is flushed the echo of the banner
        // itself has arrived in the receive buffer.
        self.port.write_all(b"\n")?;
        self.port.flush()?;

        let mut matched = 0;
        for &expected in self.banner {
            if !self.port.read_ready()? {
                break;
            }
            let mut byte = [0u8];
            if self.port.read(&mut byte)? != 1 || byte[0] != expected {
                break;
            }
            matched += 1;
        }
        Ok(matched)
    }
}

impl<S: SerialTransport> BannerCheck for BannerEcho<S> {
    fn echoed(&mut self) -> bool {
        self.port.begin(self.baud);
        let matched = match self.exchange() {
            Ok(matched) => matched,
            Err(_) => {
                fmt::warn!("serial error during banner exchange");
                0
            }
        };
        self.port.end();

        fmt::trace!("banner echo {}/{}", matched, self.banner.len());
        matched == self.banner.len()
    }
}
