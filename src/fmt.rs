//! Logging facade.
//!
//! Forwards to `defmt` or `log` depending on the enabled feature, and compiles to nothing
//! otherwise. Format strings must stay within the common subset of both (`{}`, `{:?}`, `{:#x}`).
#![allow(unused_macros, unused_imports)]

#[cfg(feature = "defmt")]
pub(crate) use defmt::{debug, info, trace, warn};

#[cfg(all(feature = "log", not(feature = "defmt")))]
pub(crate) use ::log::{debug, info, trace, warn};

#[cfg(not(any(feature = "defmt", feature = "log")))]
mod noop {
    macro_rules! trace {
        ( $( $x:expr ),* $(,)? ) => {{ $( let _ = &$x; )* }};
    }
    pub(crate) use trace;
    macro_rules! debug {
        ( $( $x:expr ),* $(,)? ) => {{ $( let _ = &$x; )* }};
    }
    pub(crate) use debug;
    macro_rules! info {
        ( $( $x:expr ),* $(,)? ) => {{ $( let _ = &$x; )* }};
    }
    pub(crate) use info;
    macro_rules! warning {
        ( $( $x:expr ),* $(,)? ) => {{ $( let _ = &$x; )* }};
    }
    pub(crate) use warning as warn;
}

#[cfg(not(any(feature = "defmt", feature = "log")))]
pub(crate) use noop::{debug, info, trace, warn};
