//! Logging shims.
//!
//! The crate logs through `defmt` when the `defmt` feature is enabled, through `log` when only the
//! `log` feature is enabled, and otherwise compiles the calls away while still type-checking their
//! arguments.
#![allow(unused_macros)]

cfg_if::cfg_if! {
    if #[cfg(feature = "defmt")] {
        macro_rules! trace {
            ($($arg:tt)*) => { ::defmt::trace!($($arg)*) };
        }
        macro_rules! debug {
            ($($arg:tt)*) => { ::defmt::debug!($($arg)*) };
        }
        macro_rules! info {
            ($($arg:tt)*) => { ::defmt::info!($($arg)*) };
        }
        macro_rules! warn {
            ($($arg:tt)*) => { ::defmt::warn!($($arg)*) };
        }
    } else if #[cfg(feature = "log")] {
        macro_rules! trace {
            ($($arg:tt)*) => { ::log::trace!($($arg)*) };
        }
        macro_rules! debug {
            ($($arg:tt)*) => { ::log::debug!($($arg)*) };
        }
        macro_rules! info {
            ($($arg:tt)*) => { ::log::info!($($arg)*) };
        }
        macro_rules! warn {
            ($($arg:tt)*) => { ::log::warn!($($arg)*) };
        }
    } else {
        macro_rules! trace {
            ($s:literal $(, $x:expr)* $(,)?) => {{ let _ = ($( & $x ),*); }};
        }
        macro_rules! debug {
            ($s:literal $(, $x:expr)* $(,)?) => {{ let _ = ($( & $x ),*); }};
        }
        macro_rules! info {
            ($s:literal $(, $x:expr)* $(,)?) => {{ let _ = ($( & $x ),*); }};
        }
        macro_rules! warn {
            ($s:literal $(, $x:expr)* $(,)?) => {{ let _ = ($( & $x ),*); }};
        }
    }
}
