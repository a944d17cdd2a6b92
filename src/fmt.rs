//! Logging shims.
//!
//! The driver logs through `defmt` or `log` depending on which feature is
//! enabled. With neither feature the macros expand to nothing.

#![allow(unused_macros)]

macro_rules! debug {
    ($($arg:tt)*) => {
        cfg_if::cfg_if! {
            if #[cfg(feature = "defmt")] {
                defmt::debug!($($arg)*);
            } else if #[cfg(feature = "log")] {
                log::debug!($($arg)*);
            }
        }
    };
}

macro_rules! warn {
    ($($arg:tt)*) => {
        cfg_if::cfg_if! {
            if #[cfg(feature = "defmt")] {
                defmt::warn!($($arg)*);
            } else if #[cfg(feature = "log")] {
                log::warn!($($arg)*);
            }
        }
    };
}

macro_rules! error {
    ($($arg:tt)*) => {
        cfg_if::cfg_if! {
            if #[cfg(feature = "defmt")] {
                defmt::error!($($arg)*);
            } else if #[cfg(feature = "log")] {
                log::error!($($arg)*);
            }
        }
    };
}
