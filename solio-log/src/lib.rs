//! Logging facade of solio.
//!
//! A thin layer over [`tracing`]: when the `enable_log` feature is on, the
//! macros below forward to `tracing`; otherwise they all expand to nothing
//! so the I/O hot path pays no logging cost.

#[cfg_attr(not(feature = "enable_log"), doc(hidden))]
pub use tracing::*;

#[cfg(not(feature = "enable_log"))]
mod noop;

#[cfg(feature = "enable_log")]
#[macro_export]
macro_rules! instrument {
    ($lvl:expr, $name:expr, $($fields:tt)*) => {
        let _entered = $crate::span!(target: module_path!(), $lvl, $name, $($fields)*).entered();
    };
    ($lvl:expr, $name:expr) => {
        let _entered = $crate::span!(target: module_path!(), $lvl, $name).entered();
    };
}

#[cfg(not(feature = "enable_log"))]
#[macro_export]
macro_rules! instrument {
    ($($args:tt)*) => {};
}
