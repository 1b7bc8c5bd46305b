//! Platform event multiplexers.
//!
//! Each backend exposes the same surface: a `Mux` owning the kernel
//! descriptor, an `Events` buffer whose iterator yields `(token, Readiness)`
//! pairs, and a pure `decode` translating kernel event bits.

cfg_if::cfg_if! {
    if #[cfg(any(target_os = "linux", target_os = "android"))] {
        mod epoll;
        pub(crate) use epoll::*;
    } else if #[cfg(any(
        target_os = "macos",
        target_os = "ios",
        target_os = "freebsd",
        target_os = "openbsd",
        target_os = "dragonfly",
    ))] {
        mod kqueue;
        pub(crate) use kqueue::*;
    } else {
        compile_error!("unsupported platform: solio needs epoll or kqueue");
    }
}
