//! Readiness-based I/O driver.
//!
//! The [`Driver`] owns the kernel event multiplexer (epoll on Linux, kqueue
//! on macOS/BSD), hands out compact [`Key`] tokens for registered file
//! descriptors, and parks the thread until the kernel reports readiness.
//! I/O itself stays with the callers: an [`op::OpCode`] issues its syscall
//! non-blockingly and the driver only decides whether to retry it or to
//! suspend the task until the next readiness edge.

#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub use std::os::fd::{AsRawFd, OwnedFd, RawFd};

mod driver;
pub use driver::*;

pub mod op;

mod readiness;
pub use readiness::*;

mod scheduled_io;

mod slab;
pub use slab::Slab;

mod sys;

/// Helper macro to execute a system call.
///
/// The plain form turns `-1` into [`std::io::Error::last_os_error`]. The
/// `break` form retries `EINTR` and maps would-block (`EAGAIN`,
/// `EWOULDBLOCK`, `EINPROGRESS`) to [`std::task::Poll::Pending`].
#[macro_export]
#[doc(hidden)]
macro_rules! syscall {
    (break $e:expr) => {
        loop {
            match $crate::syscall!($e) {
                Ok(res) => break ::std::task::Poll::Ready(Ok(res as usize)),
                Err(e)
                    if e.kind() == ::std::io::ErrorKind::WouldBlock
                        || e.raw_os_error() == Some(::libc::EINPROGRESS) =>
                {
                    break ::std::task::Poll::Pending
                }
                Err(e) if e.kind() == ::std::io::ErrorKind::Interrupted => {}
                Err(e) => break ::std::task::Poll::Ready(Err(e)),
            }
        }
    };
    ($e:expr) => {{
        #[allow(unused_unsafe)]
        let res = unsafe { $e };
        if res == -1 {
            Err(::std::io::Error::last_os_error())
        } else {
            Ok(res)
        }
    }};
}
