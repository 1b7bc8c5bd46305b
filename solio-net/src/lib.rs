//! Async TCP networking for solio.
//!
//! [`TcpListener`] and [`TcpStream`] own non-blocking sockets registered
//! with the current runtime's driver; `accept`, `connect`, `read` and
//! `write` are I/O operations that suspend the calling task until the
//! kernel reports readiness.

#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

mod socket;
mod tcp;

pub use tcp::{TcpListener, TcpStream};
