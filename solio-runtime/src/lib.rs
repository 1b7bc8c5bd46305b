//! The solio runtime.
//!
//! A strictly single-threaded executor: one FIFO ready queue of tasks and
//! one readiness [driver](solio_driver::Driver) per runtime, with the
//! thread parked inside the driver whenever no task is runnable.
//!
//! ```
//! let ans = solio_runtime::Runtime::new().unwrap().block_on(async {
//!     println!("Hello world!");
//!     42
//! });
//! assert_eq!(ans, 42);
//! ```

#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

mod attacher;
mod runtime;

pub use async_task::Task;
pub use attacher::Attacher;
pub use runtime::*;
