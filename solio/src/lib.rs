//! A single-threaded, readiness-based async runtime.
//!
//! solio drives futures on one thread per runtime: tasks wait in a FIFO
//! ready queue, and when nothing is runnable the thread parks on the kernel
//! readiness multiplexer (epoll on Linux, kqueue on macOS/BSD). I/O
//! operations issue their syscall non-blockingly and suspend the task only
//! when the kernel reports would-block.
//!
//! ```
//! use solio::net::{TcpListener, TcpStream};
//!
//! # solio::Runtime::new().unwrap().block_on(async {
//! let listener = TcpListener::bind("127.0.0.1:0".parse().unwrap()).unwrap();
//! let addr = listener.local_addr().unwrap();
//!
//! let server = solio::spawn(async move {
//!     let (stream, _) = listener.accept().await.unwrap();
//!     let mut buf = [0u8; 16];
//!     let n = stream.read(&mut buf).await.unwrap();
//!     stream.write(&buf[..n]).await.unwrap();
//! });
//!
//! let client = TcpStream::connect(addr).await.unwrap();
//! client.write(b"ping").await.unwrap();
//! let mut buf = [0u8; 16];
//! let n = client.read(&mut buf).await.unwrap();
//! assert_eq!(&buf[..n], b"ping");
//! # server.await.unwrap();
//! # });
//! ```

#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

#[doc(inline)]
pub use solio_driver as driver;
#[doc(inline)]
pub use solio_log as log;
#[doc(inline)]
pub use solio_net as net;
#[doc(inline)]
pub use solio_runtime as runtime;
pub use solio_runtime::{spawn, JoinHandle, Runtime, RuntimeBuilder};
