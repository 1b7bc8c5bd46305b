//! I/O operations expressed as retryable non-blocking syscalls.
//!
//! An op issues exactly one syscall per [`OpCode::operate`] call and never
//! blocks; the driver decides whether a `Pending` outcome means "retry now"
//! (a readiness edge is banked) or "suspend until the kernel reports one".

use std::{io, pin::Pin, task::Poll};

use libc::{sockaddr_storage, socklen_t};
use socket2::SockAddr;

use crate::{syscall, Interest, RawFd};

/// A single non-blocking I/O operation over one fd and one direction.
pub trait OpCode {
    /// The direction whose readiness unblocks this operation.
    fn interest(&self) -> Interest;

    /// Issue the syscall once.
    ///
    /// `Poll::Pending` means the kernel reported would-block; any other
    /// outcome, success or hard error, is final.
    fn operate(self: Pin<&mut Self>) -> Poll<io::Result<usize>>;
}

/// Accept a connection.
///
/// Resolves to the raw fd of the accepted socket, already non-blocking and
/// close-on-exec.
pub struct Accept {
    fd: RawFd,
    buffer: sockaddr_storage,
    addr_len: socklen_t,
}

impl Accept {
    /// Create [`Accept`].
    pub fn new(fd: RawFd) -> Self {
        Self {
            fd,
            buffer: unsafe { std::mem::zeroed() },
            addr_len: std::mem::size_of::<sockaddr_storage>() as socklen_t,
        }
    }

    /// Get the remote address from the inner buffer.
    pub fn into_addr(self) -> SockAddr {
        unsafe { SockAddr::new(self.buffer, self.addr_len) }
    }
}

impl OpCode for Accept {
    fn interest(&self) -> Interest {
        Interest::Readable
    }

    #[cfg(any(
        target_os = "linux",
        target_os = "android",
        target_os = "freebsd",
        target_os = "openbsd",
        target_os = "dragonfly",
    ))]
    fn operate(self: Pin<&mut Self>) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        syscall!(
            break libc::accept4(
                this.fd,
                &mut this.buffer as *mut _ as *mut _,
                &mut this.addr_len,
                libc::SOCK_NONBLOCK | libc::SOCK_CLOEXEC,
            )
        )
    }

    #[cfg(any(target_os = "macos", target_os = "ios"))]
    fn operate(self: Pin<&mut Self>) -> Poll<io::Result<usize>> {
        use std::os::fd::{FromRawFd, IntoRawFd};

        let this = self.get_mut();
        loop {
            match syscall!(libc::accept(
                this.fd,
                &mut this.buffer as *mut _ as *mut _,
                &mut this.addr_len,
            )) {
                Ok(fd) => {
                    // No accept4 here; set the flags on the new socket.
                    let socket = unsafe { socket2::Socket::from_raw_fd(fd) };
                    let res = socket
                        .set_cloexec(true)
                        .and_then(|_| socket.set_nonblocking(true));
                    return match res {
                        Ok(()) => Poll::Ready(Ok(socket.into_raw_fd() as usize)),
                        Err(e) => Poll::Ready(Err(e)),
                    };
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Poll::Pending,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Poll::Ready(Err(e)),
            }
        }
    }
}

/// Connect a socket to a remote address.
///
/// The first attempt issues `connect`; once the socket reports writable, the
/// pending outcome is read back with `SO_ERROR`.
pub struct Connect {
    fd: RawFd,
    addr: SockAddr,
    started: bool,
}

impl Connect {
    /// Create [`Connect`].
    pub fn new(fd: RawFd, addr: SockAddr) -> Self {
        Self {
            fd,
            addr,
            started: false,
        }
    }
}

impl OpCode for Connect {
    fn interest(&self) -> Interest {
        Interest::Writable
    }

    fn operate(self: Pin<&mut Self>) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        if !this.started {
            this.started = true;
            return match syscall!(libc::connect(
                this.fd,
                this.addr.as_ptr().cast(),
                this.addr.len()
            )) {
                Ok(res) => Poll::Ready(Ok(res as usize)),
                // EINTR leaves the connection in progress, same as
                // EINPROGRESS; do not reissue connect.
                Err(e)
                    if matches!(
                        e.raw_os_error(),
                        Some(libc::EINPROGRESS) | Some(libc::EINTR)
                    ) || e.kind() == io::ErrorKind::WouldBlock =>
                {
                    Poll::Pending
                }
                Err(e) => Poll::Ready(Err(e)),
            };
        }

        let mut err: libc::c_int = 0;
        let mut err_len = std::mem::size_of::<libc::c_int>() as socklen_t;
        syscall!(libc::getsockopt(
            this.fd,
            libc::SOL_SOCKET,
            libc::SO_ERROR,
            &mut err as *mut _ as *mut _,
            &mut err_len
        ))?;
        if err == 0 {
            Poll::Ready(Ok(0))
        } else {
            Poll::Ready(Err(io::Error::from_raw_os_error(err)))
        }
    }
}

/// Receive bytes from a socket.
///
/// Resolves with the byte count; 0 means the peer closed the connection.
pub struct Recv<'a> {
    fd: RawFd,
    buffer: &'a mut [u8],
}

impl<'a> Recv<'a> {
    /// Create [`Recv`].
    pub fn new(fd: RawFd, buffer: &'a mut [u8]) -> Self {
        Self { fd, buffer }
    }
}

impl OpCode for Recv<'_> {
    fn interest(&self) -> Interest {
        Interest::Readable
    }

    fn operate(self: Pin<&mut Self>) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        syscall!(
            break libc::read(
                this.fd,
                this.buffer.as_mut_ptr() as _,
                this.buffer.len()
            )
        )
    }
}

/// Send bytes to a socket. Short writes are returned as-is.
pub struct Send<'a> {
    fd: RawFd,
    buffer: &'a [u8],
}

impl<'a> Send<'a> {
    /// Create [`Send`].
    pub fn new(fd: RawFd, buffer: &'a [u8]) -> Self {
        Self { fd, buffer }
    }
}

impl OpCode for Send<'_> {
    fn interest(&self) -> Interest {
        Interest::Writable
    }

    fn operate(self: Pin<&mut Self>) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        syscall!(break libc::write(this.fd, this.buffer.as_ptr() as _, this.buffer.len()))
    }
}
