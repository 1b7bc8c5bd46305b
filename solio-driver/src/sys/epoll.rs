//! epoll backend.

use std::{
    io,
    os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd},
    ptr,
    time::Duration,
};

use crate::{syscall, Readiness};

// Edge-triggered, both directions, plus peer-shutdown notification.
const INTEREST: u32 =
    (libc::EPOLLIN | libc::EPOLLOUT | libc::EPOLLRDHUP | libc::EPOLLET) as u32;

pub(crate) struct Mux {
    epoll: OwnedFd,
}

impl Mux {
    pub(crate) fn new() -> io::Result<Self> {
        let fd = syscall!(libc::epoll_create1(libc::EPOLL_CLOEXEC))?;
        Ok(Self {
            epoll: unsafe { OwnedFd::from_raw_fd(fd) },
        })
    }

    pub(crate) fn add(&self, fd: RawFd, token: usize) -> io::Result<()> {
        let mut ev = libc::epoll_event {
            events: INTEREST,
            u64: token as u64,
        };
        syscall!(libc::epoll_ctl(
            self.epoll.as_raw_fd(),
            libc::EPOLL_CTL_ADD,
            fd,
            &mut ev
        ))?;
        Ok(())
    }

    pub(crate) fn delete(&self, fd: RawFd) -> io::Result<()> {
        syscall!(libc::epoll_ctl(
            self.epoll.as_raw_fd(),
            libc::EPOLL_CTL_DEL,
            fd,
            ptr::null_mut()
        ))?;
        Ok(())
    }

    pub(crate) fn wait(&self, events: &mut Events, timeout: Option<Duration>) -> io::Result<usize> {
        let millis = match timeout {
            Some(t) => i32::try_from(t.as_millis()).unwrap_or(i32::MAX),
            None => -1,
        };
        loop {
            match syscall!(libc::epoll_wait(
                self.epoll.as_raw_fd(),
                events.buf.as_mut_ptr(),
                events.buf.len() as i32,
                millis
            )) {
                Ok(n) => {
                    events.len = n as usize;
                    return Ok(n as usize);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
    }
}

impl AsRawFd for Mux {
    fn as_raw_fd(&self) -> RawFd {
        self.epoll.as_raw_fd()
    }
}

pub(crate) struct Events {
    buf: Vec<libc::epoll_event>,
    len: usize,
}

impl Events {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: vec![libc::epoll_event { events: 0, u64: 0 }; capacity],
            len: 0,
        }
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (usize, Readiness)> + '_ {
        self.buf[..self.len].iter().map(|ev| {
            let token = ev.u64;
            (token as usize, decode(ev.events))
        })
    }
}

/// Translate epoll event bits into [`Readiness`]. Pure and deterministic.
pub(crate) fn decode(events: u32) -> Readiness {
    let mut readiness = Readiness::empty();
    if events & libc::EPOLLIN as u32 != 0 || events & libc::EPOLLPRI as u32 != 0 {
        readiness |= Readiness::READABLE;
    }
    if events & libc::EPOLLOUT as u32 != 0 {
        readiness |= Readiness::WRITABLE;
    }
    if events & libc::EPOLLRDHUP as u32 != 0 {
        readiness |= Readiness::READ_CLOSED;
    }
    // HUP and ERR unblock both directions; the next syscall reports the
    // real outcome.
    if events & (libc::EPOLLHUP | libc::EPOLLERR) as u32 != 0 {
        readiness |= Readiness::READ_CLOSED | Readiness::WRITE_CLOSED;
    }
    readiness
}
