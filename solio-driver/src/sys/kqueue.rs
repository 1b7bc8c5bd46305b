//! kqueue backend.
//!
//! Registration installs a paired `EVFILT_READ`/`EVFILT_WRITE` with
//! `EV_CLEAR`, which is kqueue's spelling of edge-triggered.

use std::{
    io, mem,
    os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd},
    ptr,
    time::Duration,
};

use crate::{syscall, Readiness};

pub(crate) struct Mux {
    kq: OwnedFd,
}

impl Mux {
    pub(crate) fn new() -> io::Result<Self> {
        let fd = syscall!(libc::kqueue())?;
        let kq = unsafe { OwnedFd::from_raw_fd(fd) };
        syscall!(libc::fcntl(kq.as_raw_fd(), libc::F_SETFD, libc::FD_CLOEXEC))?;
        Ok(Self { kq })
    }

    pub(crate) fn add(&self, fd: RawFd, token: usize) -> io::Result<()> {
        let changes = [
            change(fd, libc::EVFILT_READ, libc::EV_ADD | libc::EV_CLEAR, token),
            change(fd, libc::EVFILT_WRITE, libc::EV_ADD | libc::EV_CLEAR, token),
        ];
        syscall!(libc::kevent(
            self.kq.as_raw_fd(),
            changes.as_ptr(),
            changes.len() as _,
            ptr::null_mut(),
            0,
            ptr::null()
        ))?;
        Ok(())
    }

    pub(crate) fn delete(&self, fd: RawFd) -> io::Result<()> {
        let changes = [
            change(fd, libc::EVFILT_READ, libc::EV_DELETE, 0),
            change(fd, libc::EVFILT_WRITE, libc::EV_DELETE, 0),
        ];
        syscall!(libc::kevent(
            self.kq.as_raw_fd(),
            changes.as_ptr(),
            changes.len() as _,
            ptr::null_mut(),
            0,
            ptr::null()
        ))?;
        Ok(())
    }

    pub(crate) fn wait(&self, events: &mut Events, timeout: Option<Duration>) -> io::Result<usize> {
        let timespec = timeout.map(|t| libc::timespec {
            tv_sec: t.as_secs() as _,
            tv_nsec: t.subsec_nanos() as _,
        });
        let timespec = timespec
            .as_ref()
            .map(|t| t as *const libc::timespec)
            .unwrap_or(ptr::null());
        loop {
            match syscall!(libc::kevent(
                self.kq.as_raw_fd(),
                ptr::null(),
                0,
                events.buf.as_mut_ptr(),
                events.buf.len() as _,
                timespec
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
        self.kq.as_raw_fd()
    }
}

fn change(fd: RawFd, filter: i16, flags: u16, token: usize) -> libc::kevent {
    let mut ev: libc::kevent = unsafe { mem::zeroed() };
    ev.ident = fd as _;
    ev.filter = filter as _;
    ev.flags = flags as _;
    ev.udata = token as *mut libc::c_void;
    ev
}

pub(crate) struct Events {
    buf: Vec<libc::kevent>,
    len: usize,
}

impl Events {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        let zeroed: libc::kevent = unsafe { mem::zeroed() };
        Self {
            buf: vec![zeroed; capacity],
            len: 0,
        }
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (usize, Readiness)> + '_ {
        self.buf[..self.len]
            .iter()
            .map(|ev| (ev.udata as usize, decode(ev.filter as i16, ev.flags as u16)))
    }
}

/// Translate one kevent into [`Readiness`]. Pure and deterministic.
pub(crate) fn decode(filter: i16, flags: u16) -> Readiness {
    let mut readiness = Readiness::empty();
    if filter == libc::EVFILT_READ as i16 {
        readiness |= Readiness::READABLE;
        if flags & libc::EV_EOF as u16 != 0 {
            readiness |= Readiness::READ_CLOSED;
        }
    } else if filter == libc::EVFILT_WRITE as i16 {
        readiness |= Readiness::WRITABLE;
        if flags & libc::EV_EOF as u16 != 0 {
            readiness |= Readiness::WRITE_CLOSED;
        }
    }
    // Per-fd errors unblock everything; the next syscall reports them.
    if flags & libc::EV_ERROR as u16 != 0 {
        readiness |= Readiness::READ_CLOSED | Readiness::WRITE_CLOSED;
    }
    readiness
}
