use std::{io, os::fd::FromRawFd};

use socket2::{Domain, Protocol, SockAddr, Socket as Socket2, Type};
use solio_driver::{
    op::{Accept, Connect, Recv, Send},
    AsRawFd, RawFd,
};
use solio_runtime::Attacher;

/// A non-blocking socket attached to the current runtime.
#[derive(Debug)]
pub(crate) struct Socket {
    inner: Attacher<Socket2>,
}

impl Socket {
    /// Create a socket and register it with the current runtime's driver.
    pub(crate) fn new(domain: Domain, ty: Type, protocol: Option<Protocol>) -> io::Result<Self> {
        // socket2 creates the fd close-on-exec already.
        let socket = Socket2::new(domain, ty, protocol)?;
        socket.set_nonblocking(true)?;
        Self::attach(socket)
    }

    fn attach(socket: Socket2) -> io::Result<Self> {
        Ok(Self {
            inner: Attacher::new(socket)?,
        })
    }

    pub(crate) fn set_reuse_address(&self, reuse: bool) -> io::Result<()> {
        self.inner.set_reuse_address(reuse)
    }

    pub(crate) fn bind(&self, addr: &SockAddr) -> io::Result<()> {
        self.inner.bind(addr)
    }

    pub(crate) fn listen(&self, backlog: i32) -> io::Result<()> {
        self.inner.listen(backlog)
    }

    pub(crate) fn local_addr(&self) -> io::Result<SockAddr> {
        self.inner.local_addr()
    }

    pub(crate) fn peer_addr(&self) -> io::Result<SockAddr> {
        self.inner.peer_addr()
    }

    pub(crate) async fn accept(&self) -> io::Result<(Self, SockAddr)> {
        let op = Accept::new(self.inner.as_raw_fd());
        let (res, op) = solio_runtime::submit(self.inner.key(), op).await;
        let fd = res? as RawFd;
        let addr = op.into_addr();
        // The accepted fd is already non-blocking and cloexec.
        let socket = unsafe { Socket2::from_raw_fd(fd) };
        Ok((Self::attach(socket)?, addr))
    }

    pub(crate) async fn connect(&self, addr: &SockAddr) -> io::Result<()> {
        let op = Connect::new(self.inner.as_raw_fd(), addr.clone());
        let (res, _op) = solio_runtime::submit(self.inner.key(), op).await;
        res.map(|_| ())
    }

    pub(crate) async fn recv(&self, buffer: &mut [u8]) -> io::Result<usize> {
        let op = Recv::new(self.inner.as_raw_fd(), buffer);
        let (res, _op) = solio_runtime::submit(self.inner.key(), op).await;
        res
    }

    pub(crate) async fn send(&self, buffer: &[u8]) -> io::Result<usize> {
        let op = Send::new(self.inner.as_raw_fd(), buffer);
        let (res, _op) = solio_runtime::submit(self.inner.key(), op).await;
        res
    }
}
