use std::{
    io,
    pin::Pin,
    task::{Context, Poll},
    time::Duration,
};

use solio_log::{instrument, trace};

use crate::{op::OpCode, scheduled_io::ScheduledIo, slab::Slab, sys, AsRawFd, RawFd};

/// Token addressing one registration inside the driver.
///
/// Obtained from [`Driver::register`] and valid until the matching
/// [`Driver::deregister`]. The same value rides in the kernel event's user
/// data, so demultiplexing an event is a single slab lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Key(pub(crate) usize);

/// Builder for [`Driver`].
#[derive(Debug, Clone)]
pub struct DriverBuilder {
    capacity: usize,
}

impl DriverBuilder {
    /// Create the builder with default config.
    pub fn new() -> Self {
        Self { capacity: 1024 }
    }

    /// Set how many kernel events one park can drain at most.
    pub fn capacity(&mut self, capacity: usize) -> &mut Self {
        self.capacity = capacity;
        self
    }

    /// Build the [`Driver`].
    pub fn build(&self) -> io::Result<Driver> {
        Driver::with_builder(self)
    }
}

impl Default for DriverBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The readiness driver.
///
/// Owns the kernel event multiplexer and a [`Slab`] of per-fd records. The
/// driver never issues user I/O itself: it only tracks which directions are
/// ready and which tasks to wake when the kernel reports an edge.
pub struct Driver {
    mux: sys::Mux,
    events: sys::Events,
    registry: Slab<ScheduledIo>,
}

impl Driver {
    /// Create a driver with default config.
    pub fn new() -> io::Result<Self> {
        Self::builder().build()
    }

    /// Create a [`DriverBuilder`] to config the driver.
    pub fn builder() -> DriverBuilder {
        DriverBuilder::new()
    }

    fn with_builder(builder: &DriverBuilder) -> io::Result<Self> {
        trace!("new driver, event capacity {}", builder.capacity);
        Ok(Self {
            mux: sys::Mux::new()?,
            events: sys::Events::with_capacity(builder.capacity),
            registry: Slab::new(),
        })
    }

    /// Register `fd` with edge-triggered interest in both directions.
    ///
    /// The returned [`Key`] addresses the fd's readiness record until
    /// [`Driver::deregister`].
    pub fn register(&mut self, fd: RawFd) -> io::Result<Key> {
        instrument!(solio_log::Level::TRACE, "register", fd);
        let token = self.registry.insert(ScheduledIo::new(fd));
        if let Err(e) = self.mux.add(fd, token) {
            self.registry.remove(token);
            return Err(e);
        }
        trace!("fd {} registered as token {}", fd, token);
        Ok(Key(token))
    }

    /// Remove a registration. Wakers still parked on it are dropped without
    /// firing.
    ///
    /// # Panics
    ///
    /// Panics if `key` was already deregistered.
    pub fn deregister(&mut self, key: Key) -> io::Result<()> {
        instrument!(solio_log::Level::TRACE, "deregister", ?key);
        let io = self.registry.remove(key.0);
        self.mux.delete(io.fd())
    }

    /// Block until the kernel reports at least one event or `timeout`
    /// expires (`None` parks indefinitely).
    ///
    /// Every reported event is folded into its record's readiness and the
    /// wakers suspended on now-ready directions are fired. `EINTR` is
    /// retried internally.
    pub fn park(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        instrument!(solio_log::Level::TRACE, "park", ?timeout);
        let n = self.mux.wait(&mut self.events, timeout)?;
        if n == 0 {
            return Ok(());
        }
        trace!("park woke with {} events", n);
        for (token, readiness) in self.events.iter() {
            // The kernel may still deliver events for an fd deregistered
            // earlier in this batch.
            let Some(io) = self.registry.get_mut(token) else {
                continue;
            };
            io.add_readiness(readiness);
            io.wake(readiness);
        }
        Ok(())
    }

    /// Drive `op` one step: retry its syscall across readiness edges until
    /// it completes, or park `cx`'s waker on the fd and return `Pending`.
    ///
    /// # Panics
    ///
    /// Panics if `key` is not a live registration, or if another task is
    /// already suspended on the same direction.
    pub fn poll_op<T: OpCode>(
        &mut self,
        mut op: Pin<&mut T>,
        key: Key,
        cx: &mut Context<'_>,
    ) -> Poll<io::Result<usize>> {
        let interest = op.interest();
        loop {
            match op.as_mut().operate() {
                Poll::Ready(res) => return Poll::Ready(res),
                Poll::Pending => {
                    let io = self
                        .registry
                        .get_mut(key.0)
                        .expect("I/O operation on an fd that is not registered");
                    // An edge arrived since the last would-block; the kernel
                    // owes us nothing new, so retry the syscall.
                    if io.consume_readiness(interest) {
                        continue;
                    }
                    io.install_waker(interest, cx.waker());
                    return Poll::Pending;
                }
            }
        }
    }
}

impl AsRawFd for Driver {
    fn as_raw_fd(&self) -> RawFd {
        self.mux.as_raw_fd()
    }
}
