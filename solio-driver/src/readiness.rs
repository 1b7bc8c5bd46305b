use bitflags::bitflags;

bitflags! {
    /// Readiness state of a registered file descriptor.
    ///
    /// Plain bits accumulate from kernel events and are cleared when an
    /// operation observes would-block; closed bits are sticky so a half-shut
    /// peer keeps unblocking syscalls that will report the real outcome.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Readiness: u8 {
        /// Data can be read without blocking.
        const READABLE = 1 << 0;
        /// Data can be written without blocking.
        const WRITABLE = 1 << 1;
        /// The read side was shut down by the peer.
        const READ_CLOSED = 1 << 2;
        /// The write side was shut down.
        const WRITE_CLOSED = 1 << 3;
    }
}

impl Readiness {
    /// The read direction will not block, whether with data or with EOF.
    pub fn is_readable(self) -> bool {
        self.intersects(Self::READABLE | Self::READ_CLOSED)
    }

    /// The write direction will not block.
    pub fn is_writable(self) -> bool {
        self.intersects(Self::WRITABLE | Self::WRITE_CLOSED)
    }
}

/// The direction an operation waits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interest {
    /// Wait for the fd to become readable.
    Readable,
    /// Wait for the fd to become writable.
    Writable,
}

impl Interest {
    /// All bits that unblock this direction.
    pub(crate) fn mask(self) -> Readiness {
        match self {
            Self::Readable => Readiness::READABLE | Readiness::READ_CLOSED,
            Self::Writable => Readiness::WRITABLE | Readiness::WRITE_CLOSED,
        }
    }

    /// The consumable edge bit; closed states are never cleared.
    pub(crate) fn edge(self) -> Readiness {
        match self {
            Self::Readable => Readiness::READABLE,
            Self::Writable => Readiness::WRITABLE,
        }
    }
}
