use std::task::Waker;

use crate::{Interest, RawFd, Readiness};

/// Per-registration record: accumulated readiness plus the wakers of the
/// tasks suspended on each direction.
pub(crate) struct ScheduledIo {
    fd: RawFd,
    readiness: Readiness,
    reader: Option<Waker>,
    writer: Option<Waker>,
}

impl ScheduledIo {
    pub(crate) fn new(fd: RawFd) -> Self {
        Self {
            fd,
            readiness: Readiness::empty(),
            reader: None,
            writer: None,
        }
    }

    pub(crate) fn fd(&self) -> RawFd {
        self.fd
    }

    /// Fold kernel-reported readiness into the record.
    pub(crate) fn add_readiness(&mut self, readiness: Readiness) {
        self.readiness |= readiness;
    }

    /// Consume one readiness edge for `interest`.
    ///
    /// Returns whether the direction was ready. Only the plain bit is
    /// cleared; closed states stay set so the next syscall surfaces the real
    /// outcome.
    pub(crate) fn consume_readiness(&mut self, interest: Interest) -> bool {
        if self.readiness.intersects(interest.mask()) {
            self.readiness -= interest.edge();
            true
        } else {
            false
        }
    }

    /// Park `waker` on the direction's slot.
    ///
    /// At most one task may wait per direction. A second distinct waker is a
    /// double-await and panics; a task refreshing its own waker is fine.
    pub(crate) fn install_waker(&mut self, interest: Interest, waker: &Waker) {
        let slot = match interest {
            Interest::Readable => &mut self.reader,
            Interest::Writable => &mut self.writer,
        };
        match slot {
            Some(old) if !old.will_wake(waker) => {
                panic!("two tasks are waiting on the same fd in the same direction")
            }
            _ => *slot = Some(waker.clone()),
        }
    }

    /// Fire the wakers of every direction `readiness` unblocks.
    ///
    /// Slots are emptied before the wakers run.
    pub(crate) fn wake(&mut self, readiness: Readiness) {
        if readiness.is_readable() {
            if let Some(waker) = self.reader.take() {
                waker.wake();
            }
        }
        if readiness.is_writable() {
            if let Some(waker) = self.writer.take() {
                waker.wake();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
        task::{Wake, Waker},
    };

    use super::*;

    struct Counter(AtomicUsize);

    impl Wake for Counter {
        fn wake(self: Arc<Self>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }

        fn wake_by_ref(self: &Arc<Self>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn counting_waker() -> (Waker, Arc<Counter>) {
        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        (Waker::from(counter.clone()), counter)
    }

    #[test]
    fn wake_takes_the_slot_first() {
        let mut io = ScheduledIo::new(0);
        let (waker, count) = counting_waker();
        io.install_waker(Interest::Readable, &waker);
        io.add_readiness(Readiness::READABLE);
        io.wake(Readiness::READABLE);
        assert_eq!(count.0.load(Ordering::SeqCst), 1);
        // The slot was emptied, a second event finds nobody to wake.
        io.wake(Readiness::READABLE);
        assert_eq!(count.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn directions_are_independent() {
        let mut io = ScheduledIo::new(0);
        let (reader, read_count) = counting_waker();
        let (writer, write_count) = counting_waker();
        io.install_waker(Interest::Readable, &reader);
        io.install_waker(Interest::Writable, &writer);
        io.wake(Readiness::WRITABLE);
        assert_eq!(read_count.0.load(Ordering::SeqCst), 0);
        assert_eq!(write_count.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn readiness_accumulates_until_consumed() {
        let mut io = ScheduledIo::new(0);
        io.add_readiness(Readiness::READABLE);
        io.add_readiness(Readiness::WRITABLE);
        assert!(io.consume_readiness(Interest::Readable));
        assert!(!io.consume_readiness(Interest::Readable));
        assert!(io.consume_readiness(Interest::Writable));
    }

    #[test]
    fn closed_state_is_sticky() {
        let mut io = ScheduledIo::new(0);
        io.add_readiness(Readiness::READ_CLOSED);
        assert!(io.consume_readiness(Interest::Readable));
        assert!(io.consume_readiness(Interest::Readable));
    }

    #[test]
    fn same_task_may_refresh_its_waker() {
        let mut io = ScheduledIo::new(0);
        let (waker, _count) = counting_waker();
        io.install_waker(Interest::Readable, &waker);
        io.install_waker(Interest::Readable, &waker.clone());
    }

    #[test]
    #[should_panic(expected = "same direction")]
    fn double_await_panics() {
        let mut io = ScheduledIo::new(0);
        let (first, _) = counting_waker();
        let (second, _) = counting_waker();
        io.install_waker(Interest::Readable, &first);
        io.install_waker(Interest::Readable, &second);
    }
}
