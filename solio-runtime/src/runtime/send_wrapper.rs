use std::{
    cell::Cell,
    mem::{self, ManuallyDrop},
    thread::{self, ThreadId},
};

thread_local! {
    static THREAD_ID: Cell<Option<ThreadId>> = const { Cell::new(None) };
}

fn current_id() -> ThreadId {
    // Cache the id; `thread::current` is not free.
    match THREAD_ID.get() {
        Some(id) => id,
        None => {
            let id = thread::current().id();
            THREAD_ID.set(Some(id));
            id
        }
    }
}

/// Pins a value to the thread it was created on.
///
/// The wrapper is `Send + Sync`, but the value is only reachable from the
/// owning thread; every accessor checks the caller's thread id.
pub(crate) struct SendWrapper<T> {
    data: ManuallyDrop<T>,
    thread_id: ThreadId,
}

impl<T> SendWrapper<T> {
    pub(crate) fn new(data: T) -> Self {
        Self {
            data: ManuallyDrop::new(data),
            thread_id: current_id(),
        }
    }

    /// Whether the current thread may access the value.
    pub(crate) fn valid(&self) -> bool {
        self.thread_id == current_id()
    }

    /// Borrow the value, or `None` from a foreign thread.
    pub(crate) fn get(&self) -> Option<&T> {
        if self.valid() { Some(&self.data) } else { None }
    }

    /// Borrow the value without the thread check.
    ///
    /// # Safety
    ///
    /// The caller must be on the thread that created the wrapper.
    pub(crate) unsafe fn get_unchecked(&self) -> &T {
        &self.data
    }
}

unsafe impl<T> Send for SendWrapper<T> {}
unsafe impl<T> Sync for SendWrapper<T> {}

impl<T> Drop for SendWrapper<T> {
    fn drop(&mut self) {
        // A trivial drop cannot observe the value, so any thread may run it.
        if !mem::needs_drop::<T>() || self.valid() {
            unsafe { ManuallyDrop::drop(&mut self.data) }
        } else if !thread::panicking() {
            panic!("dropped a thread-pinned value from a foreign thread")
        }
    }
}
