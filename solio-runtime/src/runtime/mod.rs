use std::{
    any::Any,
    cell::RefCell,
    collections::VecDeque,
    future::Future,
    io,
    marker::PhantomData,
    panic::AssertUnwindSafe,
    pin::Pin,
    rc::Rc,
    task::{Context, Poll},
    time::Duration,
};

use async_task::{Runnable, Task};
use futures_util::FutureExt;
use solio_driver::{op::OpCode, AsRawFd, Driver, DriverBuilder, Key, RawFd};
use solio_log::{debug, instrument};

mod op;
mod send_wrapper;

pub use op::OpFuture;
use send_wrapper::SendWrapper;

scoped_tls::scoped_thread_local!(static CURRENT_RUNTIME: Runtime);

/// Type alias for `Task<Result<T, Box<dyn Any + Send>>>`, which resolves to
/// an `Err` when the spawned future panicked.
pub type JoinHandle<T> = Task<Result<T, Box<dyn Any + Send>>>;

struct RunnableQueue {
    runnables: SendWrapper<RefCell<VecDeque<Runnable>>>,
}

impl RunnableQueue {
    fn new() -> Self {
        Self {
            runnables: SendWrapper::new(RefCell::new(VecDeque::new())),
        }
    }

    fn schedule(&self, runnable: Runnable) {
        match self.runnables.get() {
            Some(runnables) => runnables.borrow_mut().push_back(runnable),
            // Single-threaded contract: wakers never leave the runtime
            // thread. Fail loudly instead of losing the wake.
            None => panic!("a solio task was woken from a foreign thread"),
        }
    }

    /// Run up to `event_interval` tasks; returns whether any are left.
    ///
    /// # Safety
    ///
    /// Call on the thread that owns the runtime.
    unsafe fn run(&self, event_interval: usize) -> bool {
        let runnables = self.runnables.get_unchecked();
        for _ in 0..event_interval {
            let Some(task) = runnables.borrow_mut().pop_front() else {
                break;
            };
            task.run();
        }
        !runnables.borrow_mut().is_empty()
    }
}

/// The solio runtime.
///
/// A runtime is pinned to the thread that created it: tasks are resumed one
/// at a time in FIFO wake order, and the thread blocks inside
/// [`Driver::park`] when no task is runnable. Each OS thread hosts at most
/// one running runtime at a time.
pub struct Runtime {
    // The queue must outlive the driver: wakers stored in the driver point
    // back into it.
    runnables: Box<RunnableQueue>,
    driver: RefCell<Driver>,
    event_interval: usize,
    // `runnables` is only usable from the owning thread; make the whole
    // runtime `!Send` to match.
    _p: PhantomData<Rc<VecDeque<Runnable>>>,
}

impl Runtime {
    /// Create a [`Runtime`] with default config.
    pub fn new() -> io::Result<Self> {
        Self::builder().build()
    }

    /// Create a builder for [`Runtime`].
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    fn with_builder(builder: &RuntimeBuilder) -> io::Result<Self> {
        Ok(Self {
            runnables: Box::new(RunnableQueue::new()),
            driver: RefCell::new(builder.driver_builder.build()?),
            event_interval: builder.event_interval,
            _p: PhantomData,
        })
    }

    /// Try to perform a function on the current runtime, and if no runtime
    /// is running, return the function back.
    pub fn try_with_current<T, F: FnOnce(&Self) -> T>(f: F) -> Result<T, F> {
        if CURRENT_RUNTIME.is_set() {
            Ok(CURRENT_RUNTIME.with(f))
        } else {
            Err(f)
        }
    }

    /// Perform a function on the current runtime.
    ///
    /// ## Panics
    ///
    /// This method will panic if there is no running [`Runtime`].
    pub fn with_current<T, F: FnOnce(&Self) -> T>(f: F) -> T {
        #[cold]
        fn not_in_solio_runtime() -> ! {
            panic!("not in a solio runtime")
        }

        if CURRENT_RUNTIME.is_set() {
            CURRENT_RUNTIME.with(f)
        } else {
            not_in_solio_runtime()
        }
    }

    /// Set this runtime as the current runtime, and perform a function in
    /// the scope. The slot is released when `f` returns, unwinding included.
    pub fn enter<T, F: FnOnce() -> T>(&self, f: F) -> T {
        CURRENT_RUNTIME.set(self, f)
    }

    /// Spawns a new asynchronous task, returning a [`Task`] for it.
    ///
    /// # Safety
    ///
    /// The caller should ensure the captured lifetime is long enough.
    pub unsafe fn spawn_unchecked<F: Future>(&self, future: F) -> Task<F::Output> {
        // The schedule closure holds a raw pointer back into the queue the
        // runtime owns; tasks never outlive the runtime.
        let queue = self.runnables.as_ref() as *const RunnableQueue;
        let schedule = move |runnable| {
            let queue = unsafe { &*queue };
            queue.schedule(runnable);
        };
        let (runnable, task) = async_task::spawn_unchecked(future, schedule);
        runnable.schedule();
        task
    }

    /// Low level API to control the runtime.
    ///
    /// Run scheduled tasks; the return value indicates whether tasks are
    /// still queued.
    pub fn run(&self) -> bool {
        // SAFETY: self is !Send + !Sync.
        unsafe { self.runnables.run(self.event_interval) }
    }

    /// Block on the future till it completes.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        CURRENT_RUNTIME.set(self, || {
            let mut result = None;
            unsafe { self.spawn_unchecked(async { result = Some(future.await) }) }.detach();
            loop {
                let remaining_tasks = self.run();
                if let Some(result) = result.take() {
                    return result;
                }
                if remaining_tasks {
                    // Tasks are queued: only collect already-pending events.
                    self.poll_with(Some(Duration::ZERO));
                } else {
                    // Everything is suspended on I/O; park until an event
                    // wakes at least one task.
                    self.poll_with(None);
                }
            }
        })
    }

    /// Spawns a new asynchronous task, returning a [`JoinHandle`] for it.
    ///
    /// Spawning a task enables the task to execute concurrently to other
    /// tasks. A panicking task is captured and handed to the joiner.
    pub fn spawn<F: Future + 'static>(&self, future: F) -> JoinHandle<F::Output> {
        unsafe { self.spawn_unchecked(AssertUnwindSafe(future).catch_unwind()) }
    }

    /// Register a raw file descriptor with the driver.
    ///
    /// You only need this when authoring your own high-level resources;
    /// those in `solio-net` register themselves.
    pub fn register(&self, fd: RawFd) -> io::Result<Key> {
        self.driver.borrow_mut().register(fd)
    }

    /// Remove a driver registration.
    pub fn deregister(&self, key: Key) -> io::Result<()> {
        self.driver.borrow_mut().deregister(key)
    }

    /// Submit an operation over the registration `key`.
    ///
    /// You only need this when authoring your own [`OpCode`].
    pub fn submit<T: OpCode + Unpin>(&self, key: Key, op: T) -> OpFuture<T> {
        OpFuture::new(key, op)
    }

    pub(crate) fn poll_op<T: OpCode>(
        &self,
        cx: &mut Context<'_>,
        key: Key,
        op: Pin<&mut T>,
    ) -> Poll<io::Result<usize>> {
        instrument!(solio_log::Level::DEBUG, "poll_op", ?key);
        self.driver.borrow_mut().poll_op(op, key, cx)
    }

    /// Low level API to control the runtime.
    ///
    /// Poll the driver with the given timeout and wake tasks whose I/O
    /// became ready.
    pub fn poll_with(&self, timeout: Option<Duration>) {
        instrument!(solio_log::Level::DEBUG, "poll_with", ?timeout);
        let mut driver = self.driver.borrow_mut();
        match driver.park(timeout) {
            Ok(()) => {}
            Err(e) => match e.kind() {
                io::ErrorKind::TimedOut | io::ErrorKind::Interrupted => {
                    debug!("expected error: {e}");
                }
                _ => panic!("{e:?}"),
            },
        }
    }
}

impl AsRawFd for Runtime {
    fn as_raw_fd(&self) -> RawFd {
        self.driver.borrow().as_raw_fd()
    }
}

/// Builder for [`Runtime`].
#[derive(Debug, Clone)]
pub struct RuntimeBuilder {
    driver_builder: DriverBuilder,
    event_interval: usize,
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RuntimeBuilder {
    /// Create the builder with default config.
    pub fn new() -> Self {
        Self {
            driver_builder: DriverBuilder::new(),
            event_interval: 61,
        }
    }

    /// Replace the driver builder.
    pub fn with_driver(&mut self, builder: DriverBuilder) -> &mut Self {
        self.driver_builder = builder;
        self
    }

    /// Sets the number of queued tasks the scheduler runs before it checks
    /// the driver for I/O events again, so CPU-bound churn cannot starve
    /// I/O wakeups.
    pub fn event_interval(&mut self, val: usize) -> &mut Self {
        self.event_interval = val;
        self
    }

    /// Build the [`Runtime`].
    pub fn build(&self) -> io::Result<Runtime> {
        Runtime::with_builder(self)
    }
}

/// Spawns a new asynchronous task on the current runtime, returning a
/// [`JoinHandle`] for it.
///
/// ```
/// # solio_runtime::Runtime::new().unwrap().block_on(async {
/// let task = solio_runtime::spawn(async { 40 + 2 });
///
/// assert_eq!(
///     task.await.unwrap_or_else(|e| std::panic::resume_unwind(e)),
///     42
/// );
/// # })
/// ```
///
/// ## Panics
///
/// This method doesn't create a runtime. It tries to obtain the current
/// runtime by [`Runtime::with_current`].
pub fn spawn<F: Future + 'static>(future: F) -> JoinHandle<F::Output> {
    Runtime::with_current(|r| r.spawn(future))
}

/// Submit an operation over `key` to the current runtime.
///
/// The future resolves to the operation result paired with the op itself.
///
/// ## Panics
///
/// The returned future panics when polled outside a runtime.
pub fn submit<T: OpCode + Unpin>(key: Key, op: T) -> OpFuture<T> {
    OpFuture::new(key, op)
}
