use std::{
    fmt::Debug,
    future::Future,
    io,
    pin::Pin,
    task::{Context, Poll},
};

use solio_driver::{op::OpCode, Key};

use crate::Runtime;

/// Future driving one [`OpCode`] through the current runtime's driver.
///
/// Resolves to the operation result paired with the op itself, so ops that
/// carry out-parameters (the accepted peer address, say) can be consumed
/// after completion.
///
/// An `OpFuture` is not cancel-safe: dropping it while pending leaves the
/// task's waker parked on the fd's direction slot. Poll it to completion.
pub struct OpFuture<T: OpCode> {
    key: Key,
    op: Option<T>,
}

impl<T: OpCode> OpFuture<T> {
    pub(crate) fn new(key: Key, op: T) -> Self {
        Self { key, op: Some(op) }
    }
}

impl<T: OpCode + Unpin> Future for OpFuture<T> {
    type Output = (io::Result<usize>, T);

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let op = this
            .op
            .as_mut()
            .expect("an op future should not be polled after completion");
        match Runtime::with_current(|r| r.poll_op(cx, this.key, Pin::new(op))) {
            Poll::Ready(res) => Poll::Ready((res, this.op.take().unwrap())),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T: OpCode> Debug for OpFuture<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpFuture")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}
