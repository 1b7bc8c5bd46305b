use std::{
    cell::Cell,
    future::Future,
    panic::resume_unwind,
    pin::Pin,
    rc::Rc,
    task::{Context, Poll},
};

use solio_runtime::Runtime;

#[test]
fn block_on_returns_the_root_result() {
    let rt = Runtime::new().unwrap();
    assert_eq!(rt.block_on(async { 40 + 2 }), 42);
}

#[test]
fn spawn_and_join() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let task = solio_runtime::spawn(async { String::from("done") });
        let res = task.await.unwrap_or_else(|e| resume_unwind(e));
        assert_eq!(res, "done");
    });
}

#[test]
fn join_observes_the_result_only_after_completion() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let (tx, rx) = futures_channel::oneshot::channel::<i32>();
        let finished = Rc::new(Cell::new(false));

        let flag = finished.clone();
        let task = solio_runtime::spawn(async move {
            let v = rx.await.unwrap();
            flag.set(true);
            v * 2
        });
        let sender = solio_runtime::spawn(async move {
            tx.send(21).unwrap();
        });

        let res = task.await.unwrap_or_else(|e| resume_unwind(e));
        assert!(finished.get());
        assert_eq!(res, 42);
        sender.await.unwrap_or_else(|e| resume_unwind(e));
    });
}

#[test]
fn spawned_panic_reaches_the_joiner() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let task = solio_runtime::spawn(async { panic!("boom") });
        let payload = task.await.unwrap_err();
        assert_eq!(payload.downcast_ref::<&str>(), Some(&"boom"));
    });
}

#[test]
#[should_panic(expected = "not in a solio runtime")]
fn spawn_outside_a_runtime_panics() {
    let _ = solio_runtime::spawn(async {});
}

struct DoubleWake {
    polls: Rc<Cell<usize>>,
}

impl Future for DoubleWake {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let polls = self.polls.get() + 1;
        self.polls.set(polls);
        if polls == 1 {
            // Two wakes in a row must schedule the task once, not twice.
            cx.waker().wake_by_ref();
            cx.waker().wake_by_ref();
            Poll::Pending
        } else {
            Poll::Ready(())
        }
    }
}

#[test]
fn wake_while_scheduled_is_idempotent() {
    let rt = Runtime::new().unwrap();
    let polls = Rc::new(Cell::new(0));
    rt.block_on(DoubleWake {
        polls: polls.clone(),
    });
    assert_eq!(polls.get(), 2);
}

#[test]
fn tasks_run_in_fifo_wake_order() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let order = Rc::new(RefCellVec::default());
        let mut handles = Vec::new();
        for i in 0..4 {
            let order = order.clone();
            handles.push(solio_runtime::spawn(async move {
                order.push(i);
            }));
        }
        for handle in handles {
            handle.await.unwrap_or_else(|e| resume_unwind(e));
        }
        assert_eq!(order.take(), vec![0, 1, 2, 3]);
    });
}

#[derive(Default)]
struct RefCellVec(std::cell::RefCell<Vec<usize>>);

impl RefCellVec {
    fn push(&self, v: usize) {
        self.0.borrow_mut().push(v);
    }

    fn take(&self) -> Vec<usize> {
        std::mem::take(&mut *self.0.borrow_mut())
    }
}
