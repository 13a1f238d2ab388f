// Copyright (C) 2023, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

//! Bounded-concurrency task runner with priorities.
//!
//! At most `max_pool_size` tasks run at once on the backing thread pool.
//! Anything submitted beyond that waits in a max-heap and is started, highest
//! priority first, as running tasks complete.

use parking_lot::Mutex;
use rayon::ThreadPool;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

type Task = Box<dyn FnOnce() + Send + 'static>;

struct PendingTask {
    priority: usize,
    // submission order, breaks ties first-in first-out
    seq: u64,
    task: Task,
}

impl PartialEq for PendingTask {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PendingTask {}

impl PartialOrd for PendingTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PendingTask {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Default)]
struct State {
    in_flight: usize,
    seq: u64,
    queue: BinaryHeap<PendingTask>,
}

struct Inner {
    pool: Arc<ThreadPool>,
    max_pool_size: usize,
    state: Mutex<State>,
}

#[derive(Clone)]
pub struct PrioritizedExecutor {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for PrioritizedExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("PrioritizedExecutor")
            .field("max_pool_size", &self.inner.max_pool_size)
            .field("in_flight", &state.in_flight)
            .field("queued", &state.queue.len())
            .finish()
    }
}

impl PrioritizedExecutor {
    /// A pool size of zero is treated as one.
    pub fn new(pool: Arc<ThreadPool>, max_pool_size: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                pool,
                max_pool_size: max_pool_size.max(1),
                state: Default::default(),
            }),
        }
    }

    /// Runs `task` now if a slot is free, otherwise queues it under `priority`.
    pub fn execute<F>(&self, priority: usize, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let task: Task = Box::new(task);
        {
            let mut state = self.inner.state.lock();
            if state.in_flight >= self.inner.max_pool_size {
                state.seq += 1;
                let seq = state.seq;
                state.queue.push(PendingTask {
                    priority,
                    seq,
                    task,
                });
                return;
            }
            state.in_flight += 1;
        }
        Inner::spawn(&self.inner, task);
    }

    /// True when no task is running or waiting.
    pub fn finished(&self) -> bool {
        self.inner.state.lock().in_flight == 0
    }

    pub fn queued(&self) -> usize {
        self.inner.state.lock().queue.len()
    }
}

impl Inner {
    fn spawn(inner: &Arc<Inner>, task: Task) {
        let handle = Arc::clone(inner);
        inner.pool.spawn(move || {
            // the slot must be released even when the task panics
            if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
                log::warn!("executor task panicked");
            }
            handle.complete();
        });
    }

    /// Hands the freed slot to the best queued task, if any.
    fn complete(self: &Arc<Self>) {
        let next = {
            let mut state = self.state.lock();
            let next = state.queue.pop();
            if next.is_none() {
                state.in_flight -= 1;
            }
            next
        };
        if let Some(next) = next {
            Inner::spawn(self, next.task);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;

    fn single_thread_pool() -> Arc<ThreadPool> {
        Arc::new(
            rayon::ThreadPoolBuilder::new()
                .num_threads(1)
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn queued_tasks_run_by_priority() {
        let executor = PrioritizedExecutor::new(single_thread_pool(), 1);
        let order = Arc::new(Mutex::new(Vec::new()));
        let (release_tx, release_rx) = bounded::<()>(0);
        let (done_tx, done_rx) = bounded::<()>(8);

        executor.execute(0, move || {
            release_rx.recv().unwrap();
        });

        for priority in [1, 5, 3, 5] {
            let order = Arc::clone(&order);
            let done_tx = done_tx.clone();
            executor.execute(priority, move || {
                order.lock().push(priority);
                done_tx.send(()).unwrap();
            });
        }
        assert_eq!(executor.queued(), 4);
        assert!(!executor.finished());

        release_tx.send(()).unwrap();
        for _ in 0..4 {
            done_rx.recv().unwrap();
        }
        assert_eq!(*order.lock(), [5, 5, 3, 1]);

        while !executor.finished() {
            std::thread::yield_now();
        }
        assert_eq!(executor.queued(), 0);
    }

    #[test]
    fn panicking_task_frees_its_slot() {
        let executor = PrioritizedExecutor::new(single_thread_pool(), 1);
        let (tx, rx) = bounded(1);
        executor.execute(0, || panic!("task failure"));
        executor.execute(0, move || tx.send(()).unwrap());

        rx.recv().unwrap();
        while !executor.finished() {
            std::thread::yield_now();
        }
        assert_eq!(executor.queued(), 0);
    }

    #[test]
    fn runs_immediately_below_limit() {
        let executor = PrioritizedExecutor::new(single_thread_pool(), 4);
        let (tx, rx) = bounded(4);
        for i in 0..4 {
            let tx = tx.clone();
            executor.execute(i, move || tx.send(i).unwrap());
        }
        let mut seen: Vec<usize> = (0..4).map(|_| rx.recv().unwrap()).collect();
        seen.sort_unstable();
        assert_eq!(seen, [0, 1, 2, 3]);
    }
}
