//! The deferred-scheduling collaborator.
//!
//! Resolution itself never sleeps: "asynchronous" here means a continuation
//! is handed to a [`DeferredScheduler`] and runs on a later turn, after the
//! current call stack has unwound. The engine calls the scheduler whenever
//! `force_async` is requested or a deferred provider completes.

use std::collections::VecDeque;
use std::sync::Mutex;

/// A unit of deferred work.
pub type DeferredTask = Box<dyn FnOnce() + Send>;

/// Schedules a task for a later turn of the hosting event loop.
///
/// The only timing contract: the task runs after the current synchronous
/// call stack returns, before unrelated later work starves it. A panic
/// inside a task is fatal to that task only; the engine cannot observe it.
pub trait DeferredScheduler: Send + Sync {
    /// Enqueues `task` to run on a later turn.
    fn schedule_deferred(&self, task: DeferredTask);
}

/// An explicit single-threaded task queue, the default scheduler.
///
/// Deferred work accumulates until the embedding code pumps the queue with
/// [`run_next`](TaskQueue::run_next) or
/// [`run_until_idle`](TaskQueue::run_until_idle). Tests drive resolution
/// deterministically this way.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use suture_di::{Injector, InjectedExt, TaskQueue};
///
/// let queue = Arc::new(TaskQueue::new());
/// let injector = Injector::with_scheduler(queue.clone());
/// injector.add_mapping("port").unwrap().to_value_of(8080u16).unwrap();
///
/// let mapping = injector.get_mapping("port").unwrap();
/// mapping.resolve_injection_deferred(|value| {
///     assert_eq!(*value.value_of::<u16>().unwrap(), 8080);
/// });
///
/// // Nothing has fired yet; the continuation waits for the next turn.
/// assert_eq!(queue.pending(), 1);
/// assert_eq!(queue.run_until_idle(), 1);
/// ```
pub struct TaskQueue {
    tasks: Mutex<VecDeque<DeferredTask>>,
}

impl TaskQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(VecDeque::new()),
        }
    }

    /// Number of tasks currently queued.
    pub fn pending(&self) -> usize {
        self.tasks.lock().unwrap().len()
    }

    /// Runs the next queued task. Returns false when the queue was empty.
    pub fn run_next(&self) -> bool {
        // Pop before running so the task can safely enqueue more work.
        let task = self.tasks.lock().unwrap().pop_front();
        match task {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Runs tasks until the queue is empty, including tasks scheduled while
    /// draining. Returns how many tasks ran.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while self.run_next() {
            ran += 1;
        }
        ran
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl DeferredScheduler for TaskQueue {
    fn schedule_deferred(&self, task: DeferredTask) {
        self.tasks.lock().unwrap().push_back(task);
    }
}

/// Scheduler that defers through a Tokio runtime.
///
/// Each task becomes a spawned tokio task, which satisfies the "later turn"
/// contract on both the current-thread and multi-thread runtimes.
#[cfg(feature = "async")]
pub struct TokioScheduler {
    handle: tokio::runtime::Handle,
}

#[cfg(feature = "async")]
impl TokioScheduler {
    /// Captures the ambient runtime handle.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime, as
    /// `tokio::runtime::Handle::current` does.
    pub fn new() -> Self {
        Self {
            handle: tokio::runtime::Handle::current(),
        }
    }

    /// Uses an explicit runtime handle.
    pub fn with_handle(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }
}

#[cfg(feature = "async")]
impl Default for TokioScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "async")]
impl DeferredScheduler for TokioScheduler {
    fn schedule_deferred(&self, task: DeferredTask) {
        self.handle.spawn(async move {
            task();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn queue_runs_in_fifo_order() {
        let queue = TaskQueue::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        for i in 0..3 {
            let log = log.clone();
            queue.schedule_deferred(Box::new(move || log.lock().unwrap().push(i)));
        }
        assert_eq!(queue.run_until_idle(), 3);
        assert_eq!(*log.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn tasks_scheduled_while_draining_also_run() {
        let queue = Arc::new(TaskQueue::new());
        let count = Arc::new(AtomicUsize::new(0));
        let inner_queue = queue.clone();
        let inner_count = count.clone();
        queue.schedule_deferred(Box::new(move || {
            let count = inner_count.clone();
            inner_queue.schedule_deferred(Box::new(move || {
                count.fetch_add(1, Ordering::SeqCst);
            }));
            inner_count.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(queue.run_until_idle(), 2);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
