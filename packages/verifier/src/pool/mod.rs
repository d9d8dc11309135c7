//! Worker pools that run blocking verifications

use std::panic::{AssertUnwindSafe, catch_unwind};

pub mod thread_pool;
pub mod tokio_pool;

pub use thread_pool::ThreadPool;
pub use tokio_pool::TokioBlockingPool;

/// A unit of blocking work
pub type BlockingTask = Box<dyn FnOnce() + Send + 'static>;

/// Executes blocking tasks on threads other than the caller's.
///
/// `post_blocking_task` returns false when the task was not accepted; the
/// task is dropped without running in that case.
pub trait WorkerPool: Send + Sync {
    fn post_blocking_task(&self, task: BlockingTask) -> bool;
}

/// Run `task` on the current worker, containing a panic so the worker
/// survives it
pub(crate) fn run_task(task: BlockingTask) {
    if catch_unwind(AssertUnwindSafe(task)).is_err() {
        tracing::error!(target: "certverify::pool", "Blocking task panicked");
    }
}
