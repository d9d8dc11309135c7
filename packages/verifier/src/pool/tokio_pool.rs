//! Blocking pool of a tokio runtime

use tokio::runtime::Handle;

use super::{BlockingTask, WorkerPool, run_task};

/// Runs tasks through [`Handle::spawn_blocking`]. Never rejects while the
/// runtime is alive.
#[derive(Debug, Clone)]
pub struct TokioBlockingPool {
    handle: Handle,
}

impl TokioBlockingPool {
    #[must_use]
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Pool on the runtime the caller is running in, if any
    #[must_use]
    pub fn try_current() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }
}

impl WorkerPool for TokioBlockingPool {
    fn post_blocking_task(&self, task: BlockingTask) -> bool {
        drop(self.handle.spawn_blocking(move || run_task(task)));
        true
    }
}
