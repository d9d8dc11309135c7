//! Fixed pool of named worker threads

use std::thread::{self, JoinHandle};

use crossbeam_channel::{Sender, TrySendError, bounded};

use super::{BlockingTask, WorkerPool, run_task};

/// Worker threads fed from a bounded queue. A full queue rejects new tasks.
/// Dropping the pool closes the queue and joins the workers after they drain it.
#[derive(Debug)]
pub struct ThreadPool {
    sender: Option<Sender<BlockingTask>>,
    workers: Vec<JoinHandle<()>>,
}

impl ThreadPool {
    /// Spawn `threads` workers sharing a queue of `queue_capacity` tasks
    pub fn new(threads: usize, queue_capacity: usize) -> std::io::Result<Self> {
        let (sender, receiver) = bounded::<BlockingTask>(queue_capacity);
        let mut workers = Vec::with_capacity(threads);

        for index in 0..threads {
            let receiver = receiver.clone();
            let handle = thread::Builder::new()
                .name(format!("certverify-worker-{index}"))
                .spawn(move || {
                    for task in receiver {
                        run_task(task);
                    }
                    tracing::trace!(target: "certverify::pool", worker = index, "Worker exiting");
                })?;
            workers.push(handle);
        }

        tracing::debug!(
            target: "certverify::pool",
            threads,
            queue_capacity,
            "Started verification worker pool"
        );

        Ok(Self {
            sender: Some(sender),
            workers,
        })
    }

    #[must_use]
    pub fn threads(&self) -> usize {
        self.workers.len()
    }
}

impl WorkerPool for ThreadPool {
    fn post_blocking_task(&self, task: BlockingTask) -> bool {
        let Some(sender) = self.sender.as_ref() else {
            return false;
        };
        match sender.try_send(task) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::warn!(target: "certverify::pool", "Worker queue full, rejecting task");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.sender.take();
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                tracing::warn!(target: "certverify::pool", "Worker thread panicked");
            }
        }
    }
}
