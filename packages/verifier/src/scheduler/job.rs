//! In-flight verification jobs and the completions workers send back

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use super::request::RequestId;
use crate::cache::RequestKey;
use crate::verify::VerifyOutcome;

/// Delivery flag shared by a job and its worker
pub(crate) type CancelFlag = Arc<Mutex<bool>>;

pub(crate) type Callback = Box<dyn FnOnce(VerifyOutcome)>;

/// One caller waiting on a job. A canceled request has no callback.
pub(crate) struct PendingRequest {
    pub(crate) id: RequestId,
    pub(crate) callback: Option<Callback>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct JobId(pub(crate) u64);

/// One dispatched verification and the callers waiting on it
pub(crate) struct Job {
    pub(crate) key: RequestKey,
    pub(crate) cancel: CancelFlag,
    pub(crate) requests: Vec<PendingRequest>,
    pub(crate) started: Instant,
    /// Cache generation the job was dispatched under. A result from an older
    /// generation is delivered but never cached.
    pub(crate) generation: u64,
}

impl Job {
    pub(crate) fn new(key: RequestKey, cancel: CancelFlag, generation: u64) -> Self {
        Self {
            key,
            cancel,
            requests: Vec::new(),
            started: Instant::now(),
            generation,
        }
    }

    pub(crate) fn attach(&mut self, id: RequestId, callback: Callback) {
        self.requests.push(PendingRequest {
            id,
            callback: Some(callback),
        });
    }

    /// Drop the callback of request `id`, returning whether it was live
    pub(crate) fn cancel_request(&mut self, id: RequestId) -> bool {
        self.requests
            .iter_mut()
            .find(|request| request.id == id)
            .and_then(|request| request.callback.take())
            .is_some()
    }

    pub(crate) fn live_requests(&self) -> usize {
        self.requests
            .iter()
            .filter(|request| request.callback.is_some())
            .count()
    }
}

/// Result posted from a worker to the owning context
pub(crate) struct Completion {
    pub(crate) job: JobId,
    pub(crate) cancel: CancelFlag,
    pub(crate) outcome: VerifyOutcome,
}

/// Lock a delivery flag, recovering from poisoning
pub(crate) fn lock_flag(flag: &Mutex<bool>) -> MutexGuard<'_, bool> {
    match flag.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!(target: "certverify::scheduler", "Cancel flag lock poisoned, recovering");
            poisoned.into_inner()
        }
    }
}
