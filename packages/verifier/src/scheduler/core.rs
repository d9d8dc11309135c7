//! Request coalescing scheduler

use std::collections::{BTreeMap, HashMap};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, unbounded};

use super::job::{CancelFlag, Completion, Job, JobId, lock_flag};
use super::request::{RequestHandle, RequestId, VerifyRequest, VerifyStart};
use crate::cache::{CacheClock, CachedEntry, RequestCache, RequestKey, SystemClock, TrustStoreEpoch};
use crate::error::CertError;
use crate::pool::WorkerPool;
use crate::telemetry::{VerifierStats, VerifierStatsSnapshot};
use crate::trust_anchor::TrustAnchorSource;
use crate::verify::{CertStatus, PolicyEngine, VerifyOutcome, VerifyResult};

/// How long a finished verification is served from the cache
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30 * 60);

/// Asynchronous certificate verifier with a result cache and at most one
/// joinable verification per request key.
///
/// The verifier lives on one owning context (thread or event loop) and all of
/// its methods are called from there. Verifications run on a [`WorkerPool`];
/// their results come back over a channel and are applied by
/// [`process_completions`](Self::process_completions) or
/// [`wait_for_completion`](Self::wait_for_completion), which also run the
/// callbacks.
///
/// A trust store change detaches the running jobs: later calls start fresh
/// verifications, while the detached jobs still answer their own callers but
/// leave the cache alone.
pub struct MultiThreadedCertVerifier {
    engine: PolicyEngine,
    pool: Arc<dyn WorkerPool>,
    cache: RequestCache,
    cache_ttl: Duration,
    clock: Box<dyn CacheClock>,
    jobs: HashMap<JobId, Job>,
    /// Jobs new calls may join, by key
    inflight: BTreeMap<RequestKey, JobId>,
    request_index: HashMap<RequestId, JobId>,
    next_request_id: u64,
    next_job_id: u64,
    cache_generation: u64,
    completion_tx: Sender<Completion>,
    completion_rx: Receiver<Completion>,
    trust_anchor_source: Option<Box<dyn TrustAnchorSource>>,
    trust_store_epoch: TrustStoreEpoch,
    seen_epoch: u64,
    stats: VerifierStats,
}

impl std::fmt::Debug for MultiThreadedCertVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiThreadedCertVerifier")
            .field("cache_entries", &self.cache.len())
            .field("jobs", &self.jobs.len())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl MultiThreadedCertVerifier {
    #[must_use]
    pub fn new(engine: PolicyEngine, pool: Arc<dyn WorkerPool>) -> Self {
        let (completion_tx, completion_rx) = unbounded();
        let trust_store_epoch = TrustStoreEpoch::new();
        let seen_epoch = trust_store_epoch.current();
        Self {
            engine,
            pool,
            cache: RequestCache::default(),
            cache_ttl: DEFAULT_CACHE_TTL,
            clock: Box::new(SystemClock),
            jobs: HashMap::new(),
            inflight: BTreeMap::new(),
            request_index: HashMap::new(),
            next_request_id: 0,
            next_job_id: 0,
            cache_generation: 0,
            completion_tx,
            completion_rx,
            trust_anchor_source: None,
            trust_store_epoch,
            seen_epoch,
            stats: VerifierStats::default(),
        }
    }

    /// Replace the cache with an empty one holding at most `capacity` entries
    #[must_use]
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache = RequestCache::new(capacity);
        self
    }

    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: impl CacheClock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Follow an existing trust-store generation counter
    #[must_use]
    pub fn with_trust_store_epoch(mut self, epoch: TrustStoreEpoch) -> Self {
        self.seen_epoch = epoch.current();
        self.trust_store_epoch = epoch;
        self
    }

    /// Start verifying `request`.
    ///
    /// Cache hits and rejected calls complete synchronously and never invoke
    /// `callback`. Otherwise the call is attached to the running job for the
    /// same key, or a new job is dispatched, and `callback` fires exactly once
    /// from a later `process_completions` unless the request is canceled.
    pub fn verify(
        &mut self,
        request: VerifyRequest,
        callback: impl FnOnce(VerifyOutcome) + 'static,
    ) -> VerifyStart {
        if request.hostname.is_empty() {
            tracing::debug!(target: "certverify::scheduler", "Rejecting request with empty hostname");
            return VerifyStart::Completed(VerifyOutcome::rejected(CertError::InvalidArgument));
        }

        self.stats.record_request();
        self.observe_trust_store_epoch();

        let mut anchors = self
            .trust_anchor_source
            .as_ref()
            .map(|source| source.additional_trust_anchors())
            .unwrap_or_default();
        anchors.extend(request.additional_trust_anchors.iter().cloned());

        let key = RequestKey::new(&request.chain, &request.hostname, request.flags, &anchors);

        let now = self.clock.now();
        if let Some(entry) = self.cache.get(&key, now) {
            self.stats.record_cache_hit();
            tracing::trace!(
                target: "certverify::scheduler",
                hostname = %request.hostname,
                "Served verification from cache"
            );
            return VerifyStart::Completed(entry.outcome.clone());
        }

        let id = self.allocate_request_id();

        if let Some(&job_id) = self.inflight.get(&key)
            && let Some(job) = self.jobs.get_mut(&job_id)
        {
            job.attach(id, Box::new(callback));
            self.request_index.insert(id, job_id);
            self.stats.record_inflight_join();
            tracing::trace!(
                target: "certverify::scheduler",
                hostname = %request.hostname,
                "Joined in-flight verification"
            );
            return VerifyStart::Pending(RequestHandle::new(id));
        }

        let job_id = self.allocate_job_id();
        let cancel: CancelFlag = Arc::new(Mutex::new(false));
        let task = {
            let engine = self.engine.clone();
            let sender = self.completion_tx.clone();
            let cancel = Arc::clone(&cancel);
            let VerifyRequest {
                chain,
                hostname,
                flags,
                crl_set,
                ..
            } = request;
            Box::new(move || {
                let outcome = catch_unwind(AssertUnwindSafe(|| {
                    engine.verify(&chain, &hostname, flags, crl_set.as_deref(), &anchors)
                }))
                .unwrap_or_else(|_| {
                    tracing::error!(
                        target: "certverify::scheduler",
                        hostname = %hostname,
                        "Verification panicked"
                    );
                    let result = VerifyResult {
                        cert_status: CertStatus::INVALID,
                        ..VerifyResult::default()
                    };
                    VerifyOutcome::new(Err(CertError::Invalid), result)
                });
                let canceled = lock_flag(&cancel);
                if *canceled {
                    return;
                }
                let completion = Completion {
                    job: job_id,
                    cancel: Arc::clone(&cancel),
                    outcome,
                };
                if sender.send(completion).is_err() {
                    tracing::trace!(
                        target: "certverify::scheduler",
                        "Verifier dropped before completion was delivered"
                    );
                }
                drop(canceled);
            })
        };

        if !self.pool.post_blocking_task(task) {
            tracing::warn!(
                target: "certverify::scheduler",
                hostname = %key.hostname(),
                "Worker pool rejected verification"
            );
            return VerifyStart::Completed(VerifyOutcome::rejected(CertError::ResourceExhausted));
        }

        tracing::debug!(
            target: "certverify::scheduler",
            hostname = %key.hostname(),
            jobs = self.jobs.len() + 1,
            "Dispatched verification"
        );

        let mut job = Job::new(key.clone(), cancel, self.cache_generation);
        job.attach(id, Box::new(callback));
        self.request_index.insert(id, job_id);
        self.inflight.insert(key, job_id);
        self.jobs.insert(job_id, job);
        VerifyStart::Pending(RequestHandle::new(id))
    }

    /// Cancel a pending call. Its callback will never run; the underlying job
    /// and any other callers joined to it are unaffected. Returns false if the
    /// request already completed or was canceled.
    pub fn cancel_request(&mut self, handle: RequestHandle) -> bool {
        let Some(job_id) = self.request_index.remove(&handle.id()) else {
            return false;
        };
        match self.jobs.get_mut(&job_id) {
            Some(job) => job.cancel_request(handle.id()),
            None => false,
        }
    }

    /// Apply every completion that has arrived, without blocking. Returns the
    /// number of jobs finished.
    pub fn process_completions(&mut self) -> usize {
        let mut finished = 0;
        loop {
            match self.completion_rx.try_recv() {
                Ok(completion) => {
                    if self.handle_completion(completion) {
                        finished += 1;
                    }
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return finished,
            }
        }
    }

    /// Block up to `timeout` for at least one completion, then apply it and
    /// any others already queued. Returns the number of jobs finished.
    pub fn wait_for_completion(&mut self, timeout: Duration) -> usize {
        if self.jobs.is_empty() {
            return 0;
        }
        match self.completion_rx.recv_timeout(timeout) {
            Ok(completion) => {
                let first = usize::from(self.handle_completion(completion));
                first + self.process_completions()
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => 0,
        }
    }

    /// Install the source consulted for extra anchors on every later call
    pub fn set_trust_anchor_source(&mut self, source: impl TrustAnchorSource + 'static) {
        self.trust_anchor_source = Some(Box::new(source));
    }

    pub fn clear_trust_anchor_source(&mut self) {
        self.trust_anchor_source = None;
    }

    /// Drop every cached verification
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// The trusted roots changed; no cached decision or running job may be
    /// reused by later calls
    pub fn on_trust_store_changed(&mut self) {
        tracing::info!(target: "certverify::scheduler", "Trust store changed, clearing cache");
        self.invalidate();
        self.seen_epoch = self.trust_store_epoch.current();
    }

    /// Counter other threads can bump to invalidate this verifier's cache
    #[must_use]
    pub fn trust_store_epoch(&self) -> TrustStoreEpoch {
        self.trust_store_epoch.clone()
    }

    #[must_use]
    pub fn stats(&self) -> VerifierStatsSnapshot {
        self.stats.snapshot(self.cache.len())
    }

    /// Running verifications, including ones detached by a trust store change
    #[must_use]
    pub fn inflight_jobs(&self) -> usize {
        self.jobs.len()
    }

    #[must_use]
    pub fn cache(&self) -> &RequestCache {
        &self.cache
    }

    #[must_use]
    pub fn engine(&self) -> &PolicyEngine {
        &self.engine
    }

    fn allocate_request_id(&mut self) -> RequestId {
        self.next_request_id += 1;
        RequestId(self.next_request_id)
    }

    fn allocate_job_id(&mut self) -> JobId {
        self.next_job_id += 1;
        JobId(self.next_job_id)
    }

    fn invalidate(&mut self) {
        self.cache.clear();
        self.cache_generation += 1;
        if !self.inflight.is_empty() {
            tracing::debug!(
                target: "certverify::scheduler",
                detached = self.inflight.len(),
                "Detaching running verifications from the cache"
            );
            self.inflight.clear();
        }
    }

    fn observe_trust_store_epoch(&mut self) {
        let current = self.trust_store_epoch.current();
        if current != self.seen_epoch {
            tracing::debug!(
                target: "certverify::scheduler",
                from = self.seen_epoch,
                to = current,
                "Trust store generation moved, clearing cache"
            );
            self.invalidate();
            self.seen_epoch = current;
        }
    }

    fn handle_completion(&mut self, completion: Completion) -> bool {
        let Completion {
            job: job_id,
            cancel,
            outcome,
        } = completion;

        // Teardown may have raced the worker's send
        if *lock_flag(&cancel) {
            return false;
        }

        self.observe_trust_store_epoch();

        let Some(job) = self.jobs.remove(&job_id) else {
            tracing::warn!(target: "certverify::scheduler", "Completion for unknown job");
            return false;
        };
        if self.inflight.get(&job.key) == Some(&job_id) {
            self.inflight.remove(&job.key);
        }

        if job.generation == self.cache_generation {
            let now = self.clock.now();
            self.cache.put(
                job.key.clone(),
                CachedEntry::new(outcome.clone(), now, now + self.cache_ttl),
            );
        } else {
            tracing::trace!(
                target: "certverify::scheduler",
                hostname = %job.key.hostname(),
                "Not caching result from before a trust store change"
            );
        }

        tracing::debug!(
            target: "certverify::scheduler",
            hostname = %job.key.hostname(),
            ok = outcome.is_ok(),
            waiters = job.live_requests(),
            elapsed_ms = job.started.elapsed().as_millis() as u64,
            "Verification completed"
        );

        for request in job.requests {
            self.request_index.remove(&request.id);
            if let Some(callback) = request.callback {
                callback(outcome.clone());
            }
        }
        true
    }
}

impl Drop for MultiThreadedCertVerifier {
    fn drop(&mut self) {
        for (_, job) in std::mem::take(&mut self.jobs) {
            *lock_flag(&job.cancel) = true;
            if !std::thread::panicking() {
                debug_assert_eq!(
                    job.live_requests(),
                    0,
                    "verifier dropped with uncanceled requests for {}",
                    job.key.hostname()
                );
            }
        }
        self.inflight.clear();
        self.request_index.clear();
    }
}
