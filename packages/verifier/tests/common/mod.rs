//! Shared test doubles: deterministic pool and clock, a scriptable platform
//! verifier and synthetic certificates

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use certverify_core::cache::CacheClock;
use certverify_core::cert::{
    Certificate, CertificateChain, CertificateInfo, HashValue, KeyType, PublicKeyInfo,
    SignatureDigest,
};
use certverify_core::error::VerifyStatus;
use certverify_core::platform::{PlatformRequest, PlatformVerifier};
use certverify_core::pool::{BlockingTask, WorkerPool};
use certverify_core::verify::{CertStatus, PolicyEngine, VerifyOutcome, VerifyResult};
use certverify_core::{MultiThreadedCertVerifier, VerifyRequest, VerifyStart};

/// Holds posted tasks until the test runs them
#[derive(Clone, Default)]
pub struct ManualPool {
    tasks: Arc<Mutex<VecDeque<BlockingTask>>>,
}

impl ManualPool {
    pub fn pending(&self) -> usize {
        self.tasks.lock().unwrap().len()
    }

    /// Run every queued task on the calling thread
    pub fn run_all(&self) -> usize {
        let mut ran = 0;
        loop {
            let task = self.tasks.lock().unwrap().pop_front();
            match task {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => return ran,
            }
        }
    }
}

impl WorkerPool for ManualPool {
    fn post_blocking_task(&self, task: BlockingTask) -> bool {
        self.tasks.lock().unwrap().push_back(task);
        true
    }
}

/// Refuses every task
pub struct RejectingPool;

impl WorkerPool for RejectingPool {
    fn post_blocking_task(&self, _task: BlockingTask) -> bool {
        false
    }
}

/// Settable wall clock shared between the test and the verifier
#[derive(Clone)]
pub struct ManualClock {
    now: Rc<RefCell<SystemTime>>,
}

impl ManualClock {
    pub fn new(start: SystemTime) -> Self {
        Self {
            now: Rc::new(RefCell::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.borrow_mut();
        *now += by;
    }

    pub fn rewind(&self, by: Duration) {
        let mut now = self.now.borrow_mut();
        *now -= by;
    }
}

impl CacheClock for ManualClock {
    fn now(&self) -> SystemTime {
        *self.now.borrow()
    }
}

/// Platform verifier that trusts whatever it is told to
#[derive(Default)]
pub struct MockPlatform {
    pub base_status: CertStatus,
    pub known_root: bool,
    pub additional_anchor: bool,
    /// Hashes reported in addition to the chain's own keys
    pub extra_hashes: Vec<HashValue>,
    pub panic: bool,
    calls: AtomicUsize,
}

impl MockPlatform {
    pub fn trusted() -> Self {
        Self::default()
    }

    pub fn known_root() -> Self {
        Self {
            known_root: true,
            ..Self::default()
        }
    }

    pub fn failing(status: CertStatus) -> Self {
        Self {
            base_status: status,
            ..Self::default()
        }
    }

    pub fn panicking() -> Self {
        Self {
            panic: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PlatformVerifier for MockPlatform {
    fn verify(&self, request: &PlatformRequest<'_>, result: &mut VerifyResult) -> VerifyStatus {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.panic {
            panic!("platform verifier fault");
        }

        let chain = request.chain;
        result.verified_cert = Some(chain.clone());
        result.public_key_hashes = chain.iter().flat_map(Certificate::spki_hashes).collect();
        result.public_key_hashes.extend(self.extra_hashes.iter().copied());
        result.is_issued_by_known_root = self.known_root;
        result.is_issued_by_additional_trust_anchor = self.additional_anchor;
        for (index, cert) in chain.iter().enumerate() {
            match cert.info().signature_digest {
                SignatureDigest::Md2 => result.has_md2 = true,
                SignatureDigest::Md4 => result.has_md4 = true,
                SignatureDigest::Md5 => result.has_md5 = true,
                SignatureDigest::Sha1 => {
                    result.has_sha1 = true;
                    result.has_sha1_leaf |= index == 0;
                }
                _ => {}
            }
        }
        result.cert_status |= self.base_status;
        match result.cert_status.to_error() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// Builder for certificates that never existed as DER.
///
/// The bytes handed to `Certificate::from_parts` are derived from the fields,
/// so two specs differing in any field have different fingerprints.
#[derive(Debug, Clone)]
pub struct TestCert {
    name: String,
    info: CertificateInfo,
}

impl TestCert {
    pub fn new(name: &str) -> Self {
        let now = SystemTime::now();
        let subject = format!("CN={name}").into_bytes();
        Self {
            name: name.to_owned(),
            info: CertificateInfo {
                serial: vec![0x01, name.len() as u8],
                subject_der: subject.clone(),
                issuer_der: subject,
                subject_common_name: Some(name.to_owned()),
                issuer_common_name: Some(name.to_owned()),
                dns_names: vec![name.to_owned()],
                ip_addresses: Vec::new(),
                not_before: now - Duration::from_secs(30 * 24 * 3600),
                not_after: now + Duration::from_secs(300 * 24 * 3600),
                public_key: PublicKeyInfo {
                    key_type: KeyType::Rsa,
                    size_bits: 2048,
                    spki_der: format!("spki:{name}:rsa:2048").into_bytes(),
                },
                signature_digest: SignatureDigest::Sha256,
                is_ca: false,
            },
        }
    }

    pub fn ca(name: &str) -> Self {
        let mut cert = Self::new(name);
        cert.info.dns_names.clear();
        cert.info.is_ca = true;
        cert
    }

    pub fn key(mut self, key_type: KeyType, size_bits: u32) -> Self {
        self.info.public_key = PublicKeyInfo {
            key_type,
            size_bits,
            spki_der: format!("spki:{}:{}:{size_bits}", self.name, key_type.as_str()).into_bytes(),
        };
        self
    }

    pub fn digest(mut self, digest: SignatureDigest) -> Self {
        self.info.signature_digest = digest;
        self
    }

    pub fn serial(mut self, serial: &[u8]) -> Self {
        self.info.serial = serial.to_vec();
        self
    }

    pub fn dns_names(mut self, names: &[&str]) -> Self {
        self.info.dns_names = names.iter().map(|name| (*name).to_owned()).collect();
        self
    }

    pub fn validity(mut self, not_before: SystemTime, not_after: SystemTime) -> Self {
        self.info.not_before = not_before;
        self.info.not_after = not_after;
        self
    }

    pub fn issued_by(mut self, issuer: &TestCert) -> Self {
        self.info.issuer_der = issuer.info.subject_der.clone();
        self.info.issuer_common_name = issuer.info.subject_common_name.clone();
        self
    }

    pub fn issuer_common_name(mut self, name: &str) -> Self {
        self.info.issuer_common_name = Some(name.to_owned());
        self
    }

    pub fn build(&self) -> Certificate {
        let der = format!("{:?}", self.info).into_bytes();
        Certificate::from_parts(der, self.info.clone())
    }
}

/// Leaf for `host` issued by an intermediate
pub fn chain_for(host: &str) -> CertificateChain {
    let intermediate = TestCert::ca("Test Intermediate");
    let leaf = TestCert::new(host).issued_by(&intermediate);
    CertificateChain::new(leaf.build(), vec![intermediate.build()])
}

/// Callback sink recording every delivered outcome
#[derive(Clone, Default)]
pub struct Delivered {
    outcomes: Rc<RefCell<Vec<VerifyOutcome>>>,
}

impl Delivered {
    pub fn callback(&self) -> impl FnOnce(VerifyOutcome) + 'static {
        let outcomes = Rc::clone(&self.outcomes);
        move |outcome| outcomes.borrow_mut().push(outcome)
    }

    pub fn count(&self) -> usize {
        self.outcomes.borrow().len()
    }

    pub fn last(&self) -> Option<VerifyOutcome> {
        self.outcomes.borrow().last().cloned()
    }
}

/// Engine over `platform`, returning the platform for call counting
pub fn engine_with(platform: MockPlatform) -> (PolicyEngine, Arc<MockPlatform>) {
    let platform = Arc::new(platform);
    let engine = PolicyEngine::new(Arc::clone(&platform) as Arc<dyn PlatformVerifier>);
    (engine, platform)
}

/// Verifier on a manual pool and clock
pub fn manual_verifier(
    platform: MockPlatform,
) -> (MultiThreadedCertVerifier, ManualPool, ManualClock, Arc<MockPlatform>) {
    let (engine, platform) = engine_with(platform);
    let pool = ManualPool::default();
    let clock = ManualClock::new(SystemTime::now());
    let verifier = MultiThreadedCertVerifier::new(engine, Arc::new(pool.clone()))
        .with_clock(clock.clone());
    (verifier, pool, clock, platform)
}

/// Run one request to completion and return its outcome
pub fn verify_now(
    verifier: &mut MultiThreadedCertVerifier,
    pool: &ManualPool,
    request: VerifyRequest,
) -> VerifyOutcome {
    let delivered = Delivered::default();
    match verifier.verify(request, delivered.callback()) {
        VerifyStart::Completed(outcome) => outcome,
        VerifyStart::Pending(_) => {
            pool.run_all();
            verifier.process_completions();
            delivered.last().expect("callback delivered")
        }
    }
}
