mod common;

use std::sync::Arc;
use std::time::Duration;

use certverify_core::error::CertError;
use certverify_core::pool::{ThreadPool, TokioBlockingPool};
use certverify_core::trust_anchor::StaticTrustAnchors;
use certverify_core::verify::{CertStatus, VerifyFlags};
use certverify_core::{MultiThreadedCertVerifier, VerifyRequest, VerifyStart};
use common::{
    Delivered, MockPlatform, RejectingPool, TestCert, chain_for, engine_with, manual_verifier,
    verify_now,
};

fn request(host: &str) -> VerifyRequest {
    VerifyRequest::new(chain_for(host), host)
}

#[test]
fn test_second_call_is_served_from_cache() {
    let (mut verifier, pool, _clock, platform) =
        manual_verifier(MockPlatform::failing(CertStatus::DATE_INVALID));

    let first = verify_now(&mut verifier, &pool, request("example.com"));
    assert_eq!(first.status, Err(CertError::DateInvalid));

    let start = verifier.verify(request("example.com"), |_| panic!("cache hits never call back"));
    let second = start.completed().expect("cache hit");
    assert_eq!(second.status, first.status);
    assert_eq!(second.result.cert_status, first.result.cert_status);

    let stats = verifier.stats();
    assert_eq!(stats.requests, 2);
    assert_eq!(stats.cache_hits, 1);
    assert_eq!(stats.cache_size, 1);
    assert_eq!(platform.calls(), 1);
}

#[test]
fn test_identical_requests_share_one_job() {
    let (mut verifier, pool, _clock, platform) = manual_verifier(MockPlatform::trusted());
    let first = Delivered::default();
    let second = Delivered::default();

    assert!(verifier.verify(request("example.com"), first.callback()).is_pending());
    assert!(verifier.verify(request("example.com"), second.callback()).is_pending());
    assert_eq!(pool.pending(), 1);
    assert_eq!(verifier.inflight_jobs(), 1);
    assert_eq!(verifier.stats().inflight_joins, 1);

    assert_eq!(pool.run_all(), 1);
    assert_eq!(verifier.process_completions(), 1);
    assert_eq!(first.count(), 1);
    assert_eq!(second.count(), 1);
    assert_eq!(first.last(), second.last());
    assert_eq!(verifier.inflight_jobs(), 0);
    assert_eq!(platform.calls(), 1);
}

#[test]
fn test_canceled_request_never_called_back() {
    let (mut verifier, pool, _clock, _platform) = manual_verifier(MockPlatform::trusted());
    let canceled = Delivered::default();
    let sibling = Delivered::default();

    let handle = verifier
        .verify(request("example.com"), canceled.callback())
        .handle()
        .expect("pending");
    verifier.verify(request("example.com"), sibling.callback());

    assert!(verifier.cancel_request(handle));
    assert!(!verifier.cancel_request(handle));

    pool.run_all();
    verifier.process_completions();
    assert_eq!(canceled.count(), 0);
    assert_eq!(sibling.count(), 1);
}

#[test]
fn test_job_finishing_after_verifier_dropped() {
    let (mut verifier, pool, _clock, platform) = manual_verifier(MockPlatform::trusted());
    let delivered = Delivered::default();
    let handle = verifier
        .verify(request("example.com"), delivered.callback())
        .handle()
        .expect("pending");
    assert!(verifier.cancel_request(handle));
    drop(verifier);

    assert_eq!(pool.run_all(), 1);
    assert_eq!(platform.calls(), 1);
    assert_eq!(delivered.count(), 0);
}

#[test]
fn test_clear_cache_forces_fresh_dispatch() {
    let (mut verifier, pool, _clock, platform) = manual_verifier(MockPlatform::trusted());
    verify_now(&mut verifier, &pool, request("example.com"));

    verifier.clear_cache();
    let start = verifier.verify(request("example.com"), Delivered::default().callback());
    assert!(start.is_pending());
    pool.run_all();
    verifier.process_completions();
    assert_eq!(platform.calls(), 2);
    assert_eq!(verifier.stats().cache_hits, 0);
}

#[test]
fn test_trust_store_change_invalidates_cache() {
    let (mut verifier, pool, _clock, platform) = manual_verifier(MockPlatform::trusted());
    verify_now(&mut verifier, &pool, request("example.com"));

    verifier.on_trust_store_changed();
    verify_now(&mut verifier, &pool, request("example.com"));
    assert_eq!(platform.calls(), 2);

    let epoch = verifier.trust_store_epoch();
    std::thread::spawn(move || epoch.notify_changed())
        .join()
        .unwrap();
    verify_now(&mut verifier, &pool, request("example.com"));
    assert_eq!(platform.calls(), 3);

    verify_now(&mut verifier, &pool, request("example.com"));
    assert_eq!(platform.calls(), 3);
}

#[test]
fn test_result_started_before_trust_store_change_is_not_cached() {
    let (mut verifier, pool, _clock, platform) = manual_verifier(MockPlatform::trusted());
    let delivered = Delivered::default();

    assert!(verifier.verify(request("example.com"), delivered.callback()).is_pending());
    verifier.on_trust_store_changed();
    assert_eq!(pool.run_all(), 1);
    assert_eq!(verifier.process_completions(), 1);
    assert_eq!(delivered.count(), 1);
    assert!(delivered.last().unwrap().is_ok());
    assert_eq!(verifier.stats().cache_size, 0);

    let start = verifier.verify(request("example.com"), delivered.callback());
    assert!(start.is_pending());
    assert_eq!(pool.run_all(), 1);
    assert_eq!(verifier.process_completions(), 1);
    assert_eq!(delivered.count(), 2);
    assert_eq!(platform.calls(), 2);
}

#[test]
fn test_trust_store_change_detaches_running_job() {
    let (mut verifier, pool, _clock, platform) = manual_verifier(MockPlatform::trusted());
    let before = Delivered::default();
    let after = Delivered::default();

    assert!(verifier.verify(request("example.com"), before.callback()).is_pending());
    verifier.on_trust_store_changed();
    assert!(verifier.verify(request("example.com"), after.callback()).is_pending());
    assert_eq!(pool.pending(), 2);
    assert_eq!(verifier.inflight_jobs(), 2);
    assert_eq!(verifier.stats().inflight_joins, 0);

    assert_eq!(pool.run_all(), 2);
    assert_eq!(verifier.process_completions(), 2);
    assert_eq!(before.count(), 1);
    assert_eq!(after.count(), 1);
    assert_eq!(verifier.inflight_jobs(), 0);
    assert_eq!(platform.calls(), 2);

    let start = verifier.verify(request("example.com"), |_| panic!("cache hits never call back"));
    assert!(start.completed().is_some());
    assert_eq!(platform.calls(), 2);
}

#[test]
fn test_epoch_bump_during_verification_skips_cache() {
    let (mut verifier, pool, _clock, platform) = manual_verifier(MockPlatform::trusted());
    let delivered = Delivered::default();

    assert!(verifier.verify(request("example.com"), delivered.callback()).is_pending());
    assert_eq!(pool.run_all(), 1);
    let epoch = verifier.trust_store_epoch();
    std::thread::spawn(move || epoch.notify_changed())
        .join()
        .unwrap();

    assert_eq!(verifier.process_completions(), 1);
    assert_eq!(delivered.count(), 1);
    assert_eq!(verifier.stats().cache_size, 0);

    verify_now(&mut verifier, &pool, request("example.com"));
    assert_eq!(platform.calls(), 2);
}

#[test]
fn test_canceling_detached_request() {
    let (mut verifier, pool, _clock, _platform) = manual_verifier(MockPlatform::trusted());
    let delivered = Delivered::default();

    let handle = verifier
        .verify(request("example.com"), delivered.callback())
        .handle()
        .expect("pending");
    verifier.on_trust_store_changed();
    assert!(verifier.cancel_request(handle));

    pool.run_all();
    verifier.process_completions();
    assert_eq!(delivered.count(), 0);
    assert_eq!(verifier.inflight_jobs(), 0);
}

#[test]
fn test_cache_window_follows_wall_clock() {
    let (mut verifier, pool, clock, platform) = manual_verifier(MockPlatform::trusted());
    verify_now(&mut verifier, &pool, request("example.com"));

    clock.advance(Duration::from_secs(29 * 60));
    assert!(!verifier.verify(request("example.com"), |_| {}).is_pending());
    assert_eq!(platform.calls(), 1);

    clock.advance(Duration::from_secs(2 * 60));
    verify_now(&mut verifier, &pool, request("example.com"));
    assert_eq!(platform.calls(), 2);
}

#[test]
fn test_clock_moved_backwards_misses_cache() {
    let (mut verifier, pool, clock, platform) = manual_verifier(MockPlatform::trusted());
    verify_now(&mut verifier, &pool, request("example.com"));

    clock.rewind(Duration::from_secs(60));
    verify_now(&mut verifier, &pool, request("example.com"));
    assert_eq!(platform.calls(), 2);
}

#[test]
fn test_empty_hostname_is_rejected_synchronously() {
    let (mut verifier, pool, _clock, platform) = manual_verifier(MockPlatform::trusted());
    let start = verifier.verify(VerifyRequest::new(chain_for("example.com"), ""), |_| {
        panic!("rejected calls never call back")
    });
    let outcome = start.completed().expect("synchronous");
    assert_eq!(outcome.status, Err(CertError::InvalidArgument));
    assert_eq!(pool.pending(), 0);
    assert_eq!(verifier.stats().requests, 0);
    assert_eq!(verifier.cache().len(), 0);
    assert_eq!(platform.calls(), 0);
}

#[test]
fn test_rejected_dispatch_is_resource_exhausted() {
    let (engine, platform) = engine_with(MockPlatform::trusted());
    let mut verifier = MultiThreadedCertVerifier::new(engine, Arc::new(RejectingPool));

    for _ in 0..2 {
        let outcome = verifier
            .verify(request("example.com"), |_| panic!("never dispatched"))
            .completed()
            .expect("synchronous");
        assert_eq!(outcome.status, Err(CertError::ResourceExhausted));
        assert_eq!(verifier.inflight_jobs(), 0);
    }
    assert_eq!(verifier.stats().requests, 2);
    assert_eq!(platform.calls(), 0);
}

#[test]
fn test_differing_requests_do_not_coalesce() {
    let (mut verifier, pool, _clock, _platform) = manual_verifier(MockPlatform::trusted());
    let delivered = Delivered::default();

    verifier.verify(request("example.com"), delivered.callback());
    verifier.verify(request("example.org"), delivered.callback());
    verifier.verify(
        request("example.com").with_flags(VerifyFlags::REV_CHECKING_ENABLED),
        delivered.callback(),
    );
    verifier.verify(
        request("example.com").with_additional_trust_anchors(vec![TestCert::ca("Pinned").build()]),
        delivered.callback(),
    );
    assert_eq!(pool.pending(), 4);
    assert_eq!(verifier.stats().inflight_joins, 0);

    pool.run_all();
    assert_eq!(verifier.process_completions(), 4);
    assert_eq!(delivered.count(), 4);
}

#[test]
fn test_trust_anchor_source_changes_the_key() {
    let (mut verifier, pool, _clock, platform) = manual_verifier(MockPlatform::trusted());
    verify_now(&mut verifier, &pool, request("example.com"));

    verifier.set_trust_anchor_source(StaticTrustAnchors::new(vec![TestCert::ca("Corp Root").build()]));
    verify_now(&mut verifier, &pool, request("example.com"));
    assert_eq!(platform.calls(), 2);

    verifier.clear_trust_anchor_source();
    verify_now(&mut verifier, &pool, request("example.com"));
    assert_eq!(platform.calls(), 2);
}

#[test]
fn test_zero_capacity_disables_cache() {
    let (engine, platform) = engine_with(MockPlatform::trusted());
    let pool = common::ManualPool::default();
    let mut verifier =
        MultiThreadedCertVerifier::new(engine, Arc::new(pool.clone())).with_cache_capacity(0);

    verify_now(&mut verifier, &pool, request("example.com"));
    verify_now(&mut verifier, &pool, request("example.com"));
    assert_eq!(platform.calls(), 2);
    assert_eq!(verifier.stats().cache_size, 0);
}

#[test]
fn test_thread_pool_round_trip() {
    let (engine, platform) = engine_with(MockPlatform::known_root());
    let pool = Arc::new(ThreadPool::new(2, 16).unwrap());
    let mut verifier = MultiThreadedCertVerifier::new(engine, pool);
    let delivered = Delivered::default();

    let start = verifier.verify(request("intranet"), delivered.callback());
    assert!(start.is_pending());
    assert_eq!(verifier.wait_for_completion(Duration::from_secs(10)), 1);

    let outcome = delivered.last().expect("delivered");
    assert_eq!(outcome.status, Ok(()));
    assert!(outcome.result.cert_status.contains(CertStatus::NON_UNIQUE_NAME));
    assert_eq!(platform.calls(), 1);
    assert_eq!(verifier.wait_for_completion(Duration::from_millis(10)), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_tokio_blocking_pool_round_trip() {
    let (engine, _platform) = engine_with(MockPlatform::trusted());
    let pool = TokioBlockingPool::try_current().expect("inside a runtime");
    let mut verifier = MultiThreadedCertVerifier::new(engine, Arc::new(pool));
    let delivered = Delivered::default();

    assert!(matches!(
        verifier.verify(request("example.com"), delivered.callback()),
        VerifyStart::Pending(_)
    ));
    assert_eq!(verifier.wait_for_completion(Duration::from_secs(10)), 1);
    assert_eq!(delivered.count(), 1);
}
