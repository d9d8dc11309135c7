mod common;

use std::cmp::Ordering;

use certverify_core::cache::RequestKey;
use certverify_core::cert::CertificateChain;
use certverify_core::verify::VerifyFlags;
use common::{TestCert, chain_for};

fn assert_distinct(a: &RequestKey, b: &RequestKey) {
    assert_ne!(a, b);
    assert_ne!(a.cmp(b), Ordering::Equal);
    assert_eq!(a.cmp(b), b.cmp(a).reverse());
}

#[test]
fn test_identical_inputs_give_equal_keys() {
    let chain = chain_for("example.com");
    let a = RequestKey::new(&chain, "example.com", VerifyFlags::empty(), &[]);
    let b = RequestKey::new(&chain.clone(), "example.com", VerifyFlags::empty(), &[]);
    assert_eq!(a, b);
    assert_eq!(a.cmp(&b), Ordering::Equal);
}

#[test]
fn test_each_field_discriminates() {
    let chain = chain_for("example.com");
    let anchor = TestCert::ca("Pinned Root").build();
    let base = RequestKey::new(&chain, "example.com", VerifyFlags::empty(), &[]);

    assert_distinct(&base, &RequestKey::new(&chain, "www.example.com", VerifyFlags::empty(), &[]));
    assert_distinct(&base, &RequestKey::new(&chain, "example.com", VerifyFlags::EV_CERT, &[]));
    assert_distinct(
        &base,
        &RequestKey::new(&chain, "example.com", VerifyFlags::empty(), &[anchor]),
    );

    let other_leaf = chain_for("example.org");
    assert_distinct(&base, &RequestKey::new(&other_leaf, "example.com", VerifyFlags::empty(), &[]));

    let bare = CertificateChain::single(chain.leaf().clone());
    assert_distinct(&base, &RequestKey::new(&bare, "example.com", VerifyFlags::empty(), &[]));
}

#[test]
fn test_anchor_order_matters() {
    let chain = chain_for("example.com");
    let first = TestCert::ca("Root A").build();
    let second = TestCert::ca("Root B").build();
    let forward = RequestKey::new(
        &chain,
        "example.com",
        VerifyFlags::empty(),
        &[first.clone(), second.clone()],
    );
    let reverse = RequestKey::new(&chain, "example.com", VerifyFlags::empty(), &[second, first]);
    assert_distinct(&forward, &reverse);
}
