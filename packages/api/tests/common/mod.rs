//! Certificates issued by throwaway CAs

#![allow(dead_code)]

use certverify::{Certificate, CertificateChain};
use chrono::Datelike;
use rcgen::{
    BasicConstraints, CertificateParams, DistinguishedName, DnType, ExtendedKeyUsagePurpose,
    IsCa, Issuer, KeyPair, KeyUsagePurpose,
};

pub struct TestCa {
    pub root: Certificate,
    issuer: Issuer<'static, KeyPair>,
}

impl TestCa {
    pub fn new(name: &str) -> Self {
        let mut params = CertificateParams::new(Vec::default()).unwrap();
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        params.key_usages = vec![KeyUsagePurpose::KeyCertSign, KeyUsagePurpose::CrlSign];
        let mut dn = DistinguishedName::new();
        dn.push(DnType::CommonName, name);
        params.distinguished_name = dn;
        with_validity(&mut params);

        let key_pair = KeyPair::generate().unwrap();
        let cert = params.clone().self_signed(&key_pair).unwrap();
        Self {
            root: Certificate::from_der(cert.der()).unwrap(),
            issuer: Issuer::new(params, key_pair),
        }
    }

    pub fn issue(&self, host: &str) -> CertificateChain {
        let mut params = CertificateParams::new(vec![host.to_owned()]).unwrap();
        params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ServerAuth];
        with_validity(&mut params);
        let key_pair = KeyPair::generate().unwrap();
        let cert = params.signed_by(&key_pair, &self.issuer).unwrap();
        CertificateChain::single(Certificate::from_der(cert.der()).unwrap())
    }
}

fn with_validity(params: &mut CertificateParams) {
    let year = chrono::Utc::now().year();
    params.not_before = rcgen::date_time_ymd(year - 1, 1, 1);
    params.not_after = rcgen::date_time_ymd(year + 1, 1, 1);
}
