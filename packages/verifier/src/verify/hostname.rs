//! Hostname matching and uniqueness heuristics

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use crate::cert::CertificateInfo;

/// Suffixes that are never delegated in the public DNS
const RESERVED_SUFFIXES: &[&str] = &[
    "local",
    "localhost",
    "test",
    "example",
    "invalid",
    "internal",
    "lan",
    "home",
    "corp",
    "intranet",
    "private",
];

/// Case-insensitive match of a hostname against a certificate name,
/// allowing a single leading `*` label
#[must_use]
pub fn hostname_matches(hostname: &str, pattern: &str) -> bool {
    let hostname = normalize(hostname);
    let pattern = normalize(pattern);

    if hostname == pattern {
        return true;
    }

    // Wildcard covers exactly one label and never a bare public suffix
    if let Some(suffix) = pattern.strip_prefix("*.") {
        if !suffix.contains('.') {
            return false;
        }
        if let Some(prefix) = hostname.strip_suffix(suffix) {
            if let Some(label) = prefix.strip_suffix('.') {
                return !label.is_empty() && !label.contains('.');
            }
        }
    }

    false
}

/// Outcome of matching a hostname against a leaf certificate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameMatch {
    pub matched: bool,
    /// The subject common name was consulted because the leaf has no SANs
    pub common_name_fallback_used: bool,
}

/// Match `hostname` against the leaf's subjectAltNames, falling back to the
/// subject common name only when the certificate carries no SANs at all
#[must_use]
pub fn match_leaf(info: &CertificateInfo, hostname: &str) -> NameMatch {
    let host = normalize(hostname);
    let host = host.trim_start_matches('[').trim_end_matches(']');

    if let Ok(ip) = host.parse::<IpAddr>() {
        return NameMatch {
            matched: info.ip_addresses.contains(&ip),
            common_name_fallback_used: false,
        };
    }

    if !info.dns_names.is_empty() || !info.ip_addresses.is_empty() {
        return NameMatch {
            matched: info.dns_names.iter().any(|name| hostname_matches(host, name)),
            common_name_fallback_used: false,
        };
    }

    NameMatch {
        matched: info
            .subject_common_name
            .as_deref()
            .is_some_and(|cn| hostname_matches(host, cn)),
        common_name_fallback_used: true,
    }
}

/// True when `hostname` cannot be proven globally unique: single-label
/// names, reserved suffixes, and non-public IP addresses
#[must_use]
pub fn is_hostname_non_unique(hostname: &str) -> bool {
    let host = normalize(hostname);
    let host = host.trim_start_matches('[').trim_end_matches(']');

    if host.is_empty() {
        return false;
    }

    if let Ok(ip) = host.parse::<IpAddr>() {
        return is_non_public_ip(ip);
    }

    match host.rsplit_once('.') {
        None => true,
        Some((_, tld)) => RESERVED_SUFFIXES.contains(&tld),
    }
}

fn is_non_public_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_non_public_v4(v4),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => is_non_public_v4(v4),
            None => is_non_public_v6(v6),
        },
    }
}

fn is_non_public_v4(ip: Ipv4Addr) -> bool {
    ip.is_private() || ip.is_loopback() || ip.is_link_local() || ip.is_unspecified()
}

fn is_non_public_v6(ip: Ipv6Addr) -> bool {
    let first = ip.segments()[0];
    ip.is_loopback()
        || ip.is_unspecified()
        // fc00::/7 unique local
        || (first & 0xfe00) == 0xfc00
        // fe80::/10 link local
        || (first & 0xffc0) == 0xfe80
}

fn normalize(name: &str) -> String {
    name.trim_end_matches('.').to_ascii_lowercase()
}
