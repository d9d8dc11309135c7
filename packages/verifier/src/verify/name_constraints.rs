//! Domain restrictions for name-constrained CA keys

use crate::cert::CertificateInfo;

/// True if the leaf names anything outside `permitted_domains`.
///
/// DNS SANs are checked when present, otherwise the subject common name.
/// IP address SANs are never permitted under a domain constraint.
pub(crate) fn violates<S: AsRef<str>>(leaf: &CertificateInfo, permitted_domains: &[S]) -> bool {
    if !leaf.ip_addresses.is_empty() {
        return true;
    }

    if leaf.dns_names.is_empty() {
        return match leaf.subject_common_name.as_deref() {
            Some(cn) => !is_permitted(cn, permitted_domains),
            None => false,
        };
    }

    leaf.dns_names
        .iter()
        .any(|name| !is_permitted(name, permitted_domains))
}

fn is_permitted<S: AsRef<str>>(name: &str, permitted_domains: &[S]) -> bool {
    let name = name.trim_end_matches('.').to_ascii_lowercase();
    permitted_domains.iter().any(|domain| {
        let domain = domain.as_ref().trim_start_matches('.').to_ascii_lowercase();
        name == domain
            || name
                .strip_suffix(domain.as_str())
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}
