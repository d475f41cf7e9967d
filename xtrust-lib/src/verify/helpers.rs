//! Small helper functions for path validation.

use crate::fields::Certificate;
use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

/// Check if a certificate is self-issued (subject == issuer).
///
/// RFC 5280 Section 6.1: self-issued certificates do not count toward
/// pathLenConstraint.
pub(crate) fn is_self_issued(cert: &Certificate) -> bool {
    cert.is_self_issued()
}

/// Number of certificates strictly between the entity and the anchor.
pub(crate) fn count_intermediates(path: &[&Certificate]) -> usize {
    path.len().saturating_sub(2)
}

/// Supporting certificates with the entity and duplicates removed,
/// preserving first-seen order.
pub(crate) fn candidate_pool<'a>(
    entity: &Certificate,
    chain: &'a [Certificate],
) -> Vec<&'a Certificate> {
    let mut pool: Vec<&Certificate> = Vec::with_capacity(chain.len());
    for cert in chain {
        if cert != entity && !pool.contains(&cert) {
            pool.push(cert);
        }
    }
    pool
}

/// Drop repeated messages, keeping the first occurrence of each.
pub(crate) fn dedup_errors(errors: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    errors
        .into_iter()
        .filter(|e| seen.insert(e.clone()))
        .collect()
}

pub(crate) fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
