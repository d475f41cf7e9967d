//! Individual checks applied to a complete candidate path.
//!
//! Paths are ordered entity first and anchor last. Signatures are already
//! verified while the path is built; everything else is checked here. Each
//! check appends human-readable reasons to `errors`, and a path is accepted
//! only if no check adds one.

use super::crl::check_path_revocation;
use super::helpers::{count_intermediates, is_self_issued};
use crate::crl::Crl;
use crate::fields::Certificate;

/// Run every per-path check.
pub(crate) fn check_path(
    path: &[&Certificate],
    max_path_depth: Option<u32>,
    crls: &[&Crl],
    now: i64,
    errors: &mut Vec<String>,
) {
    check_path_time_validity(path, now, errors);
    check_path_basic_constraints(path, errors);
    check_path_depth(path, max_path_depth, errors);
    check_path_revocation(path, crls, now, errors);
}

/// The entity certificate is itself a trust anchor: only its own validity
/// period is checked.
pub(crate) fn check_entity_anchor(entity: &Certificate, now: i64, errors: &mut Vec<String>) {
    check_time_validity(0, entity, now, errors);
}

/// Check validity dates for every certificate except the anchor.
pub(crate) fn check_path_time_validity(path: &[&Certificate], now: i64, errors: &mut Vec<String>) {
    let anchor = path.len().saturating_sub(1);
    for (i, cert) in path.iter().enumerate().take(anchor) {
        check_time_validity(i, cert, now, errors);
    }
}

fn check_time_validity(depth: usize, cert: &Certificate, now: i64, errors: &mut Vec<String>) {
    if now < cert.not_before().timestamp {
        errors.push(format!(
            "certificate at depth {} ({}) is not yet valid",
            depth,
            cert.subject()
        ));
    }
    if now > cert.not_after().timestamp {
        errors.push(format!(
            "certificate at depth {} ({}) has expired",
            depth,
            cert.subject()
        ));
    }
}

/// Intermediates (neither entity nor anchor) must be CAs and must honor
/// their own `pathLenConstraint`.
pub(crate) fn check_path_basic_constraints(path: &[&Certificate], errors: &mut Vec<String>) {
    let anchor = path.len().saturating_sub(1);
    for (i, cert) in path.iter().enumerate().take(anchor).skip(1) {
        let Some(constraints) = cert.basic_constraints().filter(|bc| bc.is_ca) else {
            errors.push(format!(
                "certificate at depth {} ({}) is not a CA but is used as issuer",
                i,
                cert.subject()
            ));
            continue;
        };
        if let Some(pathlen) = constraints.path_len_constraint {
            // RFC 5280 Section 6.1.4(h): self-issued intermediates
            // do not count toward pathLenConstraint.
            let below = path
                .iter()
                .take(i)
                .skip(1)
                .filter(|c| !is_self_issued(c))
                .count();
            if below > pathlen as usize {
                errors.push(format!(
                    "certificate at depth {} ({}) path length constraint violated \
                     (pathlen={}, intermediates below={})",
                    i,
                    cert.subject(),
                    pathlen,
                    below
                ));
            }
        }
    }
}

/// Enforce the configured maximum number of intermediates. A path with
/// exactly that many intermediates is accepted.
pub(crate) fn check_path_depth(
    path: &[&Certificate],
    max_path_depth: Option<u32>,
    errors: &mut Vec<String>,
) {
    let Some(max) = max_path_depth else {
        return;
    };
    let intermediates = count_intermediates(path);
    if intermediates > max as usize {
        errors.push(format!(
            "path exceeds maximum depth of {} (has {} intermediates)",
            max, intermediates
        ));
    }
}
