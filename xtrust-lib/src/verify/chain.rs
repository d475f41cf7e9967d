//! Certification path building via DFS path finding.
//!
//! Starting at the entity certificate, candidate issuers are tried in order:
//! trust anchors first (a path ends as soon as one is reached), then unused
//! certificates from the credential's pool. Each complete path is handed to
//! an acceptance callback; the search backtracks when it is rejected, so
//! cross-signed intermediates are all explored.
//!
//! A candidate repeating the subject and key of a certificate already on the
//! path is skipped, signature results are cached per certificate pair, and
//! the whole search is capped at [`MAX_PATH_STEPS`] steps, so hostile pools
//! cannot force exponential work.

use crate::fields::Certificate;
use std::collections::HashMap;
use tracing::{trace, warn};

/// Maximum chain depth to prevent runaway path building.
pub(crate) const MAX_CHAIN_DEPTH: usize = 32;

/// Upper bound on extension steps (intermediates pushed plus complete paths
/// offered to the acceptance callback) in one search.
pub(crate) const MAX_PATH_STEPS: usize = 4096;

/// Find a path from `entity` to one of `anchors` that `accept` approves.
///
/// Signature failures between a certificate and a would-be issuer prune that
/// branch and are recorded in `errors`. Returns the first accepted path,
/// entity first and anchor last, or `None` when no path is accepted within
/// [`MAX_PATH_STEPS`].
pub(crate) fn find_path<'a, F>(
    entity: &'a Certificate,
    pool: &[&'a Certificate],
    anchors: &'a [Certificate],
    max_chain_depth: usize,
    errors: &mut Vec<String>,
    accept: F,
) -> Option<Vec<&'a Certificate>>
where
    F: FnMut(&[&'a Certificate]) -> bool,
{
    let mut search = Search {
        pool,
        anchors,
        max_len: max_chain_depth.max(1),
        used: vec![false; pool.len()],
        path: vec![entity],
        signatures: HashMap::new(),
        steps_left: MAX_PATH_STEPS,
        errors,
        accept,
        found: None,
    };
    search.dfs();
    search.found
}

struct Search<'a, 'p, F> {
    pool: &'p [&'a Certificate],
    anchors: &'a [Certificate],
    max_len: usize,
    used: Vec<bool>,
    path: Vec<&'a Certificate>,
    /// Signature results keyed by (certificate DER, issuer DER).
    signatures: HashMap<(&'a [u8], &'a [u8]), bool>,
    steps_left: usize,
    errors: &'p mut Vec<String>,
    accept: F,
    found: Option<Vec<&'a Certificate>>,
}

impl<'a, 'p, F> Search<'a, 'p, F>
where
    F: FnMut(&[&'a Certificate]) -> bool,
{
    /// Returns true once an accepted path has been stored in `found`.
    #[allow(clippy::indexing_slicing)] // used[idx] and pool[idx] share a length
    fn dfs(&mut self) -> bool {
        let current = match self.path.last() {
            Some(c) => *c,
            None => return false,
        };
        let depth = self.path.len() - 1;

        // A trust anchor that issued the current certificate ends the path.
        for anchor in self.anchors {
            if !could_issue(anchor, current) || !self.signed_by(current, anchor, depth) {
                continue;
            }
            if !self.take_step() {
                return false;
            }
            self.path.push(anchor);
            trace!(length = self.path.len(), anchor = %anchor.subject(), "complete path");
            if (self.accept)(&self.path) {
                self.found = Some(self.path.clone());
                return true;
            }
            self.path.pop();
        }

        if self.path.len() >= self.max_len {
            trace!(length = self.path.len(), "path length limit reached");
            return false;
        }

        for idx in 0..self.pool.len() {
            if self.used[idx] {
                continue;
            }
            let candidate = self.pool[idx];
            if !could_issue(candidate, current) || self.anchors.contains(candidate) {
                continue;
            }
            // A name and key already on the path only loops back.
            if self.path.iter().any(|c| c.same_subject_and_key(candidate)) {
                continue;
            }
            if !self.signed_by(current, candidate, depth) {
                continue;
            }
            if !self.take_step() {
                return false;
            }

            self.used[idx] = true;
            self.path.push(candidate);
            trace!(depth = depth + 1, subject = %candidate.subject(), "trying intermediate");

            if self.dfs() {
                return true;
            }

            self.path.pop();
            self.used[idx] = false;
        }

        false
    }

    /// Spend one step of the search budget. Returns false once it is used up.
    fn take_step(&mut self) -> bool {
        if self.steps_left == 0 {
            return false;
        }
        self.steps_left -= 1;
        if self.steps_left == 0 {
            warn!(steps = MAX_PATH_STEPS, "path building abandoned");
            self.errors.push(format!(
                "path building abandoned after {} steps",
                MAX_PATH_STEPS
            ));
        }
        true
    }

    fn signed_by(&mut self, cert: &'a Certificate, issuer: &'a Certificate, depth: usize) -> bool {
        let key = (cert.der(), issuer.der());
        if let Some(&ok) = self.signatures.get(&key) {
            return ok;
        }
        let ok = match cert.verify_signed_by(issuer) {
            Ok(()) => true,
            Err(e) => {
                trace!(error = %e, "signature check failed");
                self.errors.push(format!(
                    "certificate at depth {} ({}) signature does not verify with key of {}",
                    depth,
                    cert.subject(),
                    issuer.subject()
                ));
                false
            }
        };
        self.signatures.insert(key, ok);
        ok
    }
}

/// Whether `issuer` is a plausible issuer of `cert`: its encoded subject
/// equals the certificate's encoded issuer, and when both key identifiers
/// are present they agree.
fn could_issue(issuer: &Certificate, cert: &Certificate) -> bool {
    if issuer.subject_raw() != cert.issuer_raw() {
        return false;
    }
    match (cert.authority_key_identifier(), issuer.subject_key_identifier()) {
        (Some(aki), Some(ski)) => aki == ski,
        _ => true,
    }
}
