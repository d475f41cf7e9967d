//! CRL-based revocation checking for a candidate path.

use crate::crl::Crl;
use crate::fields::Certificate;
use tracing::{debug, trace};

/// Check every certificate in `path` against the applicable CRLs.
///
/// A CRL applies to a path certificate when its issuer is that
/// certificate's subject. An applicable CRL must be current at `now`; a
/// stale or not-yet-valid CRL fails the path even if the certificates it
/// covers are good. For each issuing certificate, its CRLs must also carry
/// a valid signature, and the certificate it issued in the path must not be
/// listed. A listed serial is revoked whatever its revocation date.
///
/// No applicable CRL means no revocation information and is not an error.
#[allow(clippy::indexing_slicing)] // path[i - 1] guarded by i > 0
pub(crate) fn check_path_revocation(
    path: &[&Certificate],
    crls: &[&Crl],
    now: i64,
    errors: &mut Vec<String>,
) {
    for (i, cert) in path.iter().enumerate() {
        for crl in crls.iter().filter(|crl| crl.is_issued_by(cert)) {
            if !crl.is_current_at(now) {
                debug!(issuer = %crl.issuer(), "CRL outside its validity window");
                errors.push(format!(
                    "CRL issued by {} is not current (thisUpdate {}, nextUpdate {})",
                    crl.issuer(),
                    crl.this_update(),
                    crl
                        .next_update()
                        .map_or_else(|| "none".to_string(), |t| t.to_string())
                ));
                continue;
            }

            if i == 0 {
                // The entity issued nothing in this path.
                continue;
            }

            if let Err(e) = crl.verify_signed_by(cert) {
                trace!(error = %e, "CRL signature check failed");
                errors.push(format!(
                    "CRL issued by {} has an invalid signature",
                    crl.issuer()
                ));
                continue;
            }

            let child = path[i - 1];
            if let Some(entry) = crl.find_revoked(child.serial()) {
                errors.push(format!(
                    "certificate at depth {} ({}) has been revoked (reason: {})",
                    i - 1,
                    child.subject(),
                    entry.reason.unwrap_or("unspecified")
                ));
            }
        }
    }
}
