//! Certification path validation.
//!
//! Builds candidate paths from a credential's end-entity certificate through
//! its supporting certificates to a configured trust anchor, and validates
//! each candidate for signatures, validity periods, CA constraints, path
//! depth and CRL revocation. The credential is trusted if any candidate path
//! passes every check.
//!
//! Trust anchors need not be self-signed roots. Any configured certificate,
//! including a subordinate CA, terminates a path as soon as it is reached.

mod chain;
mod checks;
mod crl;
mod helpers;

use crate::crl::Crl;
use crate::fields::Certificate;
use crate::parser;
use crate::TrustError;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub(crate) use chain::MAX_CHAIN_DEPTH;

/// Trust anchors, CRLs and path constraints for one validation attempt.
#[derive(Debug, Clone, Default)]
pub struct ValidationInformation {
    /// Certificates trusted unconditionally as path termini.
    pub trust_anchors: Vec<Certificate>,
    /// CRLs consulted for every certificate in a candidate path.
    pub crls: Vec<Crl>,
    /// Maximum number of intermediate certificates between the entity and
    /// the anchor. `None` means unbounded.
    pub max_path_depth: Option<u32>,
}

impl ValidationInformation {
    pub fn new(trust_anchors: Vec<Certificate>) -> Self {
        ValidationInformation {
            trust_anchors,
            ..Default::default()
        }
    }

    pub fn with_crls(mut self, crls: Vec<Crl>) -> Self {
        self.crls = crls;
        self
    }

    pub fn with_max_path_depth(mut self, depth: u32) -> Self {
        self.max_path_depth = Some(depth);
        self
    }
}

/// An untrusted credential: the entity certificate, an unordered set of
/// supporting certificates, and any CRLs that travel with it.
///
/// The chain may be incomplete, contain duplicates, include the entity
/// certificate itself, or be in any order.
#[derive(Debug, Clone)]
pub struct Credential {
    pub entity_certificate: Certificate,
    pub chain: Vec<Certificate>,
    pub crls: Vec<Crl>,
}

impl Credential {
    pub fn new(entity_certificate: Certificate) -> Self {
        Credential {
            entity_certificate,
            chain: Vec::new(),
            crls: Vec::new(),
        }
    }

    pub fn with_chain(mut self, chain: Vec<Certificate>) -> Self {
        self.chain = chain;
        self
    }

    pub fn with_crls(mut self, crls: Vec<Crl>) -> Self {
        self.crls = crls;
        self
    }

    /// Build a credential from a PEM (or single DER) bundle. The first
    /// certificate is the entity certificate; the rest form the chain.
    pub fn from_pem_bundle(input: &[u8]) -> Result<Self, TrustError> {
        let mut certs = parser::decode_certificates(input)?.into_iter();
        let entity = certs
            .next()
            .ok_or_else(|| TrustError::ParseError("no certificates in bundle".into()))?;
        Ok(Credential::new(entity).with_chain(certs.collect()))
    }
}

/// Options controlling path building and the evaluation instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ValidationOptions {
    /// Validate at a specific Unix timestamp instead of the current time.
    pub at_time: Option<i64>,
    /// Upper bound on the number of certificates in a candidate path,
    /// bounding path-building work independently of `max_path_depth`.
    pub max_chain_depth: usize,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            at_time: None,
            max_chain_depth: MAX_CHAIN_DEPTH,
        }
    }
}

impl ValidationOptions {
    /// The evaluation instant as a Unix timestamp.
    pub fn evaluation_time(&self) -> i64 {
        self.at_time.unwrap_or_else(helpers::unix_now)
    }
}

/// Result of path validation.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    /// Whether a path to a trust anchor passed every check.
    pub is_valid: bool,
    /// The accepted path (entity first, anchor last). On failure, the last
    /// path that was attempted, or just the entity if none could be built.
    pub path: Vec<PathCertInfo>,
    /// Reasons every candidate path failed (empty if `is_valid` is true).
    pub errors: Vec<String>,
}

impl std::fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format: [short_name], [serial], [OK/FAIL], [optional reason]
        if let Some(entity) = self.path.first() {
            write!(f, "{}, {}, ", entity.short_name, entity.serial)?;
        }
        if self.is_valid {
            write!(f, "OK")?;
        } else {
            write!(f, "FAIL")?;
            if !self.errors.is_empty() {
                write!(f, ", {}", self.errors.join("; "))?;
            }
        }
        Ok(())
    }
}

/// Information about a certificate in a validated path.
#[derive(Debug, Clone, Serialize)]
pub struct PathCertInfo {
    /// Position in path (0 = entity).
    pub depth: usize,
    pub subject: String,
    pub issuer: String,
    /// Short human-readable name derived from CN, O, or OU.
    pub short_name: String,
    /// Serial number as colon-separated hex.
    pub serial: String,
    /// SHA-256 fingerprint.
    pub fingerprint: String,
    /// Whether this certificate is the configured trust anchor.
    pub trust_anchor: bool,
}

impl PathCertInfo {
    fn describe(path: &[&Certificate], anchored: bool) -> Vec<PathCertInfo> {
        let last = path.len().saturating_sub(1);
        path.iter()
            .enumerate()
            .map(|(depth, cert)| PathCertInfo {
                depth,
                subject: cert.subject().to_rfc2253(),
                issuer: cert.issuer().to_rfc2253(),
                short_name: cert.short_name(),
                serial: cert.serial_hex(),
                fingerprint: cert.fingerprint_sha256(),
                trust_anchor: anchored && depth == last,
            })
            .collect()
    }
}

/// Validate a credential against the given trust anchors and CRLs at the
/// current time.
///
/// Returns `Ok(false)` when no path can be built or every path fails a
/// check. Fails with [`TrustError::ProcessingError`] if `info` has no trust
/// anchors.
pub fn validate(info: &ValidationInformation, credential: &Credential) -> Result<bool, TrustError> {
    validate_with_options(info, credential, &ValidationOptions::default())
}

/// Like [`validate`], with explicit [`ValidationOptions`].
pub fn validate_with_options(
    info: &ValidationInformation,
    credential: &Credential,
    options: &ValidationOptions,
) -> Result<bool, TrustError> {
    Ok(validate_report(info, credential, options)?.is_valid)
}

/// Validate a credential and report the accepted path or the reasons every
/// candidate path failed.
pub fn validate_report(
    info: &ValidationInformation,
    credential: &Credential,
    options: &ValidationOptions,
) -> Result<ValidationReport, TrustError> {
    if info.trust_anchors.is_empty() {
        warn!("path validation attempted with no trust anchors");
        return Err(TrustError::ProcessingError(
            "validation information contains no trust anchors".into(),
        ));
    }

    let entity = &credential.entity_certificate;
    let now = options.evaluation_time();
    let crls: Vec<&Crl> = info.crls.iter().chain(credential.crls.iter()).collect();
    debug!(
        entity = %entity.subject(),
        anchors = info.trust_anchors.len(),
        chain = credential.chain.len(),
        crls = crls.len(),
        at = now,
        "validating credential"
    );

    let mut errors = Vec::new();

    // An entity that is itself configured as an anchor is a complete path.
    if info.trust_anchors.contains(entity) {
        checks::check_entity_anchor(entity, now, &mut errors);
        return Ok(finish(vec![entity], true, errors));
    }

    let pool = helpers::candidate_pool(entity, &credential.chain);
    let mut path_errors = Vec::new();
    let mut last_attempt: Option<Vec<&Certificate>> = None;

    let found = chain::find_path(
        entity,
        &pool,
        &info.trust_anchors,
        options.max_chain_depth,
        &mut errors,
        |path| {
            let before = path_errors.len();
            checks::check_path(path, info.max_path_depth, &crls, now, &mut path_errors);
            last_attempt = Some(path.to_vec());
            let ok = path_errors.len() == before;
            debug!(length = path.len(), accepted = ok, "checked candidate path");
            ok
        },
    );

    match found {
        Some(path) => Ok(finish(path, true, Vec::new())),
        None => {
            if last_attempt.is_none() {
                errors.push(format!(
                    "unable to build a path from {} to a trust anchor",
                    entity.subject()
                ));
            }
            errors.extend(path_errors);
            let path = last_attempt.unwrap_or_else(|| vec![entity]);
            let anchored = path.len() > 1;
            Ok(finish(path, anchored, errors))
        }
    }
}

fn finish(path: Vec<&Certificate>, anchored: bool, errors: Vec<String>) -> ValidationReport {
    let errors = helpers::dedup_errors(errors);
    ValidationReport {
        is_valid: errors.is_empty(),
        path: PathCertInfo::describe(&path, anchored),
        errors,
    }
}
