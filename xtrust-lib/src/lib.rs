//! xtrust-lib: X.509 trust evaluation.
//!
//! Decides whether an untrusted credential (an end-entity certificate plus an
//! unordered set of supporting certificates) can be trusted. Two independent
//! checks are combined:
//!
//! - certification path validation against a set of trust anchors, with
//!   optional CRL revocation checking and a maximum path depth
//!   ([`validate`], [`validate_report`]);
//! - subject name matching against a set of trusted names ([`matches`]).
//!
//! [`TrustEngine`] ties both together behind a [`ValidationInfoResolver`],
//! trying each resolved candidate in order until one succeeds.
//!
//! All inputs are in-memory byte buffers decoded with [`decode_certificates`]
//! and [`decode_crls`]. Nothing here performs I/O or keeps state between calls.

mod crl;
mod display;
mod dn;
mod engine;
mod fields;
mod fingerprint;
mod names;
mod oid;
mod parser;
mod util;
pub mod verify;

pub use crl::{Crl, RevokedEntry};
pub use display::{display_certificate, display_crl, to_json};
pub use dn::DistinguishedName;
pub use engine::{Criteria, StaticResolver, TrustEngine, ValidationCandidate, ValidationInfoResolver};
pub use fields::{AltName, AltNameType, BasicConstraints, Certificate, DateTime};
pub use fingerprint::compute_fingerprint;
pub use names::{matches, NameEvaluatorConfig, TrustedNameSet};
pub use parser::{decode_certificate, decode_certificates, decode_crl, decode_crls};
pub use verify::{
    validate, validate_report, validate_with_options, Credential, PathCertInfo,
    ValidationInformation, ValidationOptions, ValidationReport,
};

/// Errors returned by xtrust-lib.
///
/// Decode errors (`ParseError`, `PemError`, `DerError`) mean the input bytes
/// were not usable. `ProcessingError` and `ResolverError` mean the evaluator
/// could not attempt a decision at all. An untrusted credential is never an
/// error; it is reported as `Ok(false)`.
#[derive(Debug, thiserror::Error)]
pub enum TrustError {
    #[error("Failed to parse certificate: {0}")]
    ParseError(String),

    #[error("Invalid PEM format: {0}")]
    PemError(String),

    #[error("Invalid DER format: {0}")]
    DerError(String),

    #[error("Processing error: {0}")]
    ProcessingError(String),

    #[error("Resolver error: {0}")]
    ResolverError(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TrustError {
    /// Whether this error came from malformed certificate or CRL bytes.
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            TrustError::ParseError(_) | TrustError::PemError(_) | TrustError::DerError(_)
        )
    }

    /// Whether this error means the inputs could not be processed at all
    /// (misconfiguration rather than an untrusted credential).
    pub fn is_processing_error(&self) -> bool {
        matches!(
            self,
            TrustError::ProcessingError(_) | TrustError::ResolverError(_)
        )
    }
}
