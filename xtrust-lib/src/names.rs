//! Subject name matching against a set of trusted names.
//!
//! A certificate's identity is drawn from up to three sources, each enabled
//! independently by [`NameEvaluatorConfig`]: the subject common name, the
//! full subject DN, and selected subject alternative names. The certificate
//! matches if any identity from an enabled source is in the trusted set.

use crate::dn::DistinguishedName;
use crate::fields::{AltName, AltNameType, Certificate};
use crate::TrustError;
use serde::Deserialize;
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, trace};

/// Names a credential's identity must match. `None` or an empty set places
/// no constraint on the credential.
pub type TrustedNameSet = HashSet<String>;

/// Which identity sources [`matches`] consults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NameEvaluatorConfig {
    /// Match subject alternative names of the types in `alt_name_types`.
    pub check_subject_alt_names: bool,
    /// Match the full subject DN with DN equality.
    pub check_subject_dn: bool,
    /// Match the most specific subject common name exactly.
    pub check_subject_dn_cn: bool,
    /// Alternative name types consulted when `check_subject_alt_names` is
    /// set. An empty set contributes no candidates.
    pub alt_name_types: BTreeSet<AltNameType>,
}

impl Default for NameEvaluatorConfig {
    fn default() -> Self {
        Self {
            check_subject_alt_names: true,
            check_subject_dn: true,
            check_subject_dn_cn: true,
            alt_name_types: [AltNameType::Dns, AltNameType::Uri].into_iter().collect(),
        }
    }
}

impl NameEvaluatorConfig {
    /// A configuration with every source switched off. [`matches`] always
    /// succeeds with it.
    pub fn disabled() -> Self {
        Self {
            check_subject_alt_names: false,
            check_subject_dn: false,
            check_subject_dn_cn: false,
            alt_name_types: BTreeSet::new(),
        }
    }

    pub fn with_alt_name_types<I: IntoIterator<Item = AltNameType>>(mut self, types: I) -> Self {
        self.alt_name_types = types.into_iter().collect();
        self
    }

    fn is_active(&self) -> bool {
        self.check_subject_alt_names || self.check_subject_dn || self.check_subject_dn_cn
    }
}

/// A candidate identity extracted from the certificate.
enum Candidate<'c> {
    CommonName(&'c str),
    Subject(&'c DistinguishedName),
    AltName(&'c AltName),
}

impl Candidate<'_> {
    fn matches(&self, name: &str) -> bool {
        match self {
            Candidate::CommonName(cn) => *cn == name,
            // Input that is not syntactically a DN never matches.
            Candidate::Subject(dn) => {
                DistinguishedName::parse(name).is_some_and(|n| n.dn_equals(dn))
            }
            Candidate::AltName(alt) => alt.matches_str(name),
        }
    }
}

/// Check whether `cert`'s identity matches one of `trusted_names`.
///
/// Returns `Ok(true)` without inspecting the certificate when there are no
/// trusted names or no source is enabled. Fails with a processing error if
/// alternative names are consulted and the certificate's SAN extension
/// cannot be decoded.
pub fn matches(
    cert: &Certificate,
    trusted_names: Option<&TrustedNameSet>,
    config: &NameEvaluatorConfig,
) -> Result<bool, TrustError> {
    let trusted = match trusted_names {
        Some(names) if !names.is_empty() => names,
        _ => {
            trace!("no trusted names configured; name check vacuously satisfied");
            return Ok(true);
        }
    };
    if !config.is_active() {
        trace!("name checking disabled");
        return Ok(true);
    }

    let candidates = candidates(cert, config)?;
    let matched = trusted
        .iter()
        .any(|name| candidates.iter().any(|c| c.matches(name)));
    debug!(
        subject = %cert.subject(),
        candidates = candidates.len(),
        trusted = trusted.len(),
        matched,
        "evaluated trusted names"
    );
    Ok(matched)
}

/// Collect every candidate identity before comparing, so that a SAN decode
/// failure is reported even when another source would have matched.
fn candidates<'c>(
    cert: &'c Certificate,
    config: &NameEvaluatorConfig,
) -> Result<Vec<Candidate<'c>>, TrustError> {
    let mut out = Vec::new();
    if config.check_subject_alt_names && !config.alt_name_types.is_empty() {
        let types: Vec<AltNameType> = config.alt_name_types.iter().copied().collect();
        out.extend(cert.alt_names_of(&types)?.into_iter().map(Candidate::AltName));
    }
    if config.check_subject_dn {
        out.push(Candidate::Subject(cert.subject()));
    }
    if config.check_subject_dn_cn {
        if let Some(cn) = cert.common_name() {
            out.push(Candidate::CommonName(cn));
        }
    }
    Ok(out)
}
