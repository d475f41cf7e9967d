//! Certificate revocation lists.

use crate::dn::DistinguishedName;
use crate::fields::{Certificate, DateTime};
use crate::util;
use crate::TrustError;
use serde::Serialize;
use x509_parser::prelude::*;
use x509_parser::revocation_list::CertificateRevocationList;

/// One entry of a CRL's revoked-certificate list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevokedEntry {
    /// Serial number as big-endian bytes, as encoded.
    #[serde(serialize_with = "serialize_serial")]
    pub serial: Vec<u8>,
    pub revocation_date: DateTime,
    /// RFC 5280 reason name, if the entry carries a reason code.
    pub reason: Option<&'static str>,
}

fn serialize_serial<S: serde::Serializer>(serial: &[u8], s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&util::format_serial(serial))
}

/// A decoded X.509 v2 CRL.
#[derive(Debug, Clone)]
pub struct Crl {
    der: Vec<u8>,
    issuer: DistinguishedName,
    issuer_raw: Vec<u8>,
    this_update: DateTime,
    next_update: Option<DateTime>,
    revoked: Vec<RevokedEntry>,
}

impl PartialEq for Crl {
    fn eq(&self, other: &Self) -> bool {
        self.der == other.der
    }
}

impl Eq for Crl {}

impl Crl {
    pub(crate) fn from_parsed(crl: &CertificateRevocationList, der: &[u8]) -> Self {
        let revoked = crl
            .iter_revoked_certificates()
            .map(|r| RevokedEntry {
                serial: r.raw_serial().to_vec(),
                revocation_date: DateTime::from_asn1(&r.revocation_date),
                reason: r.reason_code().map(|rc| format_crl_reason(&rc.1)),
            })
            .collect();
        Crl {
            der: der.to_vec(),
            issuer: DistinguishedName::from_x509(crl.issuer()),
            issuer_raw: crl.issuer().as_raw().to_vec(),
            this_update: DateTime::from_asn1(&crl.last_update()),
            next_update: crl.next_update().map(|t| DateTime::from_asn1(&t)),
            revoked,
        }
    }

    pub fn der(&self) -> &[u8] {
        &self.der
    }

    pub fn issuer(&self) -> &DistinguishedName {
        &self.issuer
    }

    /// Encoded issuer name, compared against certificate subjects.
    pub fn issuer_raw(&self) -> &[u8] {
        &self.issuer_raw
    }

    pub fn this_update(&self) -> DateTime {
        self.this_update
    }

    pub fn next_update(&self) -> Option<DateTime> {
        self.next_update
    }

    pub fn revoked(&self) -> &[RevokedEntry] {
        &self.revoked
    }

    /// Whether `at` lies within `thisUpdate..=nextUpdate`. A CRL without
    /// `nextUpdate` is current from `thisUpdate` onwards.
    pub fn is_current_at(&self, at: i64) -> bool {
        self.this_update.timestamp <= at
            && self.next_update.map_or(true, |next| at <= next.timestamp)
    }

    /// The revocation entry for `serial`, if listed.
    pub fn find_revoked(&self, serial: &[u8]) -> Option<&RevokedEntry> {
        self.revoked.iter().find(|r| r.serial == serial)
    }

    /// Whether this CRL was issued by the subject of `cert` (by encoded name).
    pub fn is_issued_by(&self, cert: &Certificate) -> bool {
        self.issuer_raw == cert.subject_raw()
    }

    /// Verify the CRL signature with `issuer`'s public key.
    pub fn verify_signed_by(&self, issuer: &Certificate) -> Result<(), TrustError> {
        let (_, crl) = CertificateRevocationList::from_der(&self.der)
            .map_err(|e| TrustError::DerError(format!("{}", e)))?;
        let parent = issuer.parsed()?;
        crl.verify_signature(parent.public_key()).map_err(|e| {
            TrustError::ProcessingError(format!(
                "CRL from {} does not verify with key of {}: {}",
                self.issuer,
                issuer.subject(),
                e
            ))
        })
    }
}

/// Format a CRL revocation reason code as an RFC 5280-style string.
///
/// Matches on the underlying numeric value of the `ReasonCode` newtype
/// (which wraps a `u8`), per RFC 5280 Section 5.3.1.
fn format_crl_reason(rc: &x509_parser::x509::ReasonCode) -> &'static str {
    match rc.0 {
        0 => "unspecified",
        1 => "keyCompromise",
        2 => "cACompromise",
        3 => "affiliationChanged",
        4 => "superseded",
        5 => "cessationOfOperation",
        6 => "certificateHold",
        // 7 is unused per RFC 5280
        8 => "removeFromCRL",
        9 => "privilegeWithdrawn",
        10 => "aACompromise",
        _ => "unspecified",
    }
}
