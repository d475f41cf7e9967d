//! Certificate data types.
//!
//! [`Certificate`] is an owned, immutable view of a decoded X.509 certificate.
//! Fields needed for trust decisions are extracted once at decode time; the
//! original DER is retained for signature verification and fingerprints.

use crate::dn::DistinguishedName;
use crate::util;
use crate::TrustError;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use x509_parser::prelude::*;

/// Subject alternative name type, numbered as the `GeneralName` CHOICE tags
/// in RFC 5280 Section 4.2.1.6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AltNameType {
    #[serde(rename = "othername")]
    OtherName,
    #[serde(alias = "rfc822")]
    Email,
    Dns,
    #[serde(rename = "x400")]
    X400Address,
    #[serde(rename = "dirname")]
    DirectoryName,
    #[serde(rename = "ediparty")]
    EdiPartyName,
    Uri,
    Ip,
    #[serde(rename = "registeredid")]
    RegisteredId,
}

impl AltNameType {
    /// The `GeneralName` context tag number for this type.
    pub fn tag(self) -> u8 {
        match self {
            AltNameType::OtherName => 0,
            AltNameType::Email => 1,
            AltNameType::Dns => 2,
            AltNameType::X400Address => 3,
            AltNameType::DirectoryName => 4,
            AltNameType::EdiPartyName => 5,
            AltNameType::Uri => 6,
            AltNameType::Ip => 7,
            AltNameType::RegisteredId => 8,
        }
    }

    /// Look up a type by its `GeneralName` tag number.
    pub fn from_tag(tag: u8) -> Option<Self> {
        Some(match tag {
            0 => AltNameType::OtherName,
            1 => AltNameType::Email,
            2 => AltNameType::Dns,
            3 => AltNameType::X400Address,
            4 => AltNameType::DirectoryName,
            5 => AltNameType::EdiPartyName,
            6 => AltNameType::Uri,
            7 => AltNameType::Ip,
            8 => AltNameType::RegisteredId,
            _ => return None,
        })
    }
}

impl std::str::FromStr for AltNameType {
    type Err = TrustError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "othername" => Ok(AltNameType::OtherName),
            "email" | "rfc822" => Ok(AltNameType::Email),
            "dns" => Ok(AltNameType::Dns),
            "x400" => Ok(AltNameType::X400Address),
            "dirname" => Ok(AltNameType::DirectoryName),
            "ediparty" => Ok(AltNameType::EdiPartyName),
            "uri" => Ok(AltNameType::Uri),
            "ip" => Ok(AltNameType::Ip),
            "registeredid" => Ok(AltNameType::RegisteredId),
            other => Err(TrustError::ProcessingError(format!(
                "unknown alternative name type '{}'",
                other
            ))),
        }
    }
}

/// A subject alternative name entry, decoded once from its `GeneralName`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value")]
pub enum AltName {
    Dns(String),
    Email(String),
    Uri(String),
    Ip(IpAddr),
    DirectoryName(DistinguishedName),
    /// Any other form, kept as its raw encoded content.
    Other {
        kind: AltNameType,
        #[serde(serialize_with = "serialize_hex")]
        value: Vec<u8>,
    },
}

impl AltName {
    /// The discriminator of this entry.
    pub fn kind(&self) -> AltNameType {
        match self {
            AltName::Dns(_) => AltNameType::Dns,
            AltName::Email(_) => AltNameType::Email,
            AltName::Uri(_) => AltNameType::Uri,
            AltName::Ip(_) => AltNameType::Ip,
            AltName::DirectoryName(_) => AltNameType::DirectoryName,
            AltName::Other { kind, .. } => *kind,
        }
    }

    /// Whether this entry matches a trusted name string.
    ///
    /// DNS, URI and email forms use exact string equality. IP addresses are
    /// compared as addresses, so `::1` matches `0:0:0:0:0:0:0:1`. Directory
    /// names use DN equality. Other forms never match a string.
    pub fn matches_str(&self, name: &str) -> bool {
        match self {
            AltName::Dns(v) | AltName::Email(v) | AltName::Uri(v) => v == name,
            AltName::Ip(ip) => name.parse::<IpAddr>().is_ok_and(|n| n == *ip),
            AltName::DirectoryName(dn) => {
                DistinguishedName::parse(name).is_some_and(|n| n.dn_equals(dn))
            }
            AltName::Other { .. } => false,
        }
    }
}

impl std::fmt::Display for AltName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AltName::Dns(v) => write!(f, "DNS:{}", v),
            AltName::Email(v) => write!(f, "email:{}", v),
            AltName::Uri(v) => write!(f, "URI:{}", v),
            AltName::Ip(ip) => write!(f, "IP:{}", ip),
            AltName::DirectoryName(dn) => write!(f, "DirName:{}", dn),
            AltName::Other { kind, value } => {
                write!(f, "othername<{}>:{}", kind.tag(), hex::encode(value))
            }
        }
    }
}

fn serialize_hex<S: serde::Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&hex::encode(bytes))
}

/// BasicConstraints extension values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BasicConstraints {
    /// Whether the subject is a CA.
    pub is_ca: bool,
    /// Maximum number of non-self-issued intermediates that may follow.
    pub path_len_constraint: Option<u32>,
}

/// Date-time representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct DateTime {
    /// Unix timestamp.
    pub timestamp: i64,
}

impl DateTime {
    pub(crate) fn from_asn1(t: &ASN1Time) -> Self {
        DateTime {
            timestamp: t.timestamp(),
        }
    }

    /// Format as ISO 8601 / RFC 3339 in UTC (e.g. `2020-01-01T00:00:00Z`).
    pub fn to_iso8601(&self) -> String {
        ::time::OffsetDateTime::from_unix_timestamp(self.timestamp)
            .ok()
            .and_then(|dt| {
                dt.format(&::time::format_description::well_known::Rfc3339)
                    .ok()
            })
            .unwrap_or_else(|| self.timestamp.to_string())
    }
}

impl std::fmt::Display for DateTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_iso8601())
    }
}

/// A decoded X.509 certificate.
///
/// Two certificates are equal when their DER encodings are identical.
#[derive(Debug, Clone)]
pub struct Certificate {
    pub(crate) der: Vec<u8>,
    pub(crate) version: u32,
    pub(crate) serial: Vec<u8>,
    pub(crate) signature_algorithm: String,
    pub(crate) subject: DistinguishedName,
    pub(crate) issuer: DistinguishedName,
    pub(crate) subject_raw: Vec<u8>,
    pub(crate) issuer_raw: Vec<u8>,
    pub(crate) not_before: DateTime,
    pub(crate) not_after: DateTime,
    pub(crate) public_key_algorithm: String,
    /// DER-encoded SubjectPublicKeyInfo.
    pub(crate) public_key_info: Vec<u8>,
    pub(crate) basic_constraints: Option<BasicConstraints>,
    pub(crate) subject_key_id: Option<Vec<u8>>,
    pub(crate) authority_key_id: Option<Vec<u8>>,
    /// Decoded SAN entries, or the reason the extension could not be decoded.
    pub(crate) alt_names: Result<Vec<AltName>, String>,
}

impl PartialEq for Certificate {
    fn eq(&self, other: &Self) -> bool {
        self.der == other.der
    }
}

impl Eq for Certificate {}

impl std::hash::Hash for Certificate {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.der.hash(state);
    }
}

impl Certificate {
    /// DER encoding of the certificate.
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// Certificate version (1, 2, or 3).
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Serial number as big-endian bytes, as encoded.
    pub fn serial(&self) -> &[u8] {
        &self.serial
    }

    /// Serial number as a colon-separated hex string (e.g., "10:00").
    pub fn serial_hex(&self) -> String {
        util::format_serial(&self.serial)
    }

    /// Signature algorithm name.
    pub fn signature_algorithm(&self) -> &str {
        &self.signature_algorithm
    }

    /// Public key algorithm OID.
    pub fn public_key_algorithm(&self) -> &str {
        &self.public_key_algorithm
    }

    pub fn subject(&self) -> &DistinguishedName {
        &self.subject
    }

    pub fn issuer(&self) -> &DistinguishedName {
        &self.issuer
    }

    /// Encoded subject name, used for issuer/subject chaining.
    pub fn subject_raw(&self) -> &[u8] {
        &self.subject_raw
    }

    /// Encoded issuer name.
    pub fn issuer_raw(&self) -> &[u8] {
        &self.issuer_raw
    }

    pub fn not_before(&self) -> DateTime {
        self.not_before
    }

    pub fn not_after(&self) -> DateTime {
        self.not_after
    }

    /// Whether `at` (Unix seconds) lies within the validity interval.
    pub fn is_valid_at(&self, at: i64) -> bool {
        self.not_before.timestamp <= at && at <= self.not_after.timestamp
    }

    pub fn basic_constraints(&self) -> Option<BasicConstraints> {
        self.basic_constraints
    }

    /// Whether BasicConstraints is present with `cA` set.
    pub fn is_ca(&self) -> bool {
        self.basic_constraints.is_some_and(|bc| bc.is_ca)
    }

    /// The DER-encoded SubjectPublicKeyInfo.
    pub fn public_key_info(&self) -> &[u8] {
        &self.public_key_info
    }

    /// Same encoded subject and same public key. Such certificates are
    /// interchangeable as issuers.
    pub fn same_subject_and_key(&self, other: &Certificate) -> bool {
        self.subject_raw == other.subject_raw && self.public_key_info == other.public_key_info
    }

    pub fn subject_key_identifier(&self) -> Option<&[u8]> {
        self.subject_key_id.as_deref()
    }

    pub fn authority_key_identifier(&self) -> Option<&[u8]> {
        self.authority_key_id.as_deref()
    }

    /// Most specific common name of the subject.
    pub fn common_name(&self) -> Option<&str> {
        self.subject.common_name()
    }

    /// All subject common names, most specific first.
    pub fn common_names(&self) -> Vec<&str> {
        self.subject.common_names()
    }

    /// All subject alternative names.
    ///
    /// Fails with a processing error if the extension is present but could
    /// not be decoded. A certificate without the extension yields an empty
    /// slice.
    pub fn alt_names(&self) -> Result<&[AltName], TrustError> {
        self.alt_names.as_deref().map_err(|e| {
            TrustError::ProcessingError(format!(
                "subject alternative names of {} could not be decoded: {}",
                self.subject, e
            ))
        })
    }

    /// Subject alternative names of the given types, in certificate order.
    pub fn alt_names_of(&self, types: &[AltNameType]) -> Result<Vec<&AltName>, TrustError> {
        Ok(self
            .alt_names()?
            .iter()
            .filter(|n| types.contains(&n.kind()))
            .collect())
    }

    /// Subject and issuer names are encoded identically.
    pub fn is_self_issued(&self) -> bool {
        self.subject_raw == self.issuer_raw
    }

    /// Self-issued and its signature verifies with its own key.
    pub fn is_self_signed(&self) -> bool {
        self.is_self_issued() && self.verify_signed_by(self).is_ok()
    }

    /// SHA-256 fingerprint as colon-separated uppercase hex.
    pub fn fingerprint_sha256(&self) -> String {
        crate::fingerprint::compute_fingerprint(&self.der)
    }

    /// PEM encoding of the certificate.
    pub fn to_pem(&self) -> String {
        format!(
            "-----BEGIN CERTIFICATE-----\n{}\n-----END CERTIFICATE-----\n",
            util::base64_wrap(&self.der)
        )
    }

    /// Short human-readable identifier: CN, O or OU, whichever comes first.
    pub fn short_name(&self) -> String {
        use crate::oid;
        self.common_name()
            .or_else(|| self.subject.values_of(oid::ORGANIZATION).last().copied())
            .or_else(|| {
                self.subject
                    .values_of(oid::ORGANIZATIONAL_UNIT)
                    .last()
                    .copied()
            })
            .unwrap_or("Unknown")
            .to_string()
    }

    /// Verify that this certificate's signature was produced by `issuer`'s
    /// public key.
    pub fn verify_signed_by(&self, issuer: &Certificate) -> Result<(), TrustError> {
        let child = self.parsed()?;
        let parent = issuer.parsed()?;
        child
            .verify_signature(Some(parent.public_key()))
            .map_err(|e| {
                TrustError::ProcessingError(format!(
                    "signature of {} does not verify with key of {}: {}",
                    self.subject, issuer.subject, e
                ))
            })
    }

    /// Re-parse the retained DER. Certificates are only constructed from DER
    /// that parsed successfully, so this fails only on internal corruption.
    pub(crate) fn parsed(&self) -> Result<X509Certificate<'_>, TrustError> {
        X509Certificate::from_der(&self.der)
            .map(|(_, cert)| cert)
            .map_err(|e| TrustError::DerError(format!("{}", e)))
    }
}
