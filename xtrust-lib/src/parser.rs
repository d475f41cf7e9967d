//! Certificate and CRL decoding from PEM and DER.
//!
//! Input is auto-detected: if it begins with `-----BEGIN` (after leading
//! whitespace) it is read as a sequence of PEM blocks, otherwise as a single
//! DER structure. Order of PEM blocks is preserved.

use crate::crl::Crl;
use crate::dn::DistinguishedName;
use crate::fields::{AltName, AltNameType, BasicConstraints, Certificate, DateTime};
use crate::oid;
use crate::util;
use crate::TrustError;
use tracing::{debug, trace};
use x509_parser::oid_registry::OID_X509_EXT_SUBJECT_ALT_NAME;
use x509_parser::pem::Pem;
use x509_parser::prelude::*;
use x509_parser::revocation_list::CertificateRevocationList;

const CERTIFICATE_LABELS: &[&str] = &["CERTIFICATE", "TRUSTED CERTIFICATE", "X509 CERTIFICATE"];
const CRL_LABELS: &[&str] = &["X509 CRL"];

/// Decode one or more certificates.
///
/// PEM input may hold several `CERTIFICATE` blocks; other block types are
/// skipped. DER input holds exactly one certificate.
pub fn decode_certificates(input: &[u8]) -> Result<Vec<Certificate>, TrustError> {
    if input.is_empty() {
        return Err(TrustError::ParseError("empty input".into()));
    }
    if util::is_pem(input) {
        let certs = pem_blocks(input, CERTIFICATE_LABELS, "certificates")?
            .iter()
            .map(|der| parse_certificate_der(der))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(count = certs.len(), "decoded PEM certificates");
        Ok(certs)
    } else {
        Ok(vec![parse_certificate_der(input)?])
    }
}

/// Decode exactly one certificate.
///
/// Fails if the input holds no certificate or more than one.
pub fn decode_certificate(input: &[u8]) -> Result<Certificate, TrustError> {
    let mut certs = decode_certificates(input)?;
    match certs.len() {
        1 => Ok(certs.remove(0)),
        n => Err(TrustError::ParseError(format!(
            "expected exactly one certificate, found {}",
            n
        ))),
    }
}

/// Decode one or more CRLs.
pub fn decode_crls(input: &[u8]) -> Result<Vec<Crl>, TrustError> {
    if input.is_empty() {
        return Err(TrustError::ParseError("empty input".into()));
    }
    if util::is_pem(input) {
        let crls = pem_blocks(input, CRL_LABELS, "CRLs")?
            .iter()
            .map(|der| parse_crl_der(der))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(count = crls.len(), "decoded PEM CRLs");
        Ok(crls)
    } else {
        Ok(vec![parse_crl_der(input)?])
    }
}

/// Decode exactly one CRL.
pub fn decode_crl(input: &[u8]) -> Result<Crl, TrustError> {
    let mut crls = decode_crls(input)?;
    match crls.len() {
        1 => Ok(crls.remove(0)),
        n => Err(TrustError::ParseError(format!(
            "expected exactly one CRL, found {}",
            n
        ))),
    }
}

/// Collect the contents of PEM blocks whose label is in `labels`.
///
/// Stops at the first unreadable block once at least one usable block has
/// been collected (trailing garbage).
fn pem_blocks(input: &[u8], labels: &[&str], what: &str) -> Result<Vec<Vec<u8>>, TrustError> {
    let mut blocks = Vec::new();
    for pem_result in Pem::iter_from_buffer(input) {
        match pem_result {
            Ok(pem) => {
                if labels.contains(&pem.label.as_str()) {
                    blocks.push(pem.contents);
                } else {
                    trace!(label = %pem.label, "skipping PEM block");
                }
            }
            Err(e) => {
                if !blocks.is_empty() {
                    break;
                }
                return Err(TrustError::PemError(format!("failed to parse PEM: {}", e)));
            }
        }
    }

    if blocks.is_empty() {
        return Err(TrustError::PemError(format!("no {} found in PEM input", what)));
    }
    Ok(blocks)
}

/// Parse a single DER certificate into the owned model.
pub(crate) fn parse_certificate_der(input: &[u8]) -> Result<Certificate, TrustError> {
    let (remaining, x509) =
        X509Certificate::from_der(input).map_err(|e| TrustError::DerError(format!("{}", e)))?;

    // Keep only the certificate bytes, not any trailing data, so that
    // equality and fingerprints cover the right content.
    let cert_len = input.len() - remaining.len();
    let cert_der = input.get(..cert_len).unwrap_or(input);
    build_certificate(&x509, cert_der)
}

fn build_certificate(x509: &X509Certificate, raw_der: &[u8]) -> Result<Certificate, TrustError> {
    let tbs = &x509.tbs_certificate;

    let raw_version = tbs.version.0;
    if raw_version > 2 {
        return Err(TrustError::ParseError(format!(
            "unsupported X.509 version {} (expected v1, v2, or v3)",
            raw_version + 1
        )));
    }

    let mut basic_constraints = None;
    let mut subject_key_id = None;
    let mut authority_key_id = None;
    let mut alt_names = Ok(Vec::new());

    for ext in tbs.extensions() {
        match ext.parsed_extension() {
            ParsedExtension::BasicConstraints(bc) => {
                basic_constraints = Some(BasicConstraints {
                    is_ca: bc.ca,
                    path_len_constraint: bc.path_len_constraint,
                });
            }
            ParsedExtension::SubjectKeyIdentifier(ki) => {
                subject_key_id = Some(ki.0.to_vec());
            }
            ParsedExtension::AuthorityKeyIdentifier(aki) => {
                authority_key_id = aki.key_identifier.as_ref().map(|ki| ki.0.to_vec());
            }
            ParsedExtension::SubjectAlternativeName(san) => {
                alt_names = san.general_names.iter().map(decode_general_name).collect();
            }
            ParsedExtension::ParseError { error } if ext.oid == OID_X509_EXT_SUBJECT_ALT_NAME => {
                alt_names = Err(format!("{}", error));
            }
            _ => {}
        }
    }

    Ok(Certificate {
        der: raw_der.to_vec(),
        version: raw_version + 1,
        serial: tbs.raw_serial().to_vec(),
        signature_algorithm: format_sig_algorithm(&x509.signature_algorithm),
        subject: DistinguishedName::from_x509(x509.subject()),
        issuer: DistinguishedName::from_x509(x509.issuer()),
        subject_raw: x509.subject().as_raw().to_vec(),
        issuer_raw: x509.issuer().as_raw().to_vec(),
        not_before: DateTime::from_asn1(&x509.validity().not_before),
        not_after: DateTime::from_asn1(&x509.validity().not_after),
        public_key_algorithm: tbs.subject_pki.algorithm.algorithm.to_id_string(),
        public_key_info: tbs.subject_pki.raw.to_vec(),
        basic_constraints,
        subject_key_id,
        authority_key_id,
        alt_names,
    })
}

/// Decode one `GeneralName` into its tagged form.
fn decode_general_name(gn: &GeneralName) -> Result<AltName, String> {
    Ok(match gn {
        GeneralName::DNSName(name) => AltName::Dns(name.to_string()),
        GeneralName::RFC822Name(email) => AltName::Email(email.to_string()),
        GeneralName::URI(uri) => AltName::Uri(uri.to_string()),
        GeneralName::IPAddress(bytes) => match util::ip_from_bytes(bytes) {
            Some(ip) => AltName::Ip(ip),
            None => {
                return Err(format!(
                    "IP address entry has invalid length {}",
                    bytes.len()
                ))
            }
        },
        GeneralName::DirectoryName(name) => {
            AltName::DirectoryName(DistinguishedName::from_x509(name))
        }
        GeneralName::OtherName(_, value) => AltName::Other {
            kind: AltNameType::OtherName,
            value: value.to_vec(),
        },
        GeneralName::RegisteredID(id) => AltName::Other {
            kind: AltNameType::RegisteredId,
            value: id.as_bytes().to_vec(),
        },
        GeneralName::X400Address(any) => AltName::Other {
            kind: AltNameType::X400Address,
            value: any.as_bytes().to_vec(),
        },
        GeneralName::EDIPartyName(any) => AltName::Other {
            kind: AltNameType::EdiPartyName,
            value: any.as_bytes().to_vec(),
        },
        #[allow(unreachable_patterns)]
        other => return Err(format!("unsupported general name {:?}", other)),
    })
}

fn format_sig_algorithm(algo: &AlgorithmIdentifier) -> String {
    match algo.algorithm.to_id_string().as_str() {
        oid::SHA1_WITH_RSA => "sha1WithRSAEncryption".into(),
        oid::SHA256_WITH_RSA => "sha256WithRSAEncryption".into(),
        oid::SHA384_WITH_RSA => "sha384WithRSAEncryption".into(),
        oid::SHA512_WITH_RSA => "sha512WithRSAEncryption".into(),
        oid::ECDSA_WITH_SHA256 => "ecdsa-with-SHA256".into(),
        oid::ECDSA_WITH_SHA384 => "ecdsa-with-SHA384".into(),
        oid::ECDSA_WITH_SHA512 => "ecdsa-with-SHA512".into(),
        oid::ED25519 => "Ed25519".into(),
        other => other.to_string(),
    }
}

/// Parse a single DER CRL into the owned model.
pub(crate) fn parse_crl_der(input: &[u8]) -> Result<Crl, TrustError> {
    let (remaining, crl) = CertificateRevocationList::from_der(input)
        .map_err(|e| TrustError::DerError(format!("{}", e)))?;
    let crl_len = input.len() - remaining.len();
    let crl_der = input.get(..crl_len).unwrap_or(input);
    Ok(Crl::from_parsed(&crl, crl_der))
}
