//! Human-readable and JSON formatting of certificates and CRLs.

use crate::crl::{Crl, RevokedEntry};
use crate::fields::{AltName, BasicConstraints, Certificate, DateTime};
use crate::util;
use crate::TrustError;
use serde::{Serialize, Serializer};

/// Format a certificate as human-readable text.
pub fn display_certificate(cert: &Certificate) -> String {
    let mut out = String::new();

    out.push_str("Certificate:\n");
    out.push_str(&format!("  Version: {} (v{})\n", cert.version(), cert.version()));
    out.push_str(&format!("  Serial: {}\n", cert.serial_hex()));
    out.push_str(&format!("  Signature Algorithm: {}\n", cert.signature_algorithm()));
    out.push_str(&format!("  Issuer: {}\n", cert.issuer()));
    out.push_str("  Validity:\n");
    out.push_str(&format!("    Not Before: {}\n", cert.not_before()));
    out.push_str(&format!("    Not After:  {}\n", cert.not_after()));
    out.push_str(&format!("  Subject: {}\n", cert.subject()));

    if let Some(BasicConstraints {
        is_ca,
        path_len_constraint,
    }) = cert.basic_constraints()
    {
        let pl = match path_len_constraint {
            Some(n) => format!(", pathlen:{}", n),
            None => String::new(),
        };
        out.push_str(&format!("  Basic Constraints: CA={}{}\n", is_ca, pl));
    }
    if let Some(ski) = cert.subject_key_identifier() {
        out.push_str(&format!("  Subject Key Identifier: {}\n", util::hex_colon_upper(ski)));
    }
    if let Some(aki) = cert.authority_key_identifier() {
        out.push_str(&format!(
            "  Authority Key Identifier: keyid:{}\n",
            util::hex_colon_upper(aki)
        ));
    }

    match cert.alt_names() {
        Ok([]) => {}
        Ok(names) => {
            out.push_str("  Subject Alternative Name:\n");
            for name in names {
                out.push_str(&format!("    {}\n", name));
            }
        }
        Err(e) => out.push_str(&format!("  Subject Alternative Name: <{}>\n", e)),
    }

    out.push_str(&format!("  Fingerprint (SHA-256): {}\n", cert.fingerprint_sha256()));
    out
}

/// Format a CRL as human-readable text.
pub fn display_crl(crl: &Crl) -> String {
    let mut out = String::new();

    out.push_str("Certificate Revocation List:\n");
    out.push_str(&format!("  Issuer: {}\n", crl.issuer()));
    out.push_str(&format!("  This Update: {}\n", crl.this_update()));
    match crl.next_update() {
        Some(next) => out.push_str(&format!("  Next Update: {}\n", next)),
        None => out.push_str("  Next Update: NONE\n"),
    }
    if crl.revoked().is_empty() {
        out.push_str("  No Revoked Certificates.\n");
    } else {
        out.push_str("  Revoked Certificates:\n");
        for RevokedEntry {
            serial,
            revocation_date,
            reason,
        } in crl.revoked()
        {
            out.push_str(&format!(
                "    Serial: {}  Date: {}",
                util::format_serial(serial),
                revocation_date
            ));
            if let Some(reason) = reason {
                out.push_str(&format!("  Reason: {}", reason));
            }
            out.push('\n');
        }
    }
    out
}

/// Serialize a value to a pretty-printed JSON string.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, TrustError> {
    serde_json::to_string_pretty(value).map_err(TrustError::Json)
}

#[derive(Serialize)]
struct CertificateSummary<'a> {
    version: u32,
    serial: String,
    signature_algorithm: &'a str,
    issuer: String,
    subject: String,
    not_before: String,
    not_after: String,
    basic_constraints: Option<BasicConstraints>,
    subject_key_identifier: Option<String>,
    authority_key_identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    subject_alt_names: Option<&'a [AltName]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    subject_alt_names_error: Option<String>,
    fingerprint_sha256: String,
}

impl Serialize for Certificate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let (subject_alt_names, subject_alt_names_error) = match self.alt_names() {
            Ok(names) => (Some(names), None),
            Err(e) => (None, Some(e.to_string())),
        };
        CertificateSummary {
            version: self.version(),
            serial: self.serial_hex(),
            signature_algorithm: self.signature_algorithm(),
            issuer: self.issuer().to_rfc2253(),
            subject: self.subject().to_rfc2253(),
            not_before: self.not_before().to_iso8601(),
            not_after: self.not_after().to_iso8601(),
            basic_constraints: self.basic_constraints(),
            subject_key_identifier: self.subject_key_identifier().map(util::hex_colon_upper),
            authority_key_identifier: self.authority_key_identifier().map(util::hex_colon_upper),
            subject_alt_names,
            subject_alt_names_error,
            fingerprint_sha256: self.fingerprint_sha256(),
        }
        .serialize(serializer)
    }
}

#[derive(Serialize)]
struct CrlSummary<'a> {
    issuer: String,
    this_update: DateTime,
    next_update: Option<DateTime>,
    revoked: &'a [RevokedEntry],
}

impl Serialize for Crl {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        CrlSummary {
            issuer: self.issuer().to_rfc2253(),
            this_update: self.this_update(),
            next_update: self.next_update(),
            revoked: self.revoked(),
        }
        .serialize(serializer)
    }
}
