#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::indexing_slicing
)]
//! Decoder tests: PEM and DER certificates and CRLs, certificate accessors,
//! and distinguished name handling.

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use xtrust_lib::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn data_path(name: &str) -> PathBuf {
    let mut p = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    p.push("tests");
    p.push("data");
    p.push(name);
    p
}

fn data(name: &str) -> Vec<u8> {
    std::fs::read(data_path(name)).unwrap_or_else(|e| panic!("reading {}: {}", name, e))
}

fn cert(name: &str) -> Certificate {
    decode_certificate(&data(name)).unwrap()
}

fn crl(name: &str) -> Crl {
    decode_crl(&data(name)).unwrap()
}

/// 2023-11-14T22:13:20Z
const AT: i64 = 1_700_000_000;

// ---------------------------------------------------------------------------
// Certificates
// ---------------------------------------------------------------------------

#[test]
fn decode_pem_certificate() {
    let c = cert("foo-1A1-good.crt");
    assert_eq!(c.version(), 3);
    assert_eq!(c.serial(), &[0x64]);
    assert_eq!(c.serial_hex(), "64");
    assert_eq!(c.common_name(), Some("foo.example.org"));
    assert_eq!(c.issuer().common_name(), Some("inter1A1-ca"));
    assert_eq!(c.signature_algorithm(), "ecdsa-with-SHA256");
    assert_eq!(c.not_before().to_iso8601(), "2020-01-01T00:00:00Z");
    assert_eq!(c.not_after().to_iso8601(), "2099-12-31T23:59:59Z");
    assert!(c.is_valid_at(AT));
    assert!(!c.is_ca());
}

#[test]
fn der_and_pem_decode_to_the_same_certificate() {
    let from_der = cert("foo-1A1-good.der");
    let from_pem = cert("foo-1A1-good.crt");
    assert_eq!(from_der, from_pem);
    assert_eq!(from_der.fingerprint_sha256(), from_pem.fingerprint_sha256());
}

#[test]
fn decode_bundle_preserves_order_and_count() {
    let certs = decode_certificates(&data("root1-bundle.pem")).unwrap();
    assert_eq!(certs.len(), 2);
    assert_eq!(certs[0].common_name(), Some("root1-ca"));
    assert_eq!(certs[1].common_name(), Some("inter1A-ca"));
}

#[test]
fn decode_certificate_rejects_bundle() {
    let err = decode_certificate(&data("root1-bundle.pem")).unwrap_err();
    assert!(err.is_decode_error(), "{}", err);
}

#[test]
fn bundle_trailing_garbage_is_ignored() {
    let mut input = data("root1-bundle.pem");
    input.extend_from_slice(b"-----BEGIN CERTIFICATE-----\nnot base64 at all\n");
    let certs = decode_certificates(&input).unwrap();
    assert_eq!(certs.len(), 2);
}

#[test]
fn non_certificate_pem_blocks_are_skipped() {
    let mut input = data("inter1A1-v1.crl");
    input.extend_from_slice(&data("root1-ca.crt"));
    let certs = decode_certificates(&input).unwrap();
    assert_eq!(certs.len(), 1);
    assert_eq!(certs[0].common_name(), Some("root1-ca"));
}

#[test]
fn decode_errors() {
    assert!(decode_certificates(b"").unwrap_err().is_decode_error());
    assert!(matches!(
        decode_certificates(b"\x30\x03\x02\x01\x01").unwrap_err(),
        TrustError::DerError(_)
    ));
    assert!(matches!(
        decode_certificates(&data("inter1A1-v1.crl")).unwrap_err(),
        TrustError::PemError(_)
    ));
    assert!(matches!(
        decode_crls(&data("root1-ca.crt")).unwrap_err(),
        TrustError::PemError(_)
    ));
    assert!(decode_crl(b"garbage").unwrap_err().is_decode_error());
}

#[test]
fn to_pem_reencodes_the_same_der() {
    let c = cert("inter1A-ca.crt");
    let again = decode_certificate(c.to_pem().as_bytes()).unwrap();
    assert_eq!(again.der(), c.der());
}

#[test]
fn fingerprint_format() {
    let c = cert("root1-ca.crt");
    let fp = c.fingerprint_sha256();
    assert_eq!(fp.len(), 32 * 3 - 1);
    assert_eq!(fp, compute_fingerprint(c.der()));
    assert!(fp.chars().all(|ch| ch == ':' || ch.is_ascii_hexdigit()));
    assert_eq!(fp, fp.to_uppercase());
}

// ---------------------------------------------------------------------------
// Extensions
// ---------------------------------------------------------------------------

#[test]
fn alt_names_are_decoded_in_order() {
    let c = cert("foo-1A1-good.crt");
    let names = c.alt_names().unwrap();
    assert_eq!(
        names,
        &[
            AltName::Dns("foo-alt.example.org".into()),
            AltName::Uri("https://foo.example.org/idp".into()),
            AltName::Ip(IpAddr::V4(Ipv4Addr::new(10, 1, 2, 3))),
            AltName::Email("admin@foo.example.org".into()),
        ]
    );
}

#[test]
fn alt_names_of_filters_by_type() {
    let c = cert("foo-1A1-good.crt");
    let ips = c.alt_names_of(&[AltNameType::Ip]).unwrap();
    assert_eq!(ips.len(), 1);
    assert_eq!(ips[0].to_string(), "IP:10.1.2.3");

    let web = c.alt_names_of(&[AltNameType::Dns, AltNameType::Uri]).unwrap();
    assert_eq!(web.len(), 2);

    assert!(c.alt_names_of(&[AltNameType::DirectoryName]).unwrap().is_empty());
}

#[test]
fn certificate_without_san_has_no_alt_names() {
    let c = cert("root1-ca.crt");
    assert!(c.alt_names().unwrap().is_empty());
}

#[test]
fn malformed_san_still_decodes_but_alt_names_fail() {
    let c = cert("foo-1A1-badsan.crt");
    assert_eq!(c.common_name(), Some("foo.example.org"));
    let err = c.alt_names().unwrap_err();
    assert!(err.is_processing_error(), "{}", err);
}

#[test]
fn key_identifiers_link_issuer_and_subject() {
    let entity = cert("foo-1A1-good.crt");
    let issuer = cert("inter1A1-ca.crt");
    assert!(entity.authority_key_identifier().is_some());
    assert_eq!(
        entity.authority_key_identifier(),
        issuer.subject_key_identifier()
    );
    assert_eq!(cert("root1-ca.crt").authority_key_identifier(), None);
}

#[test]
fn same_subject_and_key() {
    let loop_cas = decode_certificates(&data("loop-ca-bundle.pem")).unwrap();
    assert_ne!(loop_cas[0], loop_cas[1]);
    assert!(loop_cas[0].same_subject_and_key(&loop_cas[1]));
    assert_eq!(loop_cas[0].public_key_info(), loop_cas[9].public_key_info());
    assert!(!cert("inter1A1-ca.crt").same_subject_and_key(&cert("inter1A-ca.crt")));
}

#[test]
fn basic_constraints() {
    let b = cert("inter1B-ca.crt").basic_constraints().unwrap();
    assert!(b.is_ca);
    assert_eq!(b.path_len_constraint, Some(0));
    let a = cert("inter1A-ca.crt").basic_constraints().unwrap();
    assert_eq!(a.path_len_constraint, None);
    assert!(!cert("notca-1A1.crt").is_ca());
}

#[test]
fn self_issued_and_self_signed() {
    let root = cert("root1-ca.crt");
    assert!(root.is_self_issued());
    assert!(root.is_self_signed());
    let inter = cert("inter1A-ca.crt");
    assert!(!inter.is_self_issued());
    assert!(!inter.is_self_signed());
}

#[test]
fn signature_verification() {
    let entity = cert("foo-1A1-good.crt");
    assert!(entity.verify_signed_by(&cert("inter1A1-ca.crt")).is_ok());
    assert!(entity.verify_signed_by(&cert("inter1A-ca.crt")).is_err());
    assert!(cert("foo-1A1-forged.crt")
        .verify_signed_by(&cert("inter1A1-ca.crt"))
        .is_err());
}

#[test]
fn certificate_json() {
    let json = to_json(&cert("foo-1A1-good.crt")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["serial"], "64");
    assert_eq!(value["subject"], "CN=foo.example.org,OU=Test,O=Example Org,C=US");
    assert_eq!(value["subject_alt_names"][0]["type"], "Dns");
    assert_eq!(value["subject_alt_names"][2]["value"], "10.1.2.3");
}

#[test]
fn display_certificate_summary() {
    let text = display_certificate(&cert("foo-1A1-good.crt"));
    assert!(text.contains("Subject: CN=foo.example.org,OU=Test,O=Example Org,C=US"));
    assert!(text.contains("DNS:foo-alt.example.org"));
    assert!(text.contains("Fingerprint (SHA-256):"));
}

// ---------------------------------------------------------------------------
// CRLs
// ---------------------------------------------------------------------------

#[test]
fn decode_pem_crl() {
    let c = crl("inter1A1-v1.crl");
    assert_eq!(c.issuer().common_name(), Some("inter1A1-ca"));
    assert_eq!(c.this_update().to_iso8601(), "2020-01-01T00:00:00Z");
    assert_eq!(
        c.next_update().map(|t| t.to_iso8601()),
        Some("2099-12-31T23:59:59Z".to_string())
    );
    assert_eq!(c.revoked().len(), 1);
    let entry = c.find_revoked(&[0x65]).unwrap();
    assert_eq!(entry.reason, Some("keyCompromise"));
    assert!(c.find_revoked(&[0x64]).is_none());
}

#[test]
fn der_and_pem_crls_match() {
    let pem = crl("inter1A1-v1.crl");
    let der = crl("inter1A1-v1.crl.der");
    assert_eq!(pem, der);
    assert_eq!(decode_crls(&data("inter1A1-v1.crl.der")).unwrap().len(), 1);
}

#[test]
fn crl_validity_window() {
    assert!(crl("inter1A1-empty.crl").is_current_at(AT));
    assert!(crl("inter1A1-empty.crl").revoked().is_empty());
    let expired = crl("inter1A1-expired.crl");
    assert!(!expired.is_current_at(AT));
    assert!(expired.is_current_at(1_000_000_000));
    assert!(!crl("inter1A1-future.crl").is_current_at(AT));
}

#[test]
fn crl_issuer_and_signature() {
    let c = crl("inter1A1-v1.crl");
    let issuer = cert("inter1A1-ca.crt");
    assert!(c.is_issued_by(&issuer));
    assert!(!c.is_issued_by(&cert("inter1A-ca.crt")));
    assert!(c.verify_signed_by(&issuer).is_ok());
    // Right issuer name, wrong key.
    let forged = crl("inter1A1-forged.crl");
    assert!(forged.is_issued_by(&issuer));
    assert!(forged.verify_signed_by(&issuer).is_err());
    assert!(c.verify_signed_by(&cert("inter1A-ca.crt")).is_err());
}

#[test]
fn display_crl_lists_revoked_serials() {
    let text = display_crl(&crl("inter1A1-v1.crl"));
    assert!(text.contains("Serial: 65"));
    assert!(text.contains("Reason: keyCompromise"));
    assert!(display_crl(&crl("inter1A1-empty.crl")).contains("No Revoked Certificates."));
}

// ---------------------------------------------------------------------------
// Distinguished names
// ---------------------------------------------------------------------------

#[test]
fn subject_renders_rfc2253() {
    let c = cert("foo-1A1-good.crt");
    assert_eq!(
        c.subject().to_rfc2253(),
        "CN=foo.example.org,OU=Test,O=Example Org,C=US"
    );
    assert_eq!(c.common_names(), vec!["foo.example.org"]);
}

#[test]
fn dn_equality_ignores_case_and_spacing() {
    let subject = cert("foo-1A1-good.crt").subject().clone();
    for s in [
        "CN=foo.example.org,OU=Test,O=Example Org,C=US",
        "cn=FOO.example.org, ou=test, o=example  org, c=us",
        "CN = foo.example.org ; OU=Test ; O=Example Org ; C=US",
        "2.5.4.3=foo.example.org,OID.2.5.4.11=Test,O=Example Org,C=US",
    ] {
        let parsed = DistinguishedName::parse(s).unwrap_or_else(|| panic!("parse {}", s));
        assert!(parsed.dn_equals(&subject), "{}", s);
    }
}

#[test]
fn dn_equality_respects_rdn_order() {
    let a = DistinguishedName::parse("CN=foo,O=Example Org").unwrap();
    let b = DistinguishedName::parse("O=Example Org,CN=foo").unwrap();
    assert_ne!(a, b);
}

#[test]
fn multi_valued_rdn_is_a_set() {
    let a = DistinguishedName::parse("CN=x+OU=y,O=z").unwrap();
    let b = DistinguishedName::parse("OU=y+CN=x,O=z").unwrap();
    assert_eq!(a, b);
    assert_eq!(a.len(), 2);
}

#[test]
fn dn_escapes_and_quotes() {
    let escaped = DistinguishedName::parse(r"CN=a\, b,O=z").unwrap();
    let quoted = DistinguishedName::parse(r#"CN="a, b",O=z"#).unwrap();
    let hex_pair = DistinguishedName::parse(r"CN=a\2C b,O=z").unwrap();
    assert_eq!(escaped, quoted);
    assert_eq!(escaped, hex_pair);
    assert_eq!(escaped.common_name(), Some("a, b"));
    assert_eq!(escaped.to_rfc2253(), r"CN=a\, b,O=z");
}

#[test]
fn non_dn_strings_do_not_parse() {
    for s in [
        "foo.example.org",
        "https://foo.example.org/idp",
        "CN=foo,",
        "NOTANATTRIBUTE=x",
        "CN=a\"b",
    ] {
        assert!(DistinguishedName::parse(s).is_none(), "{}", s);
    }
    assert!(DistinguishedName::parse("").unwrap().is_empty());
}
