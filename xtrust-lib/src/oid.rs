//! Centralized OID string constants used throughout xtrust-lib.
//!
//! Distinguished name attribute types (RFC 4519 / X.520) and the handful of
//! signature algorithms we name when summarizing certificates.

// ── X.509 Distinguished Name attributes (RFC 4519 / X.520) ──────────────

pub const COMMON_NAME: &str = "2.5.4.3";
pub const SURNAME: &str = "2.5.4.4";
pub const SERIAL_NUMBER: &str = "2.5.4.5";
pub const COUNTRY: &str = "2.5.4.6";
pub const LOCALITY: &str = "2.5.4.7";
pub const STATE_OR_PROVINCE: &str = "2.5.4.8";
pub const STREET_ADDRESS: &str = "2.5.4.9";
pub const ORGANIZATION: &str = "2.5.4.10";
pub const ORGANIZATIONAL_UNIT: &str = "2.5.4.11";
pub const TITLE: &str = "2.5.4.12";
pub const POSTAL_CODE: &str = "2.5.4.17";
pub const GIVEN_NAME: &str = "2.5.4.42";
pub const EMAIL_ADDRESS: &str = "1.2.840.113549.1.9.1"; // PKCS#9
pub const DOMAIN_COMPONENT: &str = "0.9.2342.19200300.100.1.25";
pub const USER_ID: &str = "0.9.2342.19200300.100.1.1";

// ── Signature algorithms ─────────────────────────────────────────────────

pub const SHA1_WITH_RSA: &str = "1.2.840.113549.1.1.5";
pub const SHA256_WITH_RSA: &str = "1.2.840.113549.1.1.11";
pub const SHA384_WITH_RSA: &str = "1.2.840.113549.1.1.12";
pub const SHA512_WITH_RSA: &str = "1.2.840.113549.1.1.13";
pub const ECDSA_WITH_SHA256: &str = "1.2.840.10045.4.3.2";
pub const ECDSA_WITH_SHA384: &str = "1.2.840.10045.4.3.3";
pub const ECDSA_WITH_SHA512: &str = "1.2.840.10045.4.3.4";
pub const ED25519: &str = "1.3.101.112";

/// Short names for DN attribute types, in the spelling RFC 4514 uses.
///
/// Lookups in both directions go through this table so that rendering and
/// parsing agree.
pub(crate) const DN_ATTRIBUTE_NAMES: &[(&str, &str)] = &[
    ("CN", COMMON_NAME),
    ("SN", SURNAME),
    ("SERIALNUMBER", SERIAL_NUMBER),
    ("C", COUNTRY),
    ("L", LOCALITY),
    ("ST", STATE_OR_PROVINCE),
    ("STREET", STREET_ADDRESS),
    ("O", ORGANIZATION),
    ("OU", ORGANIZATIONAL_UNIT),
    ("T", TITLE),
    ("POSTALCODE", POSTAL_CODE),
    ("GIVENNAME", GIVEN_NAME),
    ("EMAILADDRESS", EMAIL_ADDRESS),
    ("DC", DOMAIN_COMPONENT),
    ("UID", USER_ID),
];
