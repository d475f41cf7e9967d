#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::indexing_slicing
)]
//! Name matcher tests.

use proptest::prelude::*;
use std::path::PathBuf;
use xtrust_lib::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn cert(name: &str) -> Certificate {
    let mut p = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    p.push("tests");
    p.push("data");
    p.push(name);
    decode_certificate(&std::fs::read(&p).unwrap()).unwrap()
}

fn names(list: &[&str]) -> TrustedNameSet {
    list.iter().map(|s| s.to_string()).collect()
}

fn only_alt_names(types: &[AltNameType]) -> NameEvaluatorConfig {
    NameEvaluatorConfig {
        check_subject_alt_names: true,
        ..NameEvaluatorConfig::disabled()
    }
    .with_alt_name_types(types.iter().copied())
}

fn only_dn() -> NameEvaluatorConfig {
    NameEvaluatorConfig {
        check_subject_dn: true,
        ..NameEvaluatorConfig::disabled()
    }
}

fn only_cn() -> NameEvaluatorConfig {
    NameEvaluatorConfig {
        check_subject_dn_cn: true,
        ..NameEvaluatorConfig::disabled()
    }
}

// ---------------------------------------------------------------------------
// Default configuration
// ---------------------------------------------------------------------------

#[test]
fn default_config_checks_everything_with_dns_and_uri() {
    let config = NameEvaluatorConfig::default();
    assert!(config.check_subject_alt_names);
    assert!(config.check_subject_dn);
    assert!(config.check_subject_dn_cn);
    assert_eq!(
        config.alt_name_types.iter().copied().collect::<Vec<_>>(),
        vec![AltNameType::Dns, AltNameType::Uri]
    );
}

#[test]
fn default_config_matches_cn_dns_uri_and_dn() {
    let c = cert("foo-1A1-good.crt");
    let config = NameEvaluatorConfig::default();
    for name in [
        "foo.example.org",
        "foo-alt.example.org",
        "https://foo.example.org/idp",
        "CN=foo.example.org,OU=Test,O=Example Org,C=US",
    ] {
        assert!(
            matches(&c, Some(&names(&[name])), &config).unwrap(),
            "{}",
            name
        );
    }
}

#[test]
fn default_config_does_not_match_ip_or_email() {
    let c = cert("foo-1A1-good.crt");
    let config = NameEvaluatorConfig::default();
    assert!(!matches(&c, Some(&names(&["10.1.2.3"])), &config).unwrap());
    assert!(!matches(&c, Some(&names(&["admin@foo.example.org"])), &config).unwrap());
}

#[test]
fn unrelated_names_do_not_match() {
    let c = cert("foo-1A1-good.crt");
    let trusted = names(&["bar.example.org", "https://bar.example.org/idp"]);
    assert!(!matches(&c, Some(&trusted), &NameEvaluatorConfig::default()).unwrap());
}

#[test]
fn one_matching_name_among_many_is_enough() {
    let c = cert("foo-1A1-good.crt");
    let trusted = names(&["bar.example.org", "foo-alt.example.org", "baz"]);
    assert!(matches(&c, Some(&trusted), &NameEvaluatorConfig::default()).unwrap());
}

// ---------------------------------------------------------------------------
// Individual sources
// ---------------------------------------------------------------------------

#[test]
fn ip_and_email_alt_names() {
    let c = cert("foo-1A1-good.crt");
    let ip = only_alt_names(&[AltNameType::Ip]);
    assert!(matches(&c, Some(&names(&["10.1.2.3"])), &ip).unwrap());
    assert!(!matches(&c, Some(&names(&["10.1.2.4"])), &ip).unwrap());
    assert!(!matches(&c, Some(&names(&["foo-alt.example.org"])), &ip).unwrap());

    let email = only_alt_names(&[AltNameType::Email]);
    assert!(matches(&c, Some(&names(&["admin@foo.example.org"])), &email).unwrap());
}

#[test]
fn alt_name_comparison_is_exact() {
    let c = cert("foo-1A1-good.crt");
    let dns = only_alt_names(&[AltNameType::Dns]);
    assert!(!matches(&c, Some(&names(&["FOO-ALT.example.org"])), &dns).unwrap());
    assert!(!matches(&c, Some(&names(&["foo.example.org"])), &dns).unwrap());
}

#[test]
fn empty_alt_name_type_set_never_matches() {
    let c = cert("foo-1A1-good.crt");
    let config = only_alt_names(&[]);
    for name in ["foo-alt.example.org", "https://foo.example.org/idp", "10.1.2.3"] {
        assert!(!matches(&c, Some(&names(&[name])), &config).unwrap(), "{}", name);
    }
}

#[test]
fn full_dn_uses_dn_equality() {
    let c = cert("foo-1A1-good.crt");
    let config = only_dn();
    assert!(matches(
        &c,
        Some(&names(&["cn=foo.example.org, ou=TEST, o=Example Org, c=US"])),
        &config
    )
    .unwrap());
    // Wrong RDN order.
    assert!(!matches(
        &c,
        Some(&names(&["C=US,O=Example Org,OU=Test,CN=foo.example.org"])),
        &config
    )
    .unwrap());
    // Not a DN at all.
    assert!(!matches(&c, Some(&names(&["foo.example.org"])), &config).unwrap());
}

#[test]
fn common_name_is_a_plain_string() {
    let c = cert("foo-1A1-good.crt");
    let config = only_cn();
    assert!(matches(&c, Some(&names(&["foo.example.org"])), &config).unwrap());
    assert!(!matches(&c, Some(&names(&["CN=foo.example.org"])), &config).unwrap());
    assert!(!matches(&c, Some(&names(&["foo-alt.example.org"])), &config).unwrap());
}

// ---------------------------------------------------------------------------
// Malformed alternative names
// ---------------------------------------------------------------------------

#[test]
fn malformed_san_is_a_processing_error() {
    let c = cert("foo-1A1-badsan.crt");
    // The CN would match, but extraction failure must not be hidden.
    let err = matches(
        &c,
        Some(&names(&["foo.example.org"])),
        &NameEvaluatorConfig::default(),
    )
    .unwrap_err();
    assert!(err.is_processing_error(), "{}", err);
}

#[test]
fn malformed_san_is_ignored_when_alt_names_are_off() {
    let c = cert("foo-1A1-badsan.crt");
    let config = NameEvaluatorConfig {
        check_subject_alt_names: false,
        ..NameEvaluatorConfig::default()
    };
    assert!(matches(&c, Some(&names(&["foo.example.org"])), &config).unwrap());
}

#[test]
fn malformed_san_with_no_trusted_names_is_vacuous() {
    let c = cert("foo-1A1-badsan.crt");
    assert!(matches(&c, None, &NameEvaluatorConfig::default()).unwrap());
    assert!(matches(&c, Some(&names(&[])), &NameEvaluatorConfig::default()).unwrap());
}

// ---------------------------------------------------------------------------
// Configuration loading
// ---------------------------------------------------------------------------

#[test]
fn config_deserializes_with_defaults() {
    let config: NameEvaluatorConfig =
        serde_json::from_str(r#"{ "check_subject_dn": false, "alt_name_types": ["dns", "ip"] }"#)
            .unwrap();
    assert!(config.check_subject_alt_names);
    assert!(!config.check_subject_dn);
    assert!(config.check_subject_dn_cn);
    assert!(config.alt_name_types.contains(&AltNameType::Ip));
    assert!(!config.alt_name_types.contains(&AltNameType::Uri));
}

#[test]
fn alt_name_type_from_str() {
    assert_eq!("DNS".parse::<AltNameType>().unwrap(), AltNameType::Dns);
    assert_eq!("rfc822".parse::<AltNameType>().unwrap(), AltNameType::Email);
    assert_eq!("dirname".parse::<AltNameType>().unwrap(), AltNameType::DirectoryName);
    assert!("bogus".parse::<AltNameType>().is_err());
    assert_eq!(AltNameType::Ip.tag(), 7);
    assert_eq!(AltNameType::from_tag(6), Some(AltNameType::Uri));
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

fn any_config() -> impl Strategy<Value = NameEvaluatorConfig> {
    let types = prop::collection::btree_set(
        prop::sample::select(vec![
            AltNameType::Dns,
            AltNameType::Uri,
            AltNameType::Ip,
            AltNameType::Email,
            AltNameType::DirectoryName,
        ]),
        0..4,
    );
    (any::<bool>(), any::<bool>(), any::<bool>(), types).prop_map(|(alt, dn, cn, types)| {
        NameEvaluatorConfig {
            check_subject_alt_names: alt,
            check_subject_dn: dn,
            check_subject_dn_cn: cn,
            alt_name_types: types,
        }
    })
}

proptest! {
    #[test]
    fn no_trusted_names_always_matches(config in any_config()) {
        let c = cert("foo-1A1-good.crt");
        prop_assert!(matches(&c, None, &config).unwrap());
        prop_assert!(matches(&c, Some(&TrustedNameSet::new()), &config).unwrap());
    }

    #[test]
    fn disabled_config_always_matches(
        trusted in prop::collection::hash_set(".{0,40}", 1..8),
        types in prop::collection::btree_set(
            prop::sample::select(vec![AltNameType::Dns, AltNameType::Uri]), 0..3),
    ) {
        let c = cert("foo-1A1-badsan.crt");
        let config = NameEvaluatorConfig::disabled().with_alt_name_types(types);
        prop_assert!(matches(&c, Some(&trusted), &config).unwrap());
    }

    #[test]
    fn empty_type_set_never_matches_alt_names_alone(
        trusted in prop::collection::hash_set("[a-z0-9.:/@-]{1,40}", 1..8),
    ) {
        let c = cert("foo-1A1-good.crt");
        prop_assert!(!matches(&c, Some(&trusted), &only_alt_names(&[])).unwrap());
    }
}
