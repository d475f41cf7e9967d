#![no_main]

use libfuzzer_sys::fuzz_target;
use xtrust_lib::{matches, DistinguishedName, NameEvaluatorConfig, TrustedNameSet};

const CERT: &[u8] = include_bytes!("../../xtrust-lib/tests/data/foo-1A1-good.crt");

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(cert) = xtrust_lib::decode_certificate(CERT) else {
        return;
    };

    // DN parsing and comparison must never panic on arbitrary text.
    if let Some(dn) = DistinguishedName::parse(text) {
        let _ = dn.dn_equals(cert.subject());
        let _ = dn.to_rfc2253();
    }

    let trusted: TrustedNameSet = text.split('\n').map(str::to_string).collect();
    let _ = matches(&cert, Some(&trusted), &NameEvaluatorConfig::default());
});
