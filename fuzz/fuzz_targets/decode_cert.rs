#![no_main]

use libfuzzer_sys::fuzz_target;
use xtrust_lib::{decode_certificates, decode_crls, AltNameType};

fuzz_target!(|data: &[u8]| {
    // Decoding must never panic, regardless of input.
    if let Ok(certs) = decode_certificates(data) {
        for cert in &certs {
            let _ = cert.subject().to_rfc2253();
            let _ = cert.issuer().to_rfc2253();
            let _ = cert.serial_hex();
            let _ = cert.common_names();
            let _ = cert.alt_names_of(&[AltNameType::Dns, AltNameType::Uri, AltNameType::Ip]);
            let _ = cert.is_self_signed();
            let _ = xtrust_lib::display_certificate(cert);
            let _ = xtrust_lib::to_json(cert);
        }
        if let [entity, rest @ ..] = certs.as_slice() {
            for issuer in rest {
                let _ = entity.verify_signed_by(issuer);
            }
        }
    }

    if let Ok(crls) = decode_crls(data) {
        for crl in &crls {
            let _ = xtrust_lib::display_crl(crl);
            let _ = crl.is_current_at(0);
        }
    }
});
