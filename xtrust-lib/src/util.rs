//! Shared encoding utilities.

use crate::oid;
use base64::Engine;

/// Whether the input looks like PEM (begins with `-----BEGIN` after leading
/// whitespace).
pub(crate) fn is_pem(input: &[u8]) -> bool {
    let start = input
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(input.len());
    input
        .get(start..)
        .is_some_and(|rest| rest.starts_with(b"-----BEGIN"))
}

/// Format bytes as colon-separated uppercase hex (e.g., "AB:CD:EF").
pub(crate) fn hex_colon_upper(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(":")
}

/// Format a serial number as colon-separated uppercase hex, stripping leading
/// zero bytes but keeping at least one byte.
pub(crate) fn format_serial(raw: &[u8]) -> String {
    let stripped = match raw.iter().position(|&b| b != 0) {
        Some(pos) => raw.get(pos..).unwrap_or(raw),
        None => raw.get(raw.len().saturating_sub(1)..).unwrap_or(raw),
    };
    hex_colon_upper(stripped)
}

/// Encode bytes as base64 with PEM-style 64-character line wrapping.
pub(crate) fn base64_wrap(data: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(data);
    encoded
        .as_bytes()
        .chunks(64)
        .filter_map(|c| std::str::from_utf8(c).ok())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Short name for a DN attribute OID, or the dotted OID if unknown.
pub(crate) fn oid_short_name(oid_str: &str) -> String {
    oid::DN_ATTRIBUTE_NAMES
        .iter()
        .find(|(_, o)| *o == oid_str)
        .map(|(name, _)| (*name).to_string())
        .unwrap_or_else(|| oid_str.to_string())
}

/// Resolve a DN attribute type as written in a string DN (`CN`, `ou`,
/// `OID.2.5.4.3`, `2.5.4.3`) to its dotted OID.
pub(crate) fn attribute_type_to_oid(name: &str) -> Option<String> {
    let name = name.trim();
    let upper = name.to_ascii_uppercase();
    if let Some((_, o)) = oid::DN_ATTRIBUTE_NAMES.iter().find(|(n, _)| *n == upper) {
        return Some((*o).to_string());
    }
    // Common aliases seen in the wild.
    match upper.as_str() {
        "E" | "EMAIL" => return Some(oid::EMAIL_ADDRESS.to_string()),
        "S" => return Some(oid::STATE_OR_PROVINCE.to_string()),
        _ => {}
    }
    let dotted = upper.strip_prefix("OID.").unwrap_or(&upper);
    let is_dotted_oid = !dotted.is_empty()
        && dotted.split('.').count() >= 2
        && dotted
            .split('.')
            .all(|arc| !arc.is_empty() && arc.bytes().all(|b| b.is_ascii_digit()));
    is_dotted_oid.then(|| dotted.to_string())
}

/// Render raw IP address bytes from a SAN entry.
pub(crate) fn ip_from_bytes(bytes: &[u8]) -> Option<std::net::IpAddr> {
    if let Ok(octets) = <[u8; 4]>::try_from(bytes) {
        Some(std::net::IpAddr::from(octets))
    } else if let Ok(octets) = <[u8; 16]>::try_from(bytes) {
        Some(std::net::IpAddr::from(octets))
    } else {
        None
    }
}
