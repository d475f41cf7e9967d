//! Distinguished names: extraction from certificates, RFC 4514 string
//! parsing and rendering, and comparison.
//!
//! Comparison follows X.500 name matching rather than string equality: each
//! RDN is compared as a set of attribute type/value pairs, values are matched
//! case-insensitively with insignificant whitespace folded, and RDN order is
//! significant.

use crate::oid;
use crate::util;
use serde::{Serialize, Serializer};
use x509_parser::prelude::*;

/// A single attribute type and value from an RDN.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Attribute {
    /// Dotted-decimal OID of the attribute type.
    oid: String,
    /// Attribute value. Values that are not character strings are kept as
    /// `#` followed by the lowercase hex of their DER content.
    value: String,
}

/// An X.509 distinguished name, as an ordered sequence of RDNs.
///
/// RDNs are stored in encoding order (least specific first, e.g. `C`, `O`,
/// `CN`). String renderings use the reverse, RFC 4514 order.
#[derive(Debug, Clone, Default)]
pub struct DistinguishedName {
    rdns: Vec<Vec<Attribute>>,
}

impl DistinguishedName {
    /// Build from a parsed X.509 name.
    pub(crate) fn from_x509(name: &X509Name) -> Self {
        let rdns = name
            .iter()
            .map(|rdn| {
                rdn.iter()
                    .map(|attr| {
                        let value = match attr.as_str() {
                            Ok(s) => s.to_string(),
                            Err(_) => format!("#{}", hex::encode(attr.attr_value().as_bytes())),
                        };
                        Attribute {
                            oid: attr.attr_type().to_id_string(),
                            value,
                        }
                    })
                    .collect()
            })
            .collect();
        DistinguishedName { rdns }
    }

    /// Parse an RFC 4514 (or RFC 2253) string such as
    /// `CN=foo.example.org, O=Example Org, C=US`.
    ///
    /// Returns `None` if the input is not syntactically a distinguished name.
    /// Attribute types may be short names (`CN`, `ou`), `OID.`-prefixed or
    /// bare dotted OIDs. Values may be quoted, backslash-escaped, or given as
    /// `#` hex.
    pub fn parse(input: &str) -> Option<Self> {
        let chars: Vec<char> = input.chars().collect();
        let mut pos = skip_spaces(&chars, 0);
        let mut rdns: Vec<Vec<Attribute>> = Vec::new();
        if pos == chars.len() {
            return Some(DistinguishedName::default());
        }

        let mut current: Vec<Attribute> = Vec::new();
        loop {
            let (attr, next) = parse_attribute(&chars, pos)?;
            current.push(attr);
            pos = skip_spaces(&chars, next);
            match chars.get(pos) {
                None => {
                    rdns.push(std::mem::take(&mut current));
                    break;
                }
                Some('+') => pos += 1,
                Some(',') | Some(';') => {
                    rdns.push(std::mem::take(&mut current));
                    pos += 1;
                }
                Some(_) => return None,
            }
            pos = skip_spaces(&chars, pos);
            if pos == chars.len() {
                // Trailing separator
                return None;
            }
        }

        // String order is most-specific first; store in encoding order.
        rdns.reverse();
        Some(DistinguishedName { rdns })
    }

    /// Number of RDNs.
    pub fn len(&self) -> usize {
        self.rdns.len()
    }

    /// Whether the name has no RDNs.
    pub fn is_empty(&self) -> bool {
        self.rdns.is_empty()
    }

    /// All values of the given attribute type, in encoding order.
    pub fn values_of(&self, attr_oid: &str) -> Vec<&str> {
        self.rdns
            .iter()
            .flatten()
            .filter(|a| a.oid == attr_oid)
            .map(|a| a.value.as_str())
            .collect()
    }

    /// The most specific common name: the last CN attribute in encoding
    /// order, which is the first one in the RFC 4514 rendering.
    pub fn common_name(&self) -> Option<&str> {
        self.values_of(oid::COMMON_NAME).last().copied()
    }

    /// All common names, most specific first.
    pub fn common_names(&self) -> Vec<&str> {
        let mut names = self.values_of(oid::COMMON_NAME);
        names.reverse();
        names
    }

    /// Render as an RFC 4514 string, most specific RDN first, using short
    /// attribute names where known (e.g. `CN=foo,O=Example Org,C=US`).
    pub fn to_rfc2253(&self) -> String {
        self.rdns
            .iter()
            .rev()
            .map(|rdn| {
                rdn.iter()
                    .map(|attr| {
                        format!("{}={}", util::oid_short_name(&attr.oid), escape_value(&attr.value))
                    })
                    .collect::<Vec<_>>()
                    .join("+")
            })
            .collect::<Vec<_>>()
            .join(",")
    }

    /// X.500 name equality: same number of RDNs, and each RDN holds the same
    /// set of attributes after value normalization.
    pub fn dn_equals(&self, other: &DistinguishedName) -> bool {
        self.canonical() == other.canonical()
    }

    fn canonical(&self) -> Vec<Vec<(String, String)>> {
        self.rdns
            .iter()
            .map(|rdn| {
                let mut attrs: Vec<(String, String)> = rdn
                    .iter()
                    .map(|a| (a.oid.clone(), normalize_value(&a.value)))
                    .collect();
                attrs.sort();
                attrs.dedup();
                attrs
            })
            .collect()
    }
}

impl PartialEq for DistinguishedName {
    fn eq(&self, other: &Self) -> bool {
        self.dn_equals(other)
    }
}

impl Eq for DistinguishedName {}

impl std::fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_rfc2253())
    }
}

impl Serialize for DistinguishedName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_rfc2253())
    }
}

/// Case-fold and collapse runs of whitespace; leading and trailing
/// whitespace is insignificant.
fn normalize_value(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Escape a value for RFC 4514 output.
fn escape_value(value: &str) -> String {
    if value.starts_with('#') && value.len() > 1 {
        // Hex-encoded binary value, emitted as-is.
        return value.to_string();
    }
    let count = value.chars().count();
    let mut out = String::with_capacity(value.len());
    for (i, ch) in value.chars().enumerate() {
        match ch {
            ',' | '+' | '"' | '\\' | '<' | '>' | ';' | '=' => {
                out.push('\\');
                out.push(ch);
            }
            ' ' if i == 0 || i + 1 == count => out.push_str("\\ "),
            '#' if i == 0 => out.push_str("\\#"),
            _ => out.push(ch),
        }
    }
    out
}

fn skip_spaces(chars: &[char], mut pos: usize) -> usize {
    while chars.get(pos).is_some_and(|c| *c == ' ') {
        pos += 1;
    }
    pos
}

/// Parse `type=value` starting at `pos`. Returns the attribute and the
/// position just past the value.
fn parse_attribute(chars: &[char], pos: usize) -> Option<(Attribute, usize)> {
    let eq = (pos..chars.len()).find(|&i| chars.get(i) == Some(&'='))?;
    let type_str: String = chars.get(pos..eq)?.iter().collect();
    if type_str.contains([',', '+', ';', '"', '\\']) {
        return None;
    }
    let oid = util::attribute_type_to_oid(&type_str)?;

    let start = skip_spaces(chars, eq + 1);
    let (value, next) = match chars.get(start) {
        Some('#') => parse_hex_value(chars, start + 1)?,
        Some('"') => parse_quoted_value(chars, start + 1)?,
        _ => parse_plain_value(chars, start)?,
    };
    Some((Attribute { oid, value }, next))
}

fn parse_hex_value(chars: &[char], start: usize) -> Option<(String, usize)> {
    let mut end = start;
    while chars.get(end).is_some_and(|c| c.is_ascii_hexdigit()) {
        end += 1;
    }
    let digits: String = chars.get(start..end)?.iter().collect();
    if digits.is_empty() || digits.len() % 2 != 0 {
        return None;
    }
    Some((format!("#{}", digits.to_ascii_lowercase()), end))
}

fn parse_quoted_value(chars: &[char], start: usize) -> Option<(String, usize)> {
    let mut bytes = Vec::new();
    let mut pos = start;
    loop {
        match chars.get(pos)? {
            '"' => {
                let value = String::from_utf8(bytes).ok()?;
                return Some((value, pos + 1));
            }
            '\\' => {
                pos = push_escape(chars, pos + 1, &mut bytes)?;
            }
            c => {
                push_char(*c, &mut bytes);
                pos += 1;
            }
        }
    }
}

fn parse_plain_value(chars: &[char], start: usize) -> Option<(String, usize)> {
    let mut bytes = Vec::new();
    let mut pos = start;
    // Length of `bytes` up to the last character that was escaped, so that
    // escaped trailing spaces survive trimming.
    let mut protected = 0;
    while let Some(c) = chars.get(pos) {
        match c {
            ',' | '+' | ';' => break,
            '"' | '<' | '>' | '=' => return None,
            '\\' => {
                pos = push_escape(chars, pos + 1, &mut bytes)?;
                protected = bytes.len();
            }
            other => {
                push_char(*other, &mut bytes);
                pos += 1;
            }
        }
    }
    while bytes.len() > protected && bytes.last() == Some(&b' ') {
        bytes.pop();
    }
    let value = String::from_utf8(bytes).ok()?;
    Some((value, pos))
}

/// Handle the character(s) after a backslash. Either a special character or
/// a pair of hex digits encoding one byte.
fn push_escape(chars: &[char], pos: usize, bytes: &mut Vec<u8>) -> Option<usize> {
    let first = *chars.get(pos)?;
    if let (Some(hi), Some(lo)) = (
        first.to_digit(16),
        chars.get(pos + 1).and_then(|c| c.to_digit(16)),
    ) {
        bytes.push(u8::try_from(hi * 16 + lo).ok()?);
        return Some(pos + 2);
    }
    match first {
        ',' | '+' | '"' | '\\' | '<' | '>' | ';' | '=' | ' ' | '#' => {
            push_char(first, bytes);
            Some(pos + 1)
        }
        _ => None,
    }
}

fn push_char(c: char, bytes: &mut Vec<u8>) {
    let mut buf = [0u8; 4];
    bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
}
