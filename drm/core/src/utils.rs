use data_encoding::{BASE64, BASE64URL_NOPAD};

use crate::types::Kid;

/**
    Const-compatible ASCII whitespace trimming (both ends).
*/
pub const fn trim_ascii(s: &[u8]) -> &[u8] {
    s.trim_ascii()
}

/**
    Const-compatible case-insensitive ASCII byte comparison.
*/
pub const fn eq_ignore_ascii_case(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut i = 0;
    while i < a.len() {
        if a[i].to_ascii_lowercase() != b[i].to_ascii_lowercase() {
            return false;
        }
        i += 1;
    }
    true
}

pub(crate) const fn bytes_equal(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut i = 0;
    while i < a.len() {
        if a[i] != b[i] {
            return false;
        }
        i += 1;
    }
    true
}

pub(crate) const fn hex_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/**
    Parse 32 hex digits, optionally separated by hyphens, into 16 bytes.
*/
pub(crate) const fn parse_uuid_bytes(s: &[u8]) -> Option<[u8; 16]> {
    let mut bytes = [0u8; 16];
    let mut bi = 0;
    let mut si = 0;

    while si < s.len() {
        if s[si] == b'-' {
            si += 1;
            continue;
        }
        if bi >= 16 || si + 1 >= s.len() {
            return None;
        }
        let hi = match hex_digit(s[si]) {
            Some(v) => v,
            None => return None,
        };
        let lo = match hex_digit(s[si + 1]) {
            Some(v) => v,
            None => return None,
        };
        bytes[bi] = (hi << 4) | lo;
        bi += 1;
        si += 2;
    }

    if bi != 16 {
        return None;
    }
    Some(bytes)
}

/**
    Format 16 bytes as a lowercase hyphenated UUID
    (`xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx`).
*/
pub fn format_uuid(bytes: &[u8; 16]) -> String {
    let hex = hex::encode(bytes);
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32],
    )
}

/**
    Parse a key ID from any of the spellings found in manifests and
    configuration files:

    - UUID form, as in `cenc:default_KID` (`10000000-1000-1000-1000-100000000001`)
    - 32 plain hex digits
    - base64 or unpadded base64url of the 16 raw bytes (JWK `kid`)
*/
pub fn parse_kid(s: &str) -> Option<Kid> {
    let s = s.trim();
    if let Some(kid) = parse_uuid_bytes(s.as_bytes()) {
        return Some(kid);
    }
    let decoded = BASE64
        .decode(s.as_bytes())
        .or_else(|_| BASE64URL_NOPAD.decode(s.trim_end_matches('=').as_bytes()))
        .ok()?;
    decoded.try_into().ok()
}

/**
    Convenience extension for parsing key IDs from string-like values.
*/
pub trait ParseKid {
    fn parse_kid(&self) -> Option<Kid>;
}

impl ParseKid for str {
    fn parse_kid(&self) -> Option<Kid> {
        parse_kid(self)
    }
}

impl ParseKid for String {
    fn parse_kid(&self) -> Option<Kid> {
        parse_kid(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    const KID: Kid = hex!("10000000100010001000100000000001");

    #[test]
    fn kid_from_uuid_forms() {
        assert_eq!(parse_kid("10000000-1000-1000-1000-100000000001"), Some(KID));
        assert_eq!(parse_kid("10000000100010001000100000000001"), Some(KID));
        assert_eq!(
            parse_kid(" 10000000-1000-1000-1000-100000000001\n"),
            Some(KID)
        );
    }

    #[test]
    fn kid_from_base64_forms() {
        let padded = BASE64.encode(&KID);
        let url = BASE64URL_NOPAD.encode(&KID);
        assert_eq!(parse_kid(&padded), Some(KID));
        assert_eq!(url.parse_kid(), Some(KID));
    }

    #[test]
    fn kid_wrong_length_rejected() {
        assert_eq!(parse_kid("1000000010001000"), None);
        assert_eq!(parse_kid(&BASE64.encode(&[0u8; 8])), None);
        assert_eq!(parse_kid(""), None);
    }

    #[test]
    fn uuid_formatting_round_trips() {
        let s = format_uuid(&KID);
        assert_eq!(s, "10000000-1000-1000-1000-100000000001");
        assert_eq!(parse_kid(&s), Some(KID));
    }

    #[test]
    fn ascii_helpers() {
        assert_eq!(trim_ascii(b"  abc \t"), b"abc");
        assert!(eq_ignore_ascii_case(b"Temporary", b"temporary"));
        assert!(!eq_ignore_ascii_case(b"temp", b"temporary"));
        assert!(bytes_equal(&[1, 2], &[1, 2]));
        assert!(!bytes_equal(&[1, 2], &[1, 3]));
    }
}
