use data_encoding::BASE64;

use crate::error::{KeySystemError, KeySystemResult};

/**
    Decode a standard base64 field, ignoring surrounding whitespace.
*/
pub(crate) fn decode_base64(field: &'static str, value: &str) -> KeySystemResult<Vec<u8>> {
    BASE64
        .decode(value.trim().as_bytes())
        .map_err(|e| KeySystemError::InvalidBase64 {
            field,
            reason: e.to_string(),
        })
}

pub(crate) fn encode_utf16le(s: &str) -> Vec<u8> {
    s.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

/**
    Decode UTF-16LE text, dropping a leading byte-order mark and any
    trailing NUL terminator.
*/
pub(crate) fn decode_utf16le(bytes: &[u8]) -> KeySystemResult<String> {
    if bytes.len() % 2 != 0 {
        return Err(KeySystemError::InvalidUtf16(format!(
            "odd byte length {}",
            bytes.len()
        )));
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    let text = String::from_utf16(&units).map_err(|e| KeySystemError::InvalidUtf16(e.to_string()))?;
    Ok(text
        .trim_start_matches('\u{feff}')
        .trim_end_matches('\0')
        .to_owned())
}
