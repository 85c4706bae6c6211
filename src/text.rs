use anyhow::{bail, Result};
use std::borrow::Cow;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16_LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16_BE_BOM: &[u8] = &[0xFE, 0xFF];

/// Decode file bytes as UTF-8, or as UTF-16 when a byte order mark says so.
///
/// Legacy `.strings` files are frequently saved as UTF-16 by Xcode.
pub fn decode(bytes: &[u8]) -> Result<String> {
    if let Some(rest) = bytes.strip_prefix(UTF8_BOM) {
        return Ok(std::str::from_utf8(rest)?.to_string());
    }
    if let Some(rest) = bytes.strip_prefix(UTF16_LE_BOM) {
        return decode_utf16(rest, u16::from_le_bytes);
    }
    if let Some(rest) = bytes.strip_prefix(UTF16_BE_BOM) {
        return decode_utf16(rest, u16::from_be_bytes);
    }
    Ok(std::str::from_utf8(bytes)?.to_string())
}

fn decode_utf16(bytes: &[u8], to_unit: fn([u8; 2]) -> u16) -> Result<String> {
    if bytes.len() % 2 != 0 {
        bail!("UTF-16 content has an odd number of bytes");
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| to_unit([pair[0], pair[1]]))
        .collect();
    Ok(String::from_utf16(&units)?)
}

/// Replace `\"` with `"` and `\'` with `'`. Other escapes are kept verbatim.
pub fn unescape(literal: &str) -> Cow<'_, str> {
    if !literal.contains("\\\"") && !literal.contains("\\'") {
        return Cow::Borrowed(literal);
    }
    Cow::Owned(literal.replace("\\\"", "\"").replace("\\'", "'"))
}
