//! Modified UTF-8 as used by `CONSTANT_Utf8` entries.
//!
//! Differs from standard UTF-8 in two ways: NUL is encoded as `0xC0 0x80`, and
//! supplementary characters are encoded as a surrogate pair of 3-byte sequences.

/// Decode modified UTF-8. Returns `None` for malformed sequences or lone surrogates.
pub fn decode(bytes: &[u8]) -> Option<String> {
    if bytes.is_ascii() && !bytes.contains(&0) {
        return String::from_utf8(bytes.to_vec()).ok();
    }

    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b0 = bytes[i];
        match b0 {
            0x01..=0x7F => {
                units.push(b0 as u16);
                i += 1;
            }
            0xC0..=0xDF => {
                let b1 = continuation(bytes, i + 1)?;
                units.push((((b0 & 0x1F) as u16) << 6) | b1 as u16);
                i += 2;
            }
            0xE0..=0xEF => {
                let b1 = continuation(bytes, i + 1)?;
                let b2 = continuation(bytes, i + 2)?;
                units.push((((b0 & 0x0F) as u16) << 12) | ((b1 as u16) << 6) | b2 as u16);
                i += 3;
            }
            _ => return None,
        }
    }
    String::from_utf16(&units).ok()
}

fn continuation(bytes: &[u8], at: usize) -> Option<u8> {
    let b = *bytes.get(at)?;
    if b & 0xC0 == 0x80 {
        Some(b & 0x3F)
    } else {
        None
    }
}

/// Encode a string as modified UTF-8.
pub fn encode(s: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len());
    for unit in s.encode_utf16() {
        match unit {
            0x0001..=0x007F => out.push(unit as u8),
            0x0000 | 0x0080..=0x07FF => {
                out.push(0xC0 | (unit >> 6) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
            _ => {
                out.push(0xE0 | (unit >> 12) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
        }
    }
    out
}
