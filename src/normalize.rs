//! Unicode and percent-encoding canonicalization shared by the detectors.

use unicode_normalization::UnicodeNormalization;

/// Apply Unicode NFKC normalization.
///
/// Collapses homoglyphs to their canonical form (fullwidth '．' becomes
/// '.', fullwidth '＜' becomes '<') so encoded look-alikes cannot slip
/// past the pattern tables. Deterministic, total, and idempotent.
pub fn normalize(raw: &str) -> String {
    raw.nfkc().collect()
}

/// Decode one round of percent-encoding with strict semantics.
///
/// A `%` must be followed by exactly two hex digits, and the decoded
/// byte sequence must be valid UTF-8; anything else is an error.
/// `changed` is false when the input contained no percent escapes at
/// all, which lets callers detect the fixed point of repeated decoding.
pub fn percent_decode(input: &str) -> Result<Decoded, DecodeError> {
    let mut bytes = Vec::with_capacity(input.len());
    let mut chars = input.char_indices();
    let mut changed = false;

    while let Some((i, c)) = chars.next() {
        if c == '%' {
            let hex = input.get(i + 1..i + 3).ok_or(DecodeError)?;
            if hex.len() != 2 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(DecodeError);
            }
            let byte = u8::from_str_radix(hex, 16).map_err(|_| DecodeError)?;
            bytes.push(byte);
            changed = true;
            // Skip the two hex digits.
            chars.next();
            chars.next();
        } else {
            let mut buf = [0u8; 4];
            bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
        }
    }

    let value = String::from_utf8(bytes).map_err(|_| DecodeError)?;
    Ok(Decoded { value, changed })
}

/// Output of one percent-decoding round.
#[derive(Debug, Clone)]
pub struct Decoded {
    /// The decoded string.
    pub value: String,
    /// Whether any escape sequence was actually decoded.
    pub changed: bool,
}

/// Malformed percent escape or invalid UTF-8 after decoding.
///
/// Legitimate values contain bare `%` signs ("100% cotton"), so
/// callers stop decoding and judge the value as decoded so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeError;
