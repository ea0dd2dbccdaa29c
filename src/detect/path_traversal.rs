//! Path traversal detection, permissive mode.
//!
//! Blocks traversal shapes (`../` and every encoding of it), dangerous
//! protocols, Windows absolute and UNC paths, and null bytes, while
//! allowing the legitimate web patterns that naive detectors flag:
//! `http(s)://` URLs, protocol-relative CDN URLs, HTML entities used as
//! formatting, `./file.txt`, and drive-letter mentions in prose.

use crate::normalize::{normalize, percent_decode};
use regex::Regex;
use std::sync::LazyLock;

/// Literal traversal substrings, matched on the lowercased input.
static TRAVERSAL_PATTERNS: &[&str] = &[
    "../",
    "..\\",
    ".../",
    "...\\",
    "..../",
    "....\\",
    "..//",
    "..\\//",
    "../\\",
    "..\\/",
    "..;/", // servlet path-parameter trick
    "~/",
    "~\\",
];

/// Percent-encoded traversal, including double-encoded, overlong UTF-8,
/// and IIS %u spellings.
static ENCODED_TRAVERSAL: &[&str] = &[
    "%2e%2e%2f",
    "%2e%2e/",
    "..%2f",
    "%2e%2e%5c",
    "%2e%2e\\",
    "..%5c",
    "%252e%252e%252f",
    "%252e%252e%255c",
    ".%2e/",
    "%2e./",
    ".%2e\\",
    "%2e.\\",
    "%c0%ae", // overlong dot
    "%e0%40%ae",
    "%c0%2e",
    "%c1%9c", // overlong backslash
    "%c1%8e",
    "%u002e%u002e",
];

/// Encoded spellings of the file: protocol.
static ENCODED_PROTOCOLS: &[&str] = &["%66ile:", "%46ile:", "file%3a", "%66%69%6c%65"];

/// Named entities that are plain formatting, never an attack on their own.
static SAFE_ENTITIES: &[&str] = &[
    "&gt;", "&lt;", "&amp;", "&quot;", "&nbsp;", "&apos;", "&cent;", "&pound;", "&yen;",
    "&euro;", "&copy;", "&reg;",
];

/// Unicode look-alike dots. NFKC collapses most of these already; the
/// table still covers code points normalization preserves.
static UNICODE_DOTS: &[char] = &[
    '\u{ff0e}', // fullwidth full stop
    '\u{2024}', // one dot leader
    '\u{2025}', // two dot leader
    '\u{2026}', // horizontal ellipsis
];

/// Unicode look-alike slashes.
static UNICODE_SLASHES: &[char] = &[
    '\u{ff0f}', // fullwidth solidus
    '\u{2044}', // fraction slash
    '\u{2215}', // division slash
    '\u{ff3c}', // fullwidth reverse solidus
];

static SCHEME_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([a-z]+)://").unwrap());

static DOMAIN_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^//[a-zA-Z0-9][-a-zA-Z0-9.]*[a-zA-Z0-9]").unwrap());

static NUMERIC_ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#x?[0-9a-fA-F]+;").unwrap());

static DECIMAL_ENTITY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"&#([0-9]+);").unwrap());

static HEX_ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#x([0-9a-fA-F]+);").unwrap());

static WINDOWS_ABSOLUTE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z]:[\\/]").unwrap());

static DECODED_PROTOCOL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:file|ftp)://").unwrap());

static RESIDUAL_DOTS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.{2,}[/\\]").unwrap());

/// Maximum rounds of percent-decoding applied to nested encodings.
const MAX_DECODE_ROUNDS: usize = 3;

const ALLOWED_SCHEMES: &[&str] = &["http", "https", "ws", "wss"];

/// Detect filesystem-escape patterns in a single value.
///
/// Empty input is benign. Checks are ordered; the protocol and entity
/// checks can resolve a value as safe early, everything else
/// short-circuits on the first dangerous shape.
pub fn is_path_traversal(raw: &str) -> bool {
    if raw.is_empty() {
        return false;
    }

    let normalized = normalize(raw);
    let lower = normalized.to_lowercase();

    // 1. Scheme allow-list: http(s) and websockets pass, anything else
    //    with a scheme (file://, ftp://) is blocked outright.
    if let Some(caps) = SCHEME_PREFIX.captures(&lower) {
        return !ALLOWED_SCHEMES.contains(&&caps[1]);
    }

    // 2. Protocol-relative URLs pass when domain-shaped and dot-dot-free.
    if normalized.starts_with("//")
        && DOMAIN_SHAPE.is_match(&normalized)
        && !normalized.contains("..")
    {
        return false;
    }

    // 3. Numeric HTML entities: dangerous only if the decoded text hides
    //    a traversal shape; otherwise the value is just formatting.
    if NUMERIC_ENTITY.is_match(&normalized) {
        let decoded = decode_numeric_entities(&normalized);
        return decoded.contains("..") || decoded.contains("\\\\");
    }

    // Named formatting entities without dot-dot are safe as-is.
    if SAFE_ENTITIES.iter().any(|e| lower.contains(e)) && !normalized.contains("..") {
        return false;
    }

    // 4. UNC paths
    if normalized.starts_with("\\\\") || lower.starts_with("%5c%5c") {
        return true;
    }

    // 5. Windows absolute path. Bare "C:" in prose has no separator and
    //    is allowed.
    if WINDOWS_ABSOLUTE.is_match(&lower) {
        return true;
    }

    // 6. Null bytes in any encoding
    if normalized.contains('\0')
        || lower.contains("%00")
        || lower.contains("\\0")
        || lower.contains("%c0%80")
    {
        return true;
    }

    // 7. Literal traversal substrings
    if TRAVERSAL_PATTERNS.iter().any(|p| lower.contains(p)) {
        return true;
    }

    // 8. Encoded traversal
    if ENCODED_TRAVERSAL.iter().any(|p| lower.contains(p)) {
        return true;
    }

    // 9. Encoded dangerous protocols
    if ENCODED_PROTOCOLS.iter().any(|p| lower.contains(p)) {
        return true;
    }

    // 10. Unicode homoglyph traversal shapes
    if has_unicode_traversal(&normalized) {
        return true;
    }

    // 11. Iterative percent-decoding for nested encodings. Decode
    //     failure or a fixed point ends the loop; detection beyond
    //     MAX_DECODE_ROUNDS levels legitimately degrades.
    let mut decoded = normalized.clone();
    for _ in 0..MAX_DECODE_ROUNDS {
        let round = match percent_decode(&decoded) {
            Ok(round) => round,
            Err(_) => break,
        };
        if !round.changed || round.value == decoded {
            break;
        }
        decoded = round.value;

        let decoded_lower = decoded.to_lowercase();
        if TRAVERSAL_PATTERNS.iter().any(|p| decoded_lower.contains(p)) {
            return true;
        }
        if has_unicode_traversal(&decoded) {
            return true;
        }
        if DECODED_PROTOCOL.is_match(&decoded) {
            return true;
        }
    }

    // 12. Residual: runs of dots directly followed by a separator
    RESIDUAL_DOTS.is_match(&normalized)
}

/// Decode `&#NN;` / `&#xNN;` entities; non-decodable references are
/// left in place.
fn decode_numeric_entities(input: &str) -> String {
    let decimal = DECIMAL_ENTITY.replace_all(input, |caps: &regex::Captures<'_>| {
        caps[1]
            .parse::<u32>()
            .ok()
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_else(|| caps[0].to_string())
    });
    HEX_ENTITY
        .replace_all(&decimal, |caps: &regex::Captures<'_>| {
            u32::from_str_radix(&caps[1], 16)
                .ok()
                .and_then(char::from_u32)
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Dot-dot-slash shapes built from Unicode look-alike code points.
fn has_unicode_traversal(input: &str) -> bool {
    for &dot in UNICODE_DOTS {
        for &slash in UNICODE_SLASHES {
            let full: String = [dot, dot, slash].iter().collect();
            let mixed: String = [dot, '.', slash].iter().collect();
            let ascii_dots: String = ['.', '.', slash].iter().collect();
            if input.contains(&full) || input.contains(&mixed) || input.contains(&ascii_dots) {
                return true;
            }
        }
    }
    false
}
