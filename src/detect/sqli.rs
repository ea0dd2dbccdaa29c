//! Context-aware SQL injection detection.
//!
//! Inspired by the OWASP CRS / libinjection approach: keyword presence
//! alone never triggers. A keyword must combine with a quote, operator,
//! comment marker, or stacked-statement marker before the value is
//! considered an injection, so prose like "I select the blue option" or
//! "T-Shirt -- Blue Edition" passes.

use crate::normalize::normalize;
use regex::Regex;
use std::sync::LazyLock;

/// Classic quote+operator+constant sequences. Substring match on the
/// lowercased input; essentially zero false-positive rate.
static LOGIC_BOMBS: &[&str] = &[
    "' or '1'='1",
    "\" or \"1\"=\"1",
    "' or 1=1",
    "\" or 1=1",
    "' and '1'='1",
    "\" and \"1\"=\"1",
    "' and 1=1",
    "\" and 1=1",
    "' or 'a'='a",
    "\" or \"a\"=\"a",
    "' or true",
    "\" or true",
    "' or '1",
    "\" or \"1",
    "or 1=1--",
    "or 1=1#",
    "or 1=1/*",
    "and 1=1--",
    "' || '",
    "\" || \"",
    "' && '",
    "\" && \"",
];

/// `--` or `/* */` adjacent to a quote.
static COMMENT_NEAR_QUOTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"['"]\s*(?:--|/\*|\*/)|(?:--|/\*|\*/)\s*['"]"#).unwrap()
});

/// `--` or `/*` preceded elsewhere by an SQL keyword.
static COMMENT_AFTER_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:or|and|where|select|union)\b.*(?:--|/\*)").unwrap()
});

/// `#` adjacent to a quote or semicolon. Kept narrow: `#` is common in
/// URL fragments and hashtags.
static HASH_NEAR_QUOTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"['";]\s*#"#).unwrap());

/// `#` preceded elsewhere by an SQL verb.
static HASH_AFTER_VERB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:select|union|insert|delete|drop|update|exec)\b.*#").unwrap()
});

/// Semicolon followed by a statement keyword (stacked query).
static STACKED_QUERY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r";\s*(?:select|insert|update|delete|drop|create|alter|exec|execute)\b").unwrap()
});

/// A quote, an injection keyword, then a second structural keyword
/// before the quote closes.
static QUOTE_KEYWORD_PAIRS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"'[^']*\b(?:union|select)\b[^']*\b(?:select|from|where|join)",
        r#""[^"]*\b(?:union|select)\b[^"]*\b(?:select|from|where|join)"#,
        r"'[^']*\b(?:insert|delete|update|drop)\b[^']*\b(?:into|from|table|where)",
        r#""[^"]*\b(?:insert|delete|update|drop)\b[^"]*\b(?:into|from|table|where)"#,
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// `union [all] select` as a contiguous phrase.
static UNION_SELECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"union\s+(?:all\s+)?select").unwrap());

/// Time-based blind injection functions.
static TIMING_FUNCTIONS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"sleep\s*\(",
        r"benchmark\s*\(",
        r"waitfor\s+delay",
        r"pg_sleep\s*\(",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Database-probing functions and identifiers.
static INFO_FUNCTIONS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"database\s*\(",
        r"@@version",
        r"information_schema",
        r"sysobjects",
        r"syscolumns",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Quote, semicolon, or SQL verb: the extra context the probing
/// identifiers need before they count.
static SQL_CONTEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"['";]|\b(?:union|select)\b"#).unwrap());

/// `version(` / `user(`, too common in prose to flag alone.
static VERSION_OR_USER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:version|user)\s*\(").unwrap());

static DML_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:union|select|insert|delete)\b").unwrap());

/// Long bare hex literal; rare in legitimate text.
static LONG_HEX_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b0x[0-9a-f]{6,}\b").unwrap());

/// Operator-adjacency patterns framing a keyword.
static OPERATOR_ADJACENCY: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"=\s*(?:select|union)",
        r"\)\s*(?:union|select)",
        r"'\s*or\s*'",
        r#""\s*or\s*""#,
        r"'\s*and\s*'",
        r#""\s*and\s*""#,
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// SQL Server extended/stored procedure prefixes.
static PROCEDURE_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:xp_|sp_)\w+").unwrap());

static QUOTE_OR_SEMICOLON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"['";]"#).unwrap());

/// Detect SQL syntax-injection patterns in a single value.
///
/// Empty input is benign. Checks are ordered and short-circuit on the
/// first hit.
pub fn is_sql_injection(raw: &str) -> bool {
    if raw.is_empty() {
        return false;
    }

    let normalized = normalize(raw);
    let lower = normalized.to_lowercase();

    // 1. Logic bombs
    if LOGIC_BOMBS.iter().any(|p| lower.contains(p)) {
        return true;
    }

    // 2. Comment markers, only with quote or keyword context
    if (lower.contains("--") || lower.contains("/*") || lower.contains("*/"))
        && (COMMENT_NEAR_QUOTE.is_match(&lower) || COMMENT_AFTER_KEYWORD.is_match(&lower))
    {
        return true;
    }
    if lower.contains('#') && (HASH_NEAR_QUOTE.is_match(&lower) || HASH_AFTER_VERB.is_match(&lower))
    {
        return true;
    }

    // 3. Stacked queries
    if STACKED_QUERY.is_match(&lower) {
        return true;
    }

    // 4. Quote-bracketed keyword pairs
    if QUOTE_KEYWORD_PAIRS.iter().any(|re| re.is_match(&lower)) {
        return true;
    }

    // 5. UNION-based injection
    if UNION_SELECT.is_match(&lower) {
        return true;
    }

    // 6. Time-based blind injection
    if TIMING_FUNCTIONS.iter().any(|re| re.is_match(&lower)) {
        return true;
    }

    // 7. Database probing, only with surrounding SQL context
    if INFO_FUNCTIONS.iter().any(|re| re.is_match(&lower)) && SQL_CONTEXT.is_match(&lower) {
        return true;
    }

    // 8. version()/user(), only with quote plus DML keyword
    if VERSION_OR_USER.is_match(&lower)
        && (lower.contains('\'') || lower.contains('"'))
        && DML_KEYWORD.is_match(&lower)
    {
        return true;
    }

    // 9. Long hex literal
    if LONG_HEX_LITERAL.is_match(&lower) {
        return true;
    }

    // 10. Operator adjacency
    if OPERATOR_ADJACENCY.iter().any(|re| re.is_match(&lower)) {
        return true;
    }

    // 11. xp_/sp_ procedure calls, only with quote or semicolon
    if PROCEDURE_CALL.is_match(&lower) && QUOTE_OR_SEMICOLON.is_match(&lower) {
        return true;
    }

    false
}
