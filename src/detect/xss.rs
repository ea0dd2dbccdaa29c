//! Cross-site scripting detection.
//!
//! Targets script-execution capability rather than HTML presence:
//! benign markup like `<b>` or `<img src="photo.jpg">` is allowed, and
//! event-handler names only count when they sit in tag context. This is
//! the main false-positive reduction over a naive tag blocklist.

use crate::normalize::normalize;
use regex::Regex;
use std::sync::LazyLock;

/// Literal and encoded spellings of a script tag open/close.
static SCRIPT_TAG_SPELLINGS: &[&str] = &[
    "<script",
    "</script",
    "%3cscript",              // percent-encoded <
    "%3c%73%63%72%69%70%74",  // every byte percent-encoded
    "&#60;script",            // decimal entity
    "&#x3c;script",           // hex entity
    "&lt;script",             // named entity
    "\\u003cscript",          // backslash-u escape
    "\\x3cscript",            // backslash-x escape
];

/// URI schemes that execute code when dereferenced, plus encoded
/// spellings of "javascript".
static DANGEROUS_SCHEMES: &[&str] = &[
    "javascript:",
    "vbscript:",
    "data:text/html",
    "data:application/",
    "%6a%61%76%61%73%63%72%69%70%74", // javascript, percent-encoded
    "&#106;&#97;&#118;&#97;",         // java…, decimal entities
];

/// DOM event-handler attribute names.
static EVENT_HANDLERS: &[&str] = &[
    "onload",
    "onerror",
    "onclick",
    "onmouseover",
    "onmouseout",
    "onmousemove",
    "onmouseenter",
    "onmouseleave",
    "onfocus",
    "onblur",
    "onchange",
    "onsubmit",
    "onkeydown",
    "onkeyup",
    "onkeypress",
    "ondblclick",
    "oncontextmenu",
    "oninput",
    "onwheel",
    "ondrag",
    "ondrop",
    "onanimationend",
    "ontransitionend",
    "onabort",
    "ontoggle",
];

/// Quote-breakout sequences that re-open executable context.
static BREAKOUT_SEQUENCES: &[&str] = &[
    "\"><script",
    "'><script",
    "\"/><script",
    "'/><script",
    "\"><svg",
    "'><svg",
    "\"/><svg",
    "'/><svg",
];

/// CSS vectors that evaluate code (legacy IE / Gecko).
static CSS_EXECUTION: &[&str] = &["expression(", "-moz-binding"];

/// Handler name preceded by `<` and attribute characters in the same tag.
static HANDLER_IN_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"<[^>]*\s(?:{})\s*=", EVENT_HANDLERS.join("|"))).unwrap()
});

/// Handler name following a quote that looks like an attribute break.
static HANDLER_AFTER_QUOTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r#"['"][^'"]*\s(?:{})\s*="#,
        EVENT_HANDLERS.join("|")
    ))
    .unwrap()
});

/// How far past a token (`<svg`, `srcdoc=`) we look for its payload.
const CONTEXT_WINDOW: usize = 100;

/// Detect cross-site scripting vectors in a single value.
///
/// Empty input is benign. Checks are ordered and short-circuit on the
/// first hit.
pub fn is_xss(raw: &str) -> bool {
    if raw.is_empty() {
        return false;
    }

    let lower = normalize(raw).to_lowercase();

    // 1. Script tags, in any encoding
    if SCRIPT_TAG_SPELLINGS.iter().any(|t| lower.contains(t)) {
        return true;
    }

    // 2. Code-executing URI schemes
    if DANGEROUS_SCHEMES.iter().any(|s| lower.contains(s)) {
        return true;
    }

    // 3. Event handlers, only in tag context
    if HANDLER_IN_TAG.is_match(&lower) || HANDLER_AFTER_QUOTE.is_match(&lower) {
        return true;
    }

    // 4. Attribute breakout into a fresh script/svg tag
    if BREAKOUT_SEQUENCES.iter().any(|s| lower.contains(s)) {
        return true;
    }

    // 5. <svg> with an event handler nearby
    if let Some(pos) = lower.find("<svg") {
        let window: String = lower[pos + 4..].chars().take(CONTEXT_WINDOW).collect();
        if EVENT_HANDLERS.iter().any(|h| window.contains(h)) {
            return true;
        }
    }

    // 6. CSS code execution
    if CSS_EXECUTION.iter().any(|s| lower.contains(s)) {
        return true;
    }

    // 7. srcdoc / formaction with an executable value
    for attr in ["srcdoc=", "formaction="] {
        if let Some(pos) = lower.find(attr) {
            let window: String = lower[pos + attr.len()..]
                .chars()
                .take(CONTEXT_WINDOW)
                .collect();
            if window.contains("javascript:") || window.contains("data:") {
                return true;
            }
        }
    }

    false
}
