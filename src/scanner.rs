//! Recursive structural scanner over request data.
//!
//! Walks arbitrarily shaped JSON-like values (query, body, route
//! params), applying every enabled detector to each string leaf and
//! tagging hits with the dotted/bracketed key path of their origin.

use crate::detect::{CheckKind, DetectorSet};
use serde_json::Value;

/// A single detector hit on one value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Threat {
    /// Which detector fired.
    pub kind: CheckKind,
    /// Dotted/bracketed origin of the value, e.g. `body.user.name`
    /// or `query.tags[0]`.
    pub key_path: String,
    /// The offending raw value.
    pub value: String,
}

/// Result of scanning one subtree.
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    /// All detector hits, in traversal order.
    pub threats: Vec<Threat>,
    /// Whether any subtree was left unscanned because it exceeded the
    /// depth cap. The orchestrator's depth-limit policy decides what
    /// this means for the verdict.
    pub depth_exceeded: bool,
}

impl ScanOutcome {
    /// Merge another outcome into this one.
    fn absorb(&mut self, other: ScanOutcome) {
        self.threats.extend(other.threats);
        self.depth_exceeded |= other.depth_exceeded;
    }
}

/// Scan a single string value with every enabled detector.
pub fn scan_value(value: &str, key_path: &str, checks: &DetectorSet) -> Vec<Threat> {
    checks
        .iter()
        .filter(|kind| kind.detect(value))
        .map(|kind| Threat {
            kind,
            key_path: key_path.to_string(),
            value: value.to_string(),
        })
        .collect()
}

/// Recursively scan a JSON-like value.
///
/// Sequences recurse by index (`prefix[i]`), mappings by key
/// (`prefix.key`). Numbers, booleans, and null carry no payload and
/// are skipped. Recursion is bounded by `max_depth`; deeper content is
/// left unscanned and reported through
/// [`ScanOutcome::depth_exceeded`].
pub fn scan(value: &Value, prefix: &str, checks: &DetectorSet, max_depth: usize) -> ScanOutcome {
    scan_at(value, prefix, checks, 0, max_depth)
}

fn scan_at(
    value: &Value,
    prefix: &str,
    checks: &DetectorSet,
    depth: usize,
    max_depth: usize,
) -> ScanOutcome {
    let mut outcome = ScanOutcome::default();

    if depth > max_depth {
        outcome.depth_exceeded = true;
        return outcome;
    }

    match value {
        Value::String(s) => {
            outcome.threats = scan_value(s, prefix, checks);
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                let key = format!("{}[{}]", prefix, index);
                outcome.absorb(scan_at(item, &key, checks, depth + 1, max_depth));
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                let full_key = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                outcome.absorb(scan_at(item, &full_key, checks, depth + 1, max_depth));
            }
        }
        Value::Number(_) | Value::Bool(_) | Value::Null => {}
    }

    outcome
}
