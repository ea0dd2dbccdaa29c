//! Attack detectors for specific vulnerability categories.
//!
//! Each detector is a pure, total function over a single string value:
//! non-string data never reaches them and empty input is always benign.
//! The detectors target code-execution or syntax-injection capability,
//! not mere presence of markup or keywords, to keep false positives low
//! on prose and product names.

mod path_traversal;
mod sqli;
mod xss;

pub use path_traversal::is_path_traversal;
pub use sqli::is_sql_injection;
pub use xss::is_xss;

use serde::{Deserialize, Serialize};

/// The vulnerability categories the WAF inspects for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckKind {
    /// Cross-site scripting.
    Xss,
    /// SQL syntax injection.
    #[serde(rename = "sqli")]
    SqlInjection,
    /// Filesystem-escape path patterns.
    #[serde(rename = "pathtraversal")]
    PathTraversal,
}

impl CheckKind {
    /// All check kinds, in scan order.
    pub const ALL: [CheckKind; 3] = [
        CheckKind::PathTraversal,
        CheckKind::Xss,
        CheckKind::SqlInjection,
    ];

    /// Human-readable attack type name used in responses and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Xss => "XSS",
            Self::SqlInjection => "SQL Injection",
            Self::PathTraversal => "Path Traversal",
        }
    }

    /// Run the detector for this kind against a single value.
    pub fn detect(&self, value: &str) -> bool {
        match self {
            Self::Xss => is_xss(value),
            Self::SqlInjection => is_sql_injection(value),
            Self::PathTraversal => is_path_traversal(value),
        }
    }

    fn index(self) -> usize {
        match self {
            Self::Xss => 0,
            Self::SqlInjection => 1,
            Self::PathTraversal => 2,
        }
    }
}

impl std::fmt::Display for CheckKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The set of check kinds enabled for one request.
///
/// Derived by subtracting a matched partial rule's skip list from the
/// full set. Cheap to copy; recomputed per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectorSet {
    enabled: [bool; 3],
}

impl DetectorSet {
    /// The full set with all three checks enabled.
    pub fn full() -> Self {
        Self {
            enabled: [true; 3],
        }
    }

    /// An empty set.
    pub fn empty() -> Self {
        Self {
            enabled: [false; 3],
        }
    }

    /// The full set minus the given skip list.
    pub fn without(skip: &[CheckKind]) -> Self {
        let mut set = Self::full();
        for kind in skip {
            set.enabled[kind.index()] = false;
        }
        set
    }

    /// Whether the given check is enabled.
    pub fn contains(&self, kind: CheckKind) -> bool {
        self.enabled[kind.index()]
    }

    /// Iterate the enabled checks in scan order.
    pub fn iter(&self) -> impl Iterator<Item = CheckKind> + '_ {
        CheckKind::ALL.into_iter().filter(|k| self.contains(*k))
    }

    /// Number of enabled checks.
    pub fn len(&self) -> usize {
        self.enabled.iter().filter(|e| **e).count()
    }

    /// Whether no checks are enabled.
    pub fn is_empty(&self) -> bool {
        self.enabled.iter().all(|e| !e)
    }
}

impl Default for DetectorSet {
    fn default() -> Self {
        Self::full()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detector_set_full() {
        let set = DetectorSet::full();
        assert_eq!(set.len(), 3);
        assert!(set.contains(CheckKind::Xss));
        assert!(set.contains(CheckKind::SqlInjection));
        assert!(set.contains(CheckKind::PathTraversal));
    }

    #[test]
    fn test_detector_set_without() {
        let set = DetectorSet::without(&[CheckKind::Xss]);
        assert_eq!(set.len(), 2);
        assert!(!set.contains(CheckKind::Xss));
        assert!(set.contains(CheckKind::SqlInjection));
    }

    #[test]
    fn test_detector_set_iter_order() {
        let kinds: Vec<_> = DetectorSet::full().iter().collect();
        assert_eq!(kinds, CheckKind::ALL.to_vec());
    }

    #[test]
    fn test_check_kind_names() {
        assert_eq!(CheckKind::Xss.as_str(), "XSS");
        assert_eq!(CheckKind::SqlInjection.as_str(), "SQL Injection");
        assert_eq!(CheckKind::PathTraversal.as_str(), "Path Traversal");
    }

    #[test]
    fn test_check_kind_config_names() {
        let kinds: Vec<CheckKind> =
            serde_json::from_str(r#"["xss", "sqli", "pathtraversal"]"#).unwrap();
        assert_eq!(
            kinds,
            vec![
                CheckKind::Xss,
                CheckKind::SqlInjection,
                CheckKind::PathTraversal
            ]
        );
    }
}
