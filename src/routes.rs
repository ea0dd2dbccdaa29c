//! Route-based bypass policy.
//!
//! Safe routes are an explicit, audited exemption list: exact paths and
//! wildcard patterns that skip scanning entirely, plus partial rules
//! that disable individual check kinds for one path. The configuration
//! is loaded once at startup and compiled into an immutable
//! [`RouteTable`]; every bypass is logged so abuse stays visible.

use crate::config::RuntimeOptions;
use crate::detect::{CheckKind, DetectorSet};
use crate::error::{WafError, WafResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// Safe-routes configuration as it appears on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SafeRouteConfig {
    /// Literal paths with a complete WAF bypass.
    #[serde(default)]
    pub exact: Vec<String>,

    /// Wildcard templates (`*` matches any run of characters) with a
    /// complete bypass. Order matters: first match wins.
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Per-path partial bypasses that skip only the listed checks.
    #[serde(default)]
    pub partial: Vec<PartialRule>,
}

/// A partial bypass: the named checks are skipped for one path, the
/// rest still run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartialRule {
    /// Request path this rule applies to (exact equality).
    pub path: String,

    /// Restrict the rule to these HTTP methods; `None` means any.
    #[serde(default)]
    pub methods: Option<Vec<String>>,

    /// Check kinds to skip.
    pub skip: Vec<CheckKind>,

    /// Why this bypass exists; reproduced in bypass log lines.
    #[serde(default)]
    pub reason: String,
}

/// Outcome of resolving one request path against the policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDecision {
    /// Whether any rule matched.
    pub exempt: bool,
    /// When true, skip scanning entirely (exact or pattern match).
    pub skip_all: bool,
    /// Check kinds to skip for a partial match.
    pub skip: Vec<CheckKind>,
    /// Which rule matched, for the bypass log line.
    pub matched_rule: Option<String>,
}

impl RouteDecision {
    fn not_exempt() -> Self {
        Self {
            exempt: false,
            skip_all: false,
            skip: Vec::new(),
            matched_rule: None,
        }
    }

    /// The detector set left enabled by this decision.
    pub fn active_checks(&self) -> DetectorSet {
        if self.skip_all {
            DetectorSet::empty()
        } else {
            DetectorSet::without(&self.skip)
        }
    }
}

/// Compiled, immutable form of [`SafeRouteConfig`].
///
/// Built once at startup and shared by reference; resolution
/// recomputes per request (the rule set is small, O(rules) is fine).
#[derive(Debug)]
pub struct RouteTable {
    config: SafeRouteConfig,
    compiled_patterns: Vec<(String, Regex)>,
}

impl RouteTable {
    /// Compile a configuration into a route table.
    ///
    /// A wildcard template that fails to compile is skipped with a
    /// warning rather than rejecting the whole table.
    pub fn new(config: SafeRouteConfig) -> Self {
        let compiled_patterns = config
            .patterns
            .iter()
            .filter_map(|pattern| match compile_pattern(pattern) {
                Ok(re) => Some((pattern.clone(), re)),
                Err(err) => {
                    warn!("skipping unusable safe-route pattern: {}", err);
                    None
                }
            })
            .collect();

        Self {
            config,
            compiled_patterns,
        }
    }

    /// An empty table: no exemptions, everything scanned.
    pub fn empty() -> Self {
        Self::new(SafeRouteConfig::default())
    }

    /// Load a table from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> WafResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| WafError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: SafeRouteConfig = toml::from_str(&content)?;
        Ok(Self::new(config))
    }

    /// Load a table, falling back to no exemptions on any failure.
    ///
    /// Failing closed is the safe default: a broken config file means
    /// every route gets the full scan, never an accidental bypass.
    pub fn load_or_empty<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path.as_ref()) {
            Ok(table) => table,
            Err(err) => {
                warn!(
                    "safe routes config unusable, continuing with no exemptions: {}",
                    err
                );
                Self::empty()
            }
        }
    }

    /// Resolve a request path and method against the policy.
    ///
    /// Global overrides win over route rules: strict mode forces a
    /// full scan, and disabling safe routes is equivalent to an empty
    /// table.
    pub fn resolve(&self, path: &str, method: &str, options: &RuntimeOptions) -> RouteDecision {
        if options.strict || !options.safe_routes {
            return RouteDecision::not_exempt();
        }

        if self.config.exact.iter().any(|p| p == path) {
            return RouteDecision {
                exempt: true,
                skip_all: true,
                skip: Vec::new(),
                matched_rule: Some(format!("exact: {}", path)),
            };
        }

        for (pattern, re) in &self.compiled_patterns {
            if re.is_match(path) {
                return RouteDecision {
                    exempt: true,
                    skip_all: true,
                    skip: Vec::new(),
                    matched_rule: Some(format!("pattern: {}", pattern)),
                };
            }
        }

        for partial in &self.config.partial {
            if partial.path != path {
                continue;
            }
            if let Some(methods) = &partial.methods {
                if !methods.iter().any(|m| m.eq_ignore_ascii_case(method)) {
                    continue;
                }
            }
            return RouteDecision {
                exempt: true,
                skip_all: false,
                skip: partial.skip.clone(),
                matched_rule: Some(format!("partial: {} ({})", partial.path, partial.reason)),
            };
        }

        RouteDecision::not_exempt()
    }
}

/// Compile a wildcard template to an anchored regex: `*` becomes `.*`,
/// everything else is matched literally.
fn compile_pattern(pattern: &str) -> WafResult<Regex> {
    let escaped: String = pattern
        .split('*')
        .map(|part| regex::escape(part))
        .collect::<Vec<_>>()
        .join(".*");

    Regex::new(&format!("^{}$", escaped)).map_err(|source| WafError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}
