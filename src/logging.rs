//! Threat and bypass logging.
//!
//! Every detected threat produces one structured log line, and every
//! route exemption that fires is logged too. The exemption lines matter
//! as much as the threat lines: a bypass nobody can see in the logs is
//! a bypass nobody audits.

use crate::config::WafConfig;
use crate::scanner::Threat;
use serde::Serialize;
use std::net::IpAddr;
use tracing::{info, warn};

/// A threat log record, also usable as structured JSON output.
#[derive(Debug, Clone, Serialize)]
pub struct ThreatRecord {
    /// RFC 3339 timestamp.
    pub timestamp: String,

    /// Source IP, when known.
    pub client_ip: Option<IpAddr>,

    /// HTTP method.
    pub method: String,

    /// Request path.
    pub path: String,

    /// Attack type label, e.g. "SQL Injection".
    pub attack_type: String,

    /// Where in the request the value was found, e.g. `body.user.name`.
    pub parameter: String,

    /// The offending value, truncated for log hygiene.
    pub value: String,
}

impl ThreatRecord {
    pub fn new(
        threat: &Threat,
        method: &str,
        path: &str,
        client_ip: Option<IpAddr>,
        config: &WafConfig,
    ) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            client_ip,
            method: method.to_string(),
            path: path.to_string(),
            attack_type: threat.kind.as_str().to_string(),
            parameter: threat.key_path.clone(),
            value: truncate(&threat.value, config.max_logged_value),
        }
    }
}

/// Emit one warning line per detected threat.
pub fn log_threats(
    threats: &[Threat],
    method: &str,
    path: &str,
    client_ip: Option<IpAddr>,
    blocked: bool,
    config: &WafConfig,
) {
    for threat in threats {
        let record = ThreatRecord::new(threat, method, path, client_ip, config);
        warn!(
            timestamp = %record.timestamp,
            client_ip = ?record.client_ip,
            method = %record.method,
            path = %record.path,
            attack_type = %record.attack_type,
            parameter = %record.parameter,
            value = %record.value,
            blocked,
            "threat detected"
        );
    }
}

/// Log a full bypass: scanning was skipped entirely for this request.
pub fn log_bypass(method: &str, path: &str, matched_rule: &str) {
    info!(
        method = %method,
        path = %path,
        rule = %matched_rule,
        "WAF bypassed for safe route"
    );
}

/// Log a partial bypass: some checks were disabled for this request.
pub fn log_partial_bypass(method: &str, path: &str, matched_rule: &str, skipped: &[String]) {
    info!(
        method = %method,
        path = %path,
        rule = %matched_rule,
        skipped_checks = %skipped.join(","),
        "WAF checks partially skipped for route"
    );
}

/// Truncate at a char boundary, appending "..." when anything was cut.
fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::CheckKind;

    #[test]
    fn test_truncate_short_string_unchanged() {
        assert_eq!(truncate("hello", 200), "hello");
    }

    #[test]
    fn test_truncate_long_string() {
        let long = "a".repeat(300);
        let out = truncate(&long, 200);
        assert_eq!(out.len(), 203);
        assert!(out.ends_with("..."));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let long: String = "привет".chars().cycle().take(250).collect();
        let out = truncate(&long, 200);
        assert_eq!(out.chars().count(), 203);
        assert!(out.ends_with("..."));
    }

    #[test]
    fn test_threat_record_truncates_value() {
        let threat = Threat {
            kind: CheckKind::Xss,
            key_path: "body.comment".to_string(),
            value: "x".repeat(500),
        };
        let config = WafConfig::default();
        let record = ThreatRecord::new(&threat, "POST", "/api/comments", None, &config);
        assert_eq!(record.attack_type, "XSS");
        assert_eq!(record.parameter, "body.comment");
        assert_eq!(record.value.len(), 203);
    }
}
