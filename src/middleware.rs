//! Request inspection orchestrator.
//!
//! Ties the pieces together: runtime toggles, route policy, the
//! structural scanner, and threat logging. Callers hand in a
//! [`WafRequest`] snapshot and get back a [`Verdict`] telling them to
//! pass the request through or answer with the 403 block response.

use crate::config::{DepthLimitPolicy, RuntimeOptions, WafConfig};
use crate::logging;
use crate::routes::RouteTable;
use crate::scanner::{self, ScanOutcome, Threat};
use serde::Serialize;
use serde_json::Value;
use std::net::IpAddr;
use tracing::warn;

/// A framework-neutral snapshot of the parts of a request the WAF
/// inspects.
#[derive(Debug, Clone)]
pub struct WafRequest {
    method: String,
    path: String,
    query: Value,
    body: Value,
    params: Value,
    file_names: Vec<String>,
    client_ip: Option<IpAddr>,
}

impl WafRequest {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            query: Value::Null,
            body: Value::Null,
            params: Value::Null,
            file_names: Vec::new(),
            client_ip: None,
        }
    }

    /// Attach parsed query parameters.
    pub fn with_query(mut self, query: Value) -> Self {
        self.query = query;
        self
    }

    /// Attach the parsed request body.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    /// Attach route parameters (e.g. `:id` captures).
    pub fn with_params(mut self, params: Value) -> Self {
        self.params = params;
        self
    }

    /// Attach uploaded file names.
    pub fn with_file_names(mut self, names: Vec<String>) -> Self {
        self.file_names = names;
        self
    }

    /// Attach the client address for log lines.
    pub fn with_client_ip(mut self, ip: IpAddr) -> Self {
        self.client_ip = Some(ip);
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

/// One threat as reproduced in the block response body.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ThreatSummary {
    /// Attack type label, e.g. "SQL Injection".
    #[serde(rename = "type")]
    pub attack_type: String,

    /// Key path of the offending value.
    pub parameter: String,
}

/// The 403 response a blocked request should receive.
///
/// The body names attack types and parameter locations but never
/// echoes attacker-controlled values back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockResponse {
    pub status: u16,
    pub threats: Vec<ThreatSummary>,
}

#[derive(Serialize)]
struct BlockBody<'a> {
    error: &'static str,
    message: &'static str,
    threats: &'a [ThreatSummary],
}

impl BlockResponse {
    fn from_threats(threats: &[Threat]) -> Self {
        Self {
            status: 403,
            threats: threats
                .iter()
                .map(|t| ThreatSummary {
                    attack_type: t.kind.as_str().to_string(),
                    parameter: t.key_path.clone(),
                })
                .collect(),
        }
    }

    /// The JSON body to send with the 403.
    pub fn body(&self) -> Value {
        serde_json::json!({
            "error": "Forbidden",
            "message": "Request blocked by Web Application Firewall",
            "threats": self.threats,
        })
    }

    /// The JSON body as a string, for frameworks that want bytes.
    pub fn body_string(&self) -> String {
        let body = BlockBody {
            error: "Forbidden",
            message: "Request blocked by Web Application Firewall",
            threats: &self.threats,
        };
        serde_json::to_string(&body).unwrap_or_else(|_| {
            // Serialization of plain strings cannot fail; keep a
            // blocking fallback anyway.
            r#"{"error":"Forbidden","message":"Request blocked by Web Application Firewall","threats":[]}"#.to_string()
        })
    }
}

/// The outcome of inspecting one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Nothing suspicious, or the WAF is disabled. Pass the request.
    Allow,

    /// A safe-route rule exempted the request from scanning entirely.
    Bypass {
        /// The rule that matched, as logged.
        matched_rule: String,
    },

    /// Threats were found, but the WAF is in log-only mode. Pass the
    /// request; the threats have already been logged.
    Flag { threats: Vec<Threat> },

    /// Threats were found and the request must be refused.
    Block(BlockResponse),
}

impl Verdict {
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Block(_))
    }

    pub fn allows_through(&self) -> bool {
        !self.is_blocked()
    }
}

/// The WAF engine: an immutable route table plus scan configuration.
///
/// Construct once at startup and share by reference; inspection is
/// read-only and safe to call concurrently.
#[derive(Debug)]
pub struct Waf {
    routes: RouteTable,
    config: WafConfig,
}

impl Waf {
    pub fn new(routes: RouteTable, config: WafConfig) -> Self {
        Self { routes, config }
    }

    /// A WAF with no route exemptions and default configuration.
    pub fn with_defaults() -> Self {
        Self::new(RouteTable::empty(), WafConfig::default())
    }

    /// Inspect a request using the current environment toggles.
    pub fn inspect(&self, request: &WafRequest) -> Verdict {
        self.inspect_with_options(request, &RuntimeOptions::from_env())
    }

    /// Inspect a request with explicit runtime options.
    pub fn inspect_with_options(&self, request: &WafRequest, options: &RuntimeOptions) -> Verdict {
        if !options.enabled || options.mode == crate::config::DetectionMode::Off {
            return Verdict::Allow;
        }

        let decision = self
            .routes
            .resolve(&request.path, &request.method, options);

        if decision.skip_all {
            let rule = decision.matched_rule.unwrap_or_default();
            logging::log_bypass(&request.method, &request.path, &rule);
            return Verdict::Bypass { matched_rule: rule };
        }

        let checks = decision.active_checks();
        if decision.exempt {
            let skipped: Vec<String> = decision
                .skip
                .iter()
                .map(|k| k.as_str().to_string())
                .collect();
            logging::log_partial_bypass(
                &request.method,
                &request.path,
                decision.matched_rule.as_deref().unwrap_or_default(),
                &skipped,
            );
        }

        let mut outcome = ScanOutcome::default();
        for (value, prefix) in [
            (&request.query, "query"),
            (&request.body, "body"),
            (&request.params, "params"),
        ] {
            let part = scanner::scan(value, prefix, &checks, self.config.max_depth);
            outcome.threats.extend(part.threats);
            outcome.depth_exceeded |= part.depth_exceeded;
        }
        for (i, name) in request.file_names.iter().enumerate() {
            outcome
                .threats
                .extend(scanner::scan_value(name, &format!("file[{}].name", i), &checks));
        }

        if outcome.depth_exceeded && self.config.depth_limit_policy == DepthLimitPolicy::Block {
            warn!(
                method = %request.method,
                path = %request.path,
                max_depth = self.config.max_depth,
                "request data exceeded scan depth cap, refusing"
            );
            return Verdict::Block(BlockResponse::from_threats(&outcome.threats));
        }

        if outcome.threats.is_empty() {
            return Verdict::Allow;
        }

        let blocked = options.mode.should_block();
        logging::log_threats(
            &outcome.threats,
            &request.method,
            &request.path,
            request.client_ip,
            blocked,
            &self.config,
        );

        if blocked {
            Verdict::Block(BlockResponse::from_threats(&outcome.threats))
        } else {
            Verdict::Flag {
                threats: outcome.threats,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DetectionMode;
    use crate::routes::{PartialRule, RouteTable, SafeRouteConfig};
    use serde_json::json;

    fn waf() -> Waf {
        Waf::with_defaults()
    }

    fn opts() -> RuntimeOptions {
        RuntimeOptions::default()
    }

    #[test]
    fn test_clean_request_allowed() {
        let request = WafRequest::new("GET", "/api/users")
            .with_query(json!({"page": "2", "sort": "name"}));
        assert_eq!(waf().inspect_with_options(&request, &opts()), Verdict::Allow);
    }

    #[test]
    fn test_sql_injection_in_query_blocked() {
        let request =
            WafRequest::new("GET", "/api/users").with_query(json!({"id": "' OR 1=1--"}));
        let verdict = waf().inspect_with_options(&request, &opts());
        match verdict {
            Verdict::Block(response) => {
                assert_eq!(response.status, 403);
                assert!(response.threats.iter().any(|t| {
                    t.attack_type == "SQL Injection" && t.parameter == "query.id"
                }));
            }
            other => panic!("expected block, got {:?}", other),
        }
    }

    #[test]
    fn test_block_response_body_shape() {
        let request =
            WafRequest::new("GET", "/api/users").with_query(json!({"id": "' OR 1=1--"}));
        let Verdict::Block(response) = waf().inspect_with_options(&request, &opts()) else {
            panic!("expected block");
        };
        let body = response.body();
        assert_eq!(body["error"], "Forbidden");
        assert_eq!(body["message"], "Request blocked by Web Application Firewall");
        assert_eq!(body["threats"][0]["type"], "SQL Injection");
        assert_eq!(body["threats"][0]["parameter"], "query.id");
        // Offending values never appear in the response
        assert!(!response.body_string().contains("OR 1=1"));
    }

    #[test]
    fn test_traversal_in_nested_body_blocked() {
        let request = WafRequest::new("POST", "/api/download")
            .with_body(json!({"file": "../../../etc/passwd"}));
        let Verdict::Block(response) = waf().inspect_with_options(&request, &opts()) else {
            panic!("expected block");
        };
        assert_eq!(response.threats[0].attack_type, "Path Traversal");
        assert_eq!(response.threats[0].parameter, "body.file");
    }

    #[test]
    fn test_malicious_file_name_blocked() {
        let request = WafRequest::new("POST", "/api/upload")
            .with_file_names(vec!["report.pdf".to_string(), "../../etc/shadow".to_string()]);
        let Verdict::Block(response) = waf().inspect_with_options(&request, &opts()) else {
            panic!("expected block");
        };
        assert_eq!(response.threats[0].parameter, "file[1].name");
    }

    #[test]
    fn test_disabled_waf_allows_everything() {
        let request =
            WafRequest::new("GET", "/api/users").with_query(json!({"id": "' OR 1=1--"}));
        let disabled = RuntimeOptions {
            enabled: false,
            ..opts()
        };
        assert_eq!(
            waf().inspect_with_options(&request, &disabled),
            Verdict::Allow
        );

        let off = RuntimeOptions {
            mode: DetectionMode::Off,
            ..opts()
        };
        assert_eq!(waf().inspect_with_options(&request, &off), Verdict::Allow);
    }

    #[test]
    fn test_log_mode_flags_without_blocking() {
        let request =
            WafRequest::new("GET", "/api/users").with_query(json!({"id": "' OR 1=1--"}));
        let log_mode = RuntimeOptions {
            mode: DetectionMode::Log,
            ..opts()
        };
        match waf().inspect_with_options(&request, &log_mode) {
            Verdict::Flag { threats } => {
                assert_eq!(threats.len(), 1);
                assert_eq!(threats[0].key_path, "query.id");
            }
            other => panic!("expected flag, got {:?}", other),
        }
    }

    #[test]
    fn test_exempt_route_bypasses_scanning() {
        let routes = RouteTable::new(SafeRouteConfig {
            exact: vec!["/api/public/webhooks/github".to_string()],
            ..Default::default()
        });
        let waf = Waf::new(routes, WafConfig::default());
        let request = WafRequest::new("POST", "/api/public/webhooks/github")
            .with_body(json!({"payload": "<script>alert(1)</script>' OR 1=1--"}));
        match waf.inspect_with_options(&request, &opts()) {
            Verdict::Bypass { matched_rule } => {
                assert!(matched_rule.contains("/api/public/webhooks/github"));
            }
            other => panic!("expected bypass, got {:?}", other),
        }
    }

    #[test]
    fn test_partial_rule_skips_one_check_only() {
        let routes = RouteTable::new(SafeRouteConfig {
            partial: vec![PartialRule {
                path: "/api/blog/post".to_string(),
                methods: None,
                skip: vec![crate::detect::CheckKind::Xss],
                reason: "posts contain HTML".to_string(),
            }],
            ..Default::default()
        });
        let waf = Waf::new(routes, WafConfig::default());

        let html = WafRequest::new("POST", "/api/blog/post")
            .with_body(json!({"content": "<img src=x onerror=alert(1)>"}));
        assert_eq!(waf.inspect_with_options(&html, &opts()), Verdict::Allow);

        let sqli = WafRequest::new("POST", "/api/blog/post")
            .with_body(json!({"content": "' OR 1=1--"}));
        assert!(waf.inspect_with_options(&sqli, &opts()).is_blocked());
    }

    #[test]
    fn test_strict_mode_ignores_exemptions() {
        let routes = RouteTable::new(SafeRouteConfig {
            exact: vec!["/api/public/webhooks/github".to_string()],
            ..Default::default()
        });
        let waf = Waf::new(routes, WafConfig::default());
        let request = WafRequest::new("POST", "/api/public/webhooks/github")
            .with_body(json!({"payload": "' OR 1=1--"}));
        let strict = RuntimeOptions {
            strict: true,
            ..opts()
        };
        assert!(waf.inspect_with_options(&request, &strict).is_blocked());
    }

    #[test]
    fn test_depth_cap_allows_by_default() {
        let mut deep = json!("' OR 1=1--");
        for _ in 0..15 {
            deep = json!({ "inner": deep });
        }
        let request = WafRequest::new("POST", "/api/data").with_body(deep);
        assert_eq!(waf().inspect_with_options(&request, &opts()), Verdict::Allow);
    }

    #[test]
    fn test_depth_cap_blocks_when_configured() {
        let mut deep = json!("harmless");
        for _ in 0..15 {
            deep = json!({ "inner": deep });
        }
        let config = WafConfig {
            depth_limit_policy: DepthLimitPolicy::Block,
            ..WafConfig::default()
        };
        let waf = Waf::new(RouteTable::empty(), config);
        let request = WafRequest::new("POST", "/api/data").with_body(deep);
        assert!(waf.inspect_with_options(&request, &opts()).is_blocked());
    }

    #[test]
    fn test_multiple_threats_all_reported() {
        let request = WafRequest::new("POST", "/api/form").with_body(json!({
            "comment": "<script>alert(1)</script>",
            "lookup": "' OR 1=1--",
        }));
        let Verdict::Block(response) = waf().inspect_with_options(&request, &opts()) else {
            panic!("expected block");
        };
        assert_eq!(response.threats.len(), 2);
    }
}
