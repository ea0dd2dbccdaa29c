//! WAF configuration types and runtime toggles.

use serde::{Deserialize, Serialize};

/// Static WAF configuration, fixed for the lifetime of the engine.
///
/// Runtime switches (enable/disable, mode, strict) live in
/// [`RuntimeOptions`] and are re-read from the environment on every
/// request so they can be toggled without a restart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WafConfig {
    /// Maximum structural recursion depth when scanning request data.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// What to do when a request body exceeds `max_depth`.
    #[serde(default)]
    pub depth_limit_policy: DepthLimitPolicy,

    /// Maximum length of an offending value reproduced in log lines.
    #[serde(default = "default_max_logged_value")]
    pub max_logged_value: usize,
}

fn default_max_depth() -> usize {
    10
}

fn default_max_logged_value() -> usize {
    200
}

impl Default for WafConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            depth_limit_policy: DepthLimitPolicy::default(),
            max_logged_value: default_max_logged_value(),
        }
    }
}

/// Policy for subtrees nested deeper than the scan depth cap.
///
/// The scanner stops descending past the cap either way; this only
/// decides whether the unscanned remainder is treated as benign or as
/// grounds for blocking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepthLimitPolicy {
    /// Pass the request; unscanned content beyond the cap is not reported.
    #[default]
    Allow,
    /// Block the request when content was left unscanned.
    Block,
}

/// Detection mode for the WAF.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionMode {
    /// Block malicious requests with a 403 response.
    #[default]
    Block,
    /// Log threats but let the request through.
    Log,
    /// Skip scanning entirely.
    Off,
}

impl DetectionMode {
    /// Check if this mode should block requests.
    pub fn should_block(&self) -> bool {
        matches!(self, Self::Block)
    }

    fn parse(s: &str) -> Self {
        match s {
            "log" => Self::Log,
            "off" => Self::Off,
            _ => Self::Block,
        }
    }
}

/// Per-request runtime switches.
///
/// Read from the process environment on every request rather than
/// cached, so operators can flip them on a running server. The safe
/// routes file itself is loaded once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeOptions {
    /// Master switch. `WAF=false` turns inspection fully off.
    pub enabled: bool,

    /// Detection mode, from `WAF_MODE` (`block` | `log` | `off`).
    pub mode: DetectionMode,

    /// `WAF_STRICT=true` forces full scanning regardless of route rules.
    pub strict: bool,

    /// `WAF_SAFE_ROUTES=false` disables the exemption lookup.
    pub safe_routes: bool,
}

impl RuntimeOptions {
    /// Read the current toggles from the process environment.
    pub fn from_env() -> Self {
        Self {
            enabled: std::env::var("WAF").map(|v| v != "false").unwrap_or(true),
            mode: std::env::var("WAF_MODE")
                .map(|v| DetectionMode::parse(&v))
                .unwrap_or_default(),
            strict: std::env::var("WAF_STRICT")
                .map(|v| v == "true")
                .unwrap_or(false),
            safe_routes: std::env::var("WAF_SAFE_ROUTES")
                .map(|v| v != "false")
                .unwrap_or(true),
        }
    }
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: DetectionMode::Block,
            strict: false,
            safe_routes: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = WafConfig::default();
        assert_eq!(config.max_depth, 10);
        assert_eq!(config.depth_limit_policy, DepthLimitPolicy::Allow);
        assert_eq!(config.max_logged_value, 200);
    }

    #[test]
    fn test_detection_mode() {
        assert!(DetectionMode::Block.should_block());
        assert!(!DetectionMode::Log.should_block());
        assert!(!DetectionMode::Off.should_block());

        assert_eq!(DetectionMode::parse("log"), DetectionMode::Log);
        assert_eq!(DetectionMode::parse("off"), DetectionMode::Off);
        assert_eq!(DetectionMode::parse("block"), DetectionMode::Block);
        assert_eq!(DetectionMode::parse("bogus"), DetectionMode::Block);
    }

    #[test]
    fn test_default_runtime_options() {
        let opts = RuntimeOptions::default();
        assert!(opts.enabled);
        assert_eq!(opts.mode, DetectionMode::Block);
        assert!(!opts.strict);
        assert!(opts.safe_routes);
    }

    #[test]
    fn test_config_deserialization() {
        let config: WafConfig = toml::from_str(
            r#"
            max_depth = 4
            depth_limit_policy = "block"
            "#,
        )
        .unwrap();
        assert_eq!(config.max_depth, 4);
        assert_eq!(config.depth_limit_policy, DepthLimitPolicy::Block);
        assert_eq!(config.max_logged_value, 200);
    }
}
