//! # Mare WAF
//!
//! A request-inspection engine for web applications: scans query
//! parameters, request bodies, route parameters, and uploaded file
//! names for cross-site scripting, SQL injection, and path traversal
//! payloads, and tells the caller whether to pass the request through
//! or refuse it with a 403.
//!
//! ## Features
//!
//! - Context-aware XSS, SQL injection, and path traversal detectors
//!   tuned to pass benign prose ("I select the blue option",
//!   "T-Shirt -- Blue Edition", "100% cotton")
//! - Recursive structural scanning with dotted key paths
//!   (`body.user.name`, `query.tags[0]`) and a depth cap
//! - Safe-route policy: exact and wildcard full bypasses plus partial
//!   per-check exemptions, loaded from TOML and failing closed
//! - Runtime toggles from the environment (`WAF`, `WAF_MODE`,
//!   `WAF_STRICT`, `WAF_SAFE_ROUTES`), re-read on every request
//! - Structured threat and bypass logging via `tracing`
//!
//! ## Usage
//!
//! ```
//! use mare_waf::middleware::{Waf, WafRequest};
//!
//! let waf = Waf::with_defaults();
//! let request = WafRequest::new("GET", "/api/users")
//!     .with_query(serde_json::json!({"id": "' OR 1=1--"}));
//! let verdict = waf.inspect(&request);
//! assert!(verdict.is_blocked());
//! ```

pub mod config;
pub mod detect;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod normalize;
pub mod routes;
pub mod scanner;

pub use config::{DepthLimitPolicy, DetectionMode, RuntimeOptions, WafConfig};
pub use detect::{CheckKind, DetectorSet};
pub use error::{WafError, WafResult};
pub use middleware::{BlockResponse, Verdict, Waf, WafRequest};
pub use routes::{RouteTable, SafeRouteConfig};
pub use scanner::Threat;
