//! WAF error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or compiling WAF policy configuration.
///
/// Detection itself is total and never fails; errors only occur at
/// startup when the safe-routes file is read and compiled.
#[derive(Debug, Error)]
pub enum WafError {
    /// Failed to read the safe-routes configuration file.
    #[error("failed to read safe routes file '{path}': {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML content.
    #[error("failed to parse safe routes config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// A wildcard route pattern failed to compile.
    #[error("invalid route pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The offending wildcard template.
        pattern: String,
        /// Underlying regex error.
        #[source]
        source: regex::Error,
    },
}

/// Result type for WAF configuration operations.
pub type WafResult<T> = Result<T, WafError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = WafError::InvalidPattern {
            pattern: "/api/[".to_string(),
            source: regex::Regex::new("[").unwrap_err(),
        };
        assert!(err.to_string().contains("/api/["));
    }
}
