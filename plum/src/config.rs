//! Dispatch Configuration
//!
//! Tunables shared by every operation created through one
//! [`Dispatcher`](crate::Dispatcher).

use serde::{Deserialize, Serialize};

use crate::error::DispatchResult;

/// Configuration for dispatch resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Cache resolutions keyed by the call's argument types.
    pub cache_enabled: bool,

    /// Upper bound on how many arguments of one call may be converted during
    /// fallback resolution.
    pub max_conversions: usize,

    /// Check results against the declared return type after invocation.
    pub check_return_types: bool,

    /// Retry on an operation's fallback when resolution finds no match.
    pub class_fallback: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            max_conversions: 2,
            check_return_types: true,
            class_fallback: true,
        }
    }
}

impl DispatchConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from TOML. Missing keys take their defaults.
    pub fn from_toml_str(source: &str) -> DispatchResult<Self> {
        Ok(toml::from_str(source)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = DispatchConfig::from_toml_str("max_conversions = 1\n").unwrap();
        assert_eq!(
            config,
            DispatchConfig {
                max_conversions: 1,
                ..DispatchConfig::default()
            }
        );
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(DispatchConfig::from_toml_str("").unwrap(), DispatchConfig::new());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = DispatchConfig::from_toml_str("cache_enabled = \"yes\"").unwrap_err();
        assert!(matches!(err, crate::DispatchError::Config(_)));
    }
}
