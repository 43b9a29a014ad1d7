//! Planner settings.

use serde::{Deserialize, Serialize};

/// Settings controlling planning and policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Compute a serial execution order.
    pub serialize: bool,
    /// Leave nonblocking requirements out of the deployment graph.
    pub skip_nonblocking: bool,
    /// Proceed when deployments conflict.
    pub allow_conflicts: bool,
    /// Proceed when dependencies are missing.
    pub allow_missing_dependencies: bool,
    /// Proceed when the change graph has cycles.
    pub allow_cycles: bool,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            serialize: false,
            skip_nonblocking: true,
            allow_conflicts: true,
            allow_missing_dependencies: true,
            allow_cycles: true,
        }
    }
}

impl PlannerConfig {
    /// Returns a config which refuses conflicts, missing dependencies and cycles.
    #[must_use]
    pub const fn strict() -> Self {
        Self {
            serialize: false,
            skip_nonblocking: true,
            allow_conflicts: false,
            allow_missing_dependencies: false,
            allow_cycles: false,
        }
    }

    /// Sets whether plans are serialized.
    #[must_use]
    pub const fn with_serialize(mut self, serialize: bool) -> Self {
        self.serialize = serialize;
        self
    }
}

/// Parses a boolean setting value: `true/false`, `1/0` or `yes/no`.
pub(crate) fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PlannerConfig::default();
        assert!(!config.serialize);
        assert!(config.skip_nonblocking);
        assert!(config.allow_conflicts);
        assert!(config.allow_missing_dependencies);
        assert!(config.allow_cycles);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config: PlannerConfig = serde_yaml::from_str("serialize: true\nallow_cycles: false\n").unwrap();
        assert!(config.serialize);
        assert!(!config.allow_cycles);
        assert!(config.skip_nonblocking);
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" yes "), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("no"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
