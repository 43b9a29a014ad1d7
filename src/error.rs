//! Error types for the stackplan reconciliation engine.
//!
//! This module provides the error hierarchy for every stage of planning:
//! deployment resolution, configuration, change planning and reconciliation.
//! Conflicts, missing dependencies and cycles are not errors; they are
//! reported as structured data and only become errors when a reconciler
//! policy says so.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for stackplan.
#[derive(Debug, Error)]
pub enum StackplanError {
    /// Deployment resolution errors.
    #[error("Resolution error: {0}")]
    Resolution(#[from] ResolutionError),

    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Planning errors.
    #[error("Planning error: {0}")]
    Plan(#[from] PlanError),

    /// Reconciliation errors.
    #[error("Reconciliation error: {0}")]
    Reconcile(#[from] ReconcileError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while resolving a deployment against its package.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    /// A deployment enables a feature its package does not declare.
    #[error("Deployment '{deployment}' enables unrecognized feature '{feature}'")]
    UnrecognizedFeature {
        /// Name of the offending deployment.
        deployment: String,
        /// The undeclared feature name.
        feature: String,
    },
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The input file was not found.
    #[error("Input file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The input could not be parsed.
    #[error("Failed to parse input: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// Validation failed.
    #[error("Input validation failed: {message}")]
    ValidationError {
        /// Description of the validation error.
        message: String,
        /// Field that failed validation.
        field: Option<String>,
    },

    /// Duplicate name in the input.
    #[error("Duplicate {resource_type} name: {name}")]
    DuplicateName {
        /// Kind of named item (deployment, stack).
        resource_type: String,
        /// The duplicated name.
        name: String,
    },
}

/// Planning errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// Two deployments map to the same application stack name.
    #[error("Deployments '{first}' and '{second}' both map to stack '{stack}'")]
    StackNameCollision {
        /// The shared stack name.
        stack: String,
        /// First deployment mapping to the stack.
        first: String,
        /// Second deployment mapping to the stack.
        second: String,
    },
}

/// Reconciliation errors.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The configured policy refused to proceed.
    #[error("Reconciliation blocked: {reason}")]
    Blocked {
        /// Reason for blocking.
        reason: String,
    },
}

/// Result type alias for stackplan operations.
pub type Result<T> = std::result::Result<T, StackplanError>;

impl StackplanError {
    /// Returns true if the error stems from malformed input rather than
    /// a policy decision.
    #[must_use]
    pub const fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::Resolution(_) | Self::Config(_) | Self::Plan(PlanError::StackNameCollision { .. })
        )
    }
}

impl ResolutionError {
    /// Creates an unrecognized-feature error.
    #[must_use]
    pub fn unrecognized_feature(deployment: impl Into<String>, feature: impl Into<String>) -> Self {
        Self::UnrecognizedFeature {
            deployment: deployment.into(),
            feature: feature.into(),
        }
    }
}

impl ConfigError {
    /// Creates a validation error for a specific field.
    #[must_use]
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: Some(field.into()),
        }
    }
}

impl ReconcileError {
    /// Creates a blocked error with the given reason.
    #[must_use]
    pub fn blocked(reason: impl Into<String>) -> Self {
        Self::Blocked {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unrecognized_feature_message() {
        let err = ResolutionError::unrecognized_feature("web", "tls");
        assert_eq!(
            err.to_string(),
            "Deployment 'web' enables unrecognized feature 'tls'"
        );
    }

    #[test]
    fn test_input_error_classification() {
        let err: StackplanError = ResolutionError::unrecognized_feature("web", "tls").into();
        assert!(err.is_input_error());

        let err: StackplanError = ReconcileError::blocked("conflicts").into();
        assert!(!err.is_input_error());

        let err: StackplanError = std::io::Error::other("disk").into();
        assert!(!err.is_input_error());
    }
}
