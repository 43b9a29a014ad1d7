//! Input validation for plan input documents.
//!
//! This module checks an input document before planning, collecting every
//! problem so they can be reported together.

use crate::error::{ConfigError, Result, StackplanError};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

use crate::planner::stack_name;

use super::input::PlanInput;

/// Validator for plan input documents.
#[derive(Debug, Default)]
pub struct InputValidator;

/// Validation result containing all problems found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of warnings (non-fatal issues).
    pub warnings: Vec<String>,
}

/// A single validation error.
#[derive(Debug)]
pub struct ValidationError {
    /// The field path that failed validation.
    pub field: String,
    /// The error message.
    pub message: String,
}

impl InputValidator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates an input document.
    ///
    /// # Errors
    ///
    /// Returns the first problem found: an undeclared feature as a
    /// resolution error, anything else as a validation error.
    pub fn validate(&self, input: &PlanInput) -> Result<ValidationResult> {
        let mut result = ValidationResult::default();

        Self::validate_deployments(input, &mut result)?;
        Self::validate_stacks(input, &mut result);

        if result.errors.is_empty() {
            debug!(
                "Input validation passed with {} warnings",
                result.warning_count()
            );
            Ok(result)
        } else {
            let first_error = &result.errors[0];
            Err(StackplanError::Config(ConfigError::validation(
                first_error.message.clone(),
                first_error.field.clone(),
            )))
        }
    }

    /// Validates the deployments.
    ///
    /// Undeclared features abort validation immediately.
    fn validate_deployments(input: &PlanInput, result: &mut ValidationResult) -> Result<()> {
        let mut seen_names = HashSet::new();
        let mut by_stack: BTreeMap<String, &str> = BTreeMap::new();

        for (i, deployment) in input.deployments.iter().enumerate() {
            let prefix = format!("deployments[{i}]");

            if deployment.name.is_empty() {
                result.errors.push(ValidationError {
                    field: format!("{prefix}.name"),
                    message: String::from("Deployment name cannot be empty"),
                });
                continue;
            }

            if !seen_names.insert(deployment.name.as_str()) {
                result.errors.push(ValidationError {
                    field: format!("{prefix}.name"),
                    message: format!("Duplicate deployment name: {}", deployment.name),
                });
                continue;
            }

            let stack = stack_name(&deployment.name);
            if let Some(first) = by_stack.get(&stack) {
                result.errors.push(ValidationError {
                    field: format!("{prefix}.name"),
                    message: format!(
                        "Deployments '{first}' and '{}' both map to stack '{stack}'",
                        deployment.name
                    ),
                });
            } else {
                by_stack.insert(stack, deployment.name.as_str());
            }

            let resolved = deployment.resolve()?;
            if !resolved.defines_app()? {
                result.warnings.push(format!(
                    "Deployment '{}' defines no application and will not get a stack",
                    deployment.name
                ));
            }
        }

        if input.deployments.is_empty() {
            result
                .warnings
                .push(String::from("No deployments defined in input"));
        }
        Ok(())
    }

    /// Validates the live stacks.
    fn validate_stacks(input: &PlanInput, result: &mut ValidationResult) {
        let produced: HashSet<String> = input
            .deployments
            .iter()
            .map(|deployment| stack_name(&deployment.name))
            .collect();
        let mut seen_names = HashSet::new();

        for (i, stack) in input.stacks.iter().enumerate() {
            let prefix = format!("stacks[{i}]");

            if stack.name.is_empty() {
                result.errors.push(ValidationError {
                    field: format!("{prefix}.name"),
                    message: String::from("Stack name cannot be empty"),
                });
                continue;
            }

            if !seen_names.insert(stack.name.as_str()) {
                result.errors.push(ValidationError {
                    field: format!("{prefix}.name"),
                    message: format!("Duplicate stack name: {}", stack.name),
                });
                continue;
            }

            if !produced.contains(&stack.name) {
                result.warnings.push(format!(
                    "Stack '{}' belongs to no deployment and will be removed",
                    stack.name
                ));
            }
        }
    }
}

impl ValidationResult {
    /// Returns true if validation passed (no errors).
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of errors.
    #[must_use]
    pub const fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Returns the number of warnings.
    #[must_use]
    pub const fn warning_count(&self) -> usize {
        self.warnings.len()
    }
}
