//! Configuration module for the stackplan planner.
//!
//! This module handles all configuration-related functionality:
//! - Planner settings and their environment overrides
//! - Parsing and deserializing `stackplan.yaml` input documents
//! - Validation of input documents before planning

mod input;
mod parser;
mod settings;
mod validator;

pub use input::{DeploymentInput, PlanInput};
pub use parser::{ConfigParser, DEFAULT_INPUT_FILES, find_input_file};
pub use settings::PlannerConfig;
pub use validator::{InputValidator, ValidationError, ValidationResult};
