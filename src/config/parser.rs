//! Input parser for loading plan input documents.
//!
//! This module handles loading the input document from YAML files and
//! applying environment variable overrides to the planner settings.

use crate::error::{ConfigError, Result, StackplanError};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::input::PlanInput;
use super::settings::{PlannerConfig, parse_flag};

/// Parser for plan input documents.
#[derive(Debug, Default)]
pub struct ConfigParser {
    /// Base path for locating the `.env` file.
    base_path: Option<PathBuf>,
}

impl ConfigParser {
    /// Creates a new input parser.
    #[must_use]
    pub const fn new() -> Self {
        Self { base_path: None }
    }

    /// Sets the base path for locating the `.env` file.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Loads an input document from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<PlanInput> {
        let path = path.as_ref();
        info!("Loading input from: {}", path.display());

        if !path.exists() {
            return Err(StackplanError::Config(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }));
        }

        let content = std::fs::read_to_string(path)?;

        self.parse_yaml(&content, Some(path))
    }

    /// Parses an input document from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn parse_yaml(&self, content: &str, source: Option<&Path>) -> Result<PlanInput> {
        debug!("Parsing YAML input");

        let input: PlanInput = serde_yaml::from_str(content).map_err(|e| {
            let location = source.map(|p| p.display().to_string());
            StackplanError::Config(ConfigError::ParseError {
                message: format!("YAML parse error: {e}"),
                location,
            })
        })?;

        debug!(
            "Parsed {} deployments and {} live stacks",
            input.deployments.len(),
            input.stacks.len()
        );
        Ok(input)
    }

    /// Loads an input document and applies environment overrides.
    ///
    /// Settings are overridden by `STACKPLAN_<SETTING>` variables, e.g.
    /// `STACKPLAN_SERIALIZE=true`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_with_env(&self, path: impl AsRef<Path>) -> Result<PlanInput> {
        let mut input = self.load_file(path)?;
        Self::apply_env_overrides(&mut input.settings, |name| std::env::var(name).ok());
        Ok(input)
    }

    /// Applies overrides to the settings, looking variables up with `lookup`.
    ///
    /// Values which do not parse as booleans are ignored.
    pub fn apply_env_overrides(
        settings: &mut PlannerConfig,
        lookup: impl Fn(&str) -> Option<String>,
    ) {
        let fields: [(&str, &mut bool); 5] = [
            ("STACKPLAN_SERIALIZE", &mut settings.serialize),
            ("STACKPLAN_SKIP_NONBLOCKING", &mut settings.skip_nonblocking),
            ("STACKPLAN_ALLOW_CONFLICTS", &mut settings.allow_conflicts),
            (
                "STACKPLAN_ALLOW_MISSING_DEPENDENCIES",
                &mut settings.allow_missing_dependencies,
            ),
            ("STACKPLAN_ALLOW_CYCLES", &mut settings.allow_cycles),
        ];

        for (name, field) in fields {
            let Some(value) = lookup(name) else {
                continue;
            };
            match parse_flag(&value) {
                Some(flag) => {
                    debug!("Overriding setting from {name}");
                    *field = flag;
                }
                None => warn!("Ignoring {name}: '{value}' is not a boolean"),
            }
        }
    }

    /// Loads the .env file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the .env file exists but cannot be loaded.
    pub fn load_dotenv(&self) -> Result<()> {
        let env_path = self
            .base_path
            .as_ref()
            .map_or_else(|| PathBuf::from(".env"), |p| p.join(".env"));

        if env_path.exists() {
            info!("Loading environment from: {}", env_path.display());
            dotenvy::from_path(&env_path).map_err(|e| {
                StackplanError::Config(ConfigError::ParseError {
                    message: format!("Failed to load .env file: {e}"),
                    location: Some(env_path.display().to_string()),
                })
            })?;
        } else {
            debug!(".env file not found at: {}", env_path.display());
        }

        Ok(())
    }
}

/// Default input file names to search for.
pub const DEFAULT_INPUT_FILES: &[&str] = &["stackplan.yaml", "stackplan.yml"];

/// Finds the input file in the given directory or its parents.
///
/// # Errors
///
/// Returns an error if no input file is found.
pub fn find_input_file(start_dir: impl AsRef<Path>) -> Result<PathBuf> {
    let start = start_dir.as_ref();
    let mut current = start.to_path_buf();

    loop {
        for filename in DEFAULT_INPUT_FILES {
            let input_path = current.join(filename);
            if input_path.exists() {
                info!("Found input file: {}", input_path.display());
                return Ok(input_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    Err(StackplanError::Config(ConfigError::FileNotFound {
        path: start.join(DEFAULT_INPUT_FILES[0]),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    const INPUT: &str = r"
settings:
  serialize: true
deployments:
  - name: db
    package:
      path: example.com/db
      deployment:
        definition_files: [compose.yml]
        provides:
          networks:
            - name: backend
  - name: web
    features: [metrics]
    package:
      path: example.com/web
      deployment:
        definition_files: [compose.yml]
        requires:
          networks:
            - name: backend
          services:
            - port: 443
              protocol: https
              paths: ['/api/*']
              nonblocking: true
      features:
        metrics:
          images: [prom/node-exporter]
stacks:
  - name: web
    state:
      containers: 2
";

    #[test]
    fn test_parse_input() {
        let input = ConfigParser::new().parse_yaml(INPUT, None).unwrap();
        assert!(input.settings.serialize);
        assert!(input.settings.skip_nonblocking);
        assert_eq!(input.deployments.len(), 2);
        assert_eq!(input.deployments[1].features, vec!["metrics"]);
        assert!(input.deployments[1].package.deployment.requires.services[0].nonblocking);
        assert_eq!(input.stacks[0].state["containers"], 2);

        let deployments = input.resolve_deployments().unwrap();
        assert_eq!(deployments[1].images().unwrap(), vec!["prom/node-exporter"]);
    }

    #[test]
    fn test_parse_minimal_input() {
        let input = ConfigParser::new().parse_yaml("{}", None).unwrap();
        assert!(input.deployments.is_empty());
        assert_eq!(input.settings, PlannerConfig::default());
    }

    #[test]
    fn test_parse_error_has_location() {
        let err = ConfigParser::new()
            .parse_yaml("deployments: [", Some(Path::new("broken.yaml")))
            .unwrap_err();
        match err {
            StackplanError::Config(ConfigError::ParseError { location, .. }) => {
                assert_eq!(location.as_deref(), Some("broken.yaml"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(INPUT.as_bytes()).unwrap();

        let input = ConfigParser::new().load_file(file.path()).unwrap();
        assert_eq!(input.deployments[0].name, "db");
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = ConfigParser::new().load_file(dir.path().join("absent.yaml"));
        assert!(matches!(
            result,
            Err(StackplanError::Config(ConfigError::FileNotFound { .. }))
        ));
    }

    #[test]
    fn test_unreadable_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = ConfigParser::new().load_file(dir.path());
        assert!(matches!(result, Err(StackplanError::Io(_))));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("STACKPLAN_SERIALIZE", "yes"),
            ("STACKPLAN_ALLOW_CYCLES", "0"),
            ("STACKPLAN_SKIP_NONBLOCKING", "sometimes"),
        ]
        .into_iter()
        .collect();

        let mut settings = PlannerConfig::default();
        ConfigParser::apply_env_overrides(&mut settings, |name| {
            vars.get(name).map(|v| (*v).to_string())
        });
        assert!(settings.serialize);
        assert!(!settings.allow_cycles);
        assert!(settings.skip_nonblocking);
        assert!(settings.allow_conflicts);
    }

    #[test]
    fn test_find_input_file_in_parent() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("stackplan.yml"), "{}").unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let found = find_input_file(&nested).unwrap();
        assert_eq!(found, dir.path().join("stackplan.yml"));
    }
}
