#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Assignment configuration loading and environment-driven runtime settings.

use std::path::Path;

use anyhow::{Context, Result};
use tracing_subscriber::filter::LevelFilter;

use crate::{
    constants::{ASSIGNMENT_CONFIG_JSON, ASSIGNMENT_CONFIG_TOML, GRADING_FILES_DIR, LOG_ENV, WORKERS_ENV},
    engine::GradingEngine,
    error::ConfigError,
    fraction::Fraction,
    grade::{Assignment, AssignmentConfig, AssignmentMetadata},
};

/// Settings read from the environment once per process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeSettings {
    /// Grading engine pool size.
    pub workers:   usize,
    /// Most verbose log level emitted.
    pub log_level: LevelFilter,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            workers:   GradingEngine::default_workers(),
            log_level: LevelFilter::INFO,
        }
    }
}

impl RuntimeSettings {
    /// Reads `TALLY_WORKERS` and `TALLY_LOG`. Missing or invalid values fall
    /// back to the defaults.
    pub fn from_env() -> Self {
        Self {
            workers:   parse_workers(std::env::var(WORKERS_ENV).ok()),
            log_level: parse_log_level(std::env::var(LOG_ENV).ok()),
        }
    }

    /// An engine sized by these settings.
    pub fn engine(&self) -> GradingEngine {
        GradingEngine::new(self.workers)
    }
}

/// Parses a worker count, defaulting when unset, unparseable, or zero.
fn parse_workers(value: Option<String>) -> usize {
    value
        .and_then(|value| value.trim().parse::<usize>().ok())
        .filter(|workers| *workers > 0)
        .unwrap_or_else(GradingEngine::default_workers)
}

/// Parses a log level name, defaulting to `INFO`.
fn parse_log_level(value: Option<String>) -> LevelFilter {
    value
        .and_then(|value| value.trim().parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::INFO)
}

/// Reads `tally.toml`, or `tally.json` when there is no TOML file, from the
/// autograder directory.
pub fn load_assignment_config(autograder_dir: &Path) -> Result<AssignmentConfig> {
    let toml_path = autograder_dir.join(ASSIGNMENT_CONFIG_TOML);
    let json_path = autograder_dir.join(ASSIGNMENT_CONFIG_JSON);

    let config: AssignmentConfig = if toml_path.is_file() {
        let text = std::fs::read_to_string(&toml_path)
            .with_context(|| format!("Could not read {}", toml_path.display()))?;
        toml::from_str(&text).with_context(|| format!("Invalid configuration in {}", toml_path.display()))?
    } else if json_path.is_file() {
        let text = std::fs::read_to_string(&json_path)
            .with_context(|| format!("Could not read {}", json_path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Invalid configuration in {}", json_path.display()))?
    } else {
        return Err(ConfigError::MissingConfig {
            file: ASSIGNMENT_CONFIG_TOML.to_string(),
            dir:  autograder_dir.display().to_string(),
        }
        .into());
    };

    validate(&config)?;
    tracing::debug!(
        assignment = %config.name,
        components = config.components.len(),
        penalties = config.penalties.len(),
        "loaded assignment configuration"
    );
    Ok(config)
}

/// Checks what serde cannot: weights are not negative and every part carries
/// what its backend needs.
pub fn validate(config: &AssignmentConfig) -> Result<(), ConfigError> {
    for component in &config.components {
        check_weight("component", &component.name, &component.weight)?;

        for part in &component.parts {
            check_weight("part", &part.description, &part.weight)?;
            component
                .backend
                .validate_part(part)
                .map_err(|reason| ConfigError::InvalidPart {
                    component: component.name.clone(),
                    part: part.description.clone(),
                    reason,
                })?;
        }
    }
    Ok(())
}

/// Rejects negative weights.
fn check_weight(what: &'static str, name: &str, weight: &Fraction) -> Result<(), ConfigError> {
    if weight.is_negative() {
        return Err(ConfigError::NegativeWeight {
            what,
            name: name.to_string(),
            weight: weight.to_string(),
        });
    }
    Ok(())
}

/// Loads the assignment in `autograder_dir`, with `grading-files/` as the
/// grading files root.
pub fn load_assignment(
    autograder_dir: &Path,
    metadata: AssignmentMetadata,
    settings: &RuntimeSettings,
) -> Result<Assignment> {
    let config = load_assignment_config(autograder_dir)?;
    Ok(Assignment::builder()
        .config(config)
        .grading_files(autograder_dir.join(GRADING_FILES_DIR))
        .metadata(metadata)
        .engine(settings.engine())
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{backend::Backend, penalty::Penalizer};

    const CONFIG: &str = r#"
name = "Homework 1"
author = "Course Staff"

[[penalties]]
name = "LATE"
backend = { kind = "late", rules = [{ after = "1h", penalty = "25 pts" }] }

[[components]]
name = "Build"
weight = 1
backend = { kind = "multi-command" }
files = ["*.c"]
parts = [{ description = "compiles", target = "make" }]

[[components]]
name = "Tests"
weight = "3/2"
backend = { kind = "test-command", build = "make tests", run = "./tests {test}", workers = 2 }
grading-files = ["tests.c", "Makefile"]
parts = [
    { description = "test_push", weight = 2 },
    { description = "test_pop", weight = 0.5, partial-credit = false },
]
"#;

    fn write(dir: &Path, name: &str, text: &str) {
        std::fs::write(dir.join(name), text).expect("write config");
    }

    #[test]
    fn loads_toml() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), ASSIGNMENT_CONFIG_TOML, CONFIG);

        let config = load_assignment_config(dir.path()).expect("loads");
        assert_eq!(config.name, "Homework 1");
        assert_eq!(config.total_component_weight(), Fraction::new(5, 2));
        assert!(matches!(config.penalties[0].backend, Penalizer::Late(_)));

        let tests = &config.components[1];
        assert!(matches!(tests.backend, Backend::TestCommand(_)));
        assert_eq!(tests.grading_files, ["tests.c", "Makefile"]);
        assert_eq!(tests.parts[1].weight, Fraction::new(1, 2));
        assert!(!tests.parts[1].partial_credit);
        assert!(tests.parts[0].partial_credit);
    }

    #[test]
    fn falls_back_to_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(
            dir.path(),
            ASSIGNMENT_CONFIG_JSON,
            r#"{"name": "HW", "components": [{"name": "Run", "backend": {"kind": "json-report", "command": "./tester"}, "parts": [{"description": "one"}]}]}"#,
        );
        let config = load_assignment_config(dir.path()).expect("loads");
        assert_eq!(config.components[0].weight, Fraction::one());
    }

    #[test]
    fn missing_config_is_a_config_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = load_assignment_config(dir.path()).expect_err("no config");
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::MissingConfig { .. })
        ));
    }

    #[test]
    fn command_parts_need_a_target() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(
            dir.path(),
            ASSIGNMENT_CONFIG_TOML,
            r#"
name = "HW"
[[components]]
name = "Build"
backend = { kind = "multi-command" }
parts = [{ description = "compiles" }]
"#,
        );
        let err = load_assignment_config(dir.path()).expect_err("invalid part");
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::InvalidPart { .. })
        ));
    }

    #[test]
    fn bad_penalty_units_fail_at_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(
            dir.path(),
            ASSIGNMENT_CONFIG_TOML,
            r#"
name = "HW"
components = []
[[penalties]]
name = "LATE"
backend = { kind = "fixed", penalty = "5 bananas" }
"#,
        );
        let err = load_assignment_config(dir.path()).expect_err("bad units");
        assert!(format!("{err:#}").contains("bananas"));
    }

    #[test]
    fn invalid_environment_values_fall_back() {
        assert_eq!(parse_workers(Some("4".into())), 4);
        assert_eq!(parse_workers(Some("zero".into())), GradingEngine::default_workers());
        assert_eq!(parse_workers(Some("0".into())), GradingEngine::default_workers());
        assert_eq!(parse_log_level(Some("debug".into())), LevelFilter::DEBUG);
        assert_eq!(parse_log_level(Some("chatty".into())), LevelFilter::INFO);
        assert_eq!(parse_log_level(None), LevelFilter::INFO);
    }
}
