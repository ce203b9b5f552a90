#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! What a grading image needs before it can run an assignment's backends.

use std::fmt;

use anyhow::Result;
use itertools::Itertools;
use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use crate::grade::AssignmentConfig;

/// Provisioning needs collected from every component's backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Provisioning {
    /// System packages, sorted and deduplicated.
    pub packages:         Vec<String>,
    /// One-time setup commands, in component order.
    pub setup_commands:   Vec<Vec<String>>,
    /// Whether any backend needs a graphical display.
    pub needs_display:    bool,
    /// Whether any backend prompts on the command line.
    pub interactive:      bool,
    /// Programs named by commands that are not on `PATH` here.
    pub missing_programs: Vec<String>,
    /// Per-component breakdown.
    #[serde(skip)]
    rows:                 Vec<ComponentRow>,
}

/// One component in the provisioning table.
#[derive(Tabled, Debug, Clone, PartialEq, Eq)]
struct ComponentRow {
    /// Component name.
    #[tabled(rename = "Component")]
    component:     String,
    /// Backend kind.
    #[tabled(rename = "Backend")]
    backend:       &'static str,
    /// Packages, space separated.
    #[tabled(rename = "Packages")]
    packages:      String,
    /// Needs a display.
    #[tabled(rename = "Display")]
    display:       bool,
    /// Prompts on the command line.
    #[tabled(rename = "Interactive")]
    interactive:   bool,
}

impl Provisioning {
    /// Collects the needs of every backend in `config`.
    pub fn of(config: &AssignmentConfig) -> Result<Self> {
        let mut provisioning = Provisioning::default();

        for component in &config.components {
            let backend = &component.backend;
            let packages = backend.list_prerequisites();

            provisioning.packages.extend(packages.iter().cloned());
            provisioning.setup_commands.extend(backend.list_setup_commands()?);
            provisioning.needs_display |= backend.needs_display();
            provisioning.interactive |= backend.is_interactive();
            provisioning
                .missing_programs
                .extend(backend.missing_programs(&component.parts));
            provisioning.rows.push(ComponentRow {
                component:   component.name.clone(),
                backend:     backend.name(),
                packages:    packages.join(" "),
                display:     backend.needs_display(),
                interactive: backend.is_interactive(),
            });
        }

        provisioning.packages = provisioning.packages.into_iter().sorted().dedup().collect();
        provisioning.missing_programs =
            provisioning.missing_programs.into_iter().sorted().dedup().collect();
        Ok(provisioning)
    }

    /// A table with one row per component.
    pub fn table(&self) -> String {
        Table::new(&self.rows).with(Style::modern()).to_string()
    }
}

impl fmt::Display for Provisioning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for package in &self.packages {
            writeln!(f, "package: {package}")?;
        }
        for command in &self.setup_commands {
            writeln!(f, "setup: {}", shell_words::join(command))?;
        }
        writeln!(f, "needs-display: {}", self.needs_display)?;
        write!(f, "interactive: {}", self.interactive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packages_are_merged_across_components() {
        let config: AssignmentConfig = serde_json::from_value(serde_json::json!({
            "name": "HW",
            "components": [
                {
                    "name": "Build",
                    "backend": {
                        "kind": "multi-command",
                        "prerequisites": ["make", "gcc"],
                        "setup-commands": ["sh -c 'echo ready'"]
                    },
                    "parts": [{ "description": "compiles", "target": "sh -c true" }]
                },
                {
                    "name": "Circuit",
                    "backend": {
                        "kind": "json-report",
                        "command": "sh tester.sh",
                        "display": true,
                        "prerequisites": ["gcc", "openjdk-17-jre"]
                    },
                    "parts": [{ "description": "adder" }]
                }
            ]
        }))
        .expect("valid config");

        let provisioning = Provisioning::of(&config).expect("collects");
        assert_eq!(provisioning.packages, ["gcc", "make", "openjdk-17-jre"]);
        assert_eq!(provisioning.setup_commands, [vec!["sh", "-c", "echo ready"]]);
        assert!(provisioning.needs_display);
        assert!(!provisioning.interactive);
        assert!(provisioning.missing_programs.is_empty());

        let text = provisioning.to_string();
        assert!(text.contains("package: gcc\npackage: make\n"));
        assert!(text.ends_with("needs-display: true\ninteractive: false"));
        assert!(provisioning.table().contains("Circuit"));
    }
}
