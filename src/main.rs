#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! # tally
//!
//! Grades a submission against an autograder directory and exports the
//! resulting grade document.
//!
//! ```text
//! tally grade [SUBMISSION] [METADATA] --autograder DIR [-o FILE]
//! tally export FORMAT [-i FILE] [-o FILE]
//! tally prereqs --autograder DIR
//! ```
//!
//! Logs go to stderr; `TALLY_LOG` picks the level and `TALLY_WORKERS` the
//! number of components graded at once.

use std::{
    io::{Read, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use bpaf::*;
use colored::Colorize;
use dotenvy::dotenv;
use tally::{
    config::{RuntimeSettings, load_assignment, load_assignment_config},
    constants::{DEFAULT_METADATA_PATH, DEFAULT_SUBMISSION_DIR},
    export::{ExportFormat, export},
    grade::AssignmentGrade,
    provision::Provisioning,
    submission::load_submission,
};
use tracing_subscriber::{fmt, prelude::*, util::SubscriberInitExt};

/// Top-level CLI commands.
#[derive(Debug, Clone)]
enum Cmd {
    /// Grade a submission and write the grade document
    Grade {
        /// Submission directory
        submission: PathBuf,
        /// Gradescope submission metadata
        metadata:   PathBuf,
        /// Directory holding the assignment configuration
        autograder: PathBuf,
        /// Where to write the document, stdout when absent
        output:     Option<PathBuf>,
    },
    /// Render a grade document
    Export {
        /// Target format
        format: ExportFormat,
        /// Grade document, stdin when absent
        input:  Option<PathBuf>,
        /// Where to write the export, stdout when absent
        output: Option<PathBuf>,
    },
    /// Print what the grading image must provide
    Prereqs {
        /// Directory holding the assignment configuration
        autograder: PathBuf,
    },
}

/// Parse the command line arguments and return a `Cmd` enum
fn options() -> Cmd {
    /// parses the autograder directory
    fn autograder() -> impl Parser<PathBuf> {
        short('a')
            .long("autograder")
            .help("Directory containing tally.toml and grading-files/")
            .argument::<PathBuf>("DIR")
            .fallback(PathBuf::from("."))
    }

    /// parses an optional output file
    fn output() -> impl Parser<Option<PathBuf>> {
        short('o')
            .long("output")
            .help("Write to FILE instead of stdout")
            .argument::<PathBuf>("FILE")
            .optional()
    }

    let submission = positional::<PathBuf>("SUBMISSION")
        .help("Directory with the submitted files")
        .fallback(PathBuf::from(DEFAULT_SUBMISSION_DIR));
    let metadata = positional::<PathBuf>("METADATA")
        .help("Gradescope submission_metadata.json")
        .fallback(PathBuf::from(DEFAULT_METADATA_PATH));
    let grade = construct!(Cmd::Grade {
        autograder(),
        output(),
        submission,
        metadata,
    })
    .to_options()
    .command("grade")
    .help("Grade a submission and print the grade document as JSON");

    let input = short('i')
        .long("input")
        .help("Read the grade document from FILE instead of stdin")
        .argument::<PathBuf>("FILE")
        .optional();
    let format = positional::<String>("FORMAT")
        .help("One of local, gradescope, table")
        .parse(|format| format.parse::<ExportFormat>());
    let export = construct!(Cmd::Export {
        input,
        output(),
        format,
    })
    .to_options()
    .command("export")
    .help("Render a grade document");

    let prereqs = construct!(Cmd::Prereqs { autograder() })
    .to_options()
    .command("prereqs")
    .help("List packages, setup commands and display needs of the backends");

    let cmd = construct!([grade, export, prereqs]);

    cmd.to_options()
        .descr("Grade aggregation for autograders")
        .run()
}

/// Writes `text` to `path`, or to stdout.
fn write_output(path: Option<&Path>, text: &str) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, format!("{text}\n"))
            .with_context(|| format!("Could not write {}", path.display())),
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{text}").context("Could not write to stdout")
        }
    }
}

/// Reads `path`, or stdin.
fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display())),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Could not read the grade document from stdin")?;
            Ok(text)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let settings = RuntimeSettings::from_env();

    let fmt = fmt::layer()
        .without_time()
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr);
    tracing_subscriber::registry()
        .with(fmt)
        .with(settings.log_level)
        .init();

    let cmd = options();

    match cmd {
        Cmd::Grade {
            submission,
            metadata,
            autograder,
            output,
        } => {
            let (submission, metadata) = load_submission(&submission, &metadata)?;
            let assignment = load_assignment(&autograder, metadata, &settings)?;
            let grade = assignment.grade(&submission).await;
            let document =
                serde_json::to_string_pretty(&grade).context("Could not serialize the grade")?;
            write_output(output.as_deref(), &document)?;
        }
        Cmd::Export {
            format,
            input,
            output,
        } => {
            let grade = AssignmentGrade::from_json(&read_input(input.as_deref())?)?;
            write_output(output.as_deref(), &export(&grade, format)?)?;
        }
        Cmd::Prereqs { autograder } => {
            let config = load_assignment_config(&autograder)?;
            let provisioning = Provisioning::of(&config)?;
            for program in &provisioning.missing_programs {
                eprintln!("{} `{program}` is not on PATH", "warning:".yellow().bold());
            }
            eprintln!("{}", provisioning.table());
            write_output(None, &provisioning.to_string())?;
        }
    };

    Ok(())
}
