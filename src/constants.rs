#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Preferred assignment configuration file, looked up in the autograder
/// directory.
pub const ASSIGNMENT_CONFIG_TOML: &str = "tally.toml";

/// Fallback assignment configuration file.
pub const ASSIGNMENT_CONFIG_JSON: &str = "tally.json";

/// Sub-directory of the autograder directory holding grading-owned files.
pub const GRADING_FILES_DIR: &str = "grading-files";

/// Default submission location on Gradescope.
pub const DEFAULT_SUBMISSION_DIR: &str = "/autograder/submission";

/// Default submission metadata location on Gradescope.
pub const DEFAULT_METADATA_PATH: &str = "/autograder/submission_metadata.json";

/// Prefix of the per-component temporary working directories.
pub const WORKING_DIR_PREFIX: &str = "tally-component-";

/// Total points when submission metadata does not say otherwise.
pub const DEFAULT_TOTAL_POINTS: i128 = 100;

/// Default per-command timeout in seconds for command backends.
pub const DEFAULT_COMMAND_TIMEOUT_SECS: f64 = 30.0;

/// Default timeout in seconds for report-producing testers.
pub const DEFAULT_REPORT_TIMEOUT_SECS: f64 = 30.0;

/// Environment variable overriding the worker pool size.
pub const WORKERS_ENV: &str = "TALLY_WORKERS";

/// Environment variable overriding the log level.
pub const LOG_ENV: &str = "TALLY_LOG";

/// Placeholder in test command templates replaced by the part's target.
pub const TEST_PLACEHOLDER: &str = "{test}";

/// Appended to errors that are not the student's fault.
pub const AUTOGRADER_FAULT_NOTE: &str = "This appears to be an autograder bug. Please report this \
                                         as an autograder error to your instructors.";

/// Log for a part whose tester produced no result entry.
pub const RESULT_NOT_FOUND: &str = "Results for test not found. Check if there were any internal \
                                    errors reported. If not, report this as an autograder error \
                                    to your instructors.";
