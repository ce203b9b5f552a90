#![allow(dead_code)]

use std::{
    fs,
    path::{Path, PathBuf},
};

use tally::{
    config::{RuntimeSettings, load_assignment},
    grade::{Assignment, AssignmentMetadata},
};
use tempfile::TempDir;

/// A submission directory and an autograder directory side by side.
pub struct Fixture {
    root: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("create fixture root");
        fs::create_dir_all(root.path().join("submission")).expect("create submission dir");
        fs::create_dir_all(root.path().join("autograder").join("grading-files"))
            .expect("create grading files dir");
        Self { root }
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    pub fn submission(&self) -> PathBuf {
        self.root.path().join("submission")
    }

    pub fn autograder(&self) -> PathBuf {
        self.root.path().join("autograder")
    }

    pub fn grading_files(&self) -> PathBuf {
        self.autograder().join("grading-files")
    }

    pub fn submit(&self, name: &str, contents: &str) -> &Self {
        write(&self.submission().join(name), contents);
        self
    }

    pub fn grading_file(&self, name: &str, contents: &str) -> &Self {
        write(&self.grading_files().join(name), contents);
        self
    }

    pub fn config(&self, toml: &str) -> &Self {
        write(&self.autograder().join("tally.toml"), toml);
        self
    }

    pub fn assignment(&self) -> Assignment {
        let settings = RuntimeSettings {
            workers: 4,
            ..RuntimeSettings::default()
        };
        load_assignment(&self.autograder(), AssignmentMetadata::default(), &settings)
            .expect("load assignment")
    }
}

fn write(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, contents).expect("write fixture file");
}

/// A tester script printing a JSON report with one entry per
/// `(name, passed, total)`.
pub fn json_report_script(tests: &[(&str, u64, u64)]) -> String {
    let entries = tests
        .iter()
        .map(|(name, passed, total)| format!(r#""{name}": {{"passed": {passed}, "total": {total}}}"#))
        .collect::<Vec<_>>()
        .join(", ");
    format!("cat <<'EOF'\n{{\"tests\": {{{entries}}}}}\nEOF\n")
}
