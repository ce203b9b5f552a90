#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use glob::{Pattern, glob};
use walkdir::WalkDir;

/// A glob matched nothing in the directory it was copied from.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("missing file `{pattern}`")]
pub struct MissingFile {
    /// The glob as written in the configuration.
    pub pattern: String,
}

/// Paths under `root` matching `pattern` (relative to `root`).
pub fn find_matches(pattern: &str, root: &Path) -> Result<Vec<PathBuf>> {
    let full = format!(
        "{}/{}",
        Pattern::escape(
            root.to_str()
                .context("Could not convert the search root to a string")?
        ),
        pattern.trim_start_matches('/')
    );

    Ok(glob(&full)
        .with_context(|| format!("`{pattern}` is not a valid glob"))?
        .filter_map(Result::ok)
        .collect())
}

/// Copies everything matched by `globs` from `src_dir` into `dest_dir`,
/// keeping paths relative to `src_dir`. Directories are copied recursively
/// and existing files are overwritten.
///
/// All globs are resolved before anything is copied, so a glob that matches
/// nothing fails with [`MissingFile`] without leaving a partial copy.
pub fn copy_globs(globs: &[String], src_dir: &Path, dest_dir: &Path) -> Result<()> {
    let mut to_copy = Vec::new();
    for pattern in globs {
        let matches = find_matches(pattern, src_dir)?;
        if matches.is_empty() {
            return Err(MissingFile {
                pattern: pattern.clone(),
            }
            .into());
        }
        to_copy.extend(matches);
    }

    for src in to_copy {
        let rel = src
            .strip_prefix(src_dir)
            .with_context(|| format!("{} is outside {}", src.display(), src_dir.display()))?;
        let dest = dest_dir.join(rel);

        if src.is_dir() {
            copy_dir(&src, &dest)?;
        } else {
            copy_file(&src, &dest)?;
        }
    }

    Ok(())
}

/// Copies one file, creating parent directories as needed.
fn copy_file(src: &Path, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Could not create {}", parent.display()))?;
    }
    fs::copy(src, dest)
        .with_context(|| format!("Could not copy {} to {}", src.display(), dest.display()))?;
    Ok(())
}

/// Recursively copies a directory tree.
fn copy_dir(src: &Path, dest: &Path) -> Result<()> {
    for entry in WalkDir::new(src) {
        let entry = entry.with_context(|| format!("Could not walk {}", src.display()))?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .context("walkdir yielded a path outside its root")?;
        let target = dest.join(rel);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("Could not create {}", target.display()))?;
        } else {
            copy_file(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Splits a command line the way a POSIX shell would, without running one.
pub fn split_command(line: &str) -> Result<Vec<String>> {
    let words =
        shell_words::split(line).with_context(|| format!("Could not split command `{line}`"))?;
    anyhow::ensure!(!words.is_empty(), "command `{line}` is empty");
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().expect("has parent")).expect("mkdir");
        fs::write(path, contents).expect("write");
    }

    #[test]
    fn copies_files_and_directories_keeping_relative_paths() {
        let src = tempfile::tempdir().expect("src");
        let dest = tempfile::tempdir().expect("dest");
        touch(src.path(), "main.c", "int main;");
        touch(src.path(), "include/a.h", "a");
        touch(src.path(), "include/nested/b.h", "b");

        copy_globs(&["*.c".into(), "include".into()], src.path(), dest.path()).expect("copy");

        assert!(dest.path().join("main.c").is_file());
        assert_eq!(
            fs::read_to_string(dest.path().join("include/nested/b.h")).expect("read"),
            "b"
        );
    }

    #[test]
    fn later_copies_overwrite_earlier_ones() {
        let student = tempfile::tempdir().expect("student");
        let grading = tempfile::tempdir().expect("grading");
        let dest = tempfile::tempdir().expect("dest");
        touch(student.path(), "tests.c", "student version");
        touch(grading.path(), "tests.c", "instructor version");

        copy_globs(&["tests.c".into()], student.path(), dest.path()).expect("student copy");
        copy_globs(&["tests.c".into()], grading.path(), dest.path()).expect("grading copy");

        assert_eq!(
            fs::read_to_string(dest.path().join("tests.c")).expect("read"),
            "instructor version"
        );
    }

    #[test]
    fn an_unmatched_glob_copies_nothing() {
        let src = tempfile::tempdir().expect("src");
        let dest = tempfile::tempdir().expect("dest");
        touch(src.path(), "a.c", "");

        let err = copy_globs(&["a.c".into(), "b.c".into()], src.path(), dest.path())
            .expect_err("b.c is missing");
        assert_eq!(
            err.downcast_ref::<MissingFile>(),
            Some(&MissingFile {
                pattern: "b.c".into()
            })
        );
        assert!(!dest.path().join("a.c").exists());
    }

    #[test]
    fn splits_quoted_commands() {
        assert_eq!(
            split_command("sh -c 'echo hi there'").expect("split"),
            vec!["sh", "-c", "echo hi there"]
        );
        assert!(split_command("   ").is_err());
    }
}
