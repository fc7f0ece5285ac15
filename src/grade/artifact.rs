#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::path::{Path, PathBuf};

use anyhow::Context;
use itertools::Itertools;
use tracing::debug;

use super::{GradeError, SetupError};
use crate::{constants::ARTIFACT_EXTENSION, util::find_files};

/// Directory holding `test_file`, `.` for a bare file name.
fn containing_dir(test_file: &Path) -> &Path {
    match test_file.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}

/// Finds the JFLAP file a test file is meant for.
///
/// When the test file's directory holds exactly one `.jff` file, that file is
/// used whatever its name. Otherwise the test file's extension is swapped for
/// `.jff` and that file must exist.
pub fn resolve_artifact(test_file: &Path) -> Result<PathBuf, GradeError> {
    let dir = containing_dir(test_file);
    let test_name = test_file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let candidates: Vec<String> = find_files(ARTIFACT_EXTENSION, 0, dir)
        .with_context(|| format!("could not list JFLAP files in {}", dir.display()))?
        .iter()
        .filter_map(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .collect();
    debug!("JFLAP files next to {test_name}: {candidates:?}");

    if let [only] = candidates.as_slice() {
        return Ok(dir.join(only));
    }

    let Some((stem, _)) = test_name.rsplit_once('.') else {
        return Err(SetupError::NoExtension { test_file: test_name }.into());
    };
    let wanted = format!("{stem}.{ARTIFACT_EXTENSION}");
    if candidates.contains(&wanted) {
        Ok(dir.join(wanted))
    } else {
        Err(SetupError::NoMatchingArtifact {
            test_file:  test_name,
            candidates: candidates.iter().map(|c| format!("'{c}'")).join(", "),
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use uuid::Uuid;

    use super::*;

    /// Fresh directory holding empty files with the given names.
    fn dir_with(files: &[&str]) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("jflap-artifact-{}", Uuid::new_v4()));
        fs::create_dir_all(&dir).expect("create temp dir");
        for name in files {
            fs::write(dir.join(name), "").unwrap();
        }
        dir
    }

    #[test]
    fn single_artifact_is_used_whatever_its_name() {
        let dir = dir_with(&["machine.jff", "tests.txt"]);
        let found = resolve_artifact(&dir.join("tests.txt")).unwrap();
        assert_eq!(found, dir.join("machine.jff"));
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn extension_is_swapped_when_ambiguous() {
        let dir = dir_with(&["p1.jff", "p2.jff", "p2.txt"]);
        let found = resolve_artifact(&dir.join("p2.txt")).unwrap();
        assert_eq!(found, dir.join("p2.jff"));
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn reports_missing_extension_and_candidates() {
        let dir = dir_with(&["b.jff", "a.jff", "p3"]);

        let err = resolve_artifact(&dir.join("p3")).unwrap_err();
        assert_eq!(err.to_string(), "Test file 'p3' does not have an extension");

        let err = resolve_artifact(&dir.join("p3.txt")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Test file 'p3.txt' does not match any of the available JFLAP files, which are: \
             'a.jff', 'b.jff'"
        );
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn bare_file_name_uses_current_dir() {
        assert_eq!(containing_dir(Path::new("tests.txt")), Path::new("."));
        assert_eq!(containing_dir(Path::new("a/tests.txt")), Path::new("a"));
    }
}
