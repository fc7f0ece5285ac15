#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use glob::{Pattern, glob};
use which::which;

use crate::constants::CHECKER_JAR;

/// Finds and returns the path to the java binary
pub fn java_path() -> Result<OsString> {
    which("java")
        .map(PathBuf::into_os_string)
        .context("Cannot find a Java runtime on path (java)")
}

/// Path of the checker jar shipped next to the running executable.
/// If that cannot be determined, returns the bare jar name.
pub fn bundled_checker_jar() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(CHECKER_JAR)))
        .unwrap_or_else(|| PathBuf::from(CHECKER_JAR))
}

/// A glob utility function to find paths to files with certain extension,
/// sorted by path
///
/// * `extension`: the file extension to find paths for
/// * `search_depth`: how many folders deep to search for
/// * `root_dir`: the root directory where search starts
pub fn find_files(extension: &str, search_depth: i8, root_dir: &Path) -> Result<Vec<PathBuf>> {
    let root = root_dir
        .to_str()
        .context("Could not convert root_dir to string")?;
    let mut pattern = PathBuf::from(Pattern::escape(root));

    for _ in 0..search_depth {
        pattern.push("**");
    }

    pattern.push(format!("*.{extension}"));
    let pattern = pattern
        .to_str()
        .context("Could not convert glob pattern to string")?
        .to_string();

    let mut found: Vec<PathBuf> = glob(&pattern)
        .context("Could not create glob")?
        .filter_map(Result::ok)
        .collect();
    found.sort();
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_only_matching_extension() {
        let dir = std::env::temp_dir().join(format!("jflap-util-[{}]", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        for name in ["b.jff", "a.jff", "a.txt"] {
            std::fs::write(dir.join(name), "").unwrap();
        }

        let found = find_files("jff", 0, &dir).unwrap();
        assert_eq!(found, vec![dir.join("a.jff"), dir.join("b.jff")]);

        let _ = std::fs::remove_dir_all(dir);
    }
}
