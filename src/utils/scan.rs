//! Recursive source scanning for dependency guessing.

use crate::error::{Result, UpmError};
use ignore::overrides::OverrideBuilder;
use regex::Regex;
use std::path::{Path, PathBuf};

/// Directories skipped by every scan unless the settings replace the list.
pub const DEFAULT_IGNORED_PATHS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    ".upm",
    ".cask",
    "node_modules",
    "__pycache__",
    ".pytest_cache",
    ".mypy_cache",
    ".tox",
    "venv",
    ".venv",
    "site-packages",
];

/// List regular files under `root` whose names match one of `patterns`
/// (globs such as `*.el`), skipping `ignored` directories.
/// Sorted for deterministic output.
pub fn matching_files(root: &Path, patterns: &[&str], ignored: &[String]) -> Result<Vec<PathBuf>> {
    let mut overrides = OverrideBuilder::new(root);
    for pattern in patterns {
        overrides
            .add(pattern)
            .map_err(|e| UpmError::Config(format!("Invalid filename pattern '{}': {}", pattern, e)))?;
    }
    for dir in ignored {
        overrides
            .add(&format!("!{}/", dir))
            .map_err(|e| UpmError::Config(format!("Invalid ignored path '{}': {}", dir, e)))?;
    }
    let overrides = overrides
        .build()
        .map_err(|e| UpmError::Config(format!("Invalid scan patterns: {}", e)))?;

    let walker = ignore::WalkBuilder::new(root)
        .standard_filters(false)
        .hidden(false)
        .overrides(overrides)
        .build();

    let mut files = Vec::new();
    for entry in walker {
        let Ok(entry) = entry else {
            continue;
        };
        if entry.file_type().is_some_and(|ft| ft.is_file()) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Apply `regex` to every matching file and return the capture groups of each
/// match (index 0 is the whole match). Unreadable or non-UTF-8 files are skipped.
pub fn search_recursive(
    root: &Path,
    regex: &Regex,
    patterns: &[&str],
    ignored: &[String],
) -> Result<Vec<Vec<String>>> {
    let mut matches = Vec::new();
    for path in matching_files(root, patterns, ignored)? {
        let Ok(content) = std::fs::read_to_string(&path) else {
            continue;
        };
        for caps in regex.captures_iter(&content) {
            matches.push(
                caps.iter()
                    .map(|group| group.map(|m| m.as_str().to_string()).unwrap_or_default())
                    .collect(),
            );
        }
    }
    Ok(matches)
}

/// Whole-match text of every regex over every matching file, deduplicated.
/// This is the lightweight heuristic that needs no external tools.
pub fn matching_statements(
    root: &Path,
    regexps: &[Regex],
    patterns: &[&str],
    ignored: &[String],
) -> Result<Vec<String>> {
    let mut statements = std::collections::BTreeSet::new();
    for regex in regexps {
        for caps in search_recursive(root, regex, patterns, ignored)? {
            if let Some(whole) = caps.into_iter().next() {
                statements.insert(whole.trim().to_string());
            }
        }
    }
    Ok(statements.into_iter().collect())
}

pub fn default_ignored_paths() -> Vec<String> {
    DEFAULT_IGNORED_PATHS.iter().map(|s| s.to_string()).collect()
}
