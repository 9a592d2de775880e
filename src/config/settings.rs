//! Settings Module
//!
//! Loads `settings.kdl` into [`UpmConfig`], the configuration every backend
//! receives at construction time. Tool binaries, the epkgs snapshot source,
//! and scan ignores all come from here rather than from the environment.

use crate::error::{Result, UpmError};
use crate::utils::scan;
use kdl::{KdlDocument, KdlNode};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_EPKGS_URL: &str = "https://github.com/emacsmirror/epkgs/raw/master/epkg.sqlite";

const VALID_KEYS: &[&str] = &[
    "python2",
    "python3",
    "emacs",
    "cask",
    "sqlite3",
    "epkgs-url",
    "command-timeout",
    "ignored-paths",
    "color",
];

#[derive(Debug, Clone, PartialEq)]
pub struct UpmConfig {
    /// Directory holding the specfile and lockfile; commands run here
    pub project_dir: PathBuf,
    pub python2: String,
    pub python3: String,
    pub emacs: String,
    pub cask: String,
    pub sqlite3: String,
    /// URL or local path of the epkgs database snapshot
    pub epkgs_url: String,
    pub command_timeout: Option<Duration>,
    pub ignored_paths: Vec<String>,
    pub color: String,
}

impl Default for UpmConfig {
    fn default() -> Self {
        Self {
            project_dir: PathBuf::from("."),
            python2: "python2".to_string(),
            python3: "python3".to_string(),
            emacs: "emacs".to_string(),
            cask: "cask".to_string(),
            sqlite3: "sqlite3".to_string(),
            epkgs_url: DEFAULT_EPKGS_URL.to_string(),
            command_timeout: None,
            ignored_paths: scan::default_ignored_paths(),
            color: "auto".to_string(),
        }
    }
}

impl UpmConfig {
    /// Load settings from `path` on top of the defaults. A missing file
    /// yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = Self::default();
        if !path.exists() {
            return Ok(config);
        }

        let content = std::fs::read_to_string(path).map_err(|e| UpmError::io(path, e))?;
        config.apply_kdl(&content)?;
        Ok(config)
    }

    /// Apply a KDL settings document, e.g.
    ///
    /// ```kdl
    /// python3 "/opt/python3.12/bin/python3"
    /// command-timeout 600
    /// ignored-paths "build" "dist"
    /// ```
    ///
    /// Nodes may also be nested in a top-level `settings { }` block.
    pub fn apply_kdl(&mut self, content: &str) -> Result<()> {
        let doc: KdlDocument = content.parse()?;

        for node in doc.nodes() {
            if node.name().value() == "settings" {
                if let Some(children) = node.children() {
                    for child in children.nodes() {
                        self.apply_node(child)?;
                    }
                }
                continue;
            }
            self.apply_node(node)?;
        }

        Ok(())
    }

    fn apply_node(&mut self, node: &KdlNode) -> Result<()> {
        let key = node.name().value();
        if !VALID_KEYS.contains(&key) {
            return Err(UpmError::Config(format!(
                "Unknown setting: '{}'. Valid settings: {}",
                key,
                VALID_KEYS.join(", ")
            )));
        }

        match key {
            "python2" => self.python2 = string_value(node)?,
            "python3" => self.python3 = string_value(node)?,
            "emacs" => self.emacs = string_value(node)?,
            "cask" => self.cask = string_value(node)?,
            "sqlite3" => self.sqlite3 = string_value(node)?,
            "epkgs-url" => self.epkgs_url = string_value(node)?,
            "command-timeout" => {
                let secs = node
                    .entries()
                    .first()
                    .and_then(|entry| entry.value().as_integer())
                    .filter(|secs| *secs > 0)
                    .ok_or_else(|| {
                        UpmError::Config(
                            "'command-timeout' expects a positive number of seconds".to_string(),
                        )
                    })?;
                self.command_timeout = Some(Duration::from_secs(secs as u64));
            }
            "ignored-paths" => {
                self.ignored_paths = node
                    .entries()
                    .iter()
                    .map(|entry| {
                        entry.value().as_string().map(str::to_string).ok_or_else(|| {
                            UpmError::Config("'ignored-paths' expects string values".to_string())
                        })
                    })
                    .collect::<Result<Vec<String>>>()?;
            }
            "color" => {
                let value = string_value(node)?;
                let valid = ["auto", "always", "never"];
                if !valid.contains(&value.as_str()) {
                    return Err(UpmError::Config(format!(
                        "Invalid value for 'color': '{}'. Valid: {}",
                        value,
                        valid.join(", ")
                    )));
                }
                self.color = value;
            }
            _ => {}
        }

        Ok(())
    }
}

fn string_value(node: &KdlNode) -> Result<String> {
    node.entries()
        .first()
        .and_then(|entry| entry.value().as_string())
        .filter(|value| !value.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            UpmError::Config(format!(
                "'{}' expects a non-empty string value",
                node.name().value()
            ))
        })
}
