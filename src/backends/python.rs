//! Python backends using Poetry
//!
//! One backend per interpreter major version; they differ only in name and
//! in the interpreter binary taken from [`UpmConfig`]. `poetry add` and
//! `poetry remove` also install, which is reported through
//! [`Quirks::ADD_REMOVE_ALSO_INSTALLS`].

mod scripts;

use crate::backends::LanguageBackend;
use crate::config::UpmConfig;
use crate::core::types::{
    AuthorInfo, PkgInfo, PkgName, PkgSpec, PkgVersion, Quirks, null_as_default,
};
use crate::error::{Result, UpmError};
use crate::utils::exec::{ToolInvoker, is_executable_available};
use crate::utils::fs as upm_fs;
use crate::utils::sanitize::validate_package_names;
use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::LazyLock;

pub const SPECFILE: &str = "pyproject.toml";
pub const LOCKFILE: &str = "poetry.lock";
const FILENAME_PATTERNS: &[&str] = &["*.py"];

static GUESS_REGEXPS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    // (?:.|\\\n) lets a statement continue over backslash-escaped newlines
    [
        r"from ((?:.|\\\n)*) import",
        r"import ((?:.|\\\n)*) as",
        r"import ((?:.|\\\n)*)",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("Invalid regex pattern"))
    .collect()
});

static DOC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)doc").expect("Invalid regex pattern"));
static CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)code").expect("Invalid regex pattern"));
static TRACK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)track").expect("Invalid regex pattern"));
static REQUIREMENT_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*").expect("Invalid regex pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PythonVersion {
    Python2,
    Python3,
}

impl PythonVersion {
    pub fn label(self) -> &'static str {
        match self {
            Self::Python2 => "python2",
            Self::Python3 => "python3",
        }
    }

    pub fn backend_name(self) -> String {
        format!("python-{}-poetry", self.label())
    }
}

/// One element of a PyPI XMLRPC `search` response
#[derive(Debug, Deserialize)]
struct PypiSearchEntry {
    #[serde(default, deserialize_with = "null_as_default")]
    name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    summary: String,
    #[serde(default, deserialize_with = "null_as_default")]
    version: String,
}

/// PyPI XMLRPC `release_data` response
#[derive(Debug, Default, Deserialize)]
struct PypiReleaseInfo {
    #[serde(default, deserialize_with = "null_as_default")]
    author: String,
    #[serde(default, deserialize_with = "null_as_default")]
    author_email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    home_page: String,
    #[serde(default, deserialize_with = "null_as_default")]
    license: String,
    #[serde(default, deserialize_with = "null_as_default")]
    name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    project_url: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    requires_dist: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    summary: String,
    #[serde(default, deserialize_with = "null_as_default")]
    version: String,
}

/// The parts of `pyproject.toml` that declare dependencies
#[derive(Debug, Default, Deserialize)]
struct Pyproject {
    #[serde(default)]
    tool: PyprojectTool,
}

#[derive(Debug, Default, Deserialize)]
struct PyprojectTool {
    #[serde(default)]
    poetry: PoetrySection,
}

#[derive(Debug, Default, Deserialize)]
struct PoetrySection {
    #[serde(default)]
    dependencies: BTreeMap<String, toml::Value>,
    #[serde(default, rename = "dev-dependencies")]
    dev_dependencies: BTreeMap<String, toml::Value>,
    #[serde(default)]
    group: BTreeMap<String, PoetryGroup>,
}

#[derive(Debug, Default, Deserialize)]
struct PoetryGroup {
    #[serde(default)]
    dependencies: BTreeMap<String, toml::Value>,
}

/// The parts of `poetry.lock` that pin versions
#[derive(Debug, Default, Deserialize)]
struct PoetryLock {
    #[serde(default)]
    package: Vec<LockedPackage>,
}

#[derive(Debug, Deserialize)]
struct LockedPackage {
    name: String,
    version: String,
}

pub struct PythonBackend {
    name: String,
    python: String,
    invoker: ToolInvoker,
    project_dir: PathBuf,
    ignored_paths: Vec<String>,
}

impl PythonBackend {
    pub fn new(version: PythonVersion, config: &UpmConfig) -> Self {
        let python = match version {
            PythonVersion::Python2 => config.python2.clone(),
            PythonVersion::Python3 => config.python3.clone(),
        };

        Self {
            name: version.backend_name(),
            python,
            invoker: ToolInvoker::new(&config.project_dir, config.command_timeout),
            project_dir: config.project_dir.clone(),
            ignored_paths: config.ignored_paths.clone(),
        }
    }

    fn specfile_path(&self) -> PathBuf {
        self.project_dir.join(SPECFILE)
    }

    fn lockfile_path(&self) -> PathBuf {
        self.project_dir.join(LOCKFILE)
    }

    fn poetry(&self, args: &[&str]) -> Vec<String> {
        let mut argv = vec![self.python.clone(), "-m".to_string(), "poetry".to_string()];
        argv.extend(args.iter().map(|arg| arg.to_string()));
        argv
    }

    fn run_script(&self, script: &str, arg: &str) -> Result<Vec<u8>> {
        self.invoker.output(&[
            self.python.clone(),
            "-c".to_string(),
            script.to_string(),
            arg.to_string(),
        ])
    }
}

impl LanguageBackend for PythonBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn specfile(&self) -> &str {
        SPECFILE
    }

    fn lockfile(&self) -> &str {
        LOCKFILE
    }

    fn filename_patterns(&self) -> &[&'static str] {
        FILENAME_PATTERNS
    }

    fn quirks(&self) -> Quirks {
        Quirks::ADD_REMOVE_ALSO_INSTALLS
    }

    fn is_available(&self) -> bool {
        is_executable_available(&self.python)
    }

    fn search(&self, query: &str) -> Result<Vec<PkgInfo>> {
        let output = self.run_script(scripts::SEARCH, query)?;
        parse_search_output(&output)
    }

    fn info(&self, name: &PkgName) -> Result<PkgInfo> {
        let output = self.run_script(scripts::INFO, name.as_str())?;
        let release: PypiReleaseInfo =
            serde_json::from_slice(&output).map_err(|e| UpmError::response("PyPI", e))?;
        Ok(info_from_release(release))
    }

    fn add(&self, pkgs: &BTreeMap<PkgName, PkgSpec>) -> Result<()> {
        if pkgs.is_empty() {
            return Ok(());
        }
        validate_package_names(pkgs.keys())?;

        if !self.specfile_path().exists() {
            self.invoker.run(&self.poetry(&["init", "--no-interaction"]))?;
        }

        let requirements: Vec<String> = pkgs
            .iter()
            .map(|(name, spec)| format!("{}{}", name, spec))
            .collect();
        let mut argv = self.poetry(&["add"]);
        argv.extend(requirements);

        self.invoker.run(&argv)
    }

    fn remove(&self, pkgs: &BTreeSet<PkgName>) -> Result<()> {
        let declared = self.list_specfile()?;
        let targets: Vec<String> = pkgs
            .iter()
            .filter(|name| declared.contains_key(*name))
            .map(|name| name.to_string())
            .collect();

        if targets.is_empty() {
            return Ok(());
        }

        let mut argv = self.poetry(&["remove"]);
        argv.extend(targets);
        self.invoker.run(&argv)
    }

    fn supports_lock(&self) -> bool {
        true
    }

    fn lock(&self) -> Result<()> {
        self.invoker.run(&self.poetry(&["lock"]))
    }

    fn install(&self) -> Result<()> {
        // Packages dropped from the lockfile are not necessarily uninstalled,
        // e.g. after an interrupted `poetry remove`.
        self.invoker.run(&self.poetry(&["install"]))
    }

    fn list_specfile(&self) -> Result<BTreeMap<PkgName, PkgSpec>> {
        let path = self.specfile_path();
        let contents =
            upm_fs::read_optional(&path)?.ok_or(UpmError::SpecfileMissing { path })?;
        parse_pyproject(&contents)
    }

    fn list_lockfile(&self) -> Result<BTreeMap<PkgName, PkgVersion>> {
        let path = self.lockfile_path();
        let contents =
            upm_fs::read_optional(&path)?.ok_or(UpmError::LockfileMissing { path })?;
        parse_poetry_lock(&contents)
    }

    fn guess_regexps(&self) -> &[Regex] {
        &GUESS_REGEXPS
    }

    fn guess(&self) -> Result<BTreeSet<PkgName>> {
        let output = self.run_script(scripts::GUESS, &self.ignored_paths.join(" "))?;
        let names: Vec<String> =
            serde_json::from_slice(&output).map_err(|e| UpmError::response("pipreqs", e))?;
        Ok(names.into_iter().map(PkgName::from).collect())
    }
}

fn parse_search_output(output: &[u8]) -> Result<Vec<PkgInfo>> {
    let entries: Option<Vec<PypiSearchEntry>> =
        serde_json::from_slice(output).map_err(|e| UpmError::response("PyPI", e))?;

    Ok(entries
        .unwrap_or_default()
        .into_iter()
        .map(|entry| PkgInfo {
            name: entry.name,
            description: entry.summary,
            version: entry.version,
            ..Default::default()
        })
        .collect())
}

/// Map PyPI release data to a package record. Project URLs are classified
/// by label; dependencies restricted to extras are left out.
fn info_from_release(release: PypiReleaseInfo) -> PkgInfo {
    let mut info = PkgInfo {
        name: release.name,
        description: release.summary,
        version: release.version,
        homepage_url: release.home_page,
        author: AuthorInfo {
            name: release.author,
            email: release.author_email,
            url: String::new(),
        }
        .to_string(),
        license: release.license,
        ..Default::default()
    };

    for line in &release.project_url {
        let Some((label, url)) = line.split_once(", ") else {
            continue;
        };

        if DOC_RE.is_match(label) {
            info.documentation_url = url.to_string();
        } else if CODE_RE.is_match(label) {
            info.source_code_url = url.to_string();
        } else if TRACK_RE.is_match(label) {
            info.bug_tracker_url = url.to_string();
        }
    }

    info.dependencies = release
        .requires_dist
        .iter()
        .filter(|req| !req.contains("extra =="))
        .filter_map(|req| REQUIREMENT_NAME_RE.find(req.trim()))
        .map(|m| m.as_str().to_string())
        .collect();

    info
}

fn spec_string(value: &toml::Value) -> String {
    match value {
        toml::Value::String(spec) => spec.clone(),
        other => other.to_string(),
    }
}

/// Declared dependencies from `pyproject.toml`: main, dev, then each group.
/// Later sections win on duplicate names; `python` itself is skipped.
pub(crate) fn parse_pyproject(contents: &str) -> Result<BTreeMap<PkgName, PkgSpec>> {
    let pyproject: Pyproject = toml::from_str(contents).map_err(|e| UpmError::Parse {
        file: SPECFILE.to_string(),
        message: e.to_string(),
    })?;
    let poetry = pyproject.tool.poetry;

    let sections = std::iter::once(&poetry.dependencies)
        .chain(std::iter::once(&poetry.dev_dependencies))
        .chain(poetry.group.values().map(|group| &group.dependencies));

    let mut pkgs = BTreeMap::new();
    for section in sections {
        for (name, value) in section {
            if name == "python" {
                continue;
            }
            pkgs.insert(PkgName::from(name.as_str()), PkgSpec::from(spec_string(value)));
        }
    }
    Ok(pkgs)
}

pub(crate) fn parse_poetry_lock(contents: &str) -> Result<BTreeMap<PkgName, PkgVersion>> {
    let lock: PoetryLock = toml::from_str(contents).map_err(|e| UpmError::Parse {
        file: LOCKFILE.to_string(),
        message: e.to_string(),
    })?;

    Ok(lock
        .package
        .into_iter()
        .map(|pkg| (PkgName::from(pkg.name), PkgVersion::from(pkg.version)))
        .collect())
}
