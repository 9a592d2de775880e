//! Emacs Lisp backend using Cask
//!
//! The `Cask` specfile is edited as text; everything else goes through
//! `emacs` (ELPA search/info), `cask` (install, specfile listing), and
//! `sqlite3` over the epkgs database (dependency guessing). Cask has no
//! lockfile of its own, so `install` writes `packages.txt` from the packages
//! actually installed.

mod scripts;

use crate::backends::LanguageBackend;
use crate::config::UpmConfig;
use crate::core::types::{PkgInfo, PkgName, PkgSpec, PkgVersion, Quirks};
use crate::error::{Result, UpmError};
use crate::utils::exec::{ToolInvoker, is_executable_available};
use crate::utils::sanitize::{is_sql_literal_safe, validate_package_names};
use crate::utils::{fs as upm_fs, remote, scan};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::LazyLock;

pub const NAME: &str = "elisp-cask";
pub const SPECFILE: &str = "Cask";
pub const LOCKFILE: &str = "packages.txt";
const FILENAME_PATTERNS: &[&str] = &["*.el"];

/// Written when `add` has to create the Cask file
pub const CASK_HEADER: &str = "(source melpa)\n(source gnu)\n(source org)\n";

const REQUIRE_PATTERN: &str = r"\(\s*require\s*'\s*([^)[:space:]]+)[^)]*\)";
const PROVIDE_PATTERN: &str = r"\(\s*provide\s*'\s*([^)[:space:]]+)[^)]*\)";

static GUESS_REGEXPS: LazyLock<Vec<Regex>> =
    LazyLock::new(|| vec![Regex::new(REQUIRE_PATTERN).expect("Invalid regex pattern")]);
static PROVIDE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(PROVIDE_PATTERN).expect("Invalid regex pattern"));
static LOCKFILE_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(.+)=(.+)").expect("Invalid regex pattern"));
static QUOTED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""(.+?)""#).expect("Invalid regex pattern"));

pub struct ElispBackend {
    invoker: ToolInvoker,
    project_dir: PathBuf,
    emacs: String,
    cask: String,
    sqlite3: String,
    epkgs_url: String,
    ignored_paths: Vec<String>,
}

impl ElispBackend {
    pub fn new(config: &UpmConfig) -> Self {
        Self {
            invoker: ToolInvoker::new(&config.project_dir, config.command_timeout),
            project_dir: config.project_dir.clone(),
            emacs: config.emacs.clone(),
            cask: config.cask.clone(),
            sqlite3: config.sqlite3.clone(),
            epkgs_url: config.epkgs_url.clone(),
            ignored_paths: config.ignored_paths.clone(),
        }
    }

    fn specfile_path(&self) -> PathBuf {
        self.project_dir.join(SPECFILE)
    }

    fn lockfile_path(&self) -> PathBuf {
        self.project_dir.join(LOCKFILE)
    }

    /// Run the ELPA helper with a scratch package directory that is removed
    /// when the call returns.
    fn run_search_info(&self, action: &str, arg: &str) -> Result<Vec<u8>> {
        let scratch = tempfile::Builder::new()
            .prefix("elpa")
            .tempdir()
            .map_err(UpmError::StdIo)?;

        self.invoker.output(&[
            self.emacs.clone(),
            "-Q".to_string(),
            "--batch".to_string(),
            "--eval".to_string(),
            format!("(progn {})", scripts::SEARCH_INFO),
            scratch.path().to_string_lossy().into_owned(),
            action.to_string(),
            arg.to_string(),
        ])
    }

    /// Features required by the project and features it provides itself
    fn collect_features(&self) -> Result<(BTreeSet<String>, BTreeSet<String>)> {
        let capture = |regex: &Regex| -> Result<BTreeSet<String>> {
            Ok(scan::search_recursive(
                &self.project_dir,
                regex,
                FILENAME_PATTERNS,
                &self.ignored_paths,
            )?
            .into_iter()
            .filter_map(|caps| caps.get(1).cloned())
            .collect())
        };

        let mut required = BTreeSet::new();
        for regex in GUESS_REGEXPS.iter() {
            required.extend(capture(regex)?);
        }
        let provided = capture(&PROVIDE_RE)?;

        Ok((required, provided))
    }
}

impl LanguageBackend for ElispBackend {
    fn name(&self) -> &str {
        NAME
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
        Quirks::NOT_REPRODUCIBLE
    }

    fn is_available(&self) -> bool {
        is_executable_available(&self.emacs) && is_executable_available(&self.cask)
    }

    fn search(&self, query: &str) -> Result<Vec<PkgInfo>> {
        let output = self.run_search_info("search", query)?;
        parse_search_output(&output)
    }

    fn info(&self, name: &PkgName) -> Result<PkgInfo> {
        let output = self.run_search_info("info", name.as_str())?;
        parse_info_output(&output)
    }

    fn add(&self, pkgs: &BTreeMap<PkgName, PkgSpec>) -> Result<()> {
        if pkgs.is_empty() {
            return Ok(());
        }
        validate_package_names(pkgs.keys())?;

        let path = self.specfile_path();
        let existing = upm_fs::read_optional(&path)?;
        let contents = add_declarations(existing.as_deref(), pkgs)?;

        upm_fs::write_atomic(&path, contents.as_bytes())
    }

    fn remove(&self, pkgs: &BTreeSet<PkgName>) -> Result<()> {
        let path = self.specfile_path();
        let contents = upm_fs::read_optional(&path)?
            .ok_or_else(|| UpmError::SpecfileMissing { path: path.clone() })?;

        let mut updated = contents.clone();
        for name in pkgs {
            updated = remove_declaration(&updated, name)?;
            if declares(&updated, name)? {
                return Err(UpmError::Parse {
                    file: path.display().to_string(),
                    message: format!("could not remove the declaration of '{}'", name),
                });
            }
        }

        if updated == contents {
            return Ok(());
        }
        upm_fs::write_atomic(&path, updated.as_bytes())
    }

    fn install(&self) -> Result<()> {
        self.invoker
            .run(&[self.cask.clone(), "install".to_string()])?;

        let installed = self.invoker.output(&[
            self.cask.clone(),
            "eval".to_string(),
            scripts::INSTALLED_PACKAGES.to_string(),
        ])?;

        upm_fs::write_atomic(&self.lockfile_path(), &installed)
    }

    fn list_specfile(&self) -> Result<BTreeMap<PkgName, PkgSpec>> {
        let path = self.specfile_path();
        if !path.exists() {
            return Err(UpmError::SpecfileMissing { path });
        }

        let output = self.invoker.output(&[
            self.cask.clone(),
            "eval".to_string(),
            scripts::LIST_SPECFILE.to_string(),
        ])?;

        parse_specfile_listing(&String::from_utf8_lossy(&output))
    }

    fn list_lockfile(&self) -> Result<BTreeMap<PkgName, PkgVersion>> {
        let path = self.lockfile_path();
        let contents =
            upm_fs::read_optional(&path)?.ok_or(UpmError::LockfileMissing { path })?;

        Ok(parse_lockfile(&contents))
    }

    fn guess_regexps(&self) -> &[Regex] {
        &GUESS_REGEXPS
    }

    fn guess(&self) -> Result<BTreeSet<PkgName>> {
        let (required, provided) = self.collect_features()?;
        let Some(query) = epkgs_query(&unresolved_features(&required, &provided)) else {
            return Ok(BTreeSet::new());
        };

        let scratch = tempfile::Builder::new()
            .prefix("epkgs")
            .tempdir()
            .map_err(UpmError::StdIo)?;
        let db = scratch.path().join("epkgs.sqlite");
        remote::download_file(&self.epkgs_url, &db)?;

        let output = self.invoker.output(&[
            self.sqlite3.clone(),
            db.to_string_lossy().into_owned(),
            query,
        ])?;

        Ok(QUOTED_RE
            .captures_iter(&String::from_utf8_lossy(&output))
            .map(|caps| PkgName::from(&caps[1]))
            .collect())
    }
}

fn parse_search_output(output: &[u8]) -> Result<Vec<PkgInfo>> {
    let results: Option<Vec<PkgInfo>> =
        serde_json::from_slice(output).map_err(|e| UpmError::response("ELPA search", e))?;
    Ok(results.unwrap_or_default())
}

fn parse_info_output(output: &[u8]) -> Result<PkgInfo> {
    let info: Option<PkgInfo> =
        serde_json::from_slice(output).map_err(|e| UpmError::response("ELPA info", e))?;
    Ok(info.unwrap_or_default())
}

/// Matches one `(depends-on "NAME" ...)` form. Spec arguments may hold
/// one level of nested lists, e.g. `:files ("*.el")`.
fn declaration_regex(name: &PkgName) -> Result<Regex> {
    let pattern = format!(
        r#"\(depends-on[ \t]+"{}"(?:[ \t][^()\n]*(?:\([^()\n]*\)[^()\n]*)*)?\)"#,
        regex::escape(name.as_str())
    );
    Regex::new(&pattern).map_err(|e| UpmError::Config(format!("Invalid package name: {}", e)))
}

/// Opening of a declaration of `name`, however its arguments are written
fn declaration_start_regex(name: &PkgName) -> Result<Regex> {
    let pattern = format!(r#"\(depends-on[ \t]+"{}""#, regex::escape(name.as_str()));
    Regex::new(&pattern).map_err(|e| UpmError::Config(format!("Invalid package name: {}", e)))
}

fn line_bounds(contents: &str, start: usize, end: usize) -> (usize, usize) {
    let line_start = contents[..start].rfind('\n').map_or(0, |i| i + 1);
    let line_end = contents[end..]
        .find('\n')
        .map_or(contents.len(), |i| end + i + 1);
    (line_start, line_end)
}

/// Delete every declaration of `name` outside comments. A line left with
/// nothing but whitespace or a comment goes too; anything else on the
/// line, such as the `)` closing a `(development ...)` block, stays.
pub(crate) fn remove_declaration(contents: &str, name: &PkgName) -> Result<String> {
    let regex = declaration_regex(name)?;
    let mut updated = String::with_capacity(contents.len());
    let mut cursor = 0;

    for found in regex.find_iter(contents) {
        let (line_start, line_end) = line_bounds(contents, found.start(), found.end());
        let before = &contents[line_start..found.start()];
        if before.contains(';') {
            continue;
        }

        let after = contents[found.end()..line_end].trim();
        let whole_line = before.trim().is_empty() && (after.is_empty() || after.starts_with(';'));
        if whole_line && line_start >= cursor {
            updated.push_str(&contents[cursor..line_start]);
            cursor = line_end;
        } else {
            let padding = before.len() - before.trim_end_matches([' ', '\t']).len();
            let cut = (found.start() - padding).max(cursor);
            updated.push_str(&contents[cursor..cut]);
            cursor = found.end();
        }
    }

    updated.push_str(&contents[cursor..]);
    Ok(updated)
}

/// Whether `contents` still declares `name` outside comments
pub(crate) fn declares(contents: &str, name: &PkgName) -> Result<bool> {
    let regex = declaration_start_regex(name)?;
    Ok(regex.find_iter(contents).any(|found| {
        let (line_start, _) = line_bounds(contents, found.start(), found.end());
        !contents[line_start..found.start()].contains(';')
    }))
}

/// Cask text after declaring `pkgs`. An existing declaration of the same
/// package is replaced, so repeating the call changes nothing.
pub(crate) fn add_declarations(
    existing: Option<&str>,
    pkgs: &BTreeMap<PkgName, PkgSpec>,
) -> Result<String> {
    let mut contents = existing.unwrap_or(CASK_HEADER).to_string();

    for name in pkgs.keys() {
        contents = remove_declaration(&contents, name)?;
        if declares(&contents, name)? {
            return Err(UpmError::Parse {
                file: "Cask".to_string(),
                message: format!("could not replace the declaration of '{}'", name),
            });
        }
    }

    if !contents.is_empty() && !contents.ends_with('\n') {
        contents.push('\n');
    }

    for (name, spec) in pkgs {
        if spec.is_empty() {
            contents.push_str(&format!("(depends-on \"{}\")\n", name));
        } else {
            contents.push_str(&format!("(depends-on \"{}\" {})\n", name, spec));
        }
    }

    Ok(contents)
}

/// Parse `name=spec` lines printed by the Cask listing helper
pub(crate) fn parse_specfile_listing(output: &str) -> Result<BTreeMap<PkgName, PkgSpec>> {
    let mut pkgs = BTreeMap::new();
    for line in output.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let (name, spec) = line.split_once('=').ok_or_else(|| UpmError::Parse {
            file: SPECFILE.to_string(),
            message: format!("unexpected output: {}", line),
        })?;
        pkgs.insert(PkgName::from(name), PkgSpec::from(spec));
    }
    Ok(pkgs)
}

pub(crate) fn parse_lockfile(contents: &str) -> BTreeMap<PkgName, PkgVersion> {
    LOCKFILE_LINE_RE
        .captures_iter(contents)
        .map(|caps| (PkgName::from(&caps[1]), PkgVersion::from(&caps[2])))
        .collect()
}

/// Required features that the project does not provide itself and that can
/// be embedded in a SQL literal
pub(crate) fn unresolved_features(
    required: &BTreeSet<String>,
    provided: &BTreeSet<String>,
) -> BTreeSet<String> {
    required
        .iter()
        .filter(|feature| !provided.contains(*feature) && is_sql_literal_safe(feature))
        .cloned()
        .collect()
}

/// Query mapping features to non-builtin epkgs packages, or `None` when
/// there is nothing to look up
pub(crate) fn epkgs_query(features: &BTreeSet<String>) -> Option<String> {
    if features.is_empty() {
        return None;
    }

    let clauses: Vec<String> = features
        .iter()
        .map(|feature| format!("feature = '{}'", feature))
        .collect();

    Some(format!(
        "SELECT package FROM provided PR WHERE ({}) \
         AND NOT EXISTS (SELECT 1 FROM builtin_libraries B WHERE PR.feature = B.feature) \
         AND NOT EXISTS (SELECT 1 FROM packages PK WHERE PR.package = PK.name AND PK.class = 'builtin');",
        clauses.join(" OR ")
    ))
}
