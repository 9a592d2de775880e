use super::*;
use crate::core::types::{PkgInfo, PkgVersion, Quirks};
use crate::error::UpmError;
use regex::Regex;
use std::sync::Mutex;

/// In-memory backend that records which operations ran
struct RecordingBackend {
    quirks: Quirks,
    lockable: bool,
    declared: Mutex<Option<BTreeMap<PkgName, PkgSpec>>>,
    guessed: Vec<&'static str>,
    calls: Mutex<Vec<String>>,
}

impl RecordingBackend {
    fn new(quirks: Quirks, lockable: bool) -> Self {
        Self {
            quirks,
            lockable,
            declared: Mutex::new(None),
            guessed: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn with_declared(self, entries: &[(&str, &str)]) -> Self {
        *self.declared.lock().unwrap() = Some(
            entries
                .iter()
                .map(|(n, s)| (PkgName::from(*n), PkgSpec::from(*s)))
                .collect(),
        );
        self
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl LanguageBackend for RecordingBackend {
    fn name(&self) -> &str {
        "recording"
    }

    fn specfile(&self) -> &str {
        "Specfile"
    }

    fn lockfile(&self) -> &str {
        "Lockfile"
    }

    fn filename_patterns(&self) -> &[&'static str] {
        &["*.rec"]
    }

    fn quirks(&self) -> Quirks {
        self.quirks
    }

    fn is_available(&self) -> bool {
        true
    }

    fn search(&self, _query: &str) -> Result<Vec<PkgInfo>> {
        Ok(Vec::new())
    }

    fn info(&self, _name: &PkgName) -> Result<PkgInfo> {
        Ok(PkgInfo::default())
    }

    fn add(&self, pkgs: &BTreeMap<PkgName, PkgSpec>) -> Result<()> {
        let rendered: Vec<String> = pkgs
            .iter()
            .map(|(name, spec)| format!("{}={}", name, spec))
            .collect();
        self.record(format!("add {}", rendered.join(" ")));
        Ok(())
    }

    fn remove(&self, pkgs: &BTreeSet<PkgName>) -> Result<()> {
        self.record(format!("remove {}", join_names(pkgs.iter())));
        Ok(())
    }

    fn supports_lock(&self) -> bool {
        self.lockable
    }

    fn lock(&self) -> Result<()> {
        self.record("lock".to_string());
        Ok(())
    }

    fn install(&self) -> Result<()> {
        self.record("install".to_string());
        Ok(())
    }

    fn list_specfile(&self) -> Result<BTreeMap<PkgName, PkgSpec>> {
        self.record("list".to_string());
        self.declared
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| UpmError::SpecfileMissing {
                path: "Specfile".into(),
            })
    }

    fn list_lockfile(&self) -> Result<BTreeMap<PkgName, PkgVersion>> {
        Ok(BTreeMap::new())
    }

    fn guess_regexps(&self) -> &[Regex] {
        &[]
    }

    fn guess(&self) -> Result<BTreeSet<PkgName>> {
        Ok(self.guessed.iter().map(|name| PkgName::from(*name)).collect())
    }
}

fn config_with_specfile(present: bool) -> (tempfile::TempDir, UpmConfig) {
    let dir = tempfile::tempdir().unwrap();
    if present {
        std::fs::write(dir.path().join("Specfile"), "").unwrap();
    }
    let config = UpmConfig {
        project_dir: dir.path().to_path_buf(),
        ..Default::default()
    };
    (dir, config)
}

fn add_options(packages: &[&str]) -> AddOptions {
    AddOptions {
        packages: packages.iter().map(|p| p.to_string()).collect(),
        guess: false,
        no_install: false,
    }
}

#[test]
fn test_parse_requested_splits_at_first_whitespace() {
    let (name, spec) = parse_requested("requests ^2.31").unwrap();
    assert_eq!(name.as_str(), "requests");
    assert_eq!(spec.as_str(), "^2.31");

    let (name, spec) = parse_requested("  foo   git \"https://x/foo\" :ref \"v1\" ").unwrap();
    assert_eq!(name.as_str(), "foo");
    assert_eq!(spec.as_str(), "git \"https://x/foo\" :ref \"v1\"");

    let (name, spec) = parse_requested("dash").unwrap();
    assert_eq!(name.as_str(), "dash");
    assert!(spec.is_empty());
}

#[test]
fn test_parse_requested_rejects_empty_and_flags() {
    assert!(parse_requested("   ").is_err());
    assert!(parse_requested("--upgrade").is_err());
}

#[test]
fn test_pending_additions_skips_unchanged() {
    let declared: BTreeMap<PkgName, PkgSpec> = [
        (PkgName::from("dash"), PkgSpec::from("")),
        (PkgName::from("s"), PkgSpec::from("\"1.13.0\"")),
    ]
    .into_iter()
    .collect();
    let requested: BTreeMap<PkgName, PkgSpec> = [
        (PkgName::from("dash"), PkgSpec::from("")),
        (PkgName::from("s"), PkgSpec::from("\"1.13.1\"")),
        (PkgName::from("f"), PkgSpec::from("")),
    ]
    .into_iter()
    .collect();

    let pending = pending_additions(requested, &declared);
    assert_eq!(
        pending.keys().map(PkgName::as_str).collect::<Vec<_>>(),
        vec!["f", "s"]
    );
}

#[test]
fn test_add_locks_then_installs() {
    let (_dir, config) = config_with_specfile(false);
    let backend = RecordingBackend::new(Quirks::NONE, true);

    add(&backend, &config, add_options(&["flask ^3.0"])).unwrap();

    assert_eq!(backend.calls(), vec!["add flask=^3.0", "lock", "install"]);
}

#[test]
fn test_add_without_lock_support_only_installs() {
    let (_dir, config) = config_with_specfile(false);
    let backend = RecordingBackend::new(Quirks::NOT_REPRODUCIBLE, false);

    add(&backend, &config, add_options(&["dash"])).unwrap();

    assert_eq!(backend.calls(), vec!["add dash=", "install"]);
}

#[test]
fn test_add_skips_install_when_manager_installs() {
    let (_dir, config) = config_with_specfile(false);
    let backend = RecordingBackend::new(Quirks::ADD_REMOVE_ALSO_INSTALLS, true);

    add(&backend, &config, add_options(&["flask"])).unwrap();

    assert_eq!(backend.calls(), vec!["add flask="]);
}

#[test]
fn test_add_no_install_flag() {
    let (_dir, config) = config_with_specfile(false);
    let backend = RecordingBackend::new(Quirks::NONE, true);

    let mut options = add_options(&["flask"]);
    options.no_install = true;
    add(&backend, &config, options).unwrap();

    assert_eq!(backend.calls(), vec!["add flask="]);
}

#[test]
fn test_add_already_declared_does_nothing() {
    let (_dir, config) = config_with_specfile(true);
    let backend = RecordingBackend::new(Quirks::NONE, true).with_declared(&[("dash", "")]);

    add(&backend, &config, add_options(&["dash"])).unwrap();

    assert_eq!(backend.calls(), vec!["list"]);
}

#[test]
fn test_add_merges_guessed_packages() {
    let (_dir, config) = config_with_specfile(true);
    let mut backend = RecordingBackend::new(Quirks::ADD_REMOVE_ALSO_INSTALLS, true)
        .with_declared(&[("requests", "^2.31")]);
    backend.guessed = vec!["requests", "numpy"];

    let mut options = add_options(&["flask ^3.0"]);
    options.guess = true;
    add(&backend, &config, options).unwrap();

    assert_eq!(backend.calls(), vec!["list", "add flask=^3.0 numpy="]);
}

#[test]
fn test_remove_filters_to_declared() {
    let backend =
        RecordingBackend::new(Quirks::NONE, true).with_declared(&[("dash", ""), ("s", "")]);

    remove(
        &backend,
        RemoveOptions {
            names: vec!["s".to_string(), "ghost".to_string()],
            no_install: false,
        },
    )
    .unwrap();

    assert_eq!(backend.calls(), vec!["list", "remove s", "lock", "install"]);
}

#[test]
fn test_remove_nothing_declared_is_noop() {
    let backend = RecordingBackend::new(Quirks::NONE, true).with_declared(&[("dash", "")]);

    remove(
        &backend,
        RemoveOptions {
            names: vec!["ghost".to_string()],
            no_install: false,
        },
    )
    .unwrap();

    assert_eq!(backend.calls(), vec!["list"]);
}

#[test]
fn test_remove_without_specfile_fails() {
    let backend = RecordingBackend::new(Quirks::NONE, true);

    let err = remove(
        &backend,
        RemoveOptions {
            names: vec!["dash".to_string()],
            no_install: false,
        },
    )
    .unwrap_err();
    assert!(matches!(err, UpmError::SpecfileMissing { .. }));
}
