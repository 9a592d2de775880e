//! # Language Backends
//!
//! A backend binds the uniform operation set (search, info, add, remove,
//! lock, install, list, guess) to one ecosystem and package manager by
//! shelling out to its tools and parsing their output.
//!
//! - **elisp-cask** (`elisp.rs`): Emacs Lisp via Cask
//! - **python-python3-poetry** / **python-python2-poetry** (`python.rs`):
//!   Python via Poetry
//!
//! ## Adding a New Backend
//!
//! 1. Create `src/backends/<lang>.rs` with a struct implementing
//!    [`LanguageBackend`]
//! 2. Register a factory in `BackendRegistry::register_defaults()`
//!
//! Every operation reads the specfile and lockfile fresh from disk; no state
//! is kept between calls.

pub mod elisp;
pub mod python;
pub mod registry;

#[cfg(all(test, unix))]
pub(crate) mod test_support;

use crate::core::types::{PkgInfo, PkgName, PkgSpec, PkgVersion, Quirks};
use crate::error::{Result, UpmError};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

pub use registry::{BackendRegistry, create_backend};

pub trait LanguageBackend: Send + Sync {
    /// Unique backend name, e.g. `elisp-cask`
    fn name(&self) -> &str;

    /// Specfile name relative to the project directory
    fn specfile(&self) -> &str;

    /// Lockfile name relative to the project directory
    fn lockfile(&self) -> &str;

    /// Globs identifying source files of this ecosystem
    fn filename_patterns(&self) -> &[&'static str];

    fn quirks(&self) -> Quirks;

    /// Whether the wrapped tools can be found
    fn is_available(&self) -> bool;

    /// Free-text lookup. No matches yields an empty list.
    fn search(&self, query: &str) -> Result<Vec<PkgInfo>>;

    /// Single-package lookup. An unknown package yields an empty record.
    fn info(&self, name: &PkgName) -> Result<PkgInfo>;

    /// Declare each package with its spec, creating the specfile if needed.
    fn add(&self, pkgs: &BTreeMap<PkgName, PkgSpec>) -> Result<()>;

    /// Remove declarations by exact name. Fails if the specfile is absent.
    fn remove(&self, pkgs: &BTreeSet<PkgName>) -> Result<()>;

    /// Check if this backend can regenerate the lockfile separately from install
    fn supports_lock(&self) -> bool {
        false
    }

    /// Regenerate the lockfile from the specfile
    fn lock(&self) -> Result<()> {
        Err(UpmError::Unsupported {
            backend: self.name().to_string(),
            operation: "lock".to_string(),
        })
    }

    /// Make the environment match the specfile/lockfile
    fn install(&self) -> Result<()>;

    fn list_specfile(&self) -> Result<BTreeMap<PkgName, PkgSpec>>;

    fn list_lockfile(&self) -> Result<BTreeMap<PkgName, PkgVersion>>;

    /// Regexes `guess` uses to recognise import statements
    fn guess_regexps(&self) -> &[Regex];

    /// Infer dependencies from the project's sources. Best effort: may
    /// over- or under-match.
    fn guess(&self) -> Result<BTreeSet<PkgName>>;
}
