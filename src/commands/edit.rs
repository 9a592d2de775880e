//! `add` and `remove`
//!
//! Both commands touch the specfile only for packages whose declaration
//! would actually change, then lock and install unless told otherwise.

use crate::backends::LanguageBackend;
use crate::commands::sync;
use crate::config::UpmConfig;
use crate::core::types::{PkgName, PkgSpec};
use crate::error::Result;
use crate::ui as output;
use crate::utils::sanitize::validate_package_name;
use std::collections::{BTreeMap, BTreeSet};

pub struct AddOptions {
    /// Each entry is `NAME` or `NAME SPEC`
    pub packages: Vec<String>,
    pub guess: bool,
    pub no_install: bool,
}

pub struct RemoveOptions {
    pub names: Vec<String>,
    pub no_install: bool,
}

pub fn add(backend: &dyn LanguageBackend, config: &UpmConfig, options: AddOptions) -> Result<()> {
    let mut requested = BTreeMap::new();
    for arg in &options.packages {
        let (name, spec) = parse_requested(arg)?;
        requested.insert(name, spec);
    }

    if options.guess {
        for name in backend.guess()? {
            requested.entry(name).or_insert_with(PkgSpec::default);
        }
    }

    let declared = if config.project_dir.join(backend.specfile()).is_file() {
        backend.list_specfile()?
    } else {
        BTreeMap::new()
    };

    let pending = pending_additions(requested, &declared);
    if pending.is_empty() {
        output::info("Nothing to add");
        return Ok(());
    }

    backend.add(&pending)?;
    output::success(&format!("Added {}", join_names(pending.keys())));

    sync::after_edit(backend, options.no_install)
}

pub fn remove(backend: &dyn LanguageBackend, options: RemoveOptions) -> Result<()> {
    let declared = backend.list_specfile()?;
    let (targets, undeclared): (BTreeSet<PkgName>, BTreeSet<PkgName>) = options
        .names
        .iter()
        .map(|name| PkgName::from(name.trim()))
        .partition(|name| declared.contains_key(name));

    if !undeclared.is_empty() {
        output::warning(&format!(
            "Not declared in {}: {}",
            backend.specfile(),
            join_names(undeclared.iter())
        ));
    }

    if targets.is_empty() {
        output::info(&format!("Nothing to remove from {}", backend.specfile()));
        return Ok(());
    }

    backend.remove(&targets)?;
    output::success(&format!("Removed {}", join_names(targets.iter())));

    sync::after_edit(backend, options.no_install)
}

/// Split `NAME SPEC` at the first whitespace run. The spec is kept verbatim
/// apart from surrounding whitespace.
pub(crate) fn parse_requested(arg: &str) -> Result<(PkgName, PkgSpec)> {
    let arg = arg.trim();
    let (name, spec) = match arg.split_once(char::is_whitespace) {
        Some((name, spec)) => (name, spec.trim()),
        None => (arg, ""),
    };

    let name = PkgName::from(name);
    validate_package_name(&name)?;
    Ok((name, PkgSpec::from(spec)))
}

/// Requests that would change the specfile: new names, or declared names
/// with a different explicit spec.
pub(crate) fn pending_additions(
    requested: BTreeMap<PkgName, PkgSpec>,
    declared: &BTreeMap<PkgName, PkgSpec>,
) -> BTreeMap<PkgName, PkgSpec> {
    requested
        .into_iter()
        .filter(|(name, spec)| match declared.get(name) {
            Some(existing) => !spec.is_empty() && spec != existing,
            None => true,
        })
        .collect()
}

fn join_names<'a>(names: impl Iterator<Item = &'a PkgName>) -> String {
    names.map(PkgName::as_str).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests;
