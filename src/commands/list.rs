use crate::backends::LanguageBackend;
use crate::error::Result;
use crate::ui as output;
use crate::utils::machine_output;
use colored::Colorize;
use std::collections::BTreeMap;

/// Print declared specs, or pinned versions with `lockfile`
pub fn run(backend: &dyn LanguageBackend, lockfile: bool, format: Option<&str>) -> Result<()> {
    let (command, source, entries) = if lockfile {
        let locked = backend.list_lockfile()?;
        let entries = locked
            .into_iter()
            .map(|(name, version)| (name.to_string(), version.to_string()))
            .collect::<BTreeMap<_, _>>();
        ("list-lockfile", backend.lockfile(), entries)
    } else {
        let declared = backend.list_specfile()?;
        let entries = declared
            .into_iter()
            .map(|(name, spec)| (name.to_string(), spec.to_string()))
            .collect::<BTreeMap<_, _>>();
        ("list-specfile", backend.specfile(), entries)
    };

    if let Some(format) = format {
        return machine_output::emit_v1(command, backend.name(), entries, format);
    }

    if entries.is_empty() {
        output::info(&format!("No packages in {}", source));
        return Ok(());
    }

    let width = entries.keys().map(|n| n.chars().count()).max().unwrap_or(0);
    for (name, value) in &entries {
        if value.is_empty() {
            println!("{}", name.cyan());
        } else {
            println!(
                "{}  {}",
                format!("{:<width$}", name, width = width).cyan(),
                value.dimmed()
            );
        }
    }

    Ok(())
}
