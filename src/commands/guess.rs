use crate::backends::LanguageBackend;
use crate::config::UpmConfig;
use crate::core::types::PkgName;
use crate::error::Result;
use crate::utils::{machine_output, scan};
use std::collections::BTreeSet;

pub struct GuessOptions {
    /// Keep packages that are already declared
    pub all: bool,
    /// Print matching import statements instead of resolving packages
    pub statements: bool,
}

pub fn run(
    backend: &dyn LanguageBackend,
    config: &UpmConfig,
    options: GuessOptions,
    format: Option<&str>,
) -> Result<()> {
    if options.statements {
        let statements = scan::matching_statements(
            &config.project_dir,
            backend.guess_regexps(),
            backend.filename_patterns(),
            &config.ignored_paths,
        )?;
        if let Some(format) = format {
            return machine_output::emit_v1("guess-statements", backend.name(), statements, format);
        }
        for statement in statements {
            println!("{}", statement);
        }
        return Ok(());
    }

    let mut guessed = backend.guess()?;
    if !options.all && config.project_dir.join(backend.specfile()).is_file() {
        let declared = backend.list_specfile()?;
        guessed = without_declared(guessed, declared.keys());
    }

    if let Some(format) = format {
        return machine_output::emit_v1("guess", backend.name(), guessed, format);
    }
    for name in &guessed {
        println!("{}", name);
    }

    Ok(())
}

fn without_declared<'a>(
    guessed: BTreeSet<PkgName>,
    declared: impl Iterator<Item = &'a PkgName>,
) -> BTreeSet<PkgName> {
    let declared: BTreeSet<&PkgName> = declared.collect();
    guessed
        .into_iter()
        .filter(|name| !declared.contains(name))
        .collect()
}
