//! Command dispatcher
//!
//! Resolves settings and the backend, then routes the parsed command to
//! its handler.

use crate::backends::{BackendRegistry, LanguageBackend};
use crate::cli::args::{Cli, Command, GlobalFlags};
use crate::commands;
use crate::config::{self, UpmConfig};
use crate::error::{Result, UpmError};
use crate::ui as output;

/// Dispatch the parsed CLI command to the appropriate handler
pub fn dispatch(args: &Cli) -> Result<()> {
    if let Command::Completions { shell } = &args.command {
        return commands::completions::run(*shell);
    }

    let config = resolve_config(&args.global)?;
    output::init_colors(&config.color);
    let format = args.global.format.machine();

    if let Command::Backends = &args.command {
        return commands::backends::run(&config, format);
    }

    let backend = select_backend(&args.global, &config)?;
    output::verbose(&format!("Using backend {}", backend.name()));
    let backend = backend.as_ref();

    match &args.command {
        Command::WhichLanguage => commands::backends::which_language(backend),
        Command::Search { query } => commands::query::search(backend, &query.join(" "), format),
        Command::Info { name } => commands::query::info(backend, name, format),
        Command::Add {
            packages,
            guess,
            no_install,
        } => commands::edit::add(
            backend,
            &config,
            commands::edit::AddOptions {
                packages: packages.clone(),
                guess: *guess,
                no_install: *no_install,
            },
        ),
        Command::Remove { names, no_install } => commands::edit::remove(
            backend,
            commands::edit::RemoveOptions {
                names: names.clone(),
                no_install: *no_install,
            },
        ),
        Command::Lock => commands::sync::lock(backend),
        Command::Install => commands::sync::install(backend),
        Command::List { lockfile } => commands::list::run(backend, *lockfile, format),
        Command::Guess { all, statements } => commands::guess::run(
            backend,
            &config,
            commands::guess::GuessOptions {
                all: *all,
                statements: *statements,
            },
            format,
        ),
        Command::Backends | Command::Completions { .. } => Ok(()),
    }
}

/// Defaults, then the settings file, then command-line flags and their
/// environment variables.
pub(crate) fn resolve_config(global: &GlobalFlags) -> Result<UpmConfig> {
    let mut config = match &global.config {
        Some(path) => {
            if !path.is_file() {
                return Err(UpmError::Config(format!(
                    "Settings file not found: {}",
                    path.display()
                )));
            }
            UpmConfig::load(path)?
        }
        None => match config::default_settings_file() {
            Ok(path) => UpmConfig::load(&path)?,
            Err(e) => {
                output::verbose(&format!("Using default settings: {}", e));
                UpmConfig::default()
            }
        },
    };

    if let Some(dir) = &global.project_dir {
        config.project_dir = dir.clone();
    }
    if let Some(python2) = &global.python2 {
        config.python2 = python2.clone();
    }
    if let Some(python3) = &global.python3 {
        config.python3 = python3.clone();
    }

    Ok(config)
}

fn select_backend(global: &GlobalFlags, config: &UpmConfig) -> Result<Box<dyn LanguageBackend>> {
    let registry = BackendRegistry::with_defaults(config.clone());

    match &global.lang {
        Some(name) => registry.create(name),
        None => registry
            .detect(&config.project_dir)?
            .ok_or_else(|| UpmError::LanguageUndetected(config.project_dir.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::fs;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).expect("arguments should parse")
    }

    #[test]
    fn test_flags_override_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let settings = dir.path().join("settings.kdl");
        fs::write(&settings, "python3 \"/opt/py3/bin/python3\"\nemacs \"/opt/emacs\"\n").unwrap();

        let cli = parse(&[
            "upm",
            "--config",
            settings.to_str().unwrap(),
            "--python3",
            "/usr/bin/python3.12",
            "--project-dir",
            "/srv/app",
            "backends",
        ]);
        let config = resolve_config(&cli.global).unwrap();

        assert_eq!(config.python3, "/usr/bin/python3.12");
        assert_eq!(config.emacs, "/opt/emacs");
        assert_eq!(config.project_dir, std::path::PathBuf::from("/srv/app"));
    }

    #[test]
    fn test_explicit_missing_settings_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.kdl");

        let cli = parse(&["upm", "--config", missing.to_str().unwrap(), "backends"]);
        assert!(matches!(
            resolve_config(&cli.global),
            Err(UpmError::Config(_))
        ));
    }

    #[test]
    fn test_select_backend_by_name_and_detection() {
        let dir = tempfile::tempdir().unwrap();
        let config = UpmConfig {
            project_dir: dir.path().to_path_buf(),
            ..Default::default()
        };

        let cli = parse(&["upm", "--lang", "python-python2-poetry", "list"]);
        let backend = select_backend(&cli.global, &config).unwrap();
        assert_eq!(backend.name(), "python-python2-poetry");

        let cli = parse(&["upm", "list"]);
        assert!(matches!(
            select_backend(&cli.global, &config),
            Err(UpmError::LanguageUndetected(_))
        ));

        fs::write(dir.path().join("Cask"), "").unwrap();
        let backend = select_backend(&cli.global, &config).unwrap();
        assert_eq!(backend.name(), "elisp-cask");
    }
}
