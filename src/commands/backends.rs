use crate::backends::{BackendRegistry, LanguageBackend};
use crate::config::UpmConfig;
use crate::error::Result;
use crate::ui as output;
use crate::utils::machine_output;
use colored::Colorize;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct BackendSummary {
    name: String,
    specfile: String,
    lockfile: String,
    filename_patterns: Vec<String>,
    quirks: Vec<&'static str>,
    available: bool,
}

impl BackendSummary {
    fn of(backend: &dyn LanguageBackend) -> Self {
        Self {
            name: backend.name().to_string(),
            specfile: backend.specfile().to_string(),
            lockfile: backend.lockfile().to_string(),
            filename_patterns: backend
                .filename_patterns()
                .iter()
                .map(|p| p.to_string())
                .collect(),
            quirks: backend.quirks().labels(),
            available: backend.is_available(),
        }
    }
}

/// List every registered backend with its files, quirks and availability
pub fn run(config: &UpmConfig, format: Option<&str>) -> Result<()> {
    let registry = BackendRegistry::with_defaults(config.clone());
    let summaries: Vec<BackendSummary> = registry
        .all()
        .iter()
        .map(|backend| BackendSummary::of(backend.as_ref()))
        .collect();

    if let Some(format) = format {
        return machine_output::emit_v1("backends", "", summaries, format);
    }

    output::header("Backends");
    for summary in &summaries {
        let status = if summary.available {
            "✓".green()
        } else {
            "✗".red()
        };
        println!("  {} {}", status, summary.name.cyan().bold());
        output::indent(
            &format!("specfile: {}  lockfile: {}", summary.specfile, summary.lockfile),
            2,
        );
        let quirks = if summary.quirks.is_empty() {
            "none".to_string()
        } else {
            summary.quirks.join(", ")
        };
        output::indent(&format!("quirks: {}", quirks).dimmed().to_string(), 2);
    }

    Ok(())
}

pub fn which_language(backend: &dyn LanguageBackend) -> Result<()> {
    println!("{}", backend.name());
    Ok(())
}
