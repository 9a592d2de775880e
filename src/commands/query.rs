use crate::backends::LanguageBackend;
use crate::core::types::{PkgInfo, PkgName};
use crate::error::{Result, UpmError};
use crate::ui as output;
use crate::utils::machine_output;
use colored::Colorize;

pub fn search(backend: &dyn LanguageBackend, query: &str, format: Option<&str>) -> Result<()> {
    let results = backend.search(query)?;

    if let Some(format) = format {
        return machine_output::emit_v1("search", backend.name(), results, format);
    }

    if results.is_empty() {
        output::info(&format!("No packages found for '{}'", query));
        return Ok(());
    }

    let width = results
        .iter()
        .map(|r| r.name.chars().count())
        .max()
        .unwrap_or(0);
    for result in &results {
        print_search_result(result, width);
    }

    Ok(())
}

fn print_search_result(result: &PkgInfo, width: usize) {
    let padded = format!("{:<width$}", result.name, width = width);
    let version = if result.version.is_empty() {
        String::new()
    } else {
        format!(" {}", result.version)
    };

    if result.description.is_empty() {
        println!("{}{}", padded.cyan(), version.green());
    } else {
        println!(
            "{}{}  {}",
            padded.cyan(),
            version.green(),
            result.description.as_str().dimmed()
        );
    }
}

pub fn info(backend: &dyn LanguageBackend, name: &str, format: Option<&str>) -> Result<()> {
    let info = backend.info(&PkgName::from(name))?;
    if info.is_empty() {
        return Err(UpmError::PackageNotFound(name.to_string()));
    }

    if let Some(format) = format {
        return machine_output::emit_v1("info", backend.name(), info, format);
    }

    for (key, value) in info_fields(&info) {
        output::keyval(key, &value);
    }

    Ok(())
}

/// Non-empty fields of a package record, labelled for display
fn info_fields(info: &PkgInfo) -> Vec<(&'static str, String)> {
    [
        ("Name", info.name.clone()),
        ("Description", info.description.clone()),
        ("Version", info.version.clone()),
        ("Homepage", info.homepage_url.clone()),
        ("Documentation", info.documentation_url.clone()),
        ("Source code", info.source_code_url.clone()),
        ("Bug tracker", info.bug_tracker_url.clone()),
        ("Author", info.author.clone()),
        ("License", info.license.clone()),
        ("Dependencies", info.dependencies.join(", ")),
    ]
    .into_iter()
    .filter(|(_, value)| !value.is_empty())
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info_fields_skip_empty() {
        let info = PkgInfo {
            name: "dash".to_string(),
            version: "2.19.1".to_string(),
            dependencies: vec!["emacs".to_string(), "cl-lib".to_string()],
            ..Default::default()
        };

        let fields = info_fields(&info);
        assert_eq!(
            fields,
            vec![
                ("Name", "dash".to_string()),
                ("Version", "2.19.1".to_string()),
                ("Dependencies", "emacs, cl-lib".to_string()),
            ]
        );
    }
}
