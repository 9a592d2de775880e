//! Input sanitization utilities
//!
//! Package names end up inside generated specfile text and on external
//! command lines, so they are checked before either happens.

use crate::core::types::PkgName;
use crate::error::{Result, UpmError};
use regex::Regex;
use std::sync::LazyLock;

/// Characters that would break a quoted Lisp string or a TOML key
static UNSAFE_NAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[\s"'\\()`;]"#).expect("Invalid regex pattern"));

const MAX_DISPLAY_ARG: usize = 60;

/// Validate a package name before writing it to a specfile or passing it to a tool
pub fn validate_package_name(name: &PkgName) -> Result<()> {
    let name = name.as_str();

    if name.is_empty() {
        return Err(UpmError::Config("Package name cannot be empty".to_string()));
    }

    if name.starts_with('-') {
        return Err(UpmError::Config(format!(
            "Package name cannot start with '-': {}",
            name
        )));
    }

    if UNSAFE_NAME_CHARS.is_match(name) {
        return Err(UpmError::Config(format!(
            "Package name contains unsafe characters: {}",
            name
        )));
    }

    Ok(())
}

/// Validate a list of package names
pub fn validate_package_names<'a>(names: impl IntoIterator<Item = &'a PkgName>) -> Result<()> {
    for name in names {
        validate_package_name(name)?;
    }
    Ok(())
}

/// Whether a captured feature name can be embedded in a single-quoted SQL literal
pub fn is_sql_literal_safe(value: &str) -> bool {
    !value.is_empty() && !value.contains(['\\', '\''])
}

/// Render an argv for progress messages.
/// Long arguments (embedded helper scripts) are collapsed to their first line.
pub fn display_command(argv: &[String]) -> String {
    let shown: Vec<String> = argv
        .iter()
        .map(|arg| {
            let first_line = arg.trim().lines().next().unwrap_or_default();
            if arg.len() > MAX_DISPLAY_ARG || first_line.len() != arg.trim().len() {
                let cut: String = first_line.chars().take(MAX_DISPLAY_ARG).collect();
                format!("{}...", cut)
            } else {
                arg.clone()
            }
        })
        .collect();

    shlex::try_join(shown.iter().map(String::as_str)).unwrap_or_else(|_| shown.join(" "))
}
