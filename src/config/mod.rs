pub mod settings;

pub use settings::UpmConfig;

use crate::error::{Result, UpmError};
use directories::ProjectDirs;
use std::path::PathBuf;

/// Default location of `settings.kdl`
pub fn default_settings_file() -> Result<PathBuf> {
    let proj = ProjectDirs::from("com", "upm", "upm")
        .ok_or_else(|| UpmError::Config("Could not determine config directory".to_string()))?;
    Ok(proj.config_dir().join("settings.kdl"))
}
