use crate::backends::LanguageBackend;
use crate::core::types::Quirks;
use crate::error::Result;
use crate::ui as output;

pub fn lock(backend: &dyn LanguageBackend) -> Result<()> {
    backend.lock()?;
    output::success(&format!("Updated {}", backend.lockfile()));
    Ok(())
}

pub fn install(backend: &dyn LanguageBackend) -> Result<()> {
    backend.install()?;
    output::success("Installed packages");
    Ok(())
}

/// Bring the lockfile and environment up to date after the specfile changed.
/// Skipped when the package manager already did so.
pub(crate) fn after_edit(backend: &dyn LanguageBackend, no_install: bool) -> Result<()> {
    if no_install || backend.quirks().contains(Quirks::ADD_REMOVE_ALSO_INSTALLS) {
        return Ok(());
    }

    if backend.supports_lock() {
        backend.lock()?;
    }
    backend.install()
}
