//! # Backend Registry
//!
//! Maps backend names to factories and picks a backend for a project when
//! none is named explicitly. Registration order is significant: detection
//! returns the first match.

use crate::backends::LanguageBackend;
use crate::backends::elisp::ElispBackend;
use crate::backends::python::{PythonBackend, PythonVersion};
use crate::config::UpmConfig;
use crate::error::{Result, UpmError};
use crate::utils::scan;
use std::path::Path;

/// Factory function for creating backend instances
pub type BackendFactory = Box<dyn Fn(&UpmConfig) -> Box<dyn LanguageBackend> + Send + Sync>;

pub struct BackendRegistry {
    config: UpmConfig,
    factories: Vec<(String, BackendFactory)>,
}

impl BackendRegistry {
    /// Create an empty registry whose backends will be built from `config`
    pub fn new(config: UpmConfig) -> Self {
        Self {
            config,
            factories: Vec::new(),
        }
    }

    pub fn with_defaults(config: UpmConfig) -> Self {
        let mut registry = Self::new(config);
        registry.register_defaults();
        registry
    }

    /// Register a backend factory. A second registration under the same
    /// name replaces the first but keeps its position.
    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&UpmConfig) -> Box<dyn LanguageBackend> + Send + Sync + 'static,
    {
        if let Some(slot) = self.factories.iter_mut().find(|(n, _)| n == name) {
            slot.1 = Box::new(factory);
        } else {
            self.factories.push((name.to_string(), Box::new(factory)));
        }
    }

    pub fn register_defaults(&mut self) {
        self.register(crate::backends::elisp::NAME, |config| {
            Box::new(ElispBackend::new(config))
        });

        for version in [PythonVersion::Python3, PythonVersion::Python2] {
            self.register(&version.backend_name(), move |config| {
                Box::new(PythonBackend::new(version, config))
            });
        }
    }

    pub fn names(&self) -> Vec<&str> {
        self.factories.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn has_backend(&self, name: &str) -> bool {
        self.factories.iter().any(|(n, _)| n == name)
    }

    pub fn create(&self, name: &str) -> Result<Box<dyn LanguageBackend>> {
        self.factories
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, factory)| factory(&self.config))
            .ok_or_else(|| UpmError::UnknownBackend(name.to_string()))
    }

    /// Every registered backend, in registration order
    pub fn all(&self) -> Vec<Box<dyn LanguageBackend>> {
        self.factories
            .iter()
            .map(|(_, factory)| factory(&self.config))
            .collect()
    }

    /// Pick the backend for `project_dir`: the first whose specfile exists,
    /// else the first with a matching source file.
    pub fn detect(&self, project_dir: &Path) -> Result<Option<Box<dyn LanguageBackend>>> {
        let backends = self.all();

        if let Some(idx) = backends
            .iter()
            .position(|b| project_dir.join(b.specfile()).is_file())
        {
            return Ok(backends.into_iter().nth(idx));
        }

        for backend in backends {
            let files = scan::matching_files(
                project_dir,
                backend.filename_patterns(),
                &self.config.ignored_paths,
            )?;
            if !files.is_empty() {
                return Ok(Some(backend));
            }
        }

        Ok(None)
    }
}

/// Create a backend by name from the default registry
pub fn create_backend(name: &str, config: &UpmConfig) -> Result<Box<dyn LanguageBackend>> {
    BackendRegistry::with_defaults(config.clone()).create(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn registry_in(dir: &Path) -> BackendRegistry {
        BackendRegistry::with_defaults(UpmConfig {
            project_dir: dir.to_path_buf(),
            ..Default::default()
        })
    }

    #[test]
    fn test_default_registration_order() {
        let registry = BackendRegistry::with_defaults(UpmConfig::default());
        assert_eq!(
            registry.names(),
            vec!["elisp-cask", "python-python3-poetry", "python-python2-poetry"]
        );
    }

    #[test]
    fn test_create_every_registered_backend() {
        let registry = BackendRegistry::with_defaults(UpmConfig::default());

        for name in registry.names() {
            let backend = registry.create(name).unwrap();
            assert_eq!(backend.name(), name);
        }
    }

    #[test]
    fn test_create_unknown_backend() {
        let result = create_backend("ruby-bundler", &UpmConfig::default());
        assert!(matches!(result, Err(UpmError::UnknownBackend(ref name)) if name == "ruby-bundler"));
    }

    #[test]
    fn test_register_replaces_in_place() {
        let mut registry = BackendRegistry::with_defaults(UpmConfig::default());
        registry.register("elisp-cask", |config| Box::new(ElispBackend::new(config)));

        assert_eq!(registry.names().len(), 3);
        assert_eq!(registry.names()[0], "elisp-cask");
        assert!(registry.has_backend("python-python2-poetry"));
    }

    #[test]
    fn test_detect_by_specfile() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("pyproject.toml"), "").unwrap();
        fs::write(dir.path().join("init.el"), "").unwrap();

        let backend = registry_in(dir.path()).detect(dir.path()).unwrap().unwrap();
        assert_eq!(backend.name(), "python-python3-poetry");
    }

    #[test]
    fn test_detect_by_source_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("lisp")).unwrap();
        fs::write(dir.path().join("lisp").join("mode.el"), "(provide 'mode)").unwrap();

        let backend = registry_in(dir.path()).detect(dir.path()).unwrap().unwrap();
        assert_eq!(backend.name(), "elisp-cask");
    }

    #[test]
    fn test_detect_nothing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("README.md"), "# hi").unwrap();

        assert!(registry_in(dir.path()).detect(dir.path()).unwrap().is_none());
    }
}
