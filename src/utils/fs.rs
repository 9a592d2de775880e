use crate::error::{Result, UpmError};
use crate::ui;
use std::io::Write;
use std::path::Path;

/// Replace `path` with `contents` atomically.
///
/// The data goes to a temp file in the same directory, is synced, then renamed
/// over the target. The temp file is removed on every error path, so readers
/// only ever see the old or the new content.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    ui::progress(&format!("write {}", display_name(path)));

    let mut tmp = tempfile::Builder::new()
        .prefix(".upm-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| UpmError::io(dir, e))?;

    tmp.write_all(contents).map_err(|e| UpmError::io(tmp.path(), e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| UpmError::io(tmp.path(), e))?;

    tmp.persist(path).map_err(|e| UpmError::io(path, e.error))?;

    Ok(())
}

/// Read a file that may legitimately be absent.
pub fn read_optional(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(UpmError::io(path, e)),
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_atomic_creates_and_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("packages.txt");

        write_atomic(&path, b"dash=2.19.1\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "dash=2.19.1\n");

        write_atomic(&path, b"s=1.13.0\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "s=1.13.0\n");
    }

    #[test]
    fn test_write_atomic_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Cask");

        write_atomic(&path, b"(source melpa)\n").unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["Cask".to_string()]);
    }

    #[test]
    fn test_write_atomic_into_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("Cask");

        assert!(matches!(
            write_atomic(&path, b"x"),
            Err(UpmError::Io { .. })
        ));
    }

    #[test]
    fn test_read_optional_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_optional(&dir.path().join("nope")).unwrap().is_none());
    }
}
