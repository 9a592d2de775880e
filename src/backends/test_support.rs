//! Fake tool executables for backend tests.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Write an executable `sh` script named `name` into `dir`.
/// Every invocation appends its arguments (one per line, then `@@end`) to
/// `<name>.args` next to the script.
pub fn fake_tool(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    let log = dir.join(format!("{}.args", name));
    let script = format!(
        "#!/bin/sh\nfor arg in \"$@\"; do printf '%s\\n' \"$arg\" >> '{log}'; done\necho @@end >> '{log}'\n{body}\n",
        log = log.display(),
        body = body,
    );
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Arguments recorded by a fake tool, one entry per invocation.
pub fn recorded_calls(dir: &Path, name: &str) -> Vec<Vec<String>> {
    let Ok(log) = std::fs::read_to_string(dir.join(format!("{}.args", name))) else {
        return Vec::new();
    };

    let mut calls = Vec::new();
    let mut current = Vec::new();
    for line in log.lines() {
        if line == "@@end" {
            calls.push(std::mem::take(&mut current));
        } else {
            current.push(line.to_string());
        }
    }
    calls
}
