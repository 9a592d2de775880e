//! External tool invocation
//!
//! Every backend operation that shells out goes through [`ToolInvoker`]:
//! commands run in the project directory, block until exit, and any spawn
//! failure, nonzero exit, or timeout becomes [`UpmError::ExternalTool`].

use crate::error::{Result, UpmError};
use crate::ui;
use crate::utils::sanitize::display_command;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const STDERR_EXCERPT_LINES: usize = 5;

#[derive(Debug, Clone)]
pub struct ToolInvoker {
    cwd: PathBuf,
    timeout: Option<Duration>,
}

impl ToolInvoker {
    pub fn new(cwd: impl Into<PathBuf>, timeout: Option<Duration>) -> Self {
        Self {
            cwd: cwd.into(),
            timeout,
        }
    }

    /// Run a command and return its stdout. Stderr is captured and quoted in
    /// the error on failure.
    pub fn output(&self, argv: &[String]) -> Result<Vec<u8>> {
        let shown = display_command(argv);
        ui::progress(&shown);

        let mut cmd = self.command(argv, &shown)?;
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|e| spawn_error(&shown, argv, e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| UpmError::ExternalTool {
                command: shown.clone(),
                reason: "Failed to capture stdout".to_string(),
            })?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| UpmError::ExternalTool {
                command: shown.clone(),
                reason: "Failed to capture stderr".to_string(),
            })?;

        let stdout_thread = thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = std::io::BufReader::new(stdout).read_to_end(&mut buf);
            buf
        });
        let stderr_thread = thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = std::io::BufReader::new(stderr).read_to_end(&mut buf);
            buf
        });

        // On timeout the readers are left detached; a grandchild outside the
        // killed group may still hold the pipes open.
        let status = self.wait(&mut child, &shown)?;
        let stdout = stdout_thread.join().unwrap_or_default();
        let stderr = stderr_thread.join().unwrap_or_default();

        if !status.success() {
            return Err(UpmError::ExternalTool {
                command: shown,
                reason: failure_reason(status, &stderr),
            });
        }

        Ok(stdout)
    }

    /// Run a command with inherited stdio so the user sees the tool's own output.
    pub fn run(&self, argv: &[String]) -> Result<()> {
        let shown = display_command(argv);
        ui::progress(&shown);

        let mut cmd = self.command(argv, &shown)?;
        cmd.stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let mut child = cmd.spawn().map_err(|e| spawn_error(&shown, argv, e))?;
        let status = self.wait(&mut child, &shown)?;

        if !status.success() {
            return Err(UpmError::ExternalTool {
                command: shown,
                reason: failure_reason(status, &[]),
            });
        }

        Ok(())
    }

    fn command(&self, argv: &[String], shown: &str) -> Result<Command> {
        let (program, args) = argv.split_first().ok_or_else(|| UpmError::ExternalTool {
            command: shown.to_string(),
            reason: "Empty command line".to_string(),
        })?;

        let mut cmd = Command::new(program);
        cmd.args(args).current_dir(&self.cwd);

        // A timed-out command is killed along with everything it spawned.
        #[cfg(unix)]
        if self.timeout.is_some() {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        Ok(cmd)
    }

    fn wait(&self, child: &mut Child, shown: &str) -> Result<ExitStatus> {
        let Some(timeout) = self.timeout else {
            return child.wait().map_err(|e| UpmError::ExternalTool {
                command: shown.to_string(),
                reason: e.to_string(),
            });
        };

        let start = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) => {
                    if start.elapsed() > timeout {
                        kill_process_group(child);
                        let _ = child.wait();
                        return Err(UpmError::ExternalTool {
                            command: shown.to_string(),
                            reason: format!(
                                "Command timed out after {} seconds",
                                timeout.as_secs()
                            ),
                        });
                    }
                    thread::sleep(Duration::from_millis(50));
                }
                Err(e) => {
                    return Err(UpmError::ExternalTool {
                        command: shown.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }
    }
}

#[cfg(unix)]
fn kill_process_group(child: &mut Child) {
    let group = format!("-{}", child.id());
    let _ = Command::new("kill")
        .args(["-KILL", "--", &group])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    let _ = child.kill();
}

#[cfg(not(unix))]
fn kill_process_group(child: &mut Child) {
    let _ = child.kill();
}

fn spawn_error(shown: &str, argv: &[String], e: std::io::Error) -> UpmError {
    let reason = if e.kind() == std::io::ErrorKind::NotFound {
        format!("'{}' not found", argv.first().map(String::as_str).unwrap_or(""))
    } else {
        e.to_string()
    };
    UpmError::ExternalTool {
        command: shown.to_string(),
        reason,
    }
}

fn failure_reason(status: ExitStatus, stderr: &[u8]) -> String {
    let stderr = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = stderr.trim().lines().collect();
    let excerpt = lines[lines.len().saturating_sub(STDERR_EXCERPT_LINES)..].join("\n");

    let status = match status.code() {
        Some(code) => format!("exited with status {}", code),
        None => "terminated by signal".to_string(),
    };

    if excerpt.is_empty() {
        status
    } else {
        format!("{}: {}", status, excerpt)
    }
}

/// Whether an executable can be resolved (bare name on PATH, or a path)
pub fn is_executable_available(program: &str) -> bool {
    which::which(program).is_ok()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Vec<String> {
        vec!["sh".to_string(), "-c".to_string(), script.to_string()]
    }

    #[test]
    fn test_output_captures_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let invoker = ToolInvoker::new(dir.path(), None);

        let out = invoker.output(&sh("printf 'a=1\\nb=2\\n'")).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "a=1\nb=2\n");
    }

    #[test]
    fn test_output_runs_in_project_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "here").unwrap();
        let invoker = ToolInvoker::new(dir.path(), None);

        let out = invoker.output(&sh("cat marker.txt")).unwrap();
        assert_eq!(out, b"here");
    }

    #[test]
    fn test_nonzero_exit_is_external_tool_error_with_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let invoker = ToolInvoker::new(dir.path(), None);

        let err = invoker
            .output(&sh("echo 'resolver exploded' >&2; exit 3"))
            .unwrap_err();
        match err {
            UpmError::ExternalTool { reason, .. } => {
                assert!(reason.contains("status 3"), "{}", reason);
                assert!(reason.contains("resolver exploded"), "{}", reason);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_missing_program_is_external_tool_error() {
        let dir = tempfile::tempdir().unwrap();
        let invoker = ToolInvoker::new(dir.path(), None);

        let err = invoker
            .run(&["upm-definitely-not-a-real-tool".to_string()])
            .unwrap_err();
        match err {
            UpmError::ExternalTool { reason, .. } => assert!(reason.contains("not found")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_timeout_kills_child() {
        let dir = tempfile::tempdir().unwrap();
        let invoker = ToolInvoker::new(dir.path(), Some(Duration::from_millis(200)));

        let err = invoker.output(&sh("exec sleep 5")).unwrap_err();
        match err {
            UpmError::ExternalTool { reason, .. } => assert!(reason.contains("timed out")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_timeout_does_not_wait_for_spawned_children() {
        let dir = tempfile::tempdir().unwrap();
        let invoker = ToolInvoker::new(dir.path(), Some(Duration::from_millis(200)));

        let start = Instant::now();
        let err = invoker.output(&sh("sleep 4; echo done")).unwrap_err();

        assert!(start.elapsed() < Duration::from_secs(2), "{:?}", start.elapsed());
        match err {
            UpmError::ExternalTool { reason, .. } => assert!(reason.contains("timed out")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_empty_argv_rejected() {
        let invoker = ToolInvoker::new(".", None);
        assert!(invoker.output(&[]).is_err());
    }
}
