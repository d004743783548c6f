//! # Process Module
//!
//! Runs external commands (`git`, `ccusage`, `security`, `secret-tool`) with a
//! hard timeout. The child is killed once the timeout elapses so a hung tool
//! can never hold up the status line.

use std::io::{self, Read};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(5);

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} timed out after {after:?}")]
    Timeout { program: String, after: Duration },

    #[error("{program} exited with code {code}: {stderr}")]
    Failed {
        program: String,
        code: i32,
        stderr: String,
    },

    #[error("i/o error while waiting for {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: io::Error,
    },
}

/// Captured result of a finished command.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub duration: Duration,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Run `program args…` in `cwd`, killing it after `timeout`.
///
/// A non-zero exit is not an error here; callers that only care about
/// successful output use [`run_checked`].
pub fn run(
    program: &str,
    args: &[&str],
    cwd: Option<&Path>,
    timeout: Duration,
) -> Result<ProcessOutput, ProcessError> {
    debug!(program, ?args, ?timeout, "running command");
    let start = Instant::now();

    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    let mut child = command.spawn().map_err(|source| ProcessError::Spawn {
        program: program.to_string(),
        source,
    })?;

    // Drain both pipes on their own threads so a chatty child never blocks on a full pipe.
    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let exit_code = match wait_with_deadline(&mut child, start + timeout) {
        Ok(Some(code)) => code,
        Ok(None) => {
            let _ = child.kill();
            let _ = child.wait();
            warn!(program, ?timeout, "command timed out");
            return Err(ProcessError::Timeout {
                program: program.to_string(),
                after: timeout,
            });
        }
        Err(source) => {
            let _ = child.kill();
            return Err(ProcessError::Io {
                program: program.to_string(),
                source,
            });
        }
    };

    let output = ProcessOutput {
        stdout: collect(stdout),
        stderr: collect(stderr),
        exit_code,
        duration: start.elapsed(),
    };
    debug!(
        program,
        exit_code,
        duration = ?output.duration,
        stdout_len = output.stdout.len(),
        "command completed"
    );
    Ok(output)
}

/// Like [`run`], but a non-zero exit becomes [`ProcessError::Failed`] and
/// only stdout is returned.
pub fn run_checked(
    program: &str,
    args: &[&str],
    cwd: Option<&Path>,
    timeout: Duration,
) -> Result<String, ProcessError> {
    let output = run(program, args, cwd, timeout)?;
    if output.success() {
        Ok(output.stdout)
    } else {
        Err(ProcessError::Failed {
            program: program.to_string(),
            code: output.exit_code,
            stderr: output.stderr.trim().to_string(),
        })
    }
}

/// Poll the child until it exits or the deadline passes. `Ok(None)` means timeout.
fn wait_with_deadline(child: &mut Child, deadline: Instant) -> io::Result<Option<i32>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status.code().unwrap_or(-1)));
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL.min(deadline - now));
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn captures_stdout_and_exit_code() {
        let out = run("sh", &["-c", "echo hello; exit 3"], None, Duration::from_secs(5)).unwrap();
        assert_eq!(out.stdout.trim(), "hello");
        assert_eq!(out.exit_code, 3);
        assert!(!out.success());
    }

    #[test]
    fn run_checked_reports_failure() {
        let err = run_checked("sh", &["-c", "echo boom >&2; exit 1"], None, Duration::from_secs(5))
            .unwrap_err();
        match err {
            ProcessError::Failed { code, stderr, .. } => {
                assert_eq!(code, 1);
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn kills_child_after_timeout() {
        let start = Instant::now();
        let err = run("sh", &["-c", "sleep 5"], None, Duration::from_millis(100)).unwrap_err();
        assert!(matches!(err, ProcessError::Timeout { .. }));
        assert!(start.elapsed() < Duration::from_secs(3));
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let err = run("ccstatus-definitely-missing", &[], None, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, ProcessError::Spawn { .. }));
    }

    #[test]
    fn honours_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = run("pwd", &[], Some(dir.path()), Duration::from_secs(5)).unwrap();
        let reported = std::fs::canonicalize(out.stdout.trim()).unwrap();
        assert_eq!(reported, std::fs::canonicalize(dir.path()).unwrap());
    }
}
