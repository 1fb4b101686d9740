//! The sandboxed execution collaborator.

use std::io::Write;
use std::process::{Command, Stdio};
use std::time::Duration;

use log::debug;
use tempfile::{Builder, TempDir};

use mend_errors::Language;

use crate::process::wait_with_deadline;
use crate::RuntimeError;

/// Timeout expiry is reported in-band, on stderr, so the controller can
/// classify it like any other diagnostic.
pub const TIMEOUT_SENTINEL: &str = "TIMEOUT";

/// Captured streams of one sandboxed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutput {
    pub stdout: String,
    pub stderr: String,
}

impl RunOutput {
    pub fn timed_out(&self) -> bool {
        self.stderr == TIMEOUT_SENTINEL
    }
}

/// Black-box execution of untrusted source. The repair pipeline only ever
/// sees `(stdout, stderr)`; implementations decide how the code actually
/// runs.
pub trait Executor {
    fn run(
        &self,
        source: &str,
        language: Language,
        timeout: Duration,
    ) -> Result<RunOutput, RuntimeError>;
}

/// Runs code under the local interpreters in a throwaway temp file. The
/// file is removed on every exit path, including timeouts.
pub struct SubprocessExecutor {
    python: String,
}

impl Default for SubprocessExecutor {
    fn default() -> Self {
        Self {
            python: std::env::var("PYTHON_EXECUTABLE").unwrap_or_else(|_| "python3".to_string()),
        }
    }
}

impl SubprocessExecutor {
    pub fn new(python: impl Into<String>) -> Self {
        Self {
            python: python.into(),
        }
    }

    fn run_python(&self, source: &str, timeout: Duration) -> Result<RunOutput, RuntimeError> {
        let mut file = Builder::new().suffix(".py").tempfile()?;
        file.write_all(source.as_bytes())?;
        file.flush()?;
        self.run_interpreter(&self.python, file.path(), timeout)
    }

    fn run_javascript(&self, source: &str, timeout: Duration) -> Result<RunOutput, RuntimeError> {
        let mut file = Builder::new().suffix(".js").tempfile()?;
        file.write_all(source.as_bytes())?;
        file.flush()?;
        self.run_interpreter("node", file.path(), timeout)
    }

    fn run_java(&self, source: &str, timeout: Duration) -> Result<RunOutput, RuntimeError> {
        let dir = TempDir::new()?;
        let source_path = dir.path().join("Main.java");
        std::fs::write(&source_path, source)?;

        let child = Command::new("javac")
            .arg(&source_path)
            .current_dir(dir.path())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| RuntimeError::Spawn {
                program: "javac".to_string(),
                source,
            })?;
        let Some(compiled) = wait_with_deadline(child, timeout)? else {
            return Ok(timeout_output());
        };
        if !compiled.stderr.is_empty() {
            return Ok(RunOutput {
                stdout: String::new(),
                stderr: compiled.stderr,
            });
        }

        let child = Command::new("java")
            .arg("-cp")
            .arg(dir.path())
            .arg("Main")
            .current_dir(dir.path())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| RuntimeError::Spawn {
                program: "java".to_string(),
                source,
            })?;
        match wait_with_deadline(child, timeout)? {
            Some(collected) => Ok(RunOutput {
                stdout: collected.stdout,
                stderr: collected.stderr,
            }),
            None => Ok(timeout_output()),
        }
    }

    fn run_interpreter(
        &self,
        program: &str,
        path: &std::path::Path,
        timeout: Duration,
    ) -> Result<RunOutput, RuntimeError> {
        debug!("executing {} via {program}", path.display());
        let child = Command::new(program)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| RuntimeError::Spawn {
                program: program.to_string(),
                source,
            })?;
        match wait_with_deadline(child, timeout)? {
            Some(collected) => {
                debug!("{program} exited with {}", collected.status);
                Ok(RunOutput {
                    stdout: collected.stdout,
                    stderr: collected.stderr,
                })
            }
            None => Ok(timeout_output()),
        }
    }
}

fn timeout_output() -> RunOutput {
    RunOutput {
        stdout: String::new(),
        stderr: TIMEOUT_SENTINEL.to_string(),
    }
}

impl Executor for SubprocessExecutor {
    fn run(
        &self,
        source: &str,
        language: Language,
        timeout: Duration,
    ) -> Result<RunOutput, RuntimeError> {
        match language {
            Language::Python => self.run_python(source, timeout),
            Language::JavaScript => self.run_javascript(source, timeout),
            Language::Java => self.run_java(source, timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use mend_errors::Language;

    use super::{Executor, SubprocessExecutor, TIMEOUT_SENTINEL};

    // These exercise the real interpreter and are the only tests in the
    // workspace that do; everything downstream uses fake executors.

    #[test]
    fn captures_stdout() {
        let executor = SubprocessExecutor::default();
        let output = executor
            .run("print(2 + 2)", Language::Python, Duration::from_secs(5))
            .unwrap();
        assert_eq!(output.stdout.trim(), "4");
        assert_eq!(output.stderr, "");
    }

    #[test]
    fn captures_stderr() {
        let executor = SubprocessExecutor::default();
        let output = executor
            .run("1 / 0", Language::Python, Duration::from_secs(5))
            .unwrap();
        assert!(output.stderr.contains("ZeroDivisionError"));
    }

    #[test]
    fn reports_timeout_in_band() {
        let executor = SubprocessExecutor::default();
        let output = executor
            .run(
                "while True:\n    pass\n",
                Language::Python,
                Duration::from_millis(300),
            )
            .unwrap();
        assert_eq!(output.stderr, TIMEOUT_SENTINEL);
        assert!(output.timed_out());
    }
}
