//! The language-model collaborator.

use std::io::Write;
use std::process::{Command, Stdio};
use std::time::Duration;

use log::{debug, warn};

use crate::process::wait_with_deadline;
use crate::RuntimeError;

/// Rough ceiling on characters per decoded token; used to bound how much of
/// a completion the engine will ever look at.
const CHARS_PER_TOKEN: usize = 8;

/// A blocking completion call. Deterministic decoding is expected from
/// implementations but not required for correctness.
pub trait TextCompletion {
    fn complete(&self, prompt: &str, max_tokens: usize) -> Result<String, RuntimeError>;
}

/// Shells out to `ollama run <model>`, feeding the prompt on stdin.
pub struct OllamaBackend {
    inner: CommandBackend,
}

impl OllamaBackend {
    pub fn new(model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            inner: CommandBackend::new("ollama", vec!["run".to_string(), model.into()], timeout),
        }
    }
}

impl TextCompletion for OllamaBackend {
    fn complete(&self, prompt: &str, max_tokens: usize) -> Result<String, RuntimeError> {
        self.inner.complete(prompt, max_tokens)
    }
}

/// Generic subprocess backend: any executable that reads a prompt on stdin
/// and writes the completion to stdout.
pub struct CommandBackend {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandBackend {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }
}

impl TextCompletion for CommandBackend {
    fn complete(&self, prompt: &str, max_tokens: usize) -> Result<String, RuntimeError> {
        debug!(
            "requesting completion from `{}` ({} prompt chars)",
            self.program,
            prompt.len()
        );
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| RuntimeError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(prompt.as_bytes())?;
            // Dropping stdin closes the pipe so the model starts decoding.
        }

        let Some(collected) = wait_with_deadline(child, self.timeout)? else {
            return Err(RuntimeError::ModelTimeout);
        };
        if !collected.stderr.is_empty() {
            warn!("model backend stderr: {}", collected.stderr.trim_end());
        }

        let mut text = collected.stdout;
        if text.trim().is_empty() {
            return Err(RuntimeError::EmptyCompletion);
        }
        let cap = max_tokens.saturating_mul(CHARS_PER_TOKEN);
        if cap > 0 && text.len() > cap {
            let mut cut = cap;
            while !text.is_char_boundary(cut) {
                cut -= 1;
            }
            text.truncate(cut);
        }
        Ok(text)
    }
}
