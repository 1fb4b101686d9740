//! Engine configuration: a small closed set of keys, read from a
//! `mend.toml` file and resolved into [`Settings`] with defaults.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// What the user may write in `mend.toml`. Every field is optional;
/// unknown keys are rejected.
#[derive(Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct Options {
    /// Cap on repair-loop iterations.
    pub max_iterations: Option<usize>,
    /// Wall-clock budget for one sandboxed execution, in seconds.
    pub sandbox_timeout: Option<u64>,
    /// Which completion backend to use (`ollama`, or an executable name).
    pub model_backend: Option<String>,
    /// Model identifier passed to the backend.
    pub model_name: Option<String>,
    /// Decoding budget per completion.
    pub model_max_tokens: Option<usize>,
    /// Verbose engine logging.
    pub debug: Option<bool>,
}

impl Options {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("invalid configuration")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn into_settings(self) -> Settings {
        let defaults = Settings::default();
        Settings {
            max_iterations: self.max_iterations.unwrap_or(defaults.max_iterations),
            sandbox_timeout: self
                .sandbox_timeout
                .map_or(defaults.sandbox_timeout, Duration::from_secs),
            model_backend: self.model_backend.unwrap_or(defaults.model_backend),
            model_name: self.model_name.unwrap_or(defaults.model_name),
            model_max_tokens: self.model_max_tokens.unwrap_or(defaults.model_max_tokens),
            debug: self.debug.unwrap_or(defaults.debug),
        }
    }
}

/// Resolved engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub max_iterations: usize,
    pub sandbox_timeout: Duration,
    pub model_backend: String,
    pub model_name: String,
    pub model_max_tokens: usize,
    pub debug: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            sandbox_timeout: Duration::from_secs(6),
            model_backend: "ollama".to_string(),
            model_name: "qwen2.5-coder-7b-instruct-q4_k_m".to_string(),
            model_max_tokens: 400,
            debug: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{Options, Settings};

    #[test]
    fn empty_options_give_defaults() {
        let settings = Options::default().into_settings();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.max_iterations, 5);
        assert_eq!(settings.sandbox_timeout, Duration::from_secs(6));
    }

    #[test]
    fn toml_keys_are_kebab_case() {
        let options = Options::from_toml_str(
            "max-iterations = 8\nsandbox-timeout = 2\nmodel-name = \"test-model\"\n",
        )
        .unwrap();
        let settings = options.into_settings();
        assert_eq!(settings.max_iterations, 8);
        assert_eq!(settings.sandbox_timeout, Duration::from_secs(2));
        assert_eq!(settings.model_name, "test-model");
        // Unset keys keep their defaults.
        assert_eq!(settings.model_max_tokens, 400);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Options::from_toml_str("max-iterations = 3\nmystery = 1\n").is_err());
    }
}
