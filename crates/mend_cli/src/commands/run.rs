use anyhow::Result;
use colored::Colorize;

use mend_engine::{Engine, Settings};
use mend_errors::ErrorKind;
use mend_runtime::{OllamaBackend, SubprocessExecutor};

use crate::args::RunCommand;
use crate::commands::read_source;
use crate::ExitStatus;

/// Execute a program once and print its streams and classification.
pub(crate) fn run(command: &RunCommand) -> Result<ExitStatus> {
    let source = read_source(&command.file)?;
    let settings = Settings::default();
    let executor = SubprocessExecutor::default();
    // The model is never consulted for a single-shot run, but the engine
    // owns both collaborators.
    let model = OllamaBackend::new(settings.model_name.clone(), settings.sandbox_timeout);
    let engine = Engine::new(&executor, &model, settings);

    let outcome = engine.run_once(&source, command.language.into())?;

    if !outcome.stdout.is_empty() {
        print!("{}", outcome.stdout);
    }
    if !outcome.stderr.is_empty() {
        eprint!("{}", outcome.stderr);
    }

    if outcome.error_kind == ErrorKind::None {
        println!("{}", "execution succeeded".green());
        Ok(ExitStatus::Success)
    } else {
        println!("{} {}", "detected error:".red().bold(), outcome.error_kind);
        Ok(ExitStatus::Failure)
    }
}
