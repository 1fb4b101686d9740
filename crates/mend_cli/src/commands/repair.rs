use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Result};
use colored::Colorize;
use log::info;

use mend_engine::{Engine, FinalStatus, Options, RepairOptions, Settings};
use mend_runtime::{CommandBackend, OllamaBackend, SubprocessExecutor, TextCompletion};

use crate::args::RepairCommand;
use crate::commands::read_source;
use crate::ExitStatus;

/// Decoding can dominate an iteration; give the model more room than a
/// sandboxed execution gets.
const MODEL_TIMEOUT: Duration = Duration::from_secs(120);

/// A seeded buggy snippet for `--demo`: memoized fibonacci returning the
/// wrong key.
const DEMO_SOURCE: &str = "\
def fib(n, memo={}):
    if n <= 1:
        return n
    if n in memo:
        return memo[0]
    memo[n] = fib(n - 1, memo) + fib(n - 2, memo)
    return memo[n]

print(fib(10))
";

const DEMO_PROMPT: &str = "Fix all errors and make the program run correctly.";

/// Run the full repair loop over a file (or the demo snippet) and print
/// the final source plus the report location.
pub(crate) fn repair(command: &RepairCommand) -> Result<ExitStatus> {
    let (source, prompt) = if command.demo {
        (DEMO_SOURCE.to_string(), DEMO_PROMPT.to_string())
    } else {
        let Some(file) = &command.file else {
            bail!("provide a file to repair, or use --demo");
        };
        (read_source(file)?, command.prompt.clone())
    };
    if source.trim().is_empty() {
        bail!("nothing to repair: the input is empty");
    }

    let settings = load_settings(command.config.as_deref())?;
    let executor = SubprocessExecutor::default();
    let model = build_model(&settings);
    let engine = Engine::new(&executor, model.as_ref(), settings);

    let options = RepairOptions {
        max_iterations: command.max_iterations,
        strip_markers: command.strip_markers,
        report_dir: Some(command.report_dir.clone()),
    };

    info!("starting repair loop");
    let outcome = engine.repair(&source, &prompt, &options)?;

    println!("{}", "==== final source ====".bold());
    print!("{}", outcome.final_source);
    println!("{}", "======================".bold());
    if let Some(path) = &outcome.report_path {
        println!("report saved to {}", path.display());
    }

    match outcome.status {
        FinalStatus::Success => {
            println!("{}", "repair succeeded".green().bold());
            Ok(ExitStatus::Success)
        }
        FinalStatus::Failed => {
            println!("{}", "repair did not converge".yellow().bold());
            Ok(ExitStatus::Failure)
        }
    }
}

fn load_settings(config: Option<&Path>) -> Result<Settings> {
    let options = match config {
        Some(path) => Options::load(path)?,
        None => {
            let default_path = Path::new("mend.toml");
            if default_path.is_file() {
                Options::load(default_path)?
            } else {
                Options::default()
            }
        }
    };
    Ok(options.into_settings())
}

fn build_model(settings: &Settings) -> Box<dyn TextCompletion> {
    match settings.model_backend.as_str() {
        "ollama" => Box::new(OllamaBackend::new(settings.model_name.clone(), MODEL_TIMEOUT)),
        // Any other backend value is treated as an executable that reads
        // the prompt on stdin.
        program => Box::new(CommandBackend::new(
            program.to_string(),
            vec![settings.model_name.clone()],
            MODEL_TIMEOUT,
        )),
    }
}
