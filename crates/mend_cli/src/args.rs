use std::path::PathBuf;

use clap::{command, Parser, Subcommand};

use mend_errors::Language;

#[derive(Debug, Parser)]
#[command(
    author,
    name = "mend",
    about = "Mend, an iterative repair engine for broken Python programs."
)]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
    #[clap(flatten)]
    pub log_level_args: LogLevelArgs,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Execute a program once in the sandbox and classify its diagnostic.
    Run(RunCommand),
    /// Run the full repair loop over a program.
    Repair(RepairCommand),
}

#[derive(Debug, clap::Args)]
pub struct RunCommand {
    /// File to execute; `-` reads from stdin.
    pub file: PathBuf,
    /// Language to execute the file as.
    #[arg(long, value_enum, default_value = "python")]
    pub language: LanguageArg,
}

#[derive(Debug, clap::Args)]
pub struct RepairCommand {
    /// File to repair; `-` reads from stdin. Omitted in `--demo` mode.
    pub file: Option<PathBuf>,
    /// What the program should do, in natural language.
    #[arg(short, long, default_value = "")]
    pub prompt: String,
    /// Cap on repair iterations (overrides configuration).
    #[arg(long)]
    pub max_iterations: Option<usize>,
    /// Path to a `mend.toml` configuration file.
    #[arg(long, env = "MEND_CONFIG")]
    pub config: Option<PathBuf>,
    /// Directory for the iteration report.
    #[arg(long, default_value = "reports")]
    pub report_dir: PathBuf,
    /// Remove no-progress markers from the final source on success.
    #[arg(long)]
    pub strip_markers: bool,
    /// Repair a seeded buggy snippet instead of a file.
    #[arg(long, conflicts_with = "file")]
    pub demo: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LanguageArg {
    Python,
    Javascript,
    Java,
}

impl From<LanguageArg> for Language {
    fn from(value: LanguageArg) -> Self {
        match value {
            LanguageArg::Python => Language::Python,
            LanguageArg::Javascript => Language::JavaScript,
            LanguageArg::Java => Language::Java,
        }
    }
}

#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, clap::Args)]
pub struct LogLevelArgs {
    /// Enable verbose logging.
    #[arg(short, long, global = true, group = "verbosity")]
    pub verbose: bool,
    /// Print results, but nothing else.
    #[arg(short, long, global = true, group = "verbosity")]
    pub quiet: bool,
    /// Disable all logging.
    #[arg(short, long, global = true, group = "verbosity")]
    pub silent: bool,
}
