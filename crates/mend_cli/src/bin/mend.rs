use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;

use mend_cli::args::Args;
use mend_cli::{run, ExitStatus};

pub fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Ok(status) => status.into(),
        Err(error) => {
            eprintln!("{} {error:#}", "error:".red().bold());
            ExitStatus::Error.into()
        }
    }
}
