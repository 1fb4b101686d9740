pub mod args;
pub mod commands;
pub mod logging;

use std::process::ExitCode;

use anyhow::Result;

use crate::args::{Args, Command};
use crate::logging::{set_up_logging, LogLevel};

#[derive(Copy, Clone)]
pub enum ExitStatus {
    /// The command ran and the program ended up (or already was) clean.
    Success,
    /// The command ran but the program still fails.
    Failure,
    /// The command itself failed.
    Error,
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        match status {
            ExitStatus::Success => ExitCode::from(0),
            ExitStatus::Failure => ExitCode::from(1),
            ExitStatus::Error => ExitCode::from(2),
        }
    }
}

pub fn run(args: Args) -> Result<ExitStatus> {
    let log_level = LogLevel::from(&args.log_level_args);
    set_up_logging(log_level)?;

    match args.command {
        Command::Run(command) => commands::run::run(&command),
        Command::Repair(command) => commands::repair::repair(&command),
    }
}
