pub mod executor;
pub mod model;
mod process;

pub use executor::{Executor, RunOutput, SubprocessExecutor, TIMEOUT_SENTINEL};
pub use model::{CommandBackend, OllamaBackend, TextCompletion};

/// Failures raised by the runtime collaborators (executor and model). The
/// controller treats every variant as an unsuccessful iteration, never as a
/// reason to stop the loop.
#[derive(thiserror::Error, Debug)]
pub enum RuntimeError {
    #[error("failed to launch `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("i/o failure talking to subprocess: {0}")]
    Io(#[from] std::io::Error),
    #[error("model call exceeded its deadline")]
    ModelTimeout,
    #[error("model returned no output")]
    EmptyCompletion,
}
