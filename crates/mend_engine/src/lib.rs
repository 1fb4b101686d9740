pub mod controller;
pub mod diff;
pub mod intent;
pub mod prompt;
pub mod report;
pub mod settings;
pub mod validate;

pub use controller::{Engine, RepairOptions, RepairOutcome, RunOutcome};
pub use report::{ChangeEntry, ChangeType, FinalStatus, IterationRecord, Report};
pub use settings::{Options, Settings};

/// Normalize line terminators and guarantee a trailing newline. Every
/// source the controller touches goes through this, which keeps the line
/// diffs exact.
pub fn normalize_source(source: &str) -> String {
    let mut normalized = source.replace("\r\n", "\n");
    if !normalized.ends_with('\n') {
        normalized.push('\n');
    }
    normalized
}
