//! Decide whether an execution counts as a successful repair.

use mend_errors::ErrorKind;

/// Warning fragments that do not block success.
const HARMLESS: &[&str] = &["warning", "deprecated"];

/// Strip sandbox logger noise, e.g.
/// `[2025-11-27 13:34:39] [INFO] Executing sandboxed code...`.
pub fn clean_stderr(stderr: &str) -> String {
    stderr
        .lines()
        .filter(|line| {
            let stripped = line.trim();
            !(stripped.starts_with("[20") && stripped.contains("] [INFO]"))
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Success requires a clean error kind and a stderr that is empty once
/// log noise is removed, or contains only harmless warnings.
pub fn is_success(stderr: &str, error_kind: ErrorKind) -> bool {
    if error_kind != ErrorKind::None {
        return false;
    }
    let cleaned = clean_stderr(stderr);
    if cleaned.is_empty() {
        return true;
    }
    let lowered = cleaned.to_lowercase();
    HARMLESS.iter().any(|fragment| lowered.contains(fragment))
}
