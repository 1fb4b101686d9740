//! The iteration report: per-iteration snapshots, a line-level change log,
//! and a single timestamped JSON file written at the end of a run.

use std::path::{Path, PathBuf};

use chrono::Local;
use log::info;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

use mend_errors::{ErrorKind, FixMethod};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinalStatus {
    Success,
    Failed,
}

/// Snapshot of one repair iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationRecord {
    #[serde(rename = "iteration")]
    pub index: usize,
    pub timestamp: String,
    #[serde(rename = "fix_method")]
    pub method: FixMethod,
    #[serde(rename = "error_type")]
    pub error_kind: ErrorKind,
    pub success: bool,
    pub execution_time: Option<f64>,
    pub stdout: String,
    pub stderr: String,
    pub code_snapshot: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Added,
    Removed,
}

/// One line-level edit attributed to an iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEntry {
    pub iteration: usize,
    pub method: FixMethod,
    pub error_kind: ErrorKind,
    pub change_type: ChangeType,
    pub line_old: Option<usize>,
    pub line_new: Option<usize>,
    pub old_text: String,
    pub new_text: String,
    pub reason: String,
}

/// The full run report, serialized once per repair invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub final_status: FinalStatus,
    pub total_iterations: usize,
    pub iterations: Vec<IterationRecord>,
    pub changes: Vec<ChangeEntry>,
}

#[derive(thiserror::Error, Debug)]
pub enum ReportError {
    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write report to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Report {
    pub fn new(
        final_status: FinalStatus,
        iterations: Vec<IterationRecord>,
        changes: Vec<ChangeEntry>,
    ) -> Self {
        Self {
            final_status,
            total_iterations: iterations.len(),
            iterations,
            changes,
        }
    }

    /// Write the report to `dir` under a timestamped file name and return
    /// the path.
    pub fn save(&self, dir: &Path) -> Result<PathBuf, ReportError> {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let path = dir.join(format!("report_{timestamp}.json"));
        let json = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ReportError::Write {
                path: path.clone(),
                source,
            })?;
        }
        std::fs::write(&path, json).map_err(|source| ReportError::Write {
            path: path.clone(),
            source,
        })?;
        info!("saved iteration report to {}", path.display());
        Ok(path)
    }
}

/// The current time in the report's timestamp format.
pub fn timestamp_now() -> String {
    Local::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use mend_errors::{ErrorKind, FixMethod};

    use super::{FinalStatus, IterationRecord, Report};

    fn record(index: usize, success: bool) -> IterationRecord {
        IterationRecord {
            index,
            timestamp: "2025-01-01T00:00:00+00:00".to_string(),
            method: FixMethod::Structured,
            error_kind: if success {
                ErrorKind::None
            } else {
                ErrorKind::Syntax
            },
            success,
            execution_time: Some(0.01),
            stdout: String::new(),
            stderr: String::new(),
            code_snapshot: "x = 1\n".to_string(),
        }
    }

    #[test]
    fn report_round_trips_through_json() {
        let report = Report::new(FinalStatus::Success, vec![record(1, false), record(2, true)], vec![]);
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"final_status\":\"SUCCESS\""));
        assert!(json.contains("\"error_type\":\"SYNTAX\""));
        assert!(json.contains("\"fix_method\":\"STRUCTURED\""));
        let back: Report = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }

    #[test]
    fn total_iterations_tracks_the_records() {
        let report = Report::new(FinalStatus::Failed, vec![record(1, false)], vec![]);
        assert_eq!(report.total_iterations, 1);
    }

    #[test]
    fn save_writes_a_timestamped_file() {
        let dir = tempfile::tempdir().unwrap();
        let report = Report::new(FinalStatus::Success, vec![record(1, true)], vec![]);
        let path = report.save(dir.path()).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("report_"));
        assert!(name.ends_with(".json"));
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"final_status\""));
    }

    #[test]
    fn success_records_carry_a_clean_error_kind() {
        // The invariant the controller upholds; encoded here so report
        // consumers can rely on it.
        let report = Report::new(FinalStatus::Success, vec![record(1, true)], vec![]);
        for record in &report.iterations {
            if record.success {
                assert_eq!(record.error_kind, ErrorKind::None);
            }
        }
    }
}
