//! Line-level diffing between iteration inputs and outputs, and the replay
//! used to check the change log is sound.
//!
//! Both sides of a diff must be newline-terminated (the controller
//! guarantees this via [`crate::normalize_source`]); line numbers are
//! one-based.

use itertools::Itertools;
use similar::{ChangeTag, TextDiff};

use mend_errors::{ErrorKind, FixMethod};

use crate::report::{ChangeEntry, ChangeType};

/// Compute the change entries transforming `before` into `after`.
pub fn change_entries(
    before: &str,
    after: &str,
    iteration: usize,
    method: FixMethod,
    error_kind: ErrorKind,
    reason: &str,
) -> Vec<ChangeEntry> {
    let diff = TextDiff::from_lines(before, after);
    let mut entries = Vec::new();
    for change in diff.iter_all_changes() {
        let text = change.value().trim_end_matches('\n').to_string();
        match change.tag() {
            ChangeTag::Delete => entries.push(ChangeEntry {
                iteration,
                method,
                error_kind,
                change_type: ChangeType::Removed,
                line_old: change.old_index().map(|index| index + 1),
                line_new: None,
                old_text: text,
                new_text: String::new(),
                reason: reason.to_string(),
            }),
            ChangeTag::Insert => entries.push(ChangeEntry {
                iteration,
                method,
                error_kind,
                change_type: ChangeType::Added,
                line_old: None,
                line_new: change.new_index().map(|index| index + 1),
                old_text: String::new(),
                new_text: text,
                reason: reason.to_string(),
            }),
            ChangeTag::Equal => {}
        }
    }
    entries
}

/// Replay a change log over `source`. Entries are applied iteration by
/// iteration: removals by old line number (descending), then insertions by
/// new line number (ascending). With entries produced by
/// [`change_entries`], replaying reproduces the final source exactly.
pub fn apply_changes(source: &str, entries: &[ChangeEntry]) -> String {
    let mut current = source.to_string();

    for (_, group) in &entries.iter().group_by(|entry| entry.iteration) {
        let group: Vec<&ChangeEntry> = group.collect();

        let mut lines: Vec<String> = current
            .split_inclusive('\n')
            .map(str::to_string)
            .collect();

        let mut removals: Vec<usize> = group
            .iter()
            .filter(|entry| entry.change_type == ChangeType::Removed)
            .filter_map(|entry| entry.line_old)
            .collect();
        removals.sort_unstable();
        for line in removals.into_iter().rev() {
            if line <= lines.len() {
                lines.remove(line - 1);
            }
        }

        let mut insertions: Vec<(usize, &str)> = group
            .iter()
            .filter(|entry| entry.change_type == ChangeType::Added)
            .filter_map(|entry| entry.line_new.map(|line| (line, entry.new_text.as_str())))
            .collect();
        insertions.sort_by_key(|(line, _)| *line);
        for (line, text) in insertions {
            let index = (line - 1).min(lines.len());
            lines.insert(index, format!("{text}\n"));
        }

        current = lines.concat();
    }
    current
}

#[cfg(test)]
mod tests {
    use mend_errors::{ErrorKind, FixMethod};

    use super::{apply_changes, change_entries};

    fn entries(before: &str, after: &str, iteration: usize) -> Vec<super::ChangeEntry> {
        change_entries(
            before,
            after,
            iteration,
            FixMethod::Structured,
            ErrorKind::Syntax,
            "test",
        )
    }

    #[test]
    fn pure_insertion() {
        let before = "a = 1\n";
        let after = "import math\na = 1\n";
        let log = entries(before, after, 1);
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].line_new, Some(1));
        assert_eq!(log[0].new_text, "import math");
        assert_eq!(apply_changes(before, &log), after);
    }

    #[test]
    fn pure_removal() {
        let before = "a = 1\nb = 2\n";
        let after = "a = 1\n";
        let log = entries(before, after, 1);
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].line_old, Some(2));
        assert_eq!(apply_changes(before, &log), after);
    }

    #[test]
    fn replacement_is_removal_plus_insertion() {
        let before = "def f():\n    return 0\n";
        let after = "def f():\n    return 1\n";
        let log = entries(before, after, 1);
        assert_eq!(log.len(), 2);
        assert_eq!(apply_changes(before, &log), after);
    }

    #[test]
    fn replay_is_sound_across_iterations() {
        let v0 = "def f():\n    return 0\nprint(f())\n";
        let v1 = "def f():\n    return 1\nprint(f())\n";
        let v2 = "import math\ndef f():\n    return 1\nprint(f())\nprint(math.pi)\n";
        let mut log = entries(v0, v1, 1);
        log.extend(entries(v1, v2, 2));
        assert_eq!(apply_changes(v0, &log), v2);
    }

    #[test]
    fn replay_tolerates_an_empty_log() {
        assert_eq!(apply_changes("x = 1\n", &[]), "x = 1\n");
    }

    #[test]
    fn multi_line_rewrite_replays_exactly() {
        let v0 = "a = 1\nb = 2\nc = 3\nd = 4\n";
        let v1 = "a = 1\nB = 20\nc = 3\nE = 5\nd = 4\n";
        let log = entries(v0, v1, 1);
        assert_eq!(apply_changes(v0, &log), v1);
    }
}
