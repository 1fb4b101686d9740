//! Structural semantic repair: close-and-split for run-on literals.
//!
//! Targets sources where a multi-line literal swallowed the statements that
//! follow it:
//!
//! ```text
//! xs = [1, 2, 3, 4
//! print(sum(xs))]
//! ```
//!
//! The repair closes the literal on its own line and dedents the absorbed
//! statement. Every transformation is validated with a parse; a change that
//! does not parse is kept only if it strictly reduced the number of
//! unmatched openers. Runs before the structured fixer so the AST passes
//! receive syntactically valid code where possible.

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use mend_python_ast::parses;

use crate::brackets::{self, residual_closers, unmatched_opener_count};

const MAX_ATTEMPTS: usize = 4;

static ASSIGNMENT_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_]\w*\s*=").unwrap());
static CALL_START: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_]\w*\s*\(").unwrap());

/// Apply the close-and-split repair until the source parses or the attempt
/// budget is exhausted. Returns the (possibly) repaired source; parseable
/// input is returned unchanged apart from newline normalization.
pub fn apply_ssr(source: &str) -> String {
    if source.is_empty() {
        return String::new();
    }

    let working = source.replace("\r\n", "\n");
    if parses(&working) {
        return working;
    }

    let mut lines: Vec<String> = working.split('\n').map(str::to_string).collect();

    for attempt in 0..MAX_ATTEMPTS {
        debug!("ssr attempt {}/{MAX_ATTEMPTS}", attempt + 1);

        let openers = open_lines(&lines);
        if openers.is_empty() {
            break;
        }

        let mut changed = false;
        for line_index in openers {
            let candidate_lines = split_out_of_literal(&lines, line_index);
            let candidate = candidate_lines.join("\n");
            if candidate == lines.join("\n") {
                continue;
            }
            if parses(&candidate) {
                debug!("ssr: repaired by closing opener on line {}", line_index + 1);
                return candidate;
            }
            let before = unmatched_opener_count(&lines.join("\n"));
            let after = unmatched_opener_count(&candidate);
            if after < before {
                lines = candidate_lines;
                changed = true;
                break;
            }
        }

        if !changed {
            let combined = close_all_openers(&lines.join("\n"));
            if combined != lines.join("\n") && parses(&combined) {
                debug!("ssr: repaired by conservative bulk closure");
                return combined;
            }
            break;
        }
    }

    let joined = lines.join("\n");
    let final_try = close_all_openers(&joined);
    if final_try != joined && parses(&final_try) {
        return final_try;
    }

    debug!("ssr: unable to fully repair; returning best effort");
    joined
}

/// Indices of lines containing an opener unmatched within the line itself,
/// earliest first.
fn open_lines(lines: &[String]) -> Vec<usize> {
    lines
        .iter()
        .enumerate()
        .filter(|(_, line)| first_unclosed_opener(line).is_some())
        .map(|(index, _)| index)
        .collect()
}

/// `(column, opener)` of the earliest opener in the line with no matching
/// closer on the same line.
fn first_unclosed_opener(line: &str) -> Option<(usize, char)> {
    let mut stack: Vec<(usize, char)> = Vec::new();
    for (column, c) in line.char_indices() {
        if brackets::is_opener(c) {
            stack.push((column, c));
        } else if brackets::is_closer(c) {
            if let Some((_, opener)) = stack.last() {
                if brackets::closer_for(*opener) == c {
                    stack.pop();
                }
            }
        }
    }
    stack.first().copied()
}

/// Close the unmatched opener on `lines[start]` and dedent the next line if
/// it reads like a statement of its own.
fn split_out_of_literal(lines: &[String], start: usize) -> Vec<String> {
    let mut new_lines = lines.to_vec();
    let start_line = &lines[start];
    let Some((column, opener)) = first_unclosed_opener(start_line) else {
        return new_lines;
    };

    new_lines[start] = close_opener_on_line(start_line, column, opener);

    if let Some(next_line) = lines.get(start + 1) {
        let base_indent = indent_width(start_line);
        let next_indent = indent_width(next_line);
        if next_indent <= base_indent || is_statement_start(next_line) {
            let remove = if base_indent > 0 { base_indent } else { 4 };
            new_lines[start + 1] = dedent(next_line, remove);
        }
    }
    new_lines
}

/// Append the matching closer at end of line, keeping any inline comment
/// after it.
fn close_opener_on_line(line: &str, column: usize, opener: char) -> String {
    let closer = brackets::closer_for(opener);
    if line[column..].contains(closer) {
        return line.to_string();
    }
    match line.find('#') {
        Some(hash) => {
            let (code, comment) = line.split_at(hash);
            format!("{}{closer}  {comment}", code.trim_end())
        }
        None => format!("{}{closer}", line.trim_end()),
    }
}

fn indent_width(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Remove up to `width` leading spaces (tabs are left alone).
fn dedent(line: &str, width: usize) -> String {
    let strip = line
        .chars()
        .take_while(|c| *c == ' ')
        .count()
        .min(width);
    line[strip..].to_string()
}

/// Whether the line looks like the start of a new statement rather than a
/// continuation of a literal.
fn is_statement_start(line: &str) -> bool {
    let stripped = line.trim_start();
    if stripped.is_empty() {
        return false;
    }
    const KEYWORDS: &[&str] = &[
        "def ", "class ", "for ", "if ", "while ", "try:", "with ", "return ", "import ",
        "from ", "print(", "print ",
    ];
    if KEYWORDS.iter().any(|keyword| stripped.starts_with(keyword)) {
        return true;
    }
    if ASSIGNMENT_START.is_match(stripped) || CALL_START.is_match(stripped) {
        return true;
    }
    stripped.starts_with(|c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '\'' | '"'))
}

/// Append every residual closer on a new line at end of file.
fn close_all_openers(source: &str) -> String {
    let residue = residual_closers(source);
    if residue.is_empty() {
        return source.to_string();
    }
    let closers: String = residue.into_iter().rev().collect();
    let mut closed = source.trim_end().to_string();
    closed.push('\n');
    closed.push_str(&closers);
    closed.push('\n');
    closed
}
