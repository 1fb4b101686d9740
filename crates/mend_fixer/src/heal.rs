//! Text-level syntactic healing passes.
//!
//! Each pass is idempotent on text it cannot improve and returns a new
//! string. The driver in [`crate::structured`] runs them in order,
//! attempting a parse after each stage.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::brackets::{self, residual_closers};

const BLOCK_KEYWORDS: &[&str] = &[
    "def", "class", "if", "elif", "else", "for", "while", "try", "except", "finally", "with",
];

const TRAILING_OPERATORS: &[&str] = &[
    "**", "//", "<=", ">=", "==", "!=", "and", "or", "not", "+", "-", "*", "/", "%", "<", ">",
    "&", "|", "^",
];

/// Append the closers still expected at end of input, innermost first.
pub fn close_residual_delimiters(source: &str) -> String {
    let residue = residual_closers(source);
    if residue.is_empty() {
        return source.to_string();
    }
    let mut healed = source.trim_end().to_string();
    for closer in residue.into_iter().rev() {
        healed.push(closer);
    }
    healed.push('\n');
    healed
}

/// Drop closers whose top-of-stack opener does not match.
pub fn drop_mismatched_closers(source: &str) -> String {
    let mut output = String::with_capacity(source.len());
    let mut stack: Vec<char> = Vec::new();
    let mut in_single = false;
    let mut in_double = false;
    let mut escaped = false;
    for c in source.chars() {
        if escaped {
            escaped = false;
            output.push(c);
            continue;
        }
        match c {
            '\\' => {
                escaped = true;
                output.push(c);
            }
            '\'' if !in_double => {
                in_single = !in_single;
                output.push(c);
            }
            '"' if !in_single => {
                in_double = !in_double;
                output.push(c);
            }
            _ if in_single || in_double => output.push(c),
            _ if brackets::is_opener(c) => {
                stack.push(brackets::closer_for(c));
                output.push(c);
            }
            _ if brackets::is_closer(c) => {
                if stack.last() == Some(&c) {
                    stack.pop();
                    output.push(c);
                }
                // Otherwise the closer is unmatched: discard it.
            }
            _ => output.push(c),
        }
    }
    output
}

/// If the count of either quote character is odd, append the missing quote.
pub fn close_odd_quotes(source: &str) -> String {
    let mut healed = source.to_string();
    if healed.matches('"').count() % 2 == 1 {
        healed = format!("{}\"", healed.trim_end());
        healed.push('\n');
    }
    if healed.matches('\'').count() % 2 == 1 {
        healed = format!("{}'", healed.trim_end());
        healed.push('\n');
    }
    healed
}

/// Add missing colons to block headers and indent the line that should be
/// their body.
pub fn add_block_colons(source: &str) -> String {
    let mut lines: Vec<String> = source.split('\n').map(str::to_string).collect();
    for index in 0..lines.len() {
        let line = lines[index].clone();
        let stripped = line.trim_start();
        let keyword = stripped
            .split(|c: char| !c.is_alphanumeric() && c != '_')
            .next()
            .unwrap_or("");
        if !BLOCK_KEYWORDS.contains(&keyword) {
            continue;
        }
        let indent = line.len() - stripped.len();

        let trimmed_end = line.trim_end();
        // Only lines with no colon anywhere are candidates; this spares
        // one-liners like `if x: y = 1` and subscripted slices.
        if !trimmed_end.is_empty() && !trimmed_end.contains(':') {
            lines[index] = format!("{trimmed_end}:");
        }
        // A block header with nothing after the colon needs an indented
        // body on the next non-empty line.
        if !lines[index].trim_end().ends_with(':') {
            continue;
        }
        if let Some(next_index) = (index + 1..lines.len()).find(|i| !lines[*i].trim().is_empty())
        {
            let next = lines[next_index].clone();
            let next_indent = next.len() - next.trim_start().len();
            if next_indent <= indent {
                lines[next_index] = format!("    {next}");
            }
        }
    }
    lines.join("\n")
}

static SEQUENCE_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^[A-Za-z0-9_.'"+-]+$"#).unwrap());
static BRACKET_SPANS: Lazy<[(Regex, char, char); 3]> = Lazy::new(|| {
    [
        (Regex::new(r"\[([^\[\]]+)\]").unwrap(), '[', ']'),
        (Regex::new(r"\(([^()]+)\)").unwrap(), '(', ')'),
        (Regex::new(r"\{([^{}]+)\}").unwrap(), '{', '}'),
    ]
});

/// Insert commas between whitespace-separated tokens inside a bracketed
/// sequence, e.g. `[1 2 3]` → `[1, 2, 3]`.
pub fn insert_sequence_commas(source: &str) -> String {
    source
        .split('\n')
        .map(|line| {
            let mut line = line.to_string();
            for (span, open, close) in BRACKET_SPANS.iter() {
                line = span
                    .replace_all(&line, |caps: &regex::Captures| {
                        let inner = &caps[1];
                        if inner.contains(',') {
                            return caps[0].to_string();
                        }
                        let tokens: Vec<&str> = inner.split_whitespace().collect();
                        if tokens.len() < 2
                            || !tokens.iter().all(|t| SEQUENCE_ITEM.is_match(t))
                        {
                            return caps[0].to_string();
                        }
                        format!("{open}{}{close}", tokens.join(", "))
                    })
                    .into_owned();
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

static INCOMPLETE_CALL: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z_]\w*\($").unwrap());

/// Close a call left dangling at end of line: `foo(` → `foo()`.
pub fn close_incomplete_calls(source: &str) -> String {
    source
        .split('\n')
        .map(|line| {
            let trimmed = line.trim_end();
            if INCOMPLETE_CALL.is_match(trimmed) {
                format!("{trimmed})")
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

static BARE_ASSIGNMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\s*[A-Za-z_]\w*\s*=)\s*$").unwrap());

/// Complete an assignment with no right-hand side: `x =` → `x = None`.
pub fn complete_bare_assignments(source: &str) -> String {
    source
        .split('\n')
        .map(|line| {
            if let Some(caps) = BARE_ASSIGNMENT.captures(line) {
                format!("{} None", caps[1].trim_end())
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Strip a binary operator or logical connector left dangling at end of
/// line.
pub fn strip_trailing_operators(source: &str) -> String {
    source
        .split('\n')
        .map(|line| {
            let trimmed = line.trim_end();
            for op in TRAILING_OPERATORS {
                if let Some(rest) = trimmed.strip_suffix(op) {
                    // Word operators need a boundary so `editor` is not
                    // truncated to `edit`.
                    if op.chars().all(char::is_alphabetic)
                        && !rest.ends_with(|c: char| c.is_whitespace())
                    {
                        continue;
                    }
                    let rest = rest.trim_end();
                    if rest.is_empty() || rest.ends_with('=') {
                        continue;
                    }
                    return rest.to_string();
                }
            }
            line.to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Last-resort per-line rewrites, applied only when the ordered passes did
/// not produce a parseable tree.
pub fn aggressive_heal(source: &str) -> String {
    source
        .split('\n')
        .map(|line| {
            let mut line = line.to_string();
            let trimmed = line.trim_end().to_string();

            // Complete a dangling binary operator instead of dropping it.
            for op in ["+", "-", "*", "/"] {
                if trimmed.ends_with(op) && !trimmed.ends_with("=") {
                    line = format!("{trimmed} 0");
                    break;
                }
            }

            if line.contains(",,") {
                line = line.replace(",,", ", None,");
            }

            let open = line.matches('(').count();
            let close = line.matches(')').count();
            if open > close {
                let trimmed = line.trim_end().to_string();
                line = format!("{}{}", trimmed, ")".repeat(open - close));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}
