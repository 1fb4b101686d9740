//! Pull usable source out of free-form model output.

use once_cell::sync::Lazy;
use regex::Regex;

use mend_python_ast::parses;

/// Hard cap on how much raw model text is ever adopted.
pub const MAX_OUTPUT_CHARS: usize = 20_000;

/// How far ahead the contiguous-block search looks, in lines.
const BLOCK_WINDOW: usize = 200;

static FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?si)```(?:python)?\n(.*?)```").unwrap());
static LEADING_COMMENTS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*#.*\n+").unwrap());
static PROSE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^[A-Za-z ,\-()"']+:\s*"#).unwrap());
static OPENING_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^```(?:python)?\n?").unwrap());
static CLOSING_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n?```$").unwrap());

/// Extract source from model output: fenced block first, then the largest
/// contiguous block of lines that parses, then a prose-prefix strip, and
/// finally the raw text bounded to [`MAX_OUTPUT_CHARS`].
pub fn extract_code(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    if let Some(caps) = FENCE.captures(text) {
        let fenced = caps[1].trim();
        if parses(fenced) {
            return with_newline(fenced);
        }
        let without_comments = LEADING_COMMENTS.replace(fenced, "");
        if parses(&without_comments) {
            return with_newline(without_comments.trim());
        }
    }

    if let Some(block) = largest_parsing_block(text) {
        return with_newline(&block);
    }

    let cleaned = PROSE_PREFIX.replace(text, "");
    let cleaned = cleaned.trim();
    if parses(cleaned) {
        return with_newline(cleaned);
    }

    text.trim().chars().take(MAX_OUTPUT_CHARS).collect()
}

/// Normalize and unfence a completion, then run the extraction ladder.
pub fn clean_completion(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }
    let normalized = text.replace("\r\n", "\n");
    let unfenced = OPENING_FENCE.replace(normalized.trim(), "");
    let unfenced = CLOSING_FENCE.replace(&unfenced, "");
    let extracted = extract_code(unfenced.trim());
    if extracted.is_empty() || extracted.ends_with('\n') {
        extracted
    } else {
        with_newline(&extracted)
    }
}

/// The longest window of consecutive lines that parses on its own.
fn largest_parsing_block(text: &str) -> Option<String> {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut best: Option<String> = None;
    for start in 0..lines.len() {
        let end_limit = (start + BLOCK_WINDOW).min(lines.len());
        for end in (start + 1)..=end_limit {
            let block = lines[start..end].join("\n");
            let block = block.trim();
            if block.len() < 10 {
                continue;
            }
            if best.as_ref().is_some_and(|best| block.len() <= best.len()) {
                continue;
            }
            if parses(block) {
                best = Some(block.to_string());
            }
        }
    }
    best
}

fn with_newline(text: &str) -> String {
    let mut owned = text.to_string();
    if !owned.ends_with('\n') {
        owned.push('\n');
    }
    owned
}
