//! Integrate untrusted model output into a working file.
//!
//! A completion is merged, never trusted: a full candidate must survive the
//! hallucination bounds, and anything less is folded in one definition at a
//! time, with a parse check after every substitution. A rejected merge
//! leaves the base verbatim.

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::FxHashSet;

use mend_python_ast::bindings::{imported_modules, top_level_defs, top_level_names};
use mend_python_ast::{parse_suite, parses, range_text};

/// A full candidate must keep at least this share of the base's lines.
pub const SHRINK_THRESHOLD: f64 = 0.75;
/// Most new top-level definitions a candidate may introduce.
pub const MAX_ADDED_TOPLEVEL_DEFS: usize = 12;
/// Most new imported modules a candidate may introduce.
pub const MAX_ADDED_IMPORTS: usize = 8;

static CODE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(def |class |import |from |[A-Za-z_]\w*\s*=|if |for |while |async def )")
        .unwrap()
});
static BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)(?:^|\n)((?:async\s+def|def|class)\s+[A-Za-z_]\w*[^\n]*:\n(?:[ \t]+.*\n)+)")
        .unwrap()
});
static BLOCK_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:async\s+def|def|class)\s+([A-Za-z_]\w*)").unwrap());

/// Merge a completion into `base`.
///
/// Returns the merged source, or `base` verbatim when no safe merge exists;
/// the caller distinguishes the two by textual equality.
pub fn merge_completion(base: &str, completion: &str, allow_full_rewrite: bool) -> String {
    if completion.trim().is_empty() {
        return base.to_string();
    }

    let candidate = with_newline(strip_non_code_prefix(completion).trim());
    let candidate_parses = parses(&candidate);

    // 1) Full-candidate path: adopt wholesale if it parses and stays inside
    // the hallucination bounds.
    if candidate_parses {
        if within_bounds(base, &candidate) {
            debug!("merge: adopting full candidate");
            return candidate;
        }
        warn!("merge: full candidate rejected by hallucination bounds");
    }

    // Partial merges splice definitions into the base, which therefore has
    // to parse itself.
    if !parses(base) {
        debug!("merge: base does not parse; refusing partial merge");
        return base.to_string();
    }

    // 2) AST-level partial merge: replace same-named top-level definitions
    // with the candidate's version.
    if candidate_parses {
        if let Ok(suite) = parse_suite(&candidate) {
            let mut merged = with_newline(base);
            let mut replaced_any = false;
            for (name, range) in top_level_defs(&suite) {
                let block = with_newline(range_text(&candidate, range));
                if !parses(&block) {
                    continue;
                }
                if let Some(next) = substitute_definition(&merged, &name, &block) {
                    debug!("merge: replaced definition `{name}`");
                    merged = next;
                    replaced_any = true;
                }
            }
            if replaced_any && parses(&merged) {
                return merged;
            }
        }
    }

    // 3) Regex-level partial merge over the extracted candidate text.
    if let Some(merged) = regex_block_merge(base, &candidate) {
        return merged;
    }

    // 4) Function-level rewrite fallback over the raw completion, only on
    // request and only inside the bounds.
    if allow_full_rewrite {
        let raw = with_newline(completion);
        if let Some(merged) = regex_block_merge(base, &raw) {
            if within_additive_bounds(base, &merged) {
                debug!("merge: accepted full-function rewrite");
                return merged;
            }
            warn!("merge: full-function rewrite rejected by hallucination bounds");
        }
    }

    base.to_string()
}

/// Whether a fully-parsed candidate passes the shrink and additive bounds.
fn within_bounds(base: &str, candidate: &str) -> bool {
    let base_lines = base.lines().count();
    let cand_lines = candidate.lines().count();
    if base_lines > 0 && (cand_lines as f64) < (base_lines as f64) * SHRINK_THRESHOLD {
        return false;
    }
    within_additive_bounds(base, candidate)
}

fn within_additive_bounds(base: &str, candidate: &str) -> bool {
    let added_defs = set_difference(names_of(candidate), names_of(base));
    if added_defs > MAX_ADDED_TOPLEVEL_DEFS {
        return false;
    }
    let added_imports = set_difference(imports_of(candidate), imports_of(base));
    added_imports <= MAX_ADDED_IMPORTS
}

fn names_of(source: &str) -> FxHashSet<String> {
    parse_suite(source)
        .map(|suite| top_level_names(&suite))
        .unwrap_or_default()
}

fn imports_of(source: &str) -> FxHashSet<String> {
    parse_suite(source)
        .map(|suite| imported_modules(&suite))
        .unwrap_or_default()
}

fn set_difference(a: FxHashSet<String>, b: FxHashSet<String>) -> usize {
    a.difference(&b).count()
}

/// Extract definition blocks from `text` (which need not parse) and splice
/// each over the same-named definition in `base`, keeping substitutions
/// that preserve the parse.
fn regex_block_merge(base: &str, text: &str) -> Option<String> {
    let mut merged = with_newline(base);
    let mut replaced_any = false;
    for caps in BLOCK.captures_iter(text) {
        let block = with_newline(caps[1].trim_end());
        let Some(name_caps) = BLOCK_NAME.captures(&block) else {
            continue;
        };
        let name = name_caps[1].to_string();
        if let Some(next) = substitute_definition(&merged, &name, &block) {
            debug!("merge: regex-replaced block `{name}`");
            merged = next;
            replaced_any = true;
        }
    }
    replaced_any.then_some(merged)
}

/// Replace the first definition of `name` in `source` with `block`,
/// returning the result only if it still parses.
fn substitute_definition(source: &str, name: &str, block: &str) -> Option<String> {
    let pattern = Regex::new(&format!(
        r"(?m)(?:^|\n)(?:async\s+def|def|class)\s+{}\b[^\n]*:\n(?:[ \t]+.*\n)+",
        regex::escape(name)
    ))
    .ok()?;
    let found = pattern.find(source)?;
    let lead = if found.start() == 0 { "" } else { "\n" };
    let attempt = format!(
        "{}{lead}{block}{}",
        &source[..found.start()],
        &source[found.end()..]
    );
    parses(&attempt).then_some(attempt)
}

/// Drop any leading prose the model wrapped around the code.
fn strip_non_code_prefix(text: &str) -> &str {
    for (index, _) in text.split('\n').take(40).enumerate() {
        let offset = byte_offset_of_line(text, index);
        let line = text[offset..].split('\n').next().unwrap_or("");
        if CODE_LINE.is_match(line) {
            return &text[offset..];
        }
    }
    text
}

fn byte_offset_of_line(text: &str, line: usize) -> usize {
    if line == 0 {
        return 0;
    }
    text.match_indices('\n')
        .nth(line - 1)
        .map_or(text.len(), |(offset, _)| offset + 1)
}

fn with_newline(text: &str) -> String {
    let mut owned = text.to_string();
    if !owned.ends_with('\n') {
        owned.push('\n');
    }
    owned
}

#[cfg(test)]
mod tests {
    use mend_python_ast::parses;

    use super::{merge_completion, MAX_ADDED_TOPLEVEL_DEFS, SHRINK_THRESHOLD};

    const BASE: &str = "\
def add(a, b):
    return a - b

def mul(a, b):
    return a * b

print(add(2, 3))
";

    #[test]
    fn clean_candidate_is_adopted() {
        let completion = "\
def add(a, b):
    return a + b

def mul(a, b):
    return a * b

print(add(2, 3))
";
        assert_eq!(merge_completion(BASE, completion, false), completion);
    }

    #[test]
    fn massive_shrink_falls_back_to_partial_merge() {
        // 120-line base, 30-line candidate holding one corrected function.
        let mut base = String::from("def target(n):\n    return n - 1\n");
        for index in 0..59 {
            base.push_str(&format!("def filler_{index}(x):\n    return x\n"));
        }
        let mut candidate = String::from("def target(n):\n    return n + 1\n");
        for _ in 0..28 {
            candidate.push_str("# model commentary\n");
        }
        assert_eq!(base.lines().count(), 120);
        assert!(
            (candidate.lines().count() as f64) < 120.0 * SHRINK_THRESHOLD,
            "candidate must trip the shrink bound"
        );

        let merged = merge_completion(&base, &candidate, false);
        // The full candidate was rejected, but the corrected function was
        // spliced in and every other definition survived.
        assert_ne!(merged, candidate);
        assert!(merged.contains("return n + 1"));
        assert!(merged.contains("def filler_0"));
        assert!(merged.contains("def filler_58"));
        assert!(parses(&merged));
    }

    #[test]
    fn hallucinated_definitions_are_rejected() {
        let mut completion = String::from(BASE);
        for index in 0..=MAX_ADDED_TOPLEVEL_DEFS {
            completion.push_str(&format!("def invented_{index}():\n    pass\n"));
        }
        let merged = merge_completion(BASE, &completion, false);
        assert!(!merged.contains("invented_0"));
    }

    #[test]
    fn unparseable_completion_merges_block_by_block() {
        let completion = "\
So, the bug is in `add`; here is the fixed version

def add(a, b):
    return a + b

and that is all you need ???
";
        let merged = merge_completion(BASE, completion, false);
        assert!(merged.contains("return a + b"), "merged: {merged}");
        assert!(merged.contains("def mul"));
        assert!(parses(&merged));
    }

    #[test]
    fn parseable_candidate_inside_bounds_is_adopted_wholesale() {
        let completion = "def somewhere_else(x):\n    return x\n";
        let merged = merge_completion("def f():\n    return 1\n", completion, false);
        // Same line count, one new def: inside every bound, so the
        // full-candidate path takes it as-is.
        assert_eq!(merged, completion);
    }

    #[test]
    fn rejected_merge_keeps_base_verbatim() {
        let base = "def f():\n    return 1\n";
        let merged = merge_completion(base, "((((( nonsense", false);
        assert_eq!(merged, base);
    }

    #[test]
    fn empty_completion_keeps_base() {
        assert_eq!(merge_completion(BASE, "   ", true), BASE);
    }

    #[test]
    fn full_rewrite_fallback_requires_opt_in() {
        // The block sits under prose that defeats extraction when the
        // wider candidate never parses, and the stripped candidate starts
        // mid-sentence.
        let completion = "\
!! unparseable preamble !!
def add(a, b):
    return a + b
!! unparseable trailer !!
";
        let conservative = merge_completion(BASE, completion, false);
        let rewritten = merge_completion(BASE, completion, true);
        assert!(rewritten.contains("return a + b"), "rewritten: {rewritten}");
        assert!(parses(&rewritten));
        // Without the opt-in the same input may still merge through the
        // regex path; what matters is the base is never corrupted.
        assert!(parses(&conservative));
    }

    #[test]
    fn shrink_bound_holds_for_accepted_candidates() {
        let base: String = (0..20).map(|i| format!("x{i} = {i}\n")).collect();
        for cand_lines in 1..=20usize {
            let candidate: String = (0..cand_lines).map(|i| format!("x{i} = {i}\n")).collect();
            let merged = merge_completion(&base, &candidate, false);
            if merged == candidate {
                assert!(
                    merged.lines().count() >= (20.0 * SHRINK_THRESHOLD).ceil() as usize,
                    "accepted candidate with {cand_lines} lines"
                );
            }
        }
    }
}
