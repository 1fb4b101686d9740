//! The structured fixer: ordered syntactic healing, then semantic repair.

use log::debug;

use mend_python_ast::parses;

use crate::heal;
use crate::semantic::resolve_names;

/// The healing stages, in the order they are attempted. Each stage receives
/// the cumulative output of the stages before it.
const STAGES: &[(&str, fn(&str) -> String)] = &[
    ("close residual delimiters", heal::close_residual_delimiters),
    ("drop mismatched closers", heal::drop_mismatched_closers),
    ("close odd quotes", heal::close_odd_quotes),
    ("add block colons", heal::add_block_colons),
    ("insert sequence commas", heal::insert_sequence_commas),
    ("close incomplete calls", heal::close_incomplete_calls),
    ("complete bare assignments", heal::complete_bare_assignments),
    ("strip trailing operators", heal::strip_trailing_operators),
];

/// Heal the source until it parses, then run the semantic stage. If no
/// stage produces a parseable tree the best-effort text is returned and the
/// caller escalates to the generative path.
pub fn fix_structured(source: &str) -> String {
    let mut working = source.replace("\r\n", "\n");

    if parses(&working) {
        return resolve_names(&working);
    }

    for (name, stage) in STAGES {
        working = stage(&working);
        if parses(&working) {
            debug!("structured fixer: parseable after `{name}`");
            return resolve_names(&working);
        }
    }

    let aggressive = heal::aggressive_heal(&working);
    if parses(&aggressive) {
        debug!("structured fixer: parseable after aggressive healing");
        return resolve_names(&aggressive);
    }

    debug!("structured fixer: returning best-effort text");
    working
}
