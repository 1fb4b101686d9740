pub mod bindings;
pub mod builtins;
pub mod parse;
pub mod visitor;

pub use parse::{parse_suite, parses};

use rustpython_parser::ast::Ranged;
use rustpython_parser::text_size::{TextRange, TextSize};

/// One-based `(row, column)` of a byte offset in `source`.
pub fn source_location(source: &str, offset: TextSize) -> (usize, usize) {
    let offset = usize::from(offset).min(source.len());
    let prefix = &source[..offset];
    let row = prefix.matches('\n').count() + 1;
    let col = offset - prefix.rfind('\n').map_or(0, |i| i + 1) + 1;
    (row, col)
}

/// The source text covered by a range.
pub fn range_text(source: &str, range: TextRange) -> &str {
    &source[usize::from(range.start())..usize::from(range.end())]
}

/// The exact source text of a node.
pub fn node_text<'a>(source: &'a str, node: &impl Ranged) -> &'a str {
    range_text(source, node.range())
}

#[cfg(test)]
mod tests {
    use rustpython_parser::text_size::TextSize;

    use super::source_location;

    #[test]
    fn location_of_offsets() {
        let source = "a = 1\nb = 2\n";
        assert_eq!(source_location(source, TextSize::new(0)), (1, 1));
        assert_eq!(source_location(source, TextSize::new(6)), (2, 1));
        assert_eq!(source_location(source, TextSize::new(10)), (2, 5));
    }
}
