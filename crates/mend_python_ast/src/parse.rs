use rustpython_parser::ast::Suite;
use rustpython_parser::{Parse, ParseError};

/// Parse a module body.
pub fn parse_suite(source: &str) -> Result<Suite, ParseError> {
    Suite::parse(source, "<source>")
}

/// Whether the source parses as a module.
pub fn parses(source: &str) -> bool {
    parse_suite(source).is_ok()
}
