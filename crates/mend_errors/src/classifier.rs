//! Map an [`ErrorKind`] onto a repair strategy.

use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::kind::ErrorKind;

/// The strategy the controller applies for one iteration.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, is_macro::Is, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FixMethod {
    /// Deterministic text/AST transformation.
    Structured,
    /// Guided rewrite from the language model.
    Generative,
    #[default]
    None,
}

/// Kinds a deterministic pass can usually resolve without reasoning about
/// intent: broken syntax, missing bindings, bad lookups.
const STRUCTURED_FIRST: &[ErrorKind] = &[
    ErrorKind::Syntax,
    ErrorKind::Name,
    ErrorKind::Import,
    ErrorKind::Attribute,
    ErrorKind::Key,
    ErrorKind::Value,
    ErrorKind::File,
    ErrorKind::Parse,
    ErrorKind::Regex,
    ErrorKind::Encoding,
];

/// Kinds that require reasoning about what the program was meant to do.
const GENERATIVE_FIRST: &[ErrorKind] = &[
    ErrorKind::Logical,
    ErrorKind::Recursion,
    ErrorKind::Runtime,
    ErrorKind::ZeroDivision,
    ErrorKind::Network,
    ErrorKind::System,
    ErrorKind::Memory,
];

/// Select the repair strategy for an error kind. Unknown or unlisted kinds
/// default to the generative path.
pub fn choose_fix_method(kind: ErrorKind) -> FixMethod {
    if STRUCTURED_FIRST.contains(&kind) {
        FixMethod::Structured
    } else if GENERATIVE_FIRST.contains(&kind) {
        FixMethod::Generative
    } else {
        FixMethod::Generative
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::{choose_fix_method, ErrorKind, FixMethod};

    #[test_case(ErrorKind::Syntax, FixMethod::Structured)]
    #[test_case(ErrorKind::Name, FixMethod::Structured)]
    #[test_case(ErrorKind::Import, FixMethod::Structured)]
    #[test_case(ErrorKind::Value, FixMethod::Structured)]
    #[test_case(ErrorKind::Regex, FixMethod::Structured)]
    #[test_case(ErrorKind::Logical, FixMethod::Generative)]
    #[test_case(ErrorKind::Recursion, FixMethod::Generative)]
    #[test_case(ErrorKind::ZeroDivision, FixMethod::Generative)]
    #[test_case(ErrorKind::Runtime, FixMethod::Generative)]
    #[test_case(ErrorKind::Type, FixMethod::Generative; "unlisted kind defaults to generative")]
    #[test_case(ErrorKind::Unknown, FixMethod::Generative)]
    fn strategy_selection(kind: ErrorKind, expected: FixMethod) {
        assert_eq!(choose_fix_method(kind), expected);
    }
}
