//! Map raw interpreter diagnostics onto the [`ErrorKind`] taxonomy.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::kind::ErrorKind;

/// Languages the executor can run. The repair pipeline itself is
/// Python-only; the other variants exist so single-shot execution can still
/// classify their diagnostics.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Python,
    #[strum(serialize = "javascript", serialize = "js", serialize = "node")]
    JavaScript,
    Java,
}

/// Substring tokens in the order they are tried. Earlier entries win, so
/// subclasses with distinctive names (`ModuleNotFoundError`,
/// `JSONDecodeError`) sit above their broader parents.
const PYTHON_TOKENS: &[(&str, ErrorKind)] = &[
    ("IndentationError", ErrorKind::Syntax),
    ("TabError", ErrorKind::Syntax),
    ("SyntaxError", ErrorKind::Syntax),
    ("NameError", ErrorKind::Name),
    ("IndexError", ErrorKind::Index),
    ("KeyError", ErrorKind::Key),
    ("AttributeError", ErrorKind::Attribute),
    ("ModuleNotFoundError", ErrorKind::Import),
    ("ImportError", ErrorKind::Import),
    ("JSONDecodeError", ErrorKind::Parse),
    ("ValueError", ErrorKind::Value),
    ("TypeError", ErrorKind::Type),
    ("ZeroDivisionError", ErrorKind::ZeroDivision),
    ("RecursionError", ErrorKind::Recursion),
    ("FileNotFoundError", ErrorKind::File),
    ("FileExistsError", ErrorKind::File),
    ("IsADirectoryError", ErrorKind::File),
    ("re.error", ErrorKind::Regex),
    ("UnicodeDecodeError", ErrorKind::Encoding),
    ("UnicodeEncodeError", ErrorKind::Encoding),
    ("UnicodeError", ErrorKind::Encoding),
    ("ConnectionError", ErrorKind::Network),
    ("ConnectionRefusedError", ErrorKind::Network),
    ("socket.gaierror", ErrorKind::Network),
    ("MemoryError", ErrorKind::Memory),
    ("OSError", ErrorKind::System),
    ("SystemError", ErrorKind::System),
];

const JAVASCRIPT_TOKENS: &[(&str, ErrorKind)] = &[
    ("SyntaxError", ErrorKind::Syntax),
    ("ReferenceError", ErrorKind::Name),
    ("TypeError", ErrorKind::Type),
    ("RangeError", ErrorKind::Index),
];

const JAVA_TOKENS: &[(&str, ErrorKind)] = &[
    ("error:", ErrorKind::Syntax),
    ("NullPointerException", ErrorKind::Attribute),
    ("ArrayIndexOutOfBoundsException", ErrorKind::Index),
    ("cannot find symbol", ErrorKind::Name),
    ("OutOfMemoryError", ErrorKind::Memory),
];

/// Classify a raw diagnostic stream.
///
/// Pure over the diagnostic text: an empty stream is a clean run, a known
/// token selects its kind, an unrecognized stream with a traceback marker is
/// a runtime failure, and anything else is unknown.
pub fn parse_diagnostic(diagnostic: &str, language: Language) -> (ErrorKind, String) {
    let text = diagnostic.trim();
    if text.is_empty() {
        return (ErrorKind::None, String::new());
    }

    let tokens = match language {
        Language::Python => PYTHON_TOKENS,
        Language::JavaScript => JAVASCRIPT_TOKENS,
        Language::Java => JAVA_TOKENS,
    };

    for (token, kind) in tokens {
        if diagnostic.contains(token) {
            return (*kind, diagnostic.to_string());
        }
    }

    match language {
        Language::Python if diagnostic.contains("Traceback") => {
            (ErrorKind::Runtime, diagnostic.to_string())
        }
        Language::JavaScript
            if diagnostic.to_lowercase().contains("unexpected token") =>
        {
            (ErrorKind::Syntax, diagnostic.to_string())
        }
        Language::JavaScript if diagnostic.to_lowercase().contains("is not defined") => {
            (ErrorKind::Name, diagnostic.to_string())
        }
        Language::Java if diagnostic.contains("Exception in thread") => {
            (ErrorKind::Runtime, diagnostic.to_string())
        }
        _ => (ErrorKind::Unknown, diagnostic.to_string()),
    }
}
