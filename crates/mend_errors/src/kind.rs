use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

/// Closed taxonomy of interpreter failure classes. Every diagnostic the
/// executor can produce maps onto exactly one variant.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    #[default]
    None,
    Syntax,
    Name,
    Index,
    Key,
    Attribute,
    Value,
    Import,
    Type,
    ZeroDivision,
    Recursion,
    Runtime,
    Logical,
    File,
    Parse,
    Regex,
    Encoding,
    Network,
    System,
    Memory,
    Unknown,
}

impl ErrorKind {
    /// Whether the run that produced this kind counts as clean.
    pub const fn is_clean(self) -> bool {
        matches!(self, ErrorKind::None)
    }
}
