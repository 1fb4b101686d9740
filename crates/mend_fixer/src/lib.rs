pub mod brackets;
pub mod extract;
pub mod heal;
pub mod merge;
pub mod semantic;
pub mod ssr;
pub mod structured;
pub mod tables;

pub use extract::{clean_completion, extract_code};
pub use merge::{merge_completion, MAX_ADDED_IMPORTS, MAX_ADDED_TOPLEVEL_DEFS, SHRINK_THRESHOLD};
pub use ssr::apply_ssr;
pub use structured::fix_structured;
