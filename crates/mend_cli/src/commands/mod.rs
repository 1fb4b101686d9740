pub mod repair;
pub mod run;

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};

/// Read the program to operate on; `-` means stdin.
pub(crate) fn read_source(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read from stdin")?;
        Ok(buffer)
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))
    }
}
