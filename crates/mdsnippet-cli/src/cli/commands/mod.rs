//! CLI command handlers.

pub mod config;
pub mod render;
pub mod snapshot;

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};

/// Reads `input`, treating `-` as stdin.
pub fn read_input(input: &Path) -> Result<String> {
    if input == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("read stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(input).with_context(|| format!("read {}", input.display()))
}
