//! Config command handler.

use anyhow::Result;
use mdsnippet_core::RenderConfig;

pub fn show(config: &RenderConfig) -> Result<()> {
    print!("{}", config.to_toml()?);
    Ok(())
}
