//! Text-producing command handlers.

use std::path::Path;

use anyhow::{Context, Result};
use mdsnippet_core::{Pipeline, RenderConfig, describe};

use super::read_input;

pub fn plain(config: &RenderConfig, input: &Path) -> Result<()> {
    let raw = read_input(input)?;
    let pipeline = Pipeline::new(config.clone());
    println!("{}", pipeline.plain_text(&raw));
    Ok(())
}

pub fn styled(config: &RenderConfig, input: &Path, include_links: bool) -> Result<()> {
    let raw = read_input(input)?;
    let pipeline = Pipeline::new(config.clone());

    let Some(doc) = pipeline.styled_document(&raw, config.base_font_size, include_links) else {
        tracing::warn!("no parse mode accepted the input; printing it verbatim");
        print!("{raw}");
        return Ok(());
    };

    let json = serde_json::to_string_pretty(&doc).context("serialize styled document")?;
    println!("{json}");
    Ok(())
}

pub fn sanitize(config: &RenderConfig, input: &Path, report: bool) -> Result<()> {
    let raw = read_input(input)?;
    if report {
        println!("{}", describe(&raw, config.sanitize_sample_limit));
    } else {
        print!("{}", mdsnippet_core::sanitize(&raw));
    }
    Ok(())
}
