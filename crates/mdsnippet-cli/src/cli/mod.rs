//! CLI entry and dispatch.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use mdsnippet_core::RenderConfig;
use tracing_subscriber::EnvFilter;

mod commands;

const LOG_ENV: &str = "MDSNIPPET_LOG";

#[derive(Parser)]
#[command(name = "mdsnippet")]
#[command(version)]
#[command(about = "Render Markdown snippets to plain text, styled JSON or PNG")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Load rendering settings from a TOML file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Print the line-preserving plain text
    Plain {
        /// Input file, or - for stdin
        input: PathBuf,
    },
    /// Print the styled document as JSON
    Render {
        /// Input file, or - for stdin
        input: PathBuf,

        /// Leave link targets off the spans
        #[arg(long = "no-links")]
        no_links: bool,
    },
    /// Rasterize to a PNG
    Snapshot {
        /// Input file, or - for stdin
        input: PathBuf,

        /// Layout width in pixels
        #[arg(short, long, allow_negative_numbers = true)]
        width: f32,

        /// Destination PNG file
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Strip disallowed scalars, or report what would be stripped
    Sanitize {
        /// Input file, or - for stdin
        input: PathBuf,

        /// Print a report of removed codepoints instead of the text
        #[arg(long)]
        describe: bool,
    },
    /// Print the effective configuration as TOML
    Config,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = match cli.config.as_deref() {
        Some(path) => RenderConfig::load_from(path).context("load config")?,
        None => RenderConfig::default(),
    };

    match cli.command {
        Commands::Plain { input } => commands::render::plain(&config, &input),
        Commands::Render { input, no_links } => commands::render::styled(&config, &input, !no_links),
        Commands::Snapshot {
            input,
            width,
            output,
        } => commands::snapshot::run(&config, &input, width, &output),
        Commands::Sanitize { input, describe } => {
            commands::render::sanitize(&config, &input, describe)
        }
        Commands::Config => commands::config::show(&config),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
