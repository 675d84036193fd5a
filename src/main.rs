//! relive - hot-reload module transformer.

use anyhow::Result;
use clap::{ColorChoice, Parser};
use std::path::Path;

use relive::cli::{self, Cli, Commands};
use relive::config::{ReliveConfig, find_config_file};
use relive::logger;
use relive::utils::path::normalize_path;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = load_config(&cli.config)?;

    match &cli.command {
        Commands::Transform {
            file,
            changed,
            stamp,
        } => cli::transform(&config, file, changed, stamp),
        Commands::Plan { file } => cli::plan(&config, file),
        Commands::Key { file } => cli::key(&config, file),
    }
}

/// Search upward from the working directory, falling back to the given path.
fn load_config(config: &Path) -> Result<ReliveConfig> {
    let cwd = std::env::current_dir()?;
    let path = find_config_file(&cwd, config).unwrap_or_else(|| cwd.join(config));
    ReliveConfig::load(&normalize_path(&path))
}
