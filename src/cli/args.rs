//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Hot-reload module transformer
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: relive.toml, searched upward)
    #[arg(short = 'C', long, default_value = "relive.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Print debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Print the generated module for a file
    #[command(visible_alias = "t")]
    Transform {
        /// Module to transform
        #[arg(value_hint = clap::ValueHint::FilePath)]
        file: PathBuf,

        /// Fill dependency placeholders, stamping these source paths
        #[arg(long, value_name = "SOURCE")]
        changed: Vec<String>,

        /// Stamp used for changed dependencies
        #[arg(long, default_value = "1")]
        stamp: String,
    },

    /// Print the transform plan and selected strategy
    #[command(visible_alias = "p")]
    Plan {
        #[arg(value_hint = clap::ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Print the five-field cache key for a file
    #[command(visible_alias = "k")]
    Key {
        #[arg(value_hint = clap::ValueHint::FilePath)]
        file: PathBuf,
    },
}
