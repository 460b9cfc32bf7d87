//! CLI module - command-line interface
//!
//! `rihla plan` runs a planning session; `rihla config` manages the config
//! file. Trip fields not given as flags are asked for on stdin.

pub mod commands;
pub mod form;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::core::config::{ExportFormat, ImageStrategy};

pub use form::TripForm;

/// Rihla - research a trip and write a travel report
#[derive(Parser, Debug)]
#[command(name = "rihla")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Debug logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Errors only
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Plan a trip
    Plan(PlanArgs),

    /// Show or create the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Args, Debug, Default)]
pub struct PlanArgs {
    /// Departure city
    #[arg(long = "from")]
    pub origin: Option<String>,

    /// Destination city
    #[arg(long = "to")]
    pub destination: Option<String>,

    /// Travel date (YYYY-MM-DD); repeat or comma-separate for several
    #[arg(long = "date", value_delimiter = ',')]
    pub dates: Vec<String>,

    /// Interests, e.g. "museums, food, walking"
    #[arg(long)]
    pub interests: Option<String>,

    /// Export formats (markdown, html, pdf)
    #[arg(long = "format", value_delimiter = ',')]
    pub formats: Vec<ExportFormat>,

    /// Directory for exported files
    #[arg(long = "out")]
    pub output_dir: Option<PathBuf>,

    /// Skip exporting files
    #[arg(long)]
    pub no_export: bool,

    /// Research sections one at a time
    #[arg(long)]
    pub sequential: bool,

    /// Image URL handling: scheme_only, probe, suffix_guess
    #[arg(long)]
    pub image_strategy: Option<ImageStrategy>,

    /// Never prompt; fail when a trip field is missing
    #[arg(long)]
    pub no_input: bool,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long, short)]
        force: bool,
    },
    /// Print the config file location
    Path,
}
