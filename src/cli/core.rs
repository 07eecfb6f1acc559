
use anyhow::bail;
use clap::{Parser, Subcommand};
use chrono::Datelike;
use lazy_static::lazy_static;
use log::LevelFilter;
use std::path::Path;

use crate::cli::aggregate::AggregateSettings;

lazy_static! {
    /// Stores the full version string we plan to use, which is generated in build.rs
    /// # Examples
    /// * `0.11.0-6bb9635-dirty` - while on a dirty branch
    /// * `0.11.0-6bb9635` - with a fresh commit
    pub static ref FULL_VERSION: String = format!("{}-{}", env!("CARGO_PKG_VERSION"), env!("VERGEN_GIT_DESCRIBE"));

    /// Shared after help string containing the legalese.
    pub static ref AFTER_HELP: String = format!("Copyright (C) 2024-{}     vafmean contributors
This program comes with ABSOLUTELY NO WARRANTY; it is intended for
Research Use Only and not for use in diagnostic procedures.", chrono::Utc::now().year());
}

#[derive(Parser)]
#[clap(author, 
    version = &**FULL_VERSION, 
    about, 
    after_help = &**AFTER_HELP)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands
}

/// vafmean, mean variant allele frequencies per site, allele set, and genotype across a cohort.
/// Select a subcommand to see more usage information:
#[derive(Subcommand)]
pub enum Commands {
    /// Averages per-sample allele fractions from a multi-sample VCF
    Aggregate(Box<AggregateSettings>)
}

pub fn get_cli() -> Cli {
    Cli::parse()
}

/// Checks that an input file exists
/// # Arguments
/// * `filename` - the file path to check for
/// * `label` - the label to use for error messages
pub fn check_required_filename(filename: &Path, label: &str) -> anyhow::Result<()> {
    if !filename.is_file() {
        bail!("{} does not exist: \"{}\"", label, filename.display());
    }
    Ok(())
}

/// Checks that the folder an optional output file will be written into already exists
/// # Arguments
/// * `opt_filename` - the output path, if any; None means stdout
/// * `label` - the label to use for error messages
pub fn check_output_filename(opt_filename: Option<&Path>, label: &str) -> anyhow::Result<()> {
    if let Some(filename) = opt_filename {
        if filename.is_dir() {
            bail!("{} is a directory: \"{}\"", label, filename.display());
        }

        // a bare filename has an empty parent, which is the current folder
        let parent = filename.parent().unwrap_or(Path::new(""));
        if !parent.as_os_str().is_empty() && !parent.is_dir() {
            bail!("{} parent folder does not exist: \"{}\"", label, parent.display());
        }
    }
    Ok(())
}

/// Sets up the global logger based on the number of -v flags
/// # Arguments
/// * `verbosity` - 0 = Info, 1 = Debug, 2+ = Trace
pub fn init_logging(verbosity: u8) {
    let filter_level: LevelFilter = match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace
    };
    env_logger::builder()
        .format_timestamp_millis()
        .filter_level(filter_level)
        .init();
}
