
use anyhow::ensure;
use clap::Args;
use log::info;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::core::{check_output_filename, check_required_filename, AFTER_HELP, FULL_VERSION};
use crate::data_types::genotype::{GenotypeSet, DEFAULT_VALID_GENOTYPES};
use crate::writers::vaf_table::OutputFormat;

#[derive(Args, Clone, Debug, Default, Serialize)]
#[clap(author, about,
    after_help = &**AFTER_HELP
)]
pub struct AggregateSettings {
    #[clap(default_value = "")]
    #[clap(hide = true)]
    vafmean_version: String,

    /// Input multi-sample variant call file (VCF), plain or bgzipped
    #[clap(required = true)]
    #[clap(short = 'i')]
    #[clap(long = "input-vcf")]
    #[clap(value_name = "VCF")]
    #[clap(help_heading = Some("Input/Output"))]
    pub vcf_filename: PathBuf,

    /// Output table; .gz paths are gzip compressed [default: stdout]
    #[clap(short = 'o')]
    #[clap(long = "output")]
    #[clap(value_name = "FILE")]
    #[clap(help_heading = Some("Input/Output"))]
    pub output_filename: Option<PathBuf>,

    /// Output table layout
    #[clap(long = "format")]
    #[clap(value_name = "FORMAT")]
    #[clap(help_heading = Some("Input/Output"))]
    #[clap(default_value = "plain")]
    pub output_format: OutputFormat,

    /// Optional output debug folder
    #[clap(long = "output-debug")]
    #[clap(value_name = "DIR")]
    #[clap(help_heading = Some("Input/Output"))]
    pub debug_folder: Option<PathBuf>,

    /// Genotypes that are retained, comma separated; phased forms are normalized first
    #[clap(long = "genotypes")]
    #[clap(value_name = "GT")]
    #[clap(help_heading = Some("Filtering"))]
    #[clap(value_delimiter = ',')]
    #[clap(default_values_t = DEFAULT_VALID_GENOTYPES.map(String::from))]
    pub valid_genotypes: Vec<String>,

    /// Disables the progress spinner
    #[clap(long = "no-progress")]
    pub disable_progress: bool,

    /// Enable verbose output.
    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = clap::ArgAction::Count)]
    pub verbosity: u8,
}

impl AggregateSettings {
    /// The configured genotypes as a normalized set
    pub fn genotype_set(&self) -> GenotypeSet {
        GenotypeSet::new(&self.valid_genotypes)
    }
}

pub fn check_aggregate_settings(mut settings: AggregateSettings) -> anyhow::Result<AggregateSettings> {
    // hard code the version in
    settings.vafmean_version = FULL_VERSION.clone();
    info!("vafmean version: {:?}", &settings.vafmean_version);
    info!("Sub-command: aggregate");
    info!("Inputs:");

    // check for all the required input files
    check_required_filename(&settings.vcf_filename, "Input VCF")?;
    info!("\tInput VCF: {:?}", &settings.vcf_filename);

    // outputs
    check_output_filename(settings.output_filename.as_deref(), "Output")?;
    info!("Outputs:");
    if let Some(output_fn) = settings.output_filename.as_deref() {
        info!("\tOutput: {output_fn:?}");
    } else {
        info!("\tOutput: stdout");
    }
    info!("\tFormat: {}", settings.output_format);
    if let Some(debug_folder) = settings.debug_folder.as_ref() {
        info!("\tDebug folder: {debug_folder:?}");
    }

    // filters, stored in normalized form so the debug JSON reflects what is actually applied
    settings.valid_genotypes.retain(|gt| !gt.trim().is_empty());
    ensure!(!settings.valid_genotypes.is_empty(), "--genotypes must contain at least one genotype");
    settings.valid_genotypes = settings.genotype_set().iter()
        .map(String::from)
        .collect();
    info!("Filtering parameters:");
    info!("\tRetained genotypes: {:?}", settings.valid_genotypes);
    info!("\tMinimum total AD: 1");

    Ok(settings)
}
