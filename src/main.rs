
use indicatif::ProgressIterator;
use log::{error, info, warn};
use std::time::Instant;

use vafmean::aggregator::{AggregatorConfigBuilder, VafAggregator};
use vafmean::cli::aggregate::{AggregateSettings, check_aggregate_settings};
use vafmean::cli::core::{Commands, get_cli, init_logging};
use vafmean::parsing::vcf_reader::VcfRecordSource;
use vafmean::util::json_io::save_json;
use vafmean::util::progress_bar::get_record_spinner;
use vafmean::writers::vaf_table::VafTableWriter;

fn run_aggregate(settings: AggregateSettings) {
    // start the timer
    let start_time = Instant::now();

    // set up logging before we check the other settings
    init_logging(settings.verbosity);

    let settings = match check_aggregate_settings(settings) {
        Ok(s) => s,
        Err(e) => {
            error!("Error while verifying settings: {e:#}");
            std::process::exit(exitcode::CONFIG);
        }
    };

    // create a debug folder if specified
    if let Some(debug_folder) = settings.debug_folder.as_ref() {
        info!("Creating debug folder at {debug_folder:?}...");
        match std::fs::create_dir_all(debug_folder) {
            Ok(()) => {},
            Err(e) => {
                error!("Error while creating debug folder: {e}");
                std::process::exit(exitcode::IOERR);
            }
        }

        // save the CLI options
        let cli_json = debug_folder.join("cli_settings.json");
        info!("Saving CLI options to {cli_json:?}...");
        if let Err(e) = save_json(&settings, &cli_json) {
            error!("Error while saving CLI options: {e}");
            std::process::exit(exitcode::IOERR);
        }
    }

    // build our configuration
    let aggregator_config = match AggregatorConfigBuilder::default()
        .valid_genotypes(settings.genotype_set())
        .build() {
        Ok(ac) => ac,
        Err(e) => {
            error!("Error while building aggregator config: {e:?}");
            std::process::exit(exitcode::SOFTWARE);
        }
    };

    // open the input
    info!("Opening {:?}...", settings.vcf_filename);
    let record_source = match VcfRecordSource::from_path(&settings.vcf_filename) {
        Ok(rs) => rs,
        Err(e) => {
            error!("Error while opening input VCF: {e:#}");
            std::process::exit(exitcode::IOERR);
        }
    };
    let num_samples = record_source.sample_names().count();
    info!("Found {num_samples} samples in input VCF.");
    if num_samples == 0 {
        warn!("Input VCF has no samples, output will be empty.");
    }

    // single pass through all the records
    info!("Aggregating allele fractions...");
    let spinner = get_record_spinner(!settings.disable_progress);
    let mut aggregator = VafAggregator::new(aggregator_config);
    if let Err(e) = aggregator.aggregate(record_source.progress_with(spinner.clone())) {
        spinner.abandon();
        error!("Error while reading input VCF: {e:#}");
        std::process::exit(exitcode::IOERR);
    }
    spinner.finish();

    let (result, stats) = aggregator.finalize_with_stats();
    info!("Records processed: {}", stats.records_seen);
    if stats.records_skipped > 0 {
        warn!("Records skipped due to AD / allele mismatch: {}", stats.records_skipped);
    }
    info!("Sample calls: {}", stats.samples_seen);
    info!("\tRetained: {}", stats.samples_kept);
    info!("\tExcluded genotype: {}", stats.samples_invalid_genotype);
    info!("\tExcluded zero depth: {}", stats.samples_zero_depth);
    info!("Distinct genotypes observed: {:?}", stats.genotype_counts.keys().collect::<Vec<_>>());
    info!("Groups: {}", result.len());

    if let Some(debug_folder) = settings.debug_folder.as_ref() {
        let stats_json = debug_folder.join("aggregation_stats.json");
        info!("Saving aggregation stats to {stats_json:?}...");
        if let Err(e) = save_json(&stats, &stats_json) {
            error!("Error while saving aggregation stats: {e:#}");
            std::process::exit(exitcode::IOERR);
        }
    }

    // now write things
    match settings.output_filename.as_deref() {
        Some(output_fn) => info!("Saving output table to {output_fn:?}..."),
        None => info!("Writing output table to stdout...")
    };
    let mut table_writer = match VafTableWriter::from_output(settings.output_filename.as_deref(), settings.output_format) {
        Ok(tw) => tw,
        Err(e) => {
            error!("Error while opening output table: {e:#}");
            std::process::exit(exitcode::IOERR);
        }
    };
    if let Err(e) = table_writer.write_result(&result) {
        error!("Error while writing output table: {e:#}");
        std::process::exit(exitcode::IOERR);
    }
    if let Err(e) = table_writer.finish() {
        error!("Error while saving output table: {e:#}");
        std::process::exit(exitcode::IOERR);
    }

    info!("Aggregation completed in {} seconds.", start_time.elapsed().as_secs_f64());
}

fn main() {
    let cli = get_cli();
    match cli.command {
        Commands::Aggregate(settings) => {
            run_aggregate(*settings);
        }
    }

    info!("Process finished successfully.");
}
