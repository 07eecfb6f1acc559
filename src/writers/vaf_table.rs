
use anyhow::{anyhow, Context};
use itertools::Itertools;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use strum_macros::EnumString;

use crate::aggregator::{AggregationResult, GroupVaf};
use crate::data_types::group_key::GroupKey;

/// Layout of the output table
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, strum_macros::Display, EnumString, Serialize, clap::ValueEnum)]
pub enum OutputFormat {
    /// Space separated "chrom pos alleles fractions", no header and no genotype column
    #[default]
    #[strum(ascii_case_insensitive, serialize = "plain")]
    #[clap(name = "plain")]
    Plain,
    /// Tab-delimited with a header row and the genotype / sample count columns
    #[strum(ascii_case_insensitive, serialize = "tsv")]
    #[clap(name = "tsv")]
    Tsv,
    /// Comma-delimited with a header row and the genotype / sample count columns
    #[strum(ascii_case_insensitive, serialize = "csv")]
    #[clap(name = "csv")]
    Csv
}

/// Contains all the data written to each row of a delimited table
#[derive(Serialize)]
struct VafRow<'a> {
    /// Chromosome
    chrom: &'a str,
    /// 1-based position
    pos: u64,
    /// Comma-joined alleles, record order
    alleles: String,
    /// Canonical genotype
    genotype: &'a str,
    /// Number of samples averaged
    sample_count: u64,
    /// Comma-joined mean fractions, same order as alleles
    mean_vaf: String
}

enum TableSink<W: Write> {
    Plain(W),
    Delimited(csv::Writer<W>)
}

/// Writes finalized groups out one line (or row) at a time
pub struct VafTableWriter<W: Write> {
    /// Where rows go
    sink: TableSink<W>,
    /// Number of groups written so far
    rows_written: u64
}

/// Formats a fraction in shortest round-trip form, keeping a trailing ".0" on integral values (e.g. "1.0", "0.25")
pub fn format_fraction(value: f64) -> String {
    format!("{value:?}")
}

impl VafTableWriter<Box<dyn Write>> {
    /// Opens the output destination; stdout if no path is provided, gzip-compressed if the path ends in .gz
    /// # Arguments
    /// * `output` - optional output path
    /// * `format` - the table layout
    pub fn from_output(output: Option<&Path>, format: OutputFormat) -> anyhow::Result<Self> {
        let inner: Box<dyn Write> = match output {
            Some(filename) => {
                let file = File::create(filename)
                    .with_context(|| format!("Error while creating {filename:?}:"))?;
                if filename.extension().unwrap_or_default() == "gz" {
                    Box::new(BufWriter::new(
                        flate2::write::GzEncoder::new(file, flate2::Compression::default())
                    ))
                } else {
                    Box::new(BufWriter::new(file))
                }
            },
            None => Box::new(BufWriter::new(std::io::stdout()))
        };
        Ok(Self::from_writer(inner, format))
    }
}

impl<W: Write> VafTableWriter<W> {
    /// Wraps an existing writer
    /// # Arguments
    /// * `inner` - the destination
    /// * `format` - the table layout
    pub fn from_writer(inner: W, format: OutputFormat) -> Self {
        let sink = match format {
            OutputFormat::Plain => TableSink::Plain(inner),
            OutputFormat::Tsv | OutputFormat::Csv => {
                let delimiter: u8 = if format == OutputFormat::Csv { b',' } else { b'\t' };
                let csv_writer = csv::WriterBuilder::new()
                    .delimiter(delimiter)
                    .from_writer(inner);
                TableSink::Delimited(csv_writer)
            }
        };
        Self {
            sink,
            rows_written: 0
        }
    }

    /// Writes a single group
    /// # Arguments
    /// * `key` - the group identity
    /// * `group` - the finalized values
    pub fn write_group(&mut self, key: &GroupKey, group: &GroupVaf) -> anyhow::Result<()> {
        let mean_vaf = group.mean_fractions().iter()
            .map(|&f| format_fraction(f))
            .join(",");

        match &mut self.sink {
            TableSink::Plain(writer) => {
                writeln!(writer, "{} {} {} {}", key.chromosome(), key.position(), key.allele_key(), mean_vaf)?;
            },
            TableSink::Delimited(csv_writer) => {
                let row = VafRow {
                    chrom: key.chromosome(),
                    pos: key.position(),
                    alleles: key.allele_key(),
                    genotype: key.genotype(),
                    sample_count: group.sample_count(),
                    mean_vaf
                };
                csv_writer.serialize(&row)?;
            }
        };
        self.rows_written += 1;
        Ok(())
    }

    /// Writes every group in the result, preserving result order
    /// # Arguments
    /// * `result` - the finalized aggregation
    pub fn write_result(&mut self, result: &AggregationResult) -> anyhow::Result<()> {
        for (key, group) in result.iter() {
            self.write_group(key, group)
                .with_context(|| format!("Error while writing group {key}:"))?;
        }
        Ok(())
    }

    /// Flushes everything and hands back the underlying writer
    pub fn finish(self) -> anyhow::Result<W> {
        match self.sink {
            TableSink::Plain(mut writer) => {
                writer.flush()?;
                Ok(writer)
            },
            TableSink::Delimited(csv_writer) => {
                csv_writer.into_inner()
                    .map_err(|e| anyhow!("Error while flushing output: {}", e.error()))
            }
        }
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }
}
