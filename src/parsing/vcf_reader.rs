
use anyhow::{anyhow, bail, Context};
use log::{debug, trace};
use noodles::vcf;
use noodles::vcf::variant::record::samples::keys::key as vcf_key;
use noodles::vcf::variant::record_buf::samples::sample::Value;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::data_types::variant_record::{SampleCall, VariantRecord};

/// Lazy, single-pass iterator over the records in a VCF stream.
/// Each record is converted into a `VariantRecord` with GT rendered as text and AD as integers.
pub struct VcfRecordSource<R: BufRead> {
    /// The underlying VCF reader
    reader: vcf::io::Reader<R>,
    /// Header parsed at construction
    header: vcf::Header,
    /// Re-used buffer for each record
    record_buf: vcf::variant::RecordBuf,
    /// Number of records pulled so far, used for error messages
    records_read: u64
}

impl VcfRecordSource<BufReader<Box<dyn Read>>> {
    /// Opens a VCF file, handling both BGZF compressed (.gz) and uncompressed inputs
    /// # Arguments
    /// * `filename` - path to the .vcf(.gz) file to open
    pub fn from_path(filename: &Path) -> anyhow::Result<Self> {
        let is_compressed = match filename.extension() {
            Some(extension) => {
                extension == "gz"
            },
            None => false
        };

        let buf_reader: Box<dyn Read> = if is_compressed {
            #[allow(clippy::default_constructed_unit_structs)]
            let bgzf_reader = noodles::bgzf::io::reader::Builder::default()
                .build_from_path(filename)
                .with_context(|| format!("Error while loading {filename:?}:"))?;
            Box::new(bgzf_reader)
        } else {
            Box::new(
                std::fs::File::open(filename)
                    .with_context(|| format!("Error while loading {filename:?}:"))?
            )
        };

        Self::from_reader(BufReader::new(buf_reader))
            .with_context(|| format!("Error while reading header of {filename:?}:"))
    }
}

impl<R: BufRead> VcfRecordSource<R> {
    /// Wraps any buffered reader containing VCF text; the header is read immediately.
    /// # Arguments
    /// * `inner` - the VCF text stream
    pub fn from_reader(inner: R) -> anyhow::Result<Self> {
        let mut reader = vcf::io::Reader::new(inner);
        let header = reader.read_header()?;
        debug!("Found {} samples in VCF header.", header.sample_names().len());
        Ok(Self {
            reader,
            header,
            record_buf: Default::default(),
            records_read: 0
        })
    }

    // getters
    pub fn header(&self) -> &vcf::Header {
        &self.header
    }

    pub fn sample_names(&self) -> impl Iterator<Item = &str> {
        self.header.sample_names().iter().map(|s| s.as_str())
    }

    pub fn records_read(&self) -> u64 {
        self.records_read
    }
}

impl<R: BufRead> Iterator for VcfRecordSource<R> {
    type Item = anyhow::Result<VariantRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read_record_buf(&self.header, &mut self.record_buf) {
            Ok(0) => None,
            Ok(_) => {
                self.records_read += 1;
                let record_index = self.records_read;
                Some(
                    parse_record(&self.record_buf)
                        .with_context(|| format!("Error while parsing VCF record #{record_index}:"))
                )
            },
            Err(e) => {
                let record_index = self.records_read + 1;
                Some(Err(e).with_context(|| format!("Error while reading VCF record #{record_index}:")))
            }
        }
    }
}

/// Converts a noodles record into our owned `VariantRecord`
/// # Arguments
/// * `record` - the record to convert
fn parse_record(record: &vcf::variant::RecordBuf) -> anyhow::Result<VariantRecord> {
    let chrom = record.reference_sequence_name().to_string();
    let pos = record.variant_start().ok_or(anyhow!("Missing POS"))?; // 1-based

    // REF then each ALT
    let alleles: Vec<String> = std::iter::once(record.reference_bases().to_string())
        .chain(record.alternate_bases().as_ref().iter().cloned())
        .collect();

    let mut samples = vec![];
    for sample in record.samples().values() {
        let genotype = match sample.get(vcf_key::GENOTYPE) {
            Some(Some(gt)) => genotype_to_string(gt)?,
            Some(None) | None => ".".to_string()
        };

        let allelic_depths = match sample.get(vcf_key::READ_DEPTHS) {
            Some(Some(ad)) => parse_allelic_depths(ad)?,
            Some(None) | None => vec![]
        };

        samples.push(SampleCall::new(genotype, allelic_depths));
    }

    trace!("{chrom}\t{pos}\t{alleles:?}\t{} samples", samples.len());
    Ok(VariantRecord::new(chrom, pos.get() as u64, alleles, samples))
}

/// Renders the GT field back into the VCF text form, e.g. "0/1", "0|1", "./.", or "0" for haploid.
/// The separator in front of each allele after the first comes from that allele's phasing.
/// # Arguments
/// * `gt` - the GT field from the record
fn genotype_to_string(gt: &Value) -> anyhow::Result<String> {
    use vcf::variant::record::samples::series::value::genotype::Phasing;

    match gt {
        Value::Genotype(genotype) => {
            let alleles = genotype.as_ref();
            if alleles.is_empty() {
                return Ok(".".to_string());
            }

            let mut ret = String::new();
            for (i, allele) in alleles.iter().enumerate() {
                if i > 0 {
                    let separator = match allele.phasing() {
                        Phasing::Phased => '|',
                        Phasing::Unphased => '/'
                    };
                    ret.push(separator);
                }
                match allele.position() {
                    Some(index) => ret.push_str(&index.to_string()),
                    None => ret.push('.')
                };
            }
            Ok(ret)
        },
        // some VCFs declare GT with an unexpected type, keep the raw text
        Value::String(s) => Ok(s.clone()),
        other => bail!("Unexpected GT value: {other:?}")
    }
}

/// Parses the AD field into counts.
/// A missing element anywhere makes the AD unusable, which we represent as no depth at all.
/// # Arguments
/// * `ad` - the AD field from the record
/// # Errors
/// * if any count is negative or not an integer
fn parse_allelic_depths(ad: &Value) -> anyhow::Result<Vec<u32>> {
    use vcf::variant::record_buf::samples::sample::value::Array;

    let raw_values: Vec<Option<i32>> = match ad {
        Value::Integer(v) => vec![Some(*v)],
        Value::Array(Array::Integer(values)) => values.clone(),
        Value::String(s) => {
            // AD without a header definition comes through as raw text
            s.split(',')
                .map(|v| {
                    if v == "." {
                        Ok(None)
                    } else {
                        v.parse::<i32>()
                            .map(Some)
                            .with_context(|| format!("Error while parsing AD value {v:?}:"))
                    }
                })
                .collect::<anyhow::Result<Vec<Option<i32>>>>()?
        },
        other => bail!("Unexpected AD value: {other:?}")
    };

    if raw_values.iter().any(|v| v.is_none()) {
        return Ok(vec![]);
    }

    raw_values.into_iter()
        .flatten()
        .map(|v| {
            u32::try_from(v)
                .map_err(|_e| anyhow!("AD values must be non-negative, found {v}"))
        })
        .collect()
}
