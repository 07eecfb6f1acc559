
use itertools::Itertools;

/// A single sample's call at a site
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SampleCall {
    /// GT as text, e.g. "0/1", "0|1", "./."
    genotype: String,
    /// AD values, one per allele and in the same order as the record alleles
    allelic_depths: Vec<u32>
}

impl SampleCall {
    /// Constructor
    /// # Arguments
    /// * `genotype` - the raw genotype string
    /// * `allelic_depths` - read counts supporting each allele
    pub fn new(genotype: String, allelic_depths: Vec<u32>) -> Self {
        Self {
            genotype,
            allelic_depths
        }
    }

    /// Total informative depth, which is the sum of AD and *not* the DP field
    pub fn total_depth(&self) -> u64 {
        self.allelic_depths.iter().map(|&d| d as u64).sum()
    }

    /// Returns the fraction of reads supporting each allele, or None if there are no informative reads.
    pub fn allele_fractions(&self) -> Option<Vec<f64>> {
        let depth = self.total_depth();
        if depth == 0 {
            return None;
        }
        let depth = depth as f64;
        Some(self.allelic_depths.iter()
            .map(|&d| d as f64 / depth)
            .collect())
    }

    // getters
    pub fn genotype(&self) -> &str {
        &self.genotype
    }

    pub fn allelic_depths(&self) -> &[u32] {
        &self.allelic_depths
    }
}

/// One site from the input, with all sample calls
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VariantRecord {
    /// Chromosome / contig name
    chromosome: String,
    /// 1-based coordinate
    position: u64,
    /// REF followed by each ALT, order is preserved
    alleles: Vec<String>,
    /// Per-sample calls, in header order
    samples: Vec<SampleCall>
}

impl VariantRecord {
    /// Constructor
    /// # Arguments
    /// * `chromosome` - the contig name
    /// * `position` - 1-based position
    /// * `alleles` - ordered alleles, REF first
    /// * `samples` - the per-sample calls
    pub fn new(chromosome: String, position: u64, alleles: Vec<String>, samples: Vec<SampleCall>) -> Self {
        Self {
            chromosome,
            position,
            alleles,
            samples
        }
    }

    /// Comma-joined alleles in record order, e.g. "T,A"
    pub fn allele_key(&self) -> String {
        self.alleles.iter().join(",")
    }

    // getters
    pub fn chromosome(&self) -> &str {
        &self.chromosome
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn alleles(&self) -> &[String] {
        &self.alleles
    }

    pub fn samples(&self) -> &[SampleCall] {
        &self.samples
    }
}
