
use itertools::Itertools;

/// The unit of aggregation: a site, its exact allele ordering, and the canonical genotype.
/// Alleles are compared in order, so [A, B] and [B, A] are different groups.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct GroupKey {
    chromosome: String,
    /// 1-based
    position: u64,
    alleles: Vec<String>,
    /// Always a post-normalization genotype
    genotype: String
}

impl std::fmt::Display for GroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {} {}", self.chromosome, self.position, self.allele_key(), self.genotype)
    }
}

impl GroupKey {
    /// Constructor
    /// # Arguments
    /// * `chromosome` - contig name
    /// * `position` - 1-based coordinate
    /// * `alleles` - the ordered alleles at the site
    /// * `genotype` - canonical genotype
    pub fn new(chromosome: String, position: u64, alleles: Vec<String>, genotype: String) -> Self {
        Self {
            chromosome,
            position,
            alleles,
            genotype
        }
    }

    /// Comma-joined alleles in the stored order
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

    pub fn genotype(&self) -> &str {
        &self.genotype
    }
}
