/// Genotype normalization and the set of genotypes we retain
pub mod genotype;
/// The composite key that defines an aggregation group
pub mod group_key;
/// Running per-allele sums used to compute group means
pub mod vaf_accumulator;
/// Owned representation of a VCF site and its sample calls
pub mod variant_record;
