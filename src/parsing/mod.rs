/*!
# Parsing module
Contains the logic for parsing input files into meaningful structs / data.
*/
/// Streams VCF records into `VariantRecord`s
pub mod vcf_reader;
