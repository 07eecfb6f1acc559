/*!
# VAF Aggregator
Groups sample calls by site, exact allele ordering, and canonical genotype, then averages the per-sample allele fractions within each group.
Samples are only retained if their normalized genotype is in the configured `GenotypeSet` and they have a non-zero total AD.

## Example usage
```rust
use vafmean::aggregator::{AggregatorConfig, VafAggregator};
use vafmean::data_types::variant_record::{SampleCall, VariantRecord};

let record = VariantRecord::new(
    "chr1".to_string(), 100,
    vec!["T".to_string(), "A".to_string()],
    vec![
        SampleCall::new("0/0".to_string(), vec![10, 0]),
        SampleCall::new("0|1".to_string(), vec![6, 6]),
        SampleCall::new("1/2".to_string(), vec![3, 3]), // not a retained genotype
    ]
);

let mut aggregator = VafAggregator::new(AggregatorConfig::default());
aggregator.add_record(&record).unwrap();
let result = aggregator.finalize();

assert_eq!(result.len(), 2);
let means: Vec<(String, Vec<f64>)> = result.iter()
    .map(|(key, group)| (key.genotype().to_string(), group.mean_fractions().to_vec()))
    .collect();
assert_eq!(means, vec![
    ("0/0".to_string(), vec![1.0, 0.0]),
    ("0/1".to_string(), vec![0.5, 0.5]),
]);
```
*/
use derive_builder::Builder;
use indexmap::IndexMap;
use log::{trace, warn};
use serde::{Deserialize, Serialize};

use crate::data_types::genotype::{normalize_genotype, GenotypeSet};
use crate::data_types::group_key::GroupKey;
use crate::data_types::vaf_accumulator::VafAccumulator;
use crate::data_types::variant_record::VariantRecord;

/// Controls which samples are retained during aggregation
#[derive(Builder, Clone, Debug, Default)]
#[builder(default)]
pub struct AggregatorConfig {
    /// Canonical genotypes that are allowed to contribute
    valid_genotypes: GenotypeSet
}

impl AggregatorConfig {
    pub fn valid_genotypes(&self) -> &GenotypeSet {
        &self.valid_genotypes
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum AggregationError {
    #[error("{chromosome}:{position} sample #{sample_index} has {num_depths} AD values for {num_alleles} alleles")]
    AlleleDepthMismatch {
        chromosome: String,
        position: u64,
        sample_index: usize,
        num_alleles: usize,
        num_depths: usize
    }
}

/// Counters describing what happened to the records and samples that went through the aggregator
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct AggregationStats {
    /// Number of records provided
    pub records_seen: u64,
    /// Records dropped entirely because a retained sample had mismatched AD length
    pub records_skipped: u64,
    /// Number of sample calls across all accepted records
    pub samples_seen: u64,
    /// Sample calls that contributed to a group
    pub samples_kept: u64,
    /// Sample calls with a genotype outside the valid set (checked first)
    pub samples_invalid_genotype: u64,
    /// Sample calls with a valid genotype but no informative reads
    pub samples_zero_depth: u64,
    /// Every raw GT string observed, prior to normalization, with the number of times it was seen
    pub genotype_counts: IndexMap<String, u64>
}

/// The finalized values for a single group
#[derive(Clone, Debug, PartialEq)]
pub struct GroupVaf {
    /// Element-wise mean of the sample fraction vectors, same order as the alleles
    mean_fractions: Vec<f64>,
    /// Number of samples averaged
    sample_count: u64
}

impl GroupVaf {
    pub fn mean_fractions(&self) -> &[f64] {
        &self.mean_fractions
    }

    pub fn sample_count(&self) -> u64 {
        self.sample_count
    }
}

/// Final output, ordered by the first time each group received a sample
pub type AggregationResult = IndexMap<GroupKey, GroupVaf>;

/// Owns all of the accumulation state for a single run
#[derive(Debug, Default)]
pub struct VafAggregator {
    /// Filtering configuration
    config: AggregatorConfig,
    /// Running sums for each group, created lazily on first contribution
    groups: IndexMap<GroupKey, VafAccumulator>,
    /// Tracking counters
    stats: AggregationStats
}

impl VafAggregator {
    /// Creates an empty aggregator
    /// # Arguments
    /// * `config` - the filtering configuration
    pub fn new(config: AggregatorConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Adds all retained samples from a single record.
    /// If any retained sample has an AD length that does not match the allele count, the whole record is rejected and nothing is added.
    /// # Arguments
    /// * `record` - the record to add
    /// # Errors
    /// * if a retained sample has a different number of AD values than alleles
    pub fn add_record(&mut self, record: &VariantRecord) -> Result<(), AggregationError> {
        self.stats.records_seen += 1;
        let num_alleles = record.alleles().len();

        // first pass: collect everything this record contributes without touching the groups
        let mut contributions: Vec<(&str, Vec<f64>)> = vec![];
        let mut invalid_genotype = 0;
        let mut zero_depth = 0;
        for (sample_index, sample) in record.samples().iter().enumerate() {
            let canonical_gt = normalize_genotype(sample.genotype());
            if !self.config.valid_genotypes.contains(canonical_gt) {
                invalid_genotype += 1;
                continue;
            }

            let fractions = match sample.allele_fractions() {
                Some(f) => f,
                None => {
                    zero_depth += 1;
                    continue;
                }
            };

            if fractions.len() != num_alleles {
                self.stats.records_skipped += 1;
                return Err(AggregationError::AlleleDepthMismatch {
                    chromosome: record.chromosome().to_string(),
                    position: record.position(),
                    sample_index,
                    num_alleles,
                    num_depths: fractions.len()
                });
            }
            contributions.push((canonical_gt, fractions));
        }

        // record is accepted, update everything
        for sample in record.samples().iter() {
            *self.stats.genotype_counts.entry(sample.genotype().to_string()).or_insert(0) += 1;
        }
        self.stats.samples_seen += record.samples().len() as u64;
        self.stats.samples_invalid_genotype += invalid_genotype;
        self.stats.samples_zero_depth += zero_depth;
        self.stats.samples_kept += contributions.len() as u64;

        for (canonical_gt, fractions) in contributions.into_iter() {
            trace!("\t{}:{} {} {canonical_gt} => {fractions:?}", record.chromosome(), record.position(), record.allele_key());
            let key = GroupKey::new(
                record.chromosome().to_string(),
                record.position(),
                record.alleles().to_vec(),
                canonical_gt.to_string()
            );
            let entry = self.groups.entry(key).or_default();
            *entry += fractions.as_slice();
        }

        Ok(())
    }

    /// Consumes a record stream in a single forward pass.
    /// Records with mismatched AD lengths are logged and skipped; errors from the stream itself are returned immediately.
    /// # Arguments
    /// * `records` - the record stream, typically a `VcfRecordSource`
    /// # Errors
    /// * any error produced by the record stream
    pub fn aggregate<I, E>(&mut self, records: I) -> Result<(), E>
    where
        I: IntoIterator<Item = Result<VariantRecord, E>>
    {
        for result in records {
            let record = result?;
            if let Err(e) = self.add_record(&record) {
                warn!("Skipping record: {e}");
            }
        }
        Ok(())
    }

    /// Computes the mean fraction vector for every group and releases the accumulation state.
    pub fn finalize(self) -> AggregationResult {
        self.groups.into_iter()
            .map(|(key, acc)| {
                let group = GroupVaf {
                    mean_fractions: acc.mean(),
                    sample_count: acc.count()
                };
                (key, group)
            })
            .collect()
    }

    /// Same as `finalize`, but also returns the tracking counters
    pub fn finalize_with_stats(mut self) -> (AggregationResult, AggregationStats) {
        let stats = std::mem::take(&mut self.stats);
        (self.finalize(), stats)
    }

    // getters
    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    pub fn stats(&self) -> &AggregationStats {
        &self.stats
    }

    pub fn num_groups(&self) -> usize {
        self.groups.len()
    }

    /// Number of samples accumulated in a group so far, 0 if the group does not exist
    pub fn group_count(&self, key: &GroupKey) -> u64 {
        self.groups.get(key).map(|acc| acc.count()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx_eq::assert_approx_eq;

    use crate::data_types::genotype::GenotypeSet;
    use crate::data_types::variant_record::SampleCall;

    fn sample(gt: &str, ad: &[u32]) -> SampleCall {
        SampleCall::new(gt.to_string(), ad.to_vec())
    }

    fn record(chrom: &str, pos: u64, alleles: &[&str], samples: Vec<SampleCall>) -> VariantRecord {
        VariantRecord::new(
            chrom.to_string(), pos,
            alleles.iter().map(|s| s.to_string()).collect(),
            samples
        )
    }

    fn key(chrom: &str, pos: u64, alleles: &[&str], gt: &str) -> GroupKey {
        GroupKey::new(
            chrom.to_string(), pos,
            alleles.iter().map(|s| s.to_string()).collect(),
            gt.to_string()
        )
    }

    #[test]
    fn test_basic_scenario() {
        let mut aggregator = VafAggregator::new(AggregatorConfig::default());
        aggregator.add_record(&record("chr1", 100, &["T", "A"], vec![
            sample("0/0", &[10, 0]),
            sample("0|1", &[6, 6])
        ])).unwrap();

        let result = aggregator.finalize();
        assert_eq!(result.len(), 2);

        let g00 = result.get(&key("chr1", 100, &["T", "A"], "0/0")).unwrap();
        assert_eq!(g00.mean_fractions(), &[1.0, 0.0]);
        assert_eq!(g00.sample_count(), 1);

        let g01 = result.get(&key("chr1", 100, &["T", "A"], "0/1")).unwrap();
        assert_eq!(g01.mean_fractions(), &[0.5, 0.5]);
        assert_eq!(g01.sample_count(), 1);

        // phased key never exists
        assert!(result.get(&key("chr1", 100, &["T", "A"], "0|1")).is_none());
    }

    #[test]
    fn test_mean_across_samples() {
        let mut aggregator = VafAggregator::new(AggregatorConfig::default());
        aggregator.add_record(&record("chr1", 5, &["G", "C"], vec![
            sample("1/1", &[0, 4]),
            sample("1|1", &[2, 2])
        ])).unwrap();

        let result = aggregator.finalize();
        assert_eq!(result.len(), 1);
        let group = result.get(&key("chr1", 5, &["G", "C"], "1/1")).unwrap();
        assert_eq!(group.mean_fractions(), &[0.25, 0.75]);
        assert_eq!(group.sample_count(), 2);
    }

    #[test]
    fn test_invalid_genotype_excluded() {
        let mut aggregator = VafAggregator::new(AggregatorConfig::default());
        aggregator.add_record(&record("chr1", 100, &["T", "A", "C"], vec![
            sample("1/2", &[1, 5, 5]),
            sample("1|0", &[5, 5, 0]),
            sample("0/0", &[9, 1, 0])
        ])).unwrap();

        assert_eq!(aggregator.num_groups(), 1);
        assert_eq!(aggregator.stats().samples_invalid_genotype, 2);
        assert_eq!(aggregator.stats().samples_kept, 1);

        let result = aggregator.finalize();
        assert!(result.keys().all(|k| k.genotype() == "0/0"));
    }

    #[test]
    fn test_zero_depth_excluded() {
        let mut aggregator = VafAggregator::new(AggregatorConfig::default());
        let k = key("chr1", 100, &["T", "A"], "0/1");

        aggregator.add_record(&record("chr1", 100, &["T", "A"], vec![
            sample("0/1", &[3, 1])
        ])).unwrap();
        assert_eq!(aggregator.group_count(&k), 1);

        // zero depth does not change the list length
        aggregator.add_record(&record("chr1", 100, &["T", "A"], vec![
            sample("0/1", &[0, 0]),
            sample("0/1", &[])
        ])).unwrap();
        assert_eq!(aggregator.group_count(&k), 1);
        assert_eq!(aggregator.stats().samples_zero_depth, 2);

        // a zero depth sample alone never creates a group
        aggregator.add_record(&record("chr2", 7, &["A", "G"], vec![
            sample("0/0", &[0, 0])
        ])).unwrap();
        assert_eq!(aggregator.num_groups(), 1);
        assert_eq!(aggregator.group_count(&key("chr2", 7, &["A", "G"], "0/0")), 0);

        let result = aggregator.finalize();
        assert_eq!(result.get(&k).unwrap().mean_fractions(), &[0.75, 0.25]);
    }

    #[test]
    fn test_allele_order_groups() {
        let mut aggregator = VafAggregator::new(AggregatorConfig::default());
        aggregator.aggregate(vec![
            Ok::<VariantRecord, std::io::Error>(record("chr1", 100, &["A", "B"], vec![sample("0/1", &[1, 3])])),
            Ok(record("chr1", 100, &["B", "A"], vec![sample("0/1", &[3, 1])])),
            Ok(record("chr1", 100, &["A", "B"], vec![sample("0/1", &[3, 1])]))
        ]).unwrap();

        let result = aggregator.finalize();
        assert_eq!(result.len(), 2);

        // insertion order follows first contribution
        let keys: Vec<String> = result.keys().map(|k| k.allele_key()).collect();
        assert_eq!(keys, vec!["A,B".to_string(), "B,A".to_string()]);

        let ab = result.get(&key("chr1", 100, &["A", "B"], "0/1")).unwrap();
        assert_eq!(ab.mean_fractions(), &[0.5, 0.5]);
        assert_eq!(ab.sample_count(), 2);
        let ba = result.get(&key("chr1", 100, &["B", "A"], "0/1")).unwrap();
        assert_eq!(ba.mean_fractions(), &[0.75, 0.25]);
    }

    #[test]
    fn test_missing_genotypes() {
        let mut aggregator = VafAggregator::new(AggregatorConfig::default());
        aggregator.add_record(&record("chrM", 3010, &["G", "A"], vec![
            sample("./.", &[2, 8]),
            sample("0/.", &[8, 2]),
            sample(".", &[5, 5])
        ])).unwrap();

        let result = aggregator.finalize();
        assert_eq!(result.len(), 1);
        let group = result.get(&key("chrM", 3010, &["G", "A"], "./.")).unwrap();
        assert_eq!(group.mean_fractions(), &[0.5, 0.5]);
        assert_eq!(group.sample_count(), 2);
    }

    #[test]
    fn test_fractions_sum_to_one() {
        let mut aggregator = VafAggregator::new(AggregatorConfig::default());
        aggregator.add_record(&record("chr3", 42, &["A", "C", "G"], vec![
            sample("0/1", &[3, 7, 1]),
            sample("0/1", &[13, 2, 5]),
            sample("0/1", &[1, 1, 1])
        ])).unwrap();

        let result = aggregator.finalize();
        let group = result.get(&key("chr3", 42, &["A", "C", "G"], "0/1")).unwrap();
        assert_eq!(group.mean_fractions().len(), 3);
        assert_approx_eq!(group.mean_fractions().iter().sum::<f64>(), 1.0);
    }

    #[test]
    fn test_length_mismatch_skips_record() {
        let mut aggregator = VafAggregator::new(AggregatorConfig::default());
        let bad = record("chr1", 100, &["T", "A"], vec![
            sample("0/0", &[10, 0]),
            sample("0/1", &[1, 2, 3])
        ]);
        let err = aggregator.add_record(&bad).unwrap_err();
        assert_eq!(err, AggregationError::AlleleDepthMismatch {
            chromosome: "chr1".to_string(),
            position: 100,
            sample_index: 1,
            num_alleles: 2,
            num_depths: 3
        });

        // nothing from the bad record is retained, including the valid first sample
        assert_eq!(aggregator.num_groups(), 0);
        assert_eq!(aggregator.stats().records_seen, 1);
        assert_eq!(aggregator.stats().records_skipped, 1);
        assert_eq!(aggregator.stats().samples_seen, 0);
        assert!(aggregator.stats().genotype_counts.is_empty());

        // filtered samples are not checked for length
        let filtered = record("chr1", 101, &["T", "A"], vec![
            sample("1/2", &[1, 2, 3]),
            sample("0/1", &[0, 0, 0]),
            sample("0/1", &[4, 4])
        ]);
        aggregator.add_record(&filtered).unwrap();
        assert_eq!(aggregator.num_groups(), 1);
    }

    #[test]
    fn test_aggregate_continues_after_mismatch() {
        let mut aggregator = VafAggregator::new(AggregatorConfig::default());
        aggregator.aggregate(vec![
            Ok::<VariantRecord, std::io::Error>(record("chr1", 1, &["A", "C"], vec![sample("0/1", &[1])])),
            Ok(record("chr1", 2, &["A", "C"], vec![sample("0/1", &[1, 1])]))
        ]).unwrap();

        let (result, stats) = aggregator.finalize_with_stats();
        assert_eq!(result.len(), 1);
        assert_eq!(stats.records_seen, 2);
        assert_eq!(stats.records_skipped, 1);
    }

    #[test]
    fn test_aggregate_stream_error() {
        let mut aggregator = VafAggregator::new(AggregatorConfig::default());
        let records: Vec<Result<VariantRecord, String>> = vec![
            Ok(record("chr1", 1, &["A", "C"], vec![sample("0/1", &[1, 1])])),
            Err("truncated input".to_string()),
            Ok(record("chr1", 3, &["A", "C"], vec![sample("0/1", &[1, 1])]))
        ];
        let err = aggregator.aggregate(records).unwrap_err();
        assert_eq!(err, "truncated input");
        assert_eq!(aggregator.stats().records_seen, 1);
    }

    #[test]
    fn test_custom_genotypes() {
        let config = AggregatorConfigBuilder::default()
            .valid_genotypes(GenotypeSet::new(["1|1"]))
            .build().unwrap();
        let mut aggregator = VafAggregator::new(config);
        aggregator.add_record(&record("chr1", 100, &["T", "A"], vec![
            sample("0/0", &[10, 0]),
            sample("0/1", &[5, 5]),
            sample("1/1", &[1, 9])
        ])).unwrap();

        let result = aggregator.finalize();
        assert_eq!(result.len(), 1);
        assert!(result.contains_key(&key("chr1", 100, &["T", "A"], "1/1")));
    }

    #[test]
    fn test_genotype_tally() {
        let mut aggregator = VafAggregator::new(AggregatorConfig::default());
        aggregator.add_record(&record("chr1", 100, &["T", "A"], vec![
            sample("0|1", &[5, 5]),
            sample("0/1", &[5, 5]),
            sample("0|1", &[0, 0]),
            sample("2/2", &[1, 1])
        ])).unwrap();

        let stats = aggregator.stats();
        assert_eq!(stats.samples_seen, 4);
        assert_eq!(stats.samples_kept, 2);
        assert_eq!(stats.samples_zero_depth, 1);
        assert_eq!(stats.samples_invalid_genotype, 1);
        let tally: Vec<(&str, u64)> = stats.genotype_counts.iter().map(|(k, &v)| (k.as_str(), v)).collect();
        assert_eq!(tally, vec![("0|1", 2), ("0/1", 1), ("2/2", 1)]);
    }
}
