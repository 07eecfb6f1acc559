
use indexmap::IndexSet;
use serde::Serialize;

/// The canonical genotypes we retain by default; these cover the haploid-style calls we expect in the cohort
pub const DEFAULT_VALID_GENOTYPES: [&str; 4] = ["0/0", "0/1", "1/1", "./."];

/// Collapses phasing notation and the half-missing call onto the canonical unphased form.
/// Anything not in the lookup passes through unchanged.
/// # Arguments
/// * `genotype` - the raw GT string, e.g. "0|1"
pub fn normalize_genotype(genotype: &str) -> &str {
    match genotype {
        "0|0" => "0/0",
        "0|1" => "0/1",
        "1|1" => "1/1",
        "0/." => "./.",
        other => other
    }
}

/// The explicit set of canonical genotypes that a sample must carry to contribute to a group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GenotypeSet {
    /// Canonical genotype strings, in the order they were provided
    genotypes: IndexSet<String>
}

impl Default for GenotypeSet {
    fn default() -> Self {
        Self::new(DEFAULT_VALID_GENOTYPES)
    }
}

impl GenotypeSet {
    /// Creates a set from any genotype strings, normalizing each one on the way in.
    /// # Arguments
    /// * `genotypes` - the genotypes to retain; phased forms are accepted and collapsed
    pub fn new<I, S>(genotypes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>
    {
        let genotypes = genotypes.into_iter()
            .map(|gt| normalize_genotype(gt.as_ref()).to_string())
            .collect();
        Self {
            genotypes
        }
    }

    /// Returns true if the canonical genotype is retained
    pub fn contains(&self, canonical_genotype: &str) -> bool {
        self.genotypes.contains(canonical_genotype)
    }

    pub fn is_empty(&self) -> bool {
        self.genotypes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.genotypes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.genotypes.iter().map(|s| s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_genotype() {
        assert_eq!(normalize_genotype("0|0"), "0/0");
        assert_eq!(normalize_genotype("0|1"), "0/1");
        assert_eq!(normalize_genotype("1|1"), "1/1");
        assert_eq!(normalize_genotype("0/."), "./.");

        // canonical forms are untouched
        for gt in DEFAULT_VALID_GENOTYPES {
            assert_eq!(normalize_genotype(gt), gt);
        }

        // unrecognized values pass through
        assert_eq!(normalize_genotype("1|0"), "1|0");
        assert_eq!(normalize_genotype("1/2"), "1/2");
        assert_eq!(normalize_genotype("./0"), "./0");
        assert_eq!(normalize_genotype("."), ".");
        assert_eq!(normalize_genotype(""), "");
    }

    #[test]
    fn test_normalize_idempotent() {
        let inputs = ["0|0", "0|1", "1|1", "0/.", "0/0", "0/1", "1/1", "./.", "1|0", "2|2", ".|.", "0", "garbage"];
        for gt in inputs {
            let once = normalize_genotype(gt);
            assert_eq!(normalize_genotype(once), once);
        }
    }

    #[test]
    fn test_genotype_set() {
        let default_set = GenotypeSet::default();
        assert_eq!(default_set.len(), 4);
        assert!(default_set.contains("0/0"));
        assert!(default_set.contains("0/1"));
        assert!(default_set.contains("1/1"));
        assert!(default_set.contains("./."));
        assert!(!default_set.contains("0|1"));
        assert!(!default_set.contains("1/2"));

        // phased inputs collapse onto the same entry
        let custom = GenotypeSet::new(["0|1", "0/1", "1|1"]);
        assert_eq!(custom.len(), 2);
        assert_eq!(custom.iter().collect::<Vec<&str>>(), vec!["0/1", "1/1"]);
        assert!(!custom.contains("0/0"));

        let empty = GenotypeSet::new(Vec::<String>::new());
        assert!(empty.is_empty());
    }
}
