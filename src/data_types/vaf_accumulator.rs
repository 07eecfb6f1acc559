
use std::ops::AddAssign;

/// Running element-wise sum of fraction vectors, with the number of vectors added
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VafAccumulator {
    /// Per-allele sum of fractions
    sums: Vec<f64>,
    /// Number of vectors that went into `sums`
    count: u64
}

impl AddAssign<&[f64]> for VafAccumulator {
    // Enables += with a fraction vector
    fn add_assign(&mut self, rhs: &[f64]) {
        self.add(rhs);
    }
}

impl VafAccumulator {
    /// Adds a single sample's fraction vector.
    /// The first vector fixes the width; all later vectors are expected to match it.
    /// # Arguments
    /// * `fractions` - allele fractions for one sample
    pub fn add(&mut self, fractions: &[f64]) {
        if self.count == 0 {
            self.sums = fractions.to_vec();
        } else {
            debug_assert_eq!(self.sums.len(), fractions.len());
            for (s, &f) in self.sums.iter_mut().zip(fractions.iter()) {
                *s += f;
            }
        }
        self.count += 1;
    }

    /// Element-wise mean of everything added; empty if nothing was added
    pub fn mean(&self) -> Vec<f64> {
        if self.count == 0 {
            return vec![];
        }
        let denom = self.count as f64;
        self.sums.iter().map(|&s| s / denom).collect()
    }

    // getters
    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn sums(&self) -> &[f64] {
        &self.sums
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx_eq::assert_approx_eq;

    #[test]
    fn test_mean() {
        let mut acc = VafAccumulator::default();
        acc.add(&[1.0, 0.0]);
        acc.add(&[0.5, 0.5]);
        assert_eq!(acc.count(), 2);
        assert_eq!(acc.mean(), vec![0.75, 0.25]);
    }

    #[test]
    fn test_add_assign() {
        let mut acc = VafAccumulator::default();
        acc += &[0.2, 0.3, 0.5][..];
        acc += &[0.0, 0.0, 1.0][..];
        acc += &[0.1, 0.6, 0.3][..];
        let mean = acc.mean();
        assert_approx_eq!(mean[0], 0.1);
        assert_approx_eq!(mean[1], 0.3);
        assert_approx_eq!(mean[2], 0.6);
    }

    #[test]
    fn test_empty() {
        let acc = VafAccumulator::default();
        assert_eq!(acc.count(), 0);
        assert!(acc.mean().is_empty());
    }
}
