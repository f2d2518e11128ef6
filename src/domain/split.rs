// ============================================================
// Layer 3 — DatasetSplit Domain Type
// ============================================================
// Index partitions of one dataset into train / validation /
// test. The split is derived once and persisted next to the
// checkpoint so that `evaluate` scores exactly the samples the
// model never trained on.

use serde::{Deserialize, Serialize};

/// Fractions of the dataset assigned to each partition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitRatios {
    pub train:      f64,
    pub validation: f64,
    pub test:       f64,
}

impl Default for SplitRatios {
    fn default() -> Self {
        Self { train: 0.7, validation: 0.15, test: 0.15 }
    }
}

impl SplitRatios {
    pub fn sum(&self) -> f64 {
        self.train + self.validation + self.test
    }
}

/// Three disjoint, exhaustive index sets over `0..total`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSplit {
    pub total:      usize,
    pub train:      Vec<usize>,
    pub validation: Vec<usize>,
    pub test:       Vec<usize>,
}

impl DatasetSplit {
    /// Every index in `0..total` appears in exactly one partition.
    pub fn is_partition(&self) -> bool {
        let mut seen = vec![false; self.total];
        for &i in self.train.iter().chain(&self.validation).chain(&self.test) {
            if i >= self.total || seen[i] {
                return false;
            }
            seen[i] = true;
        }
        seen.into_iter().all(|s| s)
    }
}
