// ============================================================
// Layer 4 — Train/Validation/Test Splitter
// ============================================================
// Shuffles the indices 0..total with a seeded RNG and cuts them
// into three partitions:
//   - train:      floor(total * ratios.train)
//   - validation: floor(total * ratios.validation)
//   - test:       everything left over
//
// The remainder goes to test so the three sizes always sum to
// `total`. Seeding makes the split reproducible across runs.
//
// Reference: rand crate documentation

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::domain::split::{DatasetSplit, SplitRatios};

pub fn split_dataset(total: usize, ratios: SplitRatios, seed: u64) -> DatasetSplit {
    let mut indices: Vec<usize> = (0..total).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let train_len = ((total as f64) * ratios.train).floor() as usize;
    let val_len   = ((total as f64) * ratios.validation).floor() as usize;

    // Clamp so rounding on tiny datasets never overruns
    let train_len = train_len.min(total);
    let val_len   = val_len.min(total - train_len);

    let test       = indices.split_off(train_len + val_len);
    let validation = indices.split_off(train_len);
    let train      = indices;

    tracing::debug!(
        "Dataset split: {} train, {} validation, {} test",
        train.len(),
        validation.len(),
        test.len(),
    );

    DatasetSplit { total, train, validation, test }
}
