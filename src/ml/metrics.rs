// ============================================================
// Layer 5 — Segmentation Metrics
// ============================================================
// Dice coefficient over thresholded predictions:
//
//   dice = (2·|P ∩ T| + ε) / (|P| + |T| + ε)
//
//   P = pixels with probability > threshold
//   T = foreground pixels of the target mask
//
// ε keeps the ratio defined when both masks are empty (dice = 1).
//
// Dice is computed once per batch over every pixel in it; the
// partition score is the mean of those batch scores weighted
// by batch length (see RunningMean). On a dataset whose final
// batch is short this differs from a single global Dice over
// all pixels, so scores are comparable only at equal batch size.

use burn::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiceConfig {
    /// Probability above which a pixel counts as foreground
    pub threshold: f64,
    /// Smoothing term added to numerator and denominator
    pub epsilon: f64,
}

impl Default for DiceConfig {
    fn default() -> Self {
        Self { threshold: 0.5, epsilon: 1e-6 }
    }
}

/// Dice coefficient between a probability map and a target mask.
pub fn dice_coefficient<B: Backend, const D: usize>(
    probs:   Tensor<B, D>,
    targets: Tensor<B, D>,
    config:  DiceConfig,
) -> f64 {
    let predicted = probs.greater_elem(config.threshold).float();

    let intersection: f64 = (predicted.clone() * targets.clone()).sum().into_scalar().elem();
    let total: f64 = (predicted.sum() + targets.sum()).into_scalar().elem();

    (2.0 * intersection + config.epsilon) / (total + config.epsilon)
}

/// Mean of per-batch values weighted by batch length.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunningMean {
    sum:   f64,
    count: usize,
}

impl RunningMean {
    pub fn add(&mut self, value: f64, weight: usize) {
        self.sum   += value * weight as f64;
        self.count += weight;
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// NaN when nothing was added.
    pub fn mean(&self) -> f64 {
        if self.count > 0 { self.sum / self.count as f64 } else { f64::NAN }
    }
}
