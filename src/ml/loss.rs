// ============================================================
// Layer 5 — Loss
// ============================================================
// Binary cross-entropy on the sigmoid output, pixel-wise
// against the target mask and averaged over the whole batch.

use burn::prelude::*;

/// Probabilities are clamped to [EPS, 1 - EPS] before taking logs so a
/// saturated sigmoid never yields an infinite loss or gradient.
const EPS: f64 = 1e-7;

/// Mean binary cross-entropy between a probability map and a target
/// mask of the same shape:
///
///   -mean( t·ln(p) + (1 - t)·ln(1 - p) )
///
/// Targets are floats, so soft masks in [0, 1] are accepted as well.
pub fn binary_cross_entropy<B: Backend, const D: usize>(
    probs:   Tensor<B, D>,
    targets: Tensor<B, D>,
) -> Tensor<B, 1> {
    let probs = probs.clamp(EPS, 1.0 - EPS);

    let positive = targets.clone() * probs.clone().log();
    let negative = targets.neg().add_scalar(1.0) * probs.neg().add_scalar(1.0).log();

    (positive + negative).neg().mean()
}
