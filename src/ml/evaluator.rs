// ============================================================
// Layer 5 — Evaluator
// ============================================================
// One pass over a data loader with frozen parameters, producing
// the batch-weighted mean BCE loss and mean Dice.
//
// Call this with a model on a non-autodiff backend (for example
// `model.valid()`) so no gradient graph is recorded.
//
// Every item of the loader must be scored. A loader that stops
// short (an item failed to load) is an error, not a smaller mean.

use anyhow::{bail, Result};
use burn::{data::dataloader::DataLoader, prelude::*};
use serde::{Deserialize, Serialize};

use crate::data::batcher::SegmentationBatch;
use crate::ml::{
    loss::binary_cross_entropy,
    metrics::{dice_coefficient, DiceConfig, RunningMean},
    model::UNet,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub mean_loss: f64,
    pub mean_dice: f64,
    /// Number of samples scored
    pub samples:   usize,
}

pub fn evaluate<B: Backend>(
    model:  &UNet<B>,
    loader: &dyn DataLoader<B, SegmentationBatch<B>>,
    dice:   DiceConfig,
) -> Result<Evaluation> {
    let mut loss_mean = RunningMean::default();
    let mut dice_mean = RunningMean::default();

    for batch in loader.iter() {
        let batch_len = batch.images.dims()[0];
        let probs = model.forward(batch.images);

        let loss: f64 = binary_cross_entropy(probs.clone(), batch.masks.clone())
            .into_scalar()
            .elem();
        let score = dice_coefficient(probs, batch.masks, dice);

        tracing::debug!("eval batch: n={batch_len} loss={loss:.4} dice={score:.4}");
        loss_mean.add(loss, batch_len);
        dice_mean.add(score, batch_len);
    }

    let expected = loader.num_items();
    if loss_mean.count() != expected {
        bail!(
            "Evaluation scored {} of {} samples; a sample failed to load",
            loss_mean.count(),
            expected
        );
    }

    Ok(Evaluation {
        mean_loss: loss_mean.mean(),
        mean_dice: dice_mean.mean(),
        samples:   loss_mean.count(),
    })
}
