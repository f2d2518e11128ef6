// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Epoch loop over Burn's DataLoader with Adam and BCE loss.
//
//   epoch boundary → training steps (shuffled, with gradients)
//                  → validation steps (ordered, frozen params)
//                  → epoch metrics appended to history
//                  → next epoch, until cfg.epochs are done
//
// Key Burn insight:
//   - Training runs on B (Autodiff<...>) for gradients
//   - model.valid() returns the model on B::InnerBackend
//   - the validation loader must produce InnerBackend batches
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::{bail, Result};
use burn::{
    data::{dataloader::DataLoaderBuilder, dataset::Dataset},
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::{batcher::SegmentationBatcher, dataset::SegmentationDataset};
use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::ml::{
    evaluator::evaluate,
    loss::binary_cross_entropy,
    metrics::RunningMean,
    model::{UNet, UNetConfig},
};

pub struct TrainedModel<B: Backend> {
    pub model:   UNet<B>,
    pub history: Vec<EpochMetrics>,
}

pub fn run_training<B: AutodiffBackend>(
    cfg:           &TrainConfig,
    train_dataset: SegmentationDataset,
    val_dataset:   SegmentationDataset,
    metrics:       &MetricsLogger,
    device:        &B::Device,
) -> Result<TrainedModel<B>> {
    let train_len = train_dataset.len();
    let val_len   = val_dataset.len();

    // ── Build model ───────────────────────────────────────────────────────────
    let model_cfg = cfg.model_config();
    let mut model: UNet<B> = model_cfg.init(device);
    tracing::info!(
        "UNet ready: widths={:?}, {} parameters",
        model_cfg.widths(),
        model.num_params()
    );

    let mut optim = AdamConfig::new().with_epsilon(1e-8).init();

    // ── Training data loader (AutodiffBackend, reshuffled every epoch) ────────
    let train_loader = DataLoaderBuilder::<B, _, _>::new(SegmentationBatcher::new(cfg.image_size))
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .num_workers(cfg.num_workers)
        .set_device(device.clone())
        .build(train_dataset);

    // ── Validation data loader (InnerBackend, fixed order) ────────────────────
    let val_loader = DataLoaderBuilder::<B::InnerBackend, _, _>::new(SegmentationBatcher::new(cfg.image_size))
        .batch_size(cfg.batch_size)
        .num_workers(cfg.num_workers)
        .set_device(device.clone())
        .build(val_dataset);

    tracing::info!(
        "Training on {} samples, validating on {} (batch_size={}, lr={})",
        train_len, val_len, cfg.batch_size, cfg.lr
    );

    let mut history = Vec::with_capacity(cfg.epochs);

    for epoch in 1..=cfg.epochs {
        // ── Training phase ────────────────────────────────────────────────────
        let mut train_loss = RunningMean::default();

        for batch in train_loader.iter() {
            let batch_len = batch.images.dims()[0];
            let probs = model.forward(batch.images);
            let loss  = binary_cross_entropy(probs, batch.masks);

            let loss_val: f64 = loss.clone().into_scalar().elem();
            train_loss.add(loss_val, batch_len);
            tracing::debug!("epoch {epoch}: batch n={batch_len} loss={loss_val:.4}");

            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optim.step(cfg.lr, model, grads);
        }

        if train_loss.count() != train_len {
            bail!(
                "Epoch {epoch} trained on {} of {train_len} samples; a sample failed to load",
                train_loss.count()
            );
        }

        // ── Validation phase ──────────────────────────────────────────────────
        let validation = evaluate(&model.valid(), val_loader.as_ref(), cfg.dice)?;

        let row = EpochMetrics::new(epoch, train_loss.mean(), validation.mean_loss, validation.mean_dice);
        println!(
            "Epoch {:>3}/{} | train_loss={:.4} | val_loss={:.4} | val_dice={:.4}",
            epoch, cfg.epochs, row.train_loss, row.val_loss, row.val_dice,
        );
        metrics.log(&row)?;
        history.push(row);
    }

    tracing::info!("Training complete! Metrics in {}", metrics.csv_path().display());
    Ok(TrainedModel { model, history })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};

    use crate::data::{
        dataset::tests::{truncate, write_fixture},
        preprocessor::Preprocessor,
    };

    type TestBackend = Autodiff<NdArray>;

    fn tiny_config(epochs: usize) -> TrainConfig {
        TrainConfig {
            image_size:    16,
            batch_size:    2,
            epochs,
            lr:            1e-3,
            base_channels: 2,
            num_workers:   1,
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_history_has_one_row_per_epoch() {
        let tmp   = tempfile::tempdir().unwrap();
        let pairs = write_fixture(tmp.path(), 6);
        let cfg   = tiny_config(2);

        let prep = Preprocessor::new(cfg.image_size);
        let train = SegmentationDataset::from_indices(&pairs, &[0, 1, 2, 3], prep).unwrap();
        let val   = SegmentationDataset::from_indices(&pairs, &[4, 5], prep).unwrap();
        let logger = MetricsLogger::new(tmp.path().join("artifacts")).unwrap();

        let trained = run_training::<TestBackend>(&cfg, train, val, &logger, &Default::default()).unwrap();

        assert_eq!(trained.history.len(), 2);
        for (i, row) in trained.history.iter().enumerate() {
            assert_eq!(row.epoch, i + 1);
            assert!(row.train_loss.is_finite());
            assert!(row.val_loss.is_finite());
            assert!(row.val_dice >= 0.0 && row.val_dice <= 1.0 + 1e-9);
        }

        let csv = std::fs::read_to_string(logger.csv_path()).unwrap();
        assert_eq!(csv.lines().count(), 3);
    }

    #[test]
    fn test_empty_validation_partition_reports_nan() {
        let tmp   = tempfile::tempdir().unwrap();
        let pairs = write_fixture(tmp.path(), 2);
        let cfg   = tiny_config(1);

        let prep  = Preprocessor::new(cfg.image_size);
        let train = SegmentationDataset::from_indices(&pairs, &[0, 1], prep).unwrap();
        let val   = SegmentationDataset::from_indices(&pairs, &[], prep).unwrap();
        let logger = MetricsLogger::new(tmp.path().join("artifacts")).unwrap();

        let trained = run_training::<TestBackend>(&cfg, train, val, &logger, &Default::default()).unwrap();
        let row = &trained.history[0];
        assert!(row.train_loss.is_finite());
        assert!(row.val_loss.is_nan());
        assert!(row.val_dice.is_nan());
    }

    #[test]
    fn test_damaged_training_sample_aborts_the_run() {
        let tmp   = tempfile::tempdir().unwrap();
        let pairs = write_fixture(tmp.path(), 4);
        let cfg   = tiny_config(1);

        let prep  = Preprocessor::new(cfg.image_size);
        let train = SegmentationDataset::from_indices(&pairs, &[0, 1, 2, 3], prep).unwrap();
        let val   = SegmentationDataset::from_indices(&pairs, &[], prep).unwrap();
        let logger = MetricsLogger::new(tmp.path().join("artifacts")).unwrap();

        let len = std::fs::metadata(&pairs[2].mask).unwrap().len() as usize;
        truncate(&pairs[2].mask, len / 2);

        let err = run_training::<TestBackend>(&cfg, train, val, &logger, &Default::default())
            .err()
            .unwrap();
        assert!(err.to_string().contains("of 4 samples"));
    }
}
