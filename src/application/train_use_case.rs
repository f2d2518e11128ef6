// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Pair image/mask files        (Layer 4 - data)
//   Step 2: Split train/val/test         (Layer 4 - data)
//   Step 3: Save config + split          (Layer 6 - infra)
//   Step 4: Build datasets               (Layer 4 - data)
//   Step 5: Run training loop            (Layer 5 - ml)
//   Step 6: Save checkpoint              (Layer 6 - infra)
//   Step 7: Reload + evaluate on test    (Layer 5 - ml)
//   Step 8: Write run report             (Layer 6 - infra)
//
// Reference: Burn Book §5 (Training)

use anyhow::{bail, Result};
use burn::tensor::backend::AutodiffBackend;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::application::evaluate_use_case::evaluate_checkpoint;
use crate::backend::{dispatch, BackendTask, DeviceChoice};
use crate::data::{
    dataset::SegmentationDataset,
    loader::PairedDirLoader,
    preprocessor::Preprocessor,
    splitter::split_dataset,
};
use crate::domain::{split::SplitRatios, traits::SampleSource};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{MetricsLogger, RunReport},
};
use crate::ml::{metrics::DiceConfig, model::{UNetConfig, SIZE_MULTIPLE}, trainer::run_training};

/// Largest accepted `image_size`.
pub const MAX_IMAGE_SIZE: usize = 4096;

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run.
// Saved to disk so evaluate / predict can rebuild the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data_dir:       PathBuf,
    pub images_subdir:  String,
    pub masks_subdir:   String,
    pub artifact_dir:   PathBuf,
    pub image_size:     usize,
    pub batch_size:     usize,
    pub epochs:         usize,
    pub lr:             f64,
    pub split:          SplitRatios,
    pub dice:           DiceConfig,
    pub base_channels:  usize,
    pub seed:           u64,
    pub num_workers:    usize,
    pub strict_pairing: bool,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_dir:       PathBuf::from("data"),
            images_subdir:  "images".to_string(),
            masks_subdir:   "annotations".to_string(),
            artifact_dir:   PathBuf::from("artifacts"),
            image_size:     256,
            batch_size:     16,
            epochs:         20,
            lr:             1e-4,
            split:          SplitRatios::default(),
            dice:           DiceConfig::default(),
            base_channels:  64,
            seed:           42,
            num_workers:    1,
            strict_pairing: false,
        }
    }
}

impl TrainConfig {
    /// Reject any configuration the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.image_size == 0 || self.image_size % SIZE_MULTIPLE != 0 {
            bail!(
                "image_size must be a positive multiple of {SIZE_MULTIPLE}, got {}",
                self.image_size
            );
        }
        if self.image_size > MAX_IMAGE_SIZE {
            bail!("image_size must be at most {MAX_IMAGE_SIZE}, got {}", self.image_size);
        }
        if self.batch_size == 0 {
            bail!("batch_size must be at least 1");
        }
        if self.epochs == 0 {
            bail!("epochs must be at least 1");
        }
        if !(self.lr > 0.0) {
            bail!("learning rate must be positive, got {}", self.lr);
        }
        if self.base_channels == 0 {
            bail!("base_channels must be at least 1");
        }
        let r = &self.split;
        if r.train < 0.0 || r.validation < 0.0 || r.test < 0.0 || (r.sum() - 1.0).abs() > 1e-6 {
            bail!(
                "split ratios must be non-negative and sum to 1, got {}/{}/{}",
                r.train, r.validation, r.test
            );
        }
        if !(self.dice.threshold > 0.0 && self.dice.threshold < 1.0) {
            bail!("dice threshold must lie in (0, 1), got {}", self.dice.threshold);
        }
        if !(self.dice.epsilon > 0.0) {
            bail!("dice epsilon must be positive, got {}", self.dice.epsilon);
        }
        Ok(())
    }

    pub fn model_config(&self) -> UNetConfig {
        UNetConfig::new().with_base_channels(self.base_channels)
    }

    pub fn sample_loader(&self) -> PairedDirLoader {
        PairedDirLoader::new(
            self.data_dir.join(&self.images_subdir),
            self.data_dir.join(&self.masks_subdir),
        )
        .with_strict(self.strict_pairing)
    }
}

/// What a finished training run produced.
#[derive(Debug, Clone)]
pub struct TrainSummary {
    pub report:      RunReport,
    pub report_path: PathBuf,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
    device: DeviceChoice,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig, device: DeviceChoice) -> Self {
        Self { config, device }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(self) -> Result<TrainSummary> {
        self.config.validate()?;
        dispatch(self.device, TrainTask { config: self.config })
    }
}

pub(crate) struct TrainTask {
    pub(crate) config: TrainConfig,
}

impl BackendTask for TrainTask {
    type Output = Result<TrainSummary>;

    fn run<B: AutodiffBackend>(self, device: B::Device) -> Result<TrainSummary> {
        let cfg = &self.config;
        B::seed(&device, cfg.seed);

        // ── Step 1: Pair image and mask files ─────────────────────────────────
        let pairs = cfg.sample_loader().load_pairs()?;

        // ── Step 2: Train / validation / test split ───────────────────────────
        let split = split_dataset(pairs.len(), cfg.split, cfg.seed);
        tracing::info!(
            "Split: {} train, {} validation, {} test",
            split.train.len(),
            split.validation.len(),
            split.test.len()
        );
        if split.train.is_empty() {
            bail!("Training partition is empty ({} samples in total)", pairs.len());
        }

        // ── Step 3: Save config and split for evaluate / predict ──────────────
        let ckpt = CheckpointManager::new(&cfg.artifact_dir);
        ckpt.save_config(cfg)?;
        ckpt.save_split(&split)?;

        // ── Step 4: Build Burn datasets ───────────────────────────────────────
        let prep = Preprocessor::new(cfg.image_size);
        let train_dataset = SegmentationDataset::from_indices(&pairs, &split.train, prep)?;
        let val_dataset   = SegmentationDataset::from_indices(&pairs, &split.validation, prep)?;

        // ── Step 5: Run training loop (Layer 5) ───────────────────────────────
        let metrics = MetricsLogger::new(&cfg.artifact_dir)?;
        let trained = run_training::<B>(cfg, train_dataset, val_dataset, &metrics, &device)?;

        // ── Step 6: Persist the trained weights ───────────────────────────────
        ckpt.save_model(&trained.model)?;
        drop(trained.model);

        // ── Step 7: Reload from disk and score the held-out test partition ────
        let test = evaluate_checkpoint::<B::InnerBackend>(&ckpt, cfg, &pairs, &split.test, &device)?;
        tracing::info!(
            "Test: loss={:.4} dice={:.4} over {} samples",
            test.mean_loss, test.mean_dice, test.samples
        );

        // ── Step 8: Hand the numbers to the reporting step ────────────────────
        let report      = RunReport::new(trained.history, &test);
        let report_path = report.save(ckpt.dir())?;

        Ok(TrainSummary { report, report_path })
    }
}
