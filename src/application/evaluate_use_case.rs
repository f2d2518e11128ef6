// ============================================================
// Layer 2 — EvaluateUseCase
// ============================================================
// Rebuilds the model described by train_config.json, loads the
// checkpoint into it and scores the persisted test partition:
//
//   Step 1: Load config + split          (Layer 6 - infra)
//   Step 2: Re-pair image/mask files     (Layer 4 - data)
//   Step 3: Load checkpoint              (Layer 6 - infra)
//   Step 4: Evaluate test partition      (Layer 5 - ml)
//   Step 5: Refresh the run report       (Layer 6 - infra)

use anyhow::{bail, Result};
use burn::{data::dataloader::DataLoaderBuilder, prelude::*, tensor::backend::AutodiffBackend};
use std::path::PathBuf;

use crate::application::train_use_case::TrainConfig;
use crate::backend::{dispatch, BackendTask, DeviceChoice};
use crate::data::{
    batcher::SegmentationBatcher,
    dataset::SegmentationDataset,
    preprocessor::Preprocessor,
};
use crate::domain::{sample_pair::SamplePair, traits::SampleSource};
use crate::infra::{checkpoint::CheckpointManager, metrics::RunReport};
use crate::ml::evaluator::{evaluate, Evaluation};

/// Load the checkpoint in `ckpt` and evaluate it on `pairs[indices]`.
pub fn evaluate_checkpoint<B: Backend>(
    ckpt:    &CheckpointManager,
    cfg:     &TrainConfig,
    pairs:   &[SamplePair],
    indices: &[usize],
    device:  &B::Device,
) -> Result<Evaluation> {
    let model = ckpt.load_model(cfg.model_config().init::<B>(device), device)?;

    let dataset = SegmentationDataset::from_indices(pairs, indices, Preprocessor::new(cfg.image_size))?;
    let loader  = DataLoaderBuilder::<B, _, _>::new(SegmentationBatcher::new(cfg.image_size))
        .batch_size(cfg.batch_size)
        .num_workers(cfg.num_workers)
        .set_device(device.clone())
        .build(dataset);

    evaluate(&model, loader.as_ref(), cfg.dice)
}

pub struct EvaluateUseCase {
    artifact_dir: PathBuf,
    /// Overrides the data directory recorded at training time
    data_dir:     Option<PathBuf>,
    device:       DeviceChoice,
}

impl EvaluateUseCase {
    pub fn new(artifact_dir: impl Into<PathBuf>, data_dir: Option<PathBuf>, device: DeviceChoice) -> Self {
        Self {
            artifact_dir: artifact_dir.into(),
            data_dir,
            device,
        }
    }

    pub fn execute(self) -> Result<Evaluation> {
        let device = self.device;
        dispatch(device, EvaluateTask { use_case: self })
    }
}

struct EvaluateTask {
    use_case: EvaluateUseCase,
}

impl BackendTask for EvaluateTask {
    type Output = Result<Evaluation>;

    fn run<B: AutodiffBackend>(self, device: B::Device) -> Result<Evaluation> {
        let ckpt = CheckpointManager::new(&self.use_case.artifact_dir);

        // ── Step 1: What was trained, and on which split ──────────────────────
        let mut cfg = ckpt.load_config()?;
        if let Some(dir) = self.use_case.data_dir {
            cfg.data_dir = dir;
        }
        let split = ckpt.load_split()?;
        if !split.is_partition() {
            bail!("split.json in '{}' is not a partition of 0..{}", ckpt.dir().display(), split.total);
        }

        // ── Step 2: The listing must still match the one the split indexes ────
        let pairs = cfg.sample_loader().load_pairs()?;
        if pairs.len() != split.total {
            bail!(
                "Split covers {} samples but '{}' now pairs {}",
                split.total,
                cfg.data_dir.display(),
                pairs.len()
            );
        }

        // ── Steps 3–4: Checkpoint → test-set scores (no autodiff) ─────────────
        let test = evaluate_checkpoint::<B::InnerBackend>(&ckpt, &cfg, &pairs, &split.test, &device)?;

        // ── Step 5: Keep report.json in step with the latest scores ───────────
        let history = match RunReport::load(ckpt.dir()) {
            Ok(previous) => previous.history,
            Err(e) => {
                tracing::warn!("No usable training history ({e:#}); report will hold test scores only");
                Vec::new()
            }
        };
        RunReport::new(history, &test).save(ckpt.dir())?;

        Ok(test)
    }
}
