// ============================================================
// Layer 2 — PredictUseCase
// ============================================================
// Loads the trained model and writes a binary mask PNG for one
// image, at the image's own resolution.

use anyhow::Result;
use burn::tensor::backend::AutodiffBackend;
use std::path::PathBuf;

use crate::backend::{dispatch, BackendTask, DeviceChoice};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::inferencer::Inferencer;

pub struct PredictUseCase {
    pub artifact_dir: PathBuf,
    pub image:        PathBuf,
    pub output:       PathBuf,
    /// Overrides the Dice threshold stored with the checkpoint
    pub threshold:    Option<f64>,
    pub device:       DeviceChoice,
}

impl PredictUseCase {
    pub fn execute(self) -> Result<PathBuf> {
        let device = self.device;
        dispatch(device, self)
    }
}

impl BackendTask for PredictUseCase {
    type Output = Result<PathBuf>;

    fn run<B: AutodiffBackend>(self, device: B::Device) -> Result<PathBuf> {
        let ckpt = CheckpointManager::new(&self.artifact_dir);
        let cfg  = ckpt.load_config()?;

        let model = ckpt.load_model(cfg.model_config().init::<B::InnerBackend>(&device), &device)?;
        let threshold = self.threshold.unwrap_or(cfg.dice.threshold);

        Inferencer::<B::InnerBackend>::new(model, cfg.image_size, threshold, device)?
            .predict_file(&self.image, &self.output)?;

        tracing::info!("Wrote mask '{}'", self.output.display());
        Ok(self.output)
    }
}
