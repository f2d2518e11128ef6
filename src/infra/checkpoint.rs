// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores everything needed to rebuild a trained
// model:
//   1. model.mpk.gz       — all learned parameters
//   2. train_config.json  — hyperparameters / architecture
//   3. split.json         — train / validation / test indices
//
// Weights go through Burn's NamedMpkGzFileRecorder with
// FullPrecisionSettings, so a save → load round trip returns
// the exact f32 values. (CompactRecorder stores half precision.)
//
// File layout:
//   artifacts/
//     model.mpk.gz
//     train_config.json
//     split.json
//     metrics.csv
//     report.json
//
// Reference: Burn Book §5 (Records and Checkpointing)
//            Rust Book §9 (Error Handling)

use anyhow::{bail, Context, Result};
use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkGzFileRecorder, Recorder},
};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::application::train_use_case::TrainConfig;
use crate::domain::split::DatasetSplit;
use crate::ml::model::UNet;

const MODEL_STEM:  &str = "model";
const CONFIG_FILE: &str = "train_config.json";
const SPLIT_FILE:  &str = "split.json";

type CheckpointRecorder = NamedMpkGzFileRecorder<FullPrecisionSettings>;

/// Manages the files of one training run's artifact directory.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the weights file as written by the recorder.
    pub fn model_path(&self) -> PathBuf {
        self.dir.join(format!("{MODEL_STEM}.mpk.gz"))
    }

    pub fn save_model<B: Backend>(&self, model: &UNet<B>) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;

        // The recorder appends ".mpk.gz" itself
        let path = self.dir.join(MODEL_STEM);
        CheckpointRecorder::new()
            .record(model.clone().into_record(), path)
            .with_context(|| format!("Failed to save checkpoint to '{}'", self.model_path().display()))?;

        tracing::info!("Saved checkpoint '{}'", self.model_path().display());
        Ok(())
    }

    /// Load weights into `model`, which must have the checkpoint's architecture.
    pub fn load_model<B: Backend>(&self, model: UNet<B>, device: &B::Device) -> Result<UNet<B>> {
        let file = self.model_path();
        if !file.is_file() {
            bail!(
                "Checkpoint file not found: '{}'. Have you run 'train' first?",
                file.display()
            );
        }

        let record = CheckpointRecorder::new()
            .load(self.dir.join(MODEL_STEM), device)
            .with_context(|| format!("Cannot load checkpoint '{}'", file.display()))?;

        tracing::info!("Loaded checkpoint '{}'", file.display());
        Ok(model.load_record(record))
    }

    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        self.write_json(CONFIG_FILE, cfg)
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        self.read_json(CONFIG_FILE)
    }

    pub fn save_split(&self, split: &DatasetSplit) -> Result<()> {
        self.write_json(SPLIT_FILE, split)
    }

    pub fn load_split(&self) -> Result<DatasetSplit> {
        self.read_json(SPLIT_FILE)
    }

    fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;

        let path = self.dir.join(name);
        fs::write(&path, serde_json::to_string_pretty(value)?)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;

        tracing::debug!("Wrote '{}'", path.display());
        Ok(())
    }

    fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let path = self.dir.join(name);
        let json = fs::read_to_string(&path).with_context(|| {
            format!("Cannot read '{}'. Have you run 'train' first?", path.display())
        })?;

        serde_json::from_str(&json).with_context(|| format!("Malformed '{}'", path.display()))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::Distribution;

    use crate::ml::model::UNetConfig;

    type TestBackend = NdArray;

    #[test]
    fn test_model_round_trip_is_exact() {
        let tmp    = tempfile::tempdir().unwrap();
        let device = Default::default();
        let cfg    = UNetConfig::new().with_base_channels(2);
        let ckpt   = CheckpointManager::new(tmp.path());

        let model: UNet<TestBackend> = cfg.init(&device);
        ckpt.save_model(&model).unwrap();
        assert!(ckpt.model_path().is_file());

        let restored = ckpt.load_model(cfg.init::<TestBackend>(&device), &device).unwrap();

        let x = Tensor::<TestBackend, 4>::random([1, 3, 16, 16], Distribution::Default, &device);
        let before = model.forward(x.clone()).into_data().to_vec::<f32>().unwrap();
        let after  = restored.forward(x).into_data().to_vec::<f32>().unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_missing_checkpoint_is_reported() {
        let tmp    = tempfile::tempdir().unwrap();
        let device = Default::default();
        let model: UNet<TestBackend> = UNetConfig::new().with_base_channels(2).init(&device);

        let err = CheckpointManager::new(tmp.path()).load_model(model, &device).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_config_and_split_round_trip() {
        let tmp  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(tmp.path().join("nested"));

        let cfg = TrainConfig { epochs: 3, seed: 9, ..TrainConfig::default() };
        ckpt.save_config(&cfg).unwrap();
        let loaded = ckpt.load_config().unwrap();
        assert_eq!(loaded.epochs, 3);
        assert_eq!(loaded.seed, 9);

        let split = DatasetSplit { total: 3, train: vec![2], validation: vec![0], test: vec![1] };
        ckpt.save_split(&split).unwrap();
        assert_eq!(ckpt.load_split().unwrap(), split);
    }
}
