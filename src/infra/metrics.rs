// ============================================================
// Layer 6 — Metrics Logger and Run Report
// ============================================================
// Records training metrics to a CSV file after each epoch and
// writes the final report consumed by the reporting step.
//
// Metrics recorded per epoch:
//   - epoch:      the epoch number (1, 2, 3, ...)
//   - train_loss: mean BCE over the training partition
//   - val_loss:   mean BCE over the validation partition
//   - val_dice:   batch-weighted mean Dice on validation
//
// Output files:
//   artifacts/metrics.csv
//     epoch,train_loss,val_loss,val_dice
//     1,0.512300,0.498100,0.702000
//     ...
//   artifacts/report.json
//     { "history": [...], "test_loss": ..., "test_dice": ... }
//
// A mean over an empty partition is NaN. JSON has no NaN, so it is
// written as null and read back as NaN.
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use crate::ml::evaluator::Evaluation;

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// The epoch number (starts at 1)
    pub epoch: usize,

    /// Mean binary cross-entropy over the training partition
    #[serde(deserialize_with = "nan_from_null")]
    pub train_loss: f64,

    /// Mean binary cross-entropy over the validation partition
    #[serde(deserialize_with = "nan_from_null")]
    pub val_loss: f64,

    /// Mean Dice over the validation partition, in [0, 1]
    #[serde(deserialize_with = "nan_from_null")]
    pub val_dice: f64,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, val_loss: f64, val_dice: f64) -> Self {
        Self { epoch, train_loss, val_loss, val_dice }
    }
}

/// Logs epoch metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    /// Full path to the CSV file
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create a new MetricsLogger, starting a fresh CSV with its header.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create '{}'", dir.display()))?;

        let csv_path = dir.join("metrics.csv");
        let mut f = fs::File::create(&csv_path)
            .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
        writeln!(f, "epoch,train_loss,val_loss,val_dice")?;
        tracing::debug!("Created metrics CSV: '{}'", csv_path.display());

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row in the CSV.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        writeln!(
            f,
            "{},{:.6},{:.6},{:.6}",
            m.epoch, m.train_loss, m.val_loss, m.val_dice,
        )?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, val_loss={:.4}",
            m.epoch,
            m.train_loss,
            m.val_loss,
        );
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

/// Everything the reporting step needs from one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub history:   Vec<EpochMetrics>,
    #[serde(deserialize_with = "nan_from_null")]
    pub test_loss: f64,
    #[serde(deserialize_with = "nan_from_null")]
    pub test_dice: f64,
}

fn nan_from_null<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

impl RunReport {
    pub fn new(history: Vec<EpochMetrics>, test: &Evaluation) -> Self {
        Self {
            history,
            test_loss: test.mean_loss,
            test_dice: test.mean_dice,
        }
    }

    /// Write as `report.json` inside `dir` and return its path.
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join("report.json");
        fs::write(&path, serde_json::to_string_pretty(self)?)
            .with_context(|| format!("Cannot write report to '{}'", path.display()))?;
        Ok(path)
    }

    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join("report.json");
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read '{}'", path.display()))?;
        Ok(serde_json::from_str(&json)?)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_rows_follow_header() {
        let tmp    = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(tmp.path()).unwrap();
        logger.log(&EpochMetrics::new(1, 0.7, 0.6, 0.5)).unwrap();
        logger.log(&EpochMetrics::new(2, 0.5, 0.55, 0.6)).unwrap();

        let csv: Vec<String> = fs::read_to_string(logger.csv_path())
            .unwrap()
            .lines()
            .map(String::from)
            .collect();
        assert_eq!(csv[0], "epoch,train_loss,val_loss,val_dice");
        assert_eq!(csv[1], "1,0.700000,0.600000,0.500000");
        assert_eq!(csv.len(), 3);
    }

    #[test]
    fn test_new_logger_starts_a_fresh_file() {
        let tmp = tempfile::tempdir().unwrap();
        MetricsLogger::new(tmp.path()).unwrap()
            .log(&EpochMetrics::new(1, 0.7, 0.6, 0.5)).unwrap();

        let logger = MetricsLogger::new(tmp.path()).unwrap();
        assert_eq!(fs::read_to_string(logger.csv_path()).unwrap().lines().count(), 1);
    }

    #[test]
    fn test_report_round_trip() {
        let tmp  = tempfile::tempdir().unwrap();
        let eval = Evaluation { mean_loss: 0.3, mean_dice: 0.81, samples: 4 };
        let report = RunReport::new(vec![EpochMetrics::new(1, 0.4, 0.35, 0.8)], &eval);

        let path = report.save(tmp.path()).unwrap();
        assert!(path.ends_with("report.json"));

        let loaded = RunReport::load(tmp.path()).unwrap();
        assert_eq!(loaded.history, report.history);
        assert_eq!(loaded.test_dice, 0.81);
    }

    #[test]
    fn test_nan_metrics_survive_report_round_trip() {
        let tmp  = tempfile::tempdir().unwrap();
        let eval = Evaluation { mean_loss: f64::NAN, mean_dice: f64::NAN, samples: 0 };
        let report = RunReport::new(vec![EpochMetrics::new(1, 0.4, f64::NAN, f64::NAN)], &eval);
        report.save(tmp.path()).unwrap();

        let json = fs::read_to_string(tmp.path().join("report.json")).unwrap();
        assert!(json.contains("\"val_loss\": null"));

        let loaded = RunReport::load(tmp.path()).unwrap();
        assert_eq!(loaded.history.len(), 1);
        assert_eq!(loaded.history[0].train_loss, 0.4);
        assert!(loaded.history[0].val_loss.is_nan());
        assert!(loaded.history[0].val_dice.is_nan());
        assert!(loaded.test_loss.is_nan() && loaded.test_dice.is_nan());
    }
}
