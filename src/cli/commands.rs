// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `train`, `evaluate` and
// `predict`, and all their configurable flags.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::application::train_use_case::TrainConfig;
use crate::backend::DeviceChoice;
use crate::domain::split::SplitRatios;
use crate::ml::metrics::DiceConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the UNet, save the checkpoint and score the test split
    Train(TrainArgs),

    /// Re-score a saved checkpoint on its test split
    Evaluate(EvaluateArgs),

    /// Write a predicted mask for one image
    Predict(PredictArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Root directory holding the image and mask folders
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,

    /// Folder of RGB images, relative to --data-dir
    #[arg(long, default_value = "images")]
    pub images_subdir: String,

    /// Folder of grayscale masks, relative to --data-dir
    #[arg(long, default_value = "annotations")]
    pub masks_subdir: String,

    /// Directory for the checkpoint, config, split, metrics and report
    #[arg(long, default_value = "artifacts")]
    pub artifact_dir: PathBuf,

    /// Square side images and masks are resized to (multiple of 16)
    #[arg(long, default_value_t = 256)]
    pub image_size: usize,

    #[arg(long, default_value_t = 16)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 20)]
    pub epochs: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 1e-4)]
    pub lr: f64,

    #[arg(long, default_value_t = 0.7)]
    pub train_ratio: f64,

    #[arg(long, default_value_t = 0.15)]
    pub val_ratio: f64,

    #[arg(long, default_value_t = 0.15)]
    pub test_ratio: f64,

    /// Probability above which a pixel counts as foreground
    #[arg(long, default_value_t = 0.5)]
    pub dice_threshold: f64,

    #[arg(long, default_value_t = 1e-6)]
    pub dice_epsilon: f64,

    /// Width of the first UNet stage; deeper stages double it
    #[arg(long, default_value_t = 64)]
    pub base_channels: usize,

    /// Seed for the dataset split and epoch shuffling
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Data loader worker threads
    #[arg(long, default_value_t = 1)]
    pub num_workers: usize,

    /// Fail instead of warning when image and mask listings disagree
    #[arg(long)]
    pub strict_pairing: bool,

    #[arg(long, value_enum, default_value_t = DeviceChoice::Auto)]
    pub device: DeviceChoice,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_dir:       a.data_dir,
            images_subdir:  a.images_subdir,
            masks_subdir:   a.masks_subdir,
            artifact_dir:   a.artifact_dir,
            image_size:     a.image_size,
            batch_size:     a.batch_size,
            epochs:         a.epochs,
            lr:             a.lr,
            split: SplitRatios {
                train:      a.train_ratio,
                validation: a.val_ratio,
                test:       a.test_ratio,
            },
            dice: DiceConfig {
                threshold: a.dice_threshold,
                epsilon:   a.dice_epsilon,
            },
            base_channels:  a.base_channels,
            seed:           a.seed,
            num_workers:    a.num_workers,
            strict_pairing: a.strict_pairing,
        }
    }
}

/// All arguments for the `evaluate` command
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Directory written by `train`
    #[arg(long, default_value = "artifacts")]
    pub artifact_dir: PathBuf,

    /// Read samples from here instead of the directory used for training
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = DeviceChoice::Auto)]
    pub device: DeviceChoice,
}

/// All arguments for the `predict` command
#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Image to segment
    #[arg(long)]
    pub image: PathBuf,

    /// Where to write the PNG mask
    #[arg(long, default_value = "mask.png")]
    pub output: PathBuf,

    /// Directory written by `train`
    #[arg(long, default_value = "artifacts")]
    pub artifact_dir: PathBuf,

    /// Foreground threshold (defaults to the one used in training)
    #[arg(long)]
    pub threshold: Option<f64>,

    #[arg(long, value_enum, default_value_t = DeviceChoice::Auto)]
    pub device: DeviceChoice,
}
