// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with clap and hands each subcommand to its
// use case in Layer 2. Printing results happens here only.
//
//   1. `train`    — train, checkpoint, score the test split
//   2. `evaluate` — reload a checkpoint and re-score it
//   3. `predict`  — segment a single image
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EvaluateArgs, PredictArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "pet-segmentation",
    version,
    about = "Train a UNet to segment pets from their background, then evaluate and predict masks."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Evaluate(args) => run_evaluate(args),
            Commands::Predict(args)  => run_predict(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on samples in: {}", args.data_dir.display());

    let device  = args.device;
    let summary = TrainUseCase::new(args.into(), device).execute()?;

    println!(
        "Training complete. test_loss={:.4} test_dice={:.4}",
        summary.report.test_loss, summary.report.test_dice
    );
    println!("Report written to {}", summary.report_path.display());
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    use crate::application::evaluate_use_case::EvaluateUseCase;

    let eval = EvaluateUseCase::new(args.artifact_dir, args.data_dir, args.device).execute()?;
    println!(
        "Test set ({} samples): loss={:.4} dice={:.4}",
        eval.samples, eval.mean_loss, eval.mean_dice
    );
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    use crate::application::predict_use_case::PredictUseCase;

    let written = PredictUseCase {
        artifact_dir: args.artifact_dir,
        image:        args.image,
        output:       args.output,
        threshold:    args.threshold,
        device:       args.device,
    }
    .execute()?;

    println!("Mask written to {}", written.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::train_use_case::TrainConfig;
    use crate::backend::DeviceChoice;

    #[test]
    fn test_train_defaults_match_config_defaults() {
        let cli = Cli::try_parse_from(["pet-segmentation", "train"]).unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        assert_eq!(args.device, DeviceChoice::Auto);

        let from_cli: TrainConfig = args.into();
        let defaults = TrainConfig::default();
        assert_eq!(from_cli.image_size, defaults.image_size);
        assert_eq!(from_cli.batch_size, defaults.batch_size);
        assert_eq!(from_cli.epochs, defaults.epochs);
        assert_eq!(from_cli.lr, defaults.lr);
        assert_eq!(from_cli.split, defaults.split);
        assert_eq!(from_cli.dice, defaults.dice);
        assert_eq!(from_cli.data_dir, defaults.data_dir);
    }

    #[test]
    fn test_parses_device_and_flags() {
        let cli = Cli::try_parse_from([
            "pet-segmentation", "train", "--device", "cpu", "--strict-pairing", "--epochs", "3",
        ])
        .unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        assert_eq!(args.device, DeviceChoice::Cpu);
        assert!(args.strict_pairing);
        assert_eq!(args.epochs, 3);
    }

    #[test]
    fn test_predict_requires_image() {
        assert!(Cli::try_parse_from(["pet-segmentation", "predict"]).is_err());
    }
}
