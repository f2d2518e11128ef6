// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All Burn model, loss and optimisation code lives here.
//
//   model.rs     — UNet encoder/decoder with skip connections
//   loss.rs      — binary cross-entropy on probability maps
//   metrics.rs   — thresholded Dice coefficient, weighted means
//   evaluator.rs — gradient-free pass computing mean loss + Dice
//   trainer.rs   — epoch loop: forward, loss, backward, Adam step
//   inferencer.rs — single-image mask prediction
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Ronneberger et al. (2015) U-Net

/// UNet segmentation model
pub mod model;

/// Binary cross-entropy loss
pub mod loss;

/// Dice coefficient and running means
pub mod metrics;

/// Frozen-parameter evaluation over a data loader
pub mod evaluator;

/// Training loop with per-epoch validation
pub mod trainer;

/// Mask prediction for a single image
pub mod inferencer;
