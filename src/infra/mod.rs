// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting persistence for a training run, all under one
// artifact directory:
//
//   checkpoint.rs — model weights (Burn NamedMpkGzFileRecorder,
//                   full f32 precision), the TrainConfig and the
//                   dataset split as JSON, so evaluate/predict
//                   rebuild exactly what train produced.
//
//   metrics.rs    — per-epoch metrics CSV and the run report
//                   (history + test scores) handed to whatever
//                   renders the final write-up.
//
// Reference: Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Records and Checkpointing)

/// Model checkpoint, config and split persistence
pub mod checkpoint;

/// Training metrics CSV logger and run report
pub mod metrics;
