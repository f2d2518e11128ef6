// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from two folders of files on disk to batches of
// tensors the UNet can consume.
//
//   data/images/*, data/annotations/*
//       │
//       ▼
//   PairedDirLoader   → sorted listings, paired by position
//       │
//       ▼
//   split_dataset     → train / validation / test indices
//       │
//       ▼
//   SegmentationDataset → implements Burn's Dataset trait,
//       │                 decodes + resizes one pair per get()
//       ▼
//   SegmentationBatcher → stacks samples into [N,C,H,W] tensors
//       │
//       ▼
//   DataLoader        → feeds batches to the training loop
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Lists and pairs image/mask files from two directories
pub mod loader;

/// Decodes, resizes and converts images and masks to float planes
pub mod preprocessor;

/// Implements Burn's Dataset trait for image/mask samples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Shuffles indices and splits them into train/validation/test
pub mod splitter;
