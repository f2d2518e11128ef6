// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Each use case wires the data, ml and infra layers together
// for one command. No tensor math and no printing here; the
// CLI layer formats the results.
//
// Use cases are generic over the Burn backend and run through
// backend::dispatch, which picks CPU or GPU once per process.
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// The training workflow (ends with a test-set evaluation)
pub mod train_use_case;

// Re-score a saved checkpoint on its test partition
pub mod evaluate_use_case;

// Predict a mask for a single image
pub mod predict_use_case;
