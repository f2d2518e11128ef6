// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer asks for image/mask pairs through
// SampleSource and never learns where they came from.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

use crate::domain::sample_pair::SamplePair;

// ─── SampleSource ─────────────────────────────────────────────────────────────
/// Any component that can enumerate supervised image/mask pairs.
///
/// Implementations:
///   - PairedDirLoader → two parallel directories paired by sorted order
pub trait SampleSource {
    /// Return every pair in a stable order. The position of a pair in
    /// the returned Vec is its dataset index.
    fn load_pairs(&self) -> Result<Vec<SamplePair>>;
}
