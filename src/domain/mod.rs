// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs and traits describing what the system
// works with: image/mask pairs on disk and the partition of
// their indices into train / validation / test.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// An image file and the mask file paired with it
pub mod sample_pair;

// The three disjoint index partitions of a dataset
pub mod split;

// Core abstractions (traits) that other layers implement
pub mod traits;
