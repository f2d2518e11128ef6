// ============================================================
// Layer 3 — SamplePair Domain Type
// ============================================================
// One supervised example as it exists on disk: an RGB image
// and the grayscale mask that annotates it.
//
// Pairing is positional. The n-th file of the sorted image
// listing goes with the n-th file of the sorted mask listing,
// so the stems ("Abyssinian_1.jpg" / "Abyssinian_1.png") are
// carried along only to be able to flag a mismatch.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplePair {
    /// Path of the RGB image
    pub image: PathBuf,

    /// Path of the grayscale mask
    pub mask: PathBuf,
}

impl SamplePair {
    pub fn new(image: impl Into<PathBuf>, mask: impl Into<PathBuf>) -> Self {
        Self {
            image: image.into(),
            mask:  mask.into(),
        }
    }

    /// True when image and mask share the same file stem.
    pub fn stems_match(&self) -> bool {
        file_stem(&self.image) == file_stem(&self.mask)
    }
}

/// File name without its extension, or "" when there is none.
pub fn file_stem(path: &Path) -> &str {
    path.file_stem().and_then(|s| s.to_str()).unwrap_or("")
}
