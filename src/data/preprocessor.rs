// ============================================================
// Layer 4 — Image / Mask Preprocessor
// ============================================================
// Converts decoded files into flat float planes of a fixed
// square size.
//
// Both image and mask go through the same geometric transform
// (resize to `size × size`) so pixel (y, x) of one lines up
// with pixel (y, x) of the other.
//
// Only the image is intensity-normalised:
//   image: RGB u8 → f32 / 255        → [0, 1], CHW layout
//   mask:  luma u8 → min(value, 1)   → {0, 1}
//
// The mask uses nearest-neighbour resampling so no fractional
// labels appear along object edges. Masks are stored as 0/1
// pixels; any other nonzero value saturates to foreground.
//
// Reference: image crate documentation

use anyhow::{Context, Result};
use image::{imageops::FilterType, DynamicImage, ImageReader};
use std::path::Path;

#[derive(Debug, Clone, Copy)]
pub struct Preprocessor {
    /// Side length of the square output
    size: u32,
}

impl Preprocessor {
    pub fn new(size: usize) -> Self {
        Self { size: size as u32 }
    }

    pub fn size(&self) -> usize {
        self.size as usize
    }

    /// Fully decode `path` without keeping the pixels.
    pub fn verify(&self, path: &Path) -> Result<()> {
        open(path).map(|_| ())
    }

    /// Decode an image file into a [3 * size * size] CHW plane in [0, 1].
    pub fn load_image(&self, path: &Path) -> Result<Vec<f32>> {
        Ok(self.image_to_chw(&open(path)?))
    }

    /// Decode a mask file into a [size * size] plane in {0, 1}.
    pub fn load_mask(&self, path: &Path) -> Result<Vec<f32>> {
        Ok(self.mask_to_plane(&open(path)?))
    }

    pub fn image_to_chw(&self, img: &DynamicImage) -> Vec<f32> {
        let rgb  = img.resize_exact(self.size, self.size, FilterType::Triangle).to_rgb8();
        let area = self.size() * self.size();
        let mut out = vec![0.0f32; 3 * area];

        for (i, pixel) in rgb.pixels().enumerate() {
            out[i]            = pixel[0] as f32 / 255.0;
            out[area + i]     = pixel[1] as f32 / 255.0;
            out[2 * area + i] = pixel[2] as f32 / 255.0;
        }
        out
    }

    pub fn mask_to_plane(&self, img: &DynamicImage) -> Vec<f32> {
        img.resize_exact(self.size, self.size, FilterType::Nearest)
            .to_luma8()
            .pixels()
            .map(|p| (p[0] as f32).min(1.0))
            .collect()
    }
}

fn open(path: &Path) -> Result<DynamicImage> {
    ImageReader::open(path)
        .with_context(|| format!("Cannot open '{}'", path.display()))?
        .with_guessed_format()
        .with_context(|| format!("Cannot read '{}'", path.display()))?
        .decode()
        .with_context(|| format!("Cannot decode '{}'", path.display()))
}
