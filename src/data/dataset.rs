// ============================================================
// Layer 4 — Segmentation Dataset
// ============================================================
// Burn `Dataset` over image/mask pairs. Items are decoded on
// every `get`, so only the file list lives in memory.
//
// Every file is decoded once at construction. A corrupt sample
// stops the run before the first epoch instead of ending a
// partition early inside the data loader.

use anyhow::{Context, Result};
use burn::data::dataset::Dataset;

use crate::data::preprocessor::Preprocessor;
use crate::domain::sample_pair::SamplePair;

/// One decoded and resized image/mask sample.
/// `image` is a [3 * size * size] CHW plane, `mask` a [size * size] plane.
#[derive(Debug, Clone)]
pub struct SegmentationItem {
    pub image: Vec<f32>,
    pub mask:  Vec<f32>,
}

/// Image/mask pairs decoded lazily on each `get`.
#[derive(Debug)]
pub struct SegmentationDataset {
    pairs:        Vec<SamplePair>,
    preprocessor: Preprocessor,
}

impl SegmentationDataset {
    /// Build a dataset over `pairs`, decoding every file once.
    pub fn new(pairs: Vec<SamplePair>, preprocessor: Preprocessor) -> Result<Self> {
        for pair in &pairs {
            for path in [&pair.image, &pair.mask] {
                preprocessor
                    .verify(path)
                    .with_context(|| format!("Unreadable sample file '{}'", path.display()))?;
            }
        }
        Ok(Self { pairs, preprocessor })
    }

    /// The subset of `pairs` selected by `indices`, in that order.
    pub fn from_indices(
        pairs:        &[SamplePair],
        indices:      &[usize],
        preprocessor: Preprocessor,
    ) -> Result<Self> {
        let selected = indices
            .iter()
            .map(|&i| {
                pairs
                    .get(i)
                    .cloned()
                    .with_context(|| format!("Split index {i} out of range for {} samples", pairs.len()))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(selected, preprocessor)
    }

    pub fn load(&self, index: usize) -> Result<SegmentationItem> {
        let pair = self
            .pairs
            .get(index)
            .with_context(|| format!("Sample index {index} out of range"))?;
        Ok(SegmentationItem {
            image: self.preprocessor.load_image(&pair.image)?,
            mask:  self.preprocessor.load_mask(&pair.mask)?,
        })
    }
}

impl Dataset<SegmentationItem> for SegmentationDataset {
    fn get(&self, index: usize) -> Option<SegmentationItem> {
        if index >= self.pairs.len() {
            return None;
        }
        match self.load(index) {
            Ok(item) => Some(item),
            Err(e) => {
                tracing::error!("Failed to load sample {index}: {e:#}");
                None
            }
        }
    }

    fn len(&self) -> usize {
        self.pairs.len()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};
    use std::path::Path;

    /// Write `count` 8x8 image/mask pairs; the mask foreground is the
    /// left half for even indices and the right half for odd ones.
    pub(crate) fn write_fixture(root: &Path, count: usize) -> Vec<SamplePair> {
        let images = root.join("images");
        let masks  = root.join("annotations");
        std::fs::create_dir_all(&images).unwrap();
        std::fs::create_dir_all(&masks).unwrap();

        (0..count)
            .map(|i| {
                let left = i % 2 == 0;
                let img  = RgbImage::from_fn(8, 8, |x, _| {
                    if (x < 4) == left { Rgb([230, 200, 40]) } else { Rgb([10, 20, 90]) }
                });
                let mask = GrayImage::from_fn(8, 8, |x, _| Luma([((x < 4) == left) as u8]));

                let image_path = images.join(format!("pet_{i:02}.png"));
                let mask_path  = masks.join(format!("pet_{i:02}.png"));
                img.save(&image_path).unwrap();
                mask.save(&mask_path).unwrap();
                SamplePair::new(image_path, mask_path)
            })
            .collect()
    }

    #[test]
    fn test_get_returns_resized_planes() {
        let tmp   = tempfile::tempdir().unwrap();
        let pairs = write_fixture(tmp.path(), 2);
        let ds    = SegmentationDataset::new(pairs, Preprocessor::new(16)).unwrap();

        let item = ds.get(1).unwrap();
        assert_eq!(item.image.len(), 3 * 16 * 16);
        assert_eq!(item.mask.len(), 16 * 16);
        // odd index → right half is foreground
        assert_eq!(item.mask[0], 0.0);
        assert_eq!(item.mask[15], 1.0);
    }

    #[test]
    fn test_get_out_of_range_is_none() {
        let tmp = tempfile::tempdir().unwrap();
        let ds  = SegmentationDataset::new(write_fixture(tmp.path(), 1), Preprocessor::new(8)).unwrap();
        assert!(ds.get(1).is_none());
        assert_eq!(ds.len(), 1);
    }

    #[test]
    fn test_get_is_deterministic() {
        let tmp = tempfile::tempdir().unwrap();
        let ds  = SegmentationDataset::new(write_fixture(tmp.path(), 1), Preprocessor::new(8)).unwrap();
        let a = ds.get(0).unwrap();
        let b = ds.get(0).unwrap();
        assert_eq!(a.image, b.image);
        assert_eq!(a.mask, b.mask);
    }

    #[test]
    fn test_from_indices_selects_in_order() {
        let tmp   = tempfile::tempdir().unwrap();
        let pairs = write_fixture(tmp.path(), 3);
        let ds    = SegmentationDataset::from_indices(&pairs, &[2, 0], Preprocessor::new(8)).unwrap();
        assert_eq!(ds.len(), 2);
        assert!(SegmentationDataset::from_indices(&pairs, &[3], Preprocessor::new(8)).is_err());
    }

    /// Cut the trailing `bytes` off a file, leaving a damaged PNG.
    pub(crate) fn truncate(path: &Path, bytes: usize) {
        let data = std::fs::read(path).unwrap();
        std::fs::write(path, &data[..data.len() - bytes]).unwrap();
    }

    #[test]
    fn test_truncated_png_fails_at_construction() {
        let tmp   = tempfile::tempdir().unwrap();
        let pairs = write_fixture(tmp.path(), 4);
        let len   = std::fs::metadata(&pairs[0].image).unwrap().len() as usize;
        truncate(&pairs[0].image, len / 2);

        let err = SegmentationDataset::new(pairs, Preprocessor::new(8)).unwrap_err();
        assert!(format!("{err:#}").contains("pet_00.png"));
    }

    #[test]
    fn test_unreadable_file_fails_at_construction() {
        let tmp = tempfile::tempdir().unwrap();
        let bogus = tmp.path().join("broken.png");
        std::fs::write(&bogus, b"not a png").unwrap();
        let pairs = vec![SamplePair::new(&bogus, &bogus)];
        assert!(SegmentationDataset::new(pairs, Preprocessor::new(8)).is_err());
    }
}
