// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Loads once, predicts many. Each image goes through the same
// resize and normalisation as training, the probability map is
// thresholded, and the mask is scaled back to the image's own
// size with nearest-neighbour so it stays strictly 0 / 255.

use anyhow::{bail, Context, Result};
use burn::prelude::*;
use image::{imageops::FilterType, DynamicImage, GrayImage, Luma};
use std::path::Path;

use crate::data::{batcher::SegmentationBatcher, preprocessor::Preprocessor};
use crate::ml::model::UNet;

pub struct Inferencer<B: Backend> {
    model:        UNet<B>,
    preprocessor: Preprocessor,
    threshold:    f64,
    device:       B::Device,
}

impl<B: Backend> Inferencer<B> {
    pub fn new(model: UNet<B>, image_size: usize, threshold: f64, device: B::Device) -> Result<Self> {
        if !(threshold > 0.0 && threshold < 1.0) {
            bail!("threshold must lie in (0, 1), got {threshold}");
        }
        Ok(Self {
            model,
            preprocessor: Preprocessor::new(image_size),
            threshold,
            device,
        })
    }

    /// Foreground probabilities at model resolution, row-major [size * size].
    pub fn probabilities(&self, img: &DynamicImage) -> Result<Vec<f32>> {
        let plane  = self.preprocessor.image_to_chw(img);
        let images = SegmentationBatcher::new(self.preprocessor.size())
            .images_tensor::<B>(vec![plane], &self.device);

        self.model
            .forward(images)
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| anyhow::anyhow!("Cannot read prediction tensor: {e:?}"))
    }

    /// Binary mask (0 = background, 255 = pet) at the input's own resolution.
    pub fn predict_mask(&self, img: &DynamicImage) -> Result<GrayImage> {
        let size  = self.preprocessor.size() as u32;
        let probs = self.probabilities(img)?;

        let mask = GrayImage::from_fn(size, size, |x, y| {
            let p = probs[(y * size + x) as usize] as f64;
            Luma([if p > self.threshold { 255 } else { 0 }])
        });

        let (width, height) = (img.width(), img.height());
        let mask = DynamicImage::ImageLuma8(mask)
            .resize_exact(width, height, FilterType::Nearest)
            .to_luma8();

        tracing::debug!(
            "Predicted {} foreground pixels of {}",
            mask.pixels().filter(|p| p[0] > 0).count(),
            width * height
        );
        Ok(mask)
    }

    /// Read `input`, predict its mask and write it to `output` as PNG.
    pub fn predict_file(&self, input: &Path, output: &Path) -> Result<()> {
        let img = image::open(input)
            .with_context(|| format!("Cannot decode '{}'", input.display()))?;
        self.predict_mask(&img)?
            .save(output)
            .with_context(|| format!("Cannot write mask to '{}'", output.display()))
    }
}
