// ============================================================
// Layer 4 — Segmentation Batcher
// ============================================================
// Implements Burn's Batcher trait to stack a Vec of decoded
// samples into two 4-D tensors:
//
//   Input:  N SegmentationItems (image [3*S*S], mask [S*S])
//   Output: images [N, 3, S, S], masks [N, 1, S, S]
//
// Every item already has the same side length S because the
// Preprocessor resizes on load, so batching is a flatten and
// a reshape.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::SegmentationItem;

/// A batch of samples ready for the model forward pass.
#[derive(Debug, Clone)]
pub struct SegmentationBatch<B: Backend> {
    /// RGB images in [0, 1], shape [batch_size, 3, size, size]
    pub images: Tensor<B, 4>,

    /// Target masks in {0, 1}, shape [batch_size, 1, size, size]
    pub masks: Tensor<B, 4>,
}

#[derive(Clone, Debug)]
pub struct SegmentationBatcher {
    /// Side length every item was resized to
    pub image_size: usize,
}

impl SegmentationBatcher {
    pub fn new(image_size: usize) -> Self {
        Self { image_size }
    }

    /// Stack CHW image planes into [N, 3, size, size].
    pub fn images_tensor<B: Backend>(&self, planes: Vec<Vec<f32>>, device: &B::Device) -> Tensor<B, 4> {
        self.stack(planes, 3, device)
    }

    fn stack<B: Backend>(&self, planes: Vec<Vec<f32>>, channels: usize, device: &B::Device) -> Tensor<B, 4> {
        let batch_size = planes.len();
        let flat: Vec<f32> = planes.into_iter().flatten().collect();
        Tensor::<B, 4>::from_data(
            TensorData::new(flat, [batch_size, channels, self.image_size, self.image_size]),
            device,
        )
    }
}

impl<B: Backend> Batcher<B, SegmentationItem, SegmentationBatch<B>> for SegmentationBatcher {
    fn batch(&self, items: Vec<SegmentationItem>, device: &B::Device) -> SegmentationBatch<B> {
        let (images, masks): (Vec<_>, Vec<_>) =
            items.into_iter().map(|item| (item.image, item.mask)).unzip();

        SegmentationBatch {
            images: self.stack(images, 3, device),
            masks:  self.stack(masks, 1, device),
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_batch_shapes() {
        let device = Default::default();
        let items = vec![
            SegmentationItem { image: vec![0.5; 3 * 4 * 4], mask: vec![1.0; 16] },
            SegmentationItem { image: vec![0.1; 3 * 4 * 4], mask: vec![0.0; 16] },
        ];
        let batch: SegmentationBatch<TestBackend> = SegmentationBatcher::new(4).batch(items, &device);

        assert_eq!(batch.images.dims(), [2, 3, 4, 4]);
        assert_eq!(batch.masks.dims(), [2, 1, 4, 4]);
        let mask_sum: f32 = batch.masks.sum().into_scalar().elem();
        assert_eq!(mask_sum, 16.0);
    }

    #[test]
    fn test_sample_order_is_preserved() {
        let device = Default::default();
        let items = vec![
            SegmentationItem { image: vec![0.0; 3], mask: vec![0.0] },
            SegmentationItem { image: vec![1.0; 3], mask: vec![1.0] },
        ];
        let batch: SegmentationBatch<TestBackend> = SegmentationBatcher::new(1).batch(items, &device);

        let second: f32 = batch.images.slice([1..2, 0..3, 0..1, 0..1]).sum().into_scalar().elem();
        assert_eq!(second, 3.0);
    }
}
