// ============================================================
// Layer 5 — UNet Model
// ============================================================
// Encoder-decoder with skip connections:
//
//   encoder:    DoubleConv → max-pool, ×4   (64 → 512 channels)
//   bottleneck: DoubleConv                  (1024 channels)
//   decoder:    up-conv → concat skip → DoubleConv, ×4
//   head:       1×1 conv → sigmoid          (1 channel)
//
// Stage widths come from one ordered list, so the encoder and
// decoder are plain vectors walked in opposite directions.
//
// Reference: Ronneberger et al. (2015) U-Net, Burn Book §3

use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig, ConvTranspose2d, ConvTranspose2dConfig},
        pool::{MaxPool2d, MaxPool2dConfig},
        BatchNorm, BatchNormConfig, PaddingConfig2d, Relu,
    },
    prelude::*,
    tensor::activation::sigmoid,
};

/// Number of 2× downsampling stages between input and bottleneck.
pub const ENCODER_DEPTH: usize = 4;

/// Input height and width must be multiples of this so every pooled
/// feature map upsamples back to the size of its skip connection.
pub const SIZE_MULTIPLE: usize = 1 << ENCODER_DEPTH;

#[derive(Config, Debug)]
pub struct UNetConfig {
    #[config(default = 3)]
    pub in_channels: usize,

    /// Width of the first encoder stage; each deeper stage doubles it
    #[config(default = 64)]
    pub base_channels: usize,
}

impl UNetConfig {
    /// Channel width per level, shallowest first. The last entry is the
    /// bottleneck: [64, 128, 256, 512, 1024] for the default config.
    pub fn widths(&self) -> Vec<usize> {
        (0..=ENCODER_DEPTH).map(|level| self.base_channels << level).collect()
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> UNet<B> {
        let widths = self.widths();

        let mut encoder = Vec::with_capacity(ENCODER_DEPTH);
        let mut in_channels = self.in_channels;
        for &width in &widths[..ENCODER_DEPTH] {
            encoder.push(DoubleConv::new(in_channels, width, device));
            in_channels = width;
        }

        let bottleneck = DoubleConv::new(widths[ENCODER_DEPTH - 1], widths[ENCODER_DEPTH], device);

        let decoder = (0..ENCODER_DEPTH)
            .rev()
            .map(|level| UpStage::new(widths[level + 1], widths[level], device))
            .collect();

        let head = Conv2dConfig::new([widths[0], 1], [1, 1]).init(device);
        let pool = MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init();

        UNet { encoder, bottleneck, decoder, head, pool }
    }
}

/// (3×3 conv → batch norm → ReLU) twice, spatial size preserved.
#[derive(Module, Debug)]
pub struct DoubleConv<B: Backend> {
    pub conv1: Conv2d<B>,
    pub norm1: BatchNorm<B>,
    pub conv2: Conv2d<B>,
    pub norm2: BatchNorm<B>,
    pub relu:  Relu,
}

impl<B: Backend> DoubleConv<B> {
    pub fn new(in_channels: usize, out_channels: usize, device: &B::Device) -> Self {
        let conv = |channels: [usize; 2]| {
            Conv2dConfig::new(channels, [3, 3])
                .with_padding(PaddingConfig2d::Same)
                .init(device)
        };
        Self {
            conv1: conv([in_channels, out_channels]),
            norm1: BatchNormConfig::new(out_channels).init(device),
            conv2: conv([out_channels, out_channels]),
            norm2: BatchNormConfig::new(out_channels).init(device),
            relu:  Relu::new(),
        }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.relu.forward(self.norm1.forward(self.conv1.forward(x)));
        self.relu.forward(self.norm2.forward(self.conv2.forward(x)))
    }
}

/// Learned 2× upsampling, concatenation with the mirrored encoder
/// output, then a double conv back down to `out_channels`.
#[derive(Module, Debug)]
pub struct UpStage<B: Backend> {
    pub up:   ConvTranspose2d<B>,
    pub conv: DoubleConv<B>,
}

impl<B: Backend> UpStage<B> {
    pub fn new(in_channels: usize, out_channels: usize, device: &B::Device) -> Self {
        let up = ConvTranspose2dConfig::new([in_channels, out_channels], [2, 2])
            .with_stride([2, 2])
            .init(device);
        // skip (out_channels) ++ upsampled (out_channels)
        let conv = DoubleConv::new(out_channels * 2, out_channels, device);
        Self { up, conv }
    }

    pub fn forward(&self, x: Tensor<B, 4>, skip: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.up.forward(x);
        self.conv.forward(Tensor::cat(vec![skip, x], 1))
    }
}

#[derive(Module, Debug)]
pub struct UNet<B: Backend> {
    pub encoder:    Vec<DoubleConv<B>>,
    pub bottleneck: DoubleConv<B>,
    /// Deepest stage first
    pub decoder:    Vec<UpStage<B>>,
    pub head:       Conv2d<B>,
    pub pool:       MaxPool2d,
}

impl<B: Backend> UNet<B> {
    /// images: [batch, 3, H, W] → per-pixel foreground probability [batch, 1, H, W]
    ///
    /// # Panics
    /// Panics if H or W is not a multiple of [`SIZE_MULTIPLE`].
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 4> {
        let [_, _, height, width] = images.dims();
        assert!(
            height % SIZE_MULTIPLE == 0 && width % SIZE_MULTIPLE == 0,
            "input spatial size {height}x{width} is not a multiple of {SIZE_MULTIPLE}"
        );

        let mut skips = Vec::with_capacity(self.encoder.len());
        let mut x = images;
        for stage in &self.encoder {
            let features = stage.forward(x);
            x = self.pool.forward(features.clone());
            skips.push(features);
        }

        let mut x = self.bottleneck.forward(x);
        for (stage, skip) in self.decoder.iter().zip(skips.into_iter().rev()) {
            x = stage.forward(x, skip);
        }

        sigmoid(self.head.forward(x))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::Distribution;

    type TestBackend = NdArray;

    #[test]
    fn test_default_widths() {
        assert_eq!(UNetConfig::new().widths(), vec![64, 128, 256, 512, 1024]);
    }

    #[test]
    fn test_stage_counts() {
        let device = Default::default();
        let model: UNet<TestBackend> = UNetConfig::new().with_base_channels(4).init(&device);
        assert_eq!(model.encoder.len(), ENCODER_DEPTH);
        assert_eq!(model.decoder.len(), ENCODER_DEPTH);
    }

    #[test]
    fn test_output_shape_matches_input() {
        let device = Default::default();
        let model: UNet<TestBackend> = UNetConfig::new().with_base_channels(4).init(&device);

        for (batch, h, w) in [(1, 16, 16), (2, 32, 16), (3, 32, 48)] {
            let x = Tensor::<TestBackend, 4>::random([batch, 3, h, w], Distribution::Default, &device);
            assert_eq!(model.forward(x).dims(), [batch, 1, h, w]);
        }
    }

    #[test]
    fn test_output_is_probability() {
        let device = Default::default();
        let model: UNet<TestBackend> = UNetConfig::new().with_base_channels(4).init(&device);
        let x = Tensor::<TestBackend, 4>::random([2, 3, 16, 16], Distribution::Default, &device);

        let values = model.forward(x).into_data().to_vec::<f32>().unwrap();
        assert!(values.iter().all(|&p| p > 0.0 && p < 1.0));
    }

    #[test]
    #[should_panic(expected = "not a multiple of 16")]
    fn test_rejects_indivisible_input() {
        let device = Default::default();
        let model: UNet<TestBackend> = UNetConfig::new().with_base_channels(4).init(&device);
        let x = Tensor::<TestBackend, 4>::zeros([1, 3, 24, 24], &device);
        let _ = model.forward(x);
    }
}
