//! Image decoding, preprocessing and feature extraction.

use appraise_core::ImageEmbedding;
use appraise_error::InputError;
use image::imageops::FilterType;
use image::DynamicImage;
use tracing::instrument;

use crate::error::EmbedError;

/// CLIP normalization constants.
pub const CLIP_MEAN: [f32; 3] = [0.481_454_66, 0.457_827_5, 0.408_210_73];
pub const CLIP_STD: [f32; 3] = [0.268_629_54, 0.261_302_6, 0.275_777_1];

/// Resize and normalization parameters required by an image encoder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImagePreprocessing {
    pub size: u32,
    pub mean: [f32; 3],
    pub std: [f32; 3],
}

impl ImagePreprocessing {
    pub const fn clip(size: u32) -> Self {
        Self {
            size,
            mean: CLIP_MEAN,
            std: CLIP_STD,
        }
    }
}

/// Normalized RGB pixels in CHW layout, `3 * size * size` values.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedImage {
    pub pixels: Vec<f32>,
    pub size: u32,
}

impl PreparedImage {
    pub fn channel(&self, c: usize) -> &[f32] {
        let area = (self.size * self.size) as usize;
        &self.pixels[c * area..(c + 1) * area]
    }
}

/// Pretrained image encoder producing one fixed-size vector per image.
pub trait ImageEncoder: Send + Sync {
    fn embedding_dim(&self) -> usize;

    fn preprocessing(&self) -> ImagePreprocessing;

    fn forward(&self, image: &PreparedImage) -> Result<Vec<f32>, EmbedError>;
}

pub struct ImageEmbedder {
    encoder: Box<dyn ImageEncoder>,
}

impl std::fmt::Debug for ImageEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageEmbedder")
            .field("embedding_dim", &self.encoder.embedding_dim())
            .field("preprocessing", &self.encoder.preprocessing())
            .finish()
    }
}

impl ImageEmbedder {
    pub fn new(encoder: Box<dyn ImageEncoder>) -> Self {
        Self { encoder }
    }

    pub fn dimensions(&self) -> usize {
        self.encoder.embedding_dim()
    }

    #[instrument(skip_all, fields(n_bytes = bytes.len()))]
    pub fn embed(&self, bytes: &[u8]) -> Result<ImageEmbedding, EmbedError> {
        let decoded = decode(bytes)?;
        let prepared = prepare(&decoded, &self.encoder.preprocessing());
        drop(decoded);

        let features = self.encoder.forward(&prepared)?;
        let expected = self.encoder.embedding_dim();
        if features.len() != expected {
            return Err(EmbedError::Dimension {
                stage: "image encoder",
                expected,
                actual: features.len(),
            });
        }
        tracing::debug!(dim = features.len(), "image embedding ready");
        Ok(ImageEmbedding::new(features))
    }
}

/// Decode any raster format the `image` crate recognizes from its magic bytes.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, EmbedError> {
    if bytes.is_empty() {
        return Err(InputError::EmptyImage.into());
    }
    image::load_from_memory(bytes).map_err(|e| {
        InputError::UndecodableImage {
            reason: e.to_string(),
        }
        .into()
    })
}

/// Bilinear resize to a square, RGB conversion, then `(x / 255 - mean) / std` per channel.
pub fn prepare(img: &DynamicImage, params: &ImagePreprocessing) -> PreparedImage {
    let size = params.size;
    let rgb = img
        .resize_exact(size, size, FilterType::Triangle)
        .to_rgb8();

    let area = (size * size) as usize;
    let mut pixels = vec![0.0f32; 3 * area];
    for (i, px) in rgb.pixels().enumerate() {
        for c in 0..3 {
            pixels[c * area + i] = (f32::from(px.0[c]) / 255.0 - params.mean[c]) / params.std[c];
        }
    }
    PreparedImage { pixels, size }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{ImageFormat, Rgb, RgbImage};

    use super::*;

    fn encode(img: RgbImage, format: ImageFormat) -> Vec<u8> {
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), format)
            .expect("encode fixture");
        buf
    }

    /// Per-channel mean of the prepared pixels.
    struct ChannelMeanEncoder;

    impl ImageEncoder for ChannelMeanEncoder {
        fn embedding_dim(&self) -> usize {
            3
        }

        fn preprocessing(&self) -> ImagePreprocessing {
            ImagePreprocessing {
                size: 8,
                mean: [0.0; 3],
                std: [1.0; 3],
            }
        }

        fn forward(&self, image: &PreparedImage) -> Result<Vec<f32>, EmbedError> {
            Ok((0..3)
                .map(|c| {
                    let ch = image.channel(c);
                    ch.iter().sum::<f32>() / ch.len() as f32
                })
                .collect())
        }
    }

    struct WrongDimEncoder;

    impl ImageEncoder for WrongDimEncoder {
        fn embedding_dim(&self) -> usize {
            16
        }

        fn preprocessing(&self) -> ImagePreprocessing {
            ImagePreprocessing::clip(4)
        }

        fn forward(&self, _image: &PreparedImage) -> Result<Vec<f32>, EmbedError> {
            Ok(vec![0.0; 3])
        }
    }

    #[test]
    fn solid_color_png_embeds_to_channel_values() {
        let bytes = encode(RgbImage::from_pixel(20, 10, Rgb([255, 0, 51])), ImageFormat::Png);
        let embedder = ImageEmbedder::new(Box::new(ChannelMeanEncoder));

        let embedding = embedder.embed(&bytes).expect("embed");
        let v = embedding.as_slice();
        assert!((v[0] - 1.0).abs() < 1e-5);
        assert!(v[1].abs() < 1e-5);
        assert!((v[2] - 0.2).abs() < 1e-5);
    }

    #[test]
    fn jpeg_is_supported() {
        let bytes = encode(RgbImage::from_pixel(100, 100, Rgb([120, 90, 60])), ImageFormat::Jpeg);
        let embedder = ImageEmbedder::new(Box::new(ChannelMeanEncoder));
        assert_eq!(embedder.embed(&bytes).expect("embed").dim(), 3);
    }

    #[test]
    fn prepare_lays_out_channels_first_and_normalizes() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(5, 7, Rgb([255, 255, 255])));
        let prepared = prepare(&img, &ImagePreprocessing::clip(4));

        assert_eq!(prepared.pixels.len(), 3 * 16);
        for c in 0..3 {
            let expected = (1.0 - CLIP_MEAN[c]) / CLIP_STD[c];
            assert!(prepared.channel(c).iter().all(|v| (v - expected).abs() < 1e-5));
        }
    }

    #[test]
    fn garbage_bytes_are_an_input_error() {
        let embedder = ImageEmbedder::new(Box::new(ChannelMeanEncoder));
        let err = embedder.embed(b"definitely not an image").unwrap_err();
        assert!(matches!(
            err,
            EmbedError::Input(InputError::UndecodableImage { .. })
        ));

        let err = embedder.embed(&[]).unwrap_err();
        assert!(matches!(err, EmbedError::Input(InputError::EmptyImage)));
    }

    #[test]
    fn truncated_png_is_an_input_error() {
        let bytes = encode(RgbImage::from_pixel(32, 32, Rgb([1, 2, 3])), ImageFormat::Png);
        let embedder = ImageEmbedder::new(Box::new(ChannelMeanEncoder));
        let err = embedder.embed(&bytes[..16]).unwrap_err();
        assert!(matches!(
            err,
            EmbedError::Input(InputError::UndecodableImage { .. })
        ));
    }

    #[test]
    fn encoder_output_length_is_checked() {
        let bytes = encode(RgbImage::from_pixel(4, 4, Rgb([0, 0, 0])), ImageFormat::Png);
        let embedder = ImageEmbedder::new(Box::new(WrongDimEncoder));
        let err = embedder.embed(&bytes).unwrap_err();
        assert!(matches!(
            err,
            EmbedError::Dimension {
                expected: 16,
                actual: 3,
                ..
            }
        ));
    }
}
