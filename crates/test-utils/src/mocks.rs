//! Deterministic stand-ins for the pretrained models.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use appraise_embed::{
    EmbedError, HiddenStates, ImageEncoder, ImagePreprocessing, PreparedImage, SpecialTokens,
    TextEncoder, TextTokenizer, TokenWindow,
};
use appraise_predict::{PredictError, Regressor};
use candle_core::{Device, Tensor};

pub const CLS: u32 = 101;
pub const SEP: u32 = 102;
pub const PAD: u32 = 0;

/// Splits on whitespace; each word maps to a stable id above the special-token range.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordTokenizer;

impl WordTokenizer {
    pub fn word_id(word: &str) -> u32 {
        // FNV-1a
        let hash = word
            .bytes()
            .fold(0xcbf2_9ce4_8422_2325u64, |h, b| (h ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3));
        1000 + (hash % 20_000) as u32
    }
}

impl TextTokenizer for WordTokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<u32>, EmbedError> {
        Ok(text.split_whitespace().map(Self::word_id).collect())
    }

    fn special_tokens(&self) -> SpecialTokens {
        SpecialTokens {
            cls: Some(CLS),
            sep: Some(SEP),
            pad: PAD,
        }
    }
}

/// Hidden state of token `t` at dimension `j`, in `[0, 1)`.
pub fn token_feature(token: u32, j: usize) -> f32 {
    ((u64::from(token) * 31 + j as u64 * 17) % 101) as f32 / 101.0
}

/// Text encoder whose hidden states depend only on the token id.
///
/// `with_padding_value` overwrites every masked-out row, which must not change pooled output.
#[derive(Debug, Clone)]
pub struct HashEncoder {
    hidden_size: usize,
    padding_value: Option<f32>,
    calls: Arc<AtomicUsize>,
}

impl HashEncoder {
    pub fn new(hidden_size: usize) -> Self {
        Self {
            hidden_size,
            padding_value: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_padding_value(mut self, value: f32) -> Self {
        self.padding_value = Some(value);
        self
    }

    /// Shared counter of `forward` calls, one per window.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl TextEncoder for HashEncoder {
    fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    fn forward(&self, window: &TokenWindow) -> Result<HiddenStates, EmbedError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let rows: Vec<f32> = window
            .input_ids
            .iter()
            .zip(&window.attention_mask)
            .flat_map(|(&token, &valid)| match (valid, self.padding_value) {
                (false, Some(v)) => vec![v; self.hidden_size],
                _ => (0..self.hidden_size).map(|j| token_feature(token, j)).collect(),
            })
            .collect();
        let shape = (window.input_ids.len(), self.hidden_size);
        Ok(Tensor::from_vec(rows, shape, &Device::Cpu)?)
    }
}

/// Per-channel mean of an 8x8 un-normalized image, so a solid colour `c` embeds to `c / 255`.
#[derive(Debug, Clone, Default)]
pub struct MeanColorEncoder {
    calls: Arc<AtomicUsize>,
}

impl MeanColorEncoder {
    pub const DIM: usize = 3;

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl ImageEncoder for MeanColorEncoder {
    fn embedding_dim(&self) -> usize {
        Self::DIM
    }

    fn preprocessing(&self) -> ImagePreprocessing {
        ImagePreprocessing {
            size: 8,
            mean: [0.0; 3],
            std: [1.0; 3],
        }
    }

    fn forward(&self, image: &PreparedImage) -> Result<Vec<f32>, EmbedError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok((0..3)
            .map(|c| {
                let channel = image.channel(c);
                channel.iter().sum::<f32>() / channel.len() as f32
            })
            .collect())
    }
}

fn forward_failure(what: &str) -> EmbedError {
    EmbedError::Tensor(candle_core::Error::Msg(format!("{what} forward failed")))
}

#[derive(Debug, Clone, Copy)]
pub struct FailingTextEncoder {
    pub hidden_size: usize,
}

impl TextEncoder for FailingTextEncoder {
    fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    fn forward(&self, _window: &TokenWindow) -> Result<HiddenStates, EmbedError> {
        Err(forward_failure("text"))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FailingImageEncoder;

impl ImageEncoder for FailingImageEncoder {
    fn embedding_dim(&self) -> usize {
        MeanColorEncoder::DIM
    }

    fn preprocessing(&self) -> ImagePreprocessing {
        ImagePreprocessing::clip(8)
    }

    fn forward(&self, _image: &PreparedImage) -> Result<Vec<f32>, EmbedError> {
        Err(forward_failure("image"))
    }
}

/// Returns `bias + sum(features)` and counts calls.
#[derive(Debug, Clone)]
pub struct SumRegressor {
    n_features: usize,
    bias: f64,
    calls: Arc<AtomicUsize>,
}

impl SumRegressor {
    pub fn new(n_features: usize, bias: f64) -> Self {
        Self {
            n_features,
            bias,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl Regressor for SumRegressor {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, features: &[f32]) -> Result<f64, PredictError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.bias + features.iter().map(|&x| f64::from(x)).sum::<f64>())
    }
}
