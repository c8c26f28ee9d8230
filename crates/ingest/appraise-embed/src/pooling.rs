use appraise_error::InputError;
use candle_core::{DType, Device, Tensor};

use crate::error::EmbedError;

/// Per-position encoder output for one window, shaped `(window_len, hidden_size)`.
pub type HiddenStates = Tensor;

/// Lower bound on the valid-token count so an all-padding window divides by ~0 instead of 0.
pub const MASK_SUM_EPSILON: f32 = 1e-9;

/// Mean of the hidden states at positions where `mask` is true.
///
/// Padding positions are weighted by zero, so any finite value the encoder put there has no
/// effect on the result.
pub fn mean_pool(
    hidden: &HiddenStates,
    mask: &[bool],
    hidden_size: usize,
) -> Result<Vec<f32>, EmbedError> {
    let (seq_len, width) = hidden.dims2()?;
    if seq_len != mask.len() {
        return Err(EmbedError::Dimension {
            stage: "text encoder sequence",
            expected: mask.len(),
            actual: seq_len,
        });
    }
    if width != hidden_size {
        return Err(EmbedError::Dimension {
            stage: "text encoder hidden",
            expected: hidden_size,
            actual: width,
        });
    }

    let hidden = hidden.to_dtype(DType::F32)?;
    let mask: Vec<f32> = mask.iter().map(|&valid| if valid { 1.0 } else { 0.0 }).collect();
    let weights = Tensor::new(mask.as_slice(), hidden.device())?
        .unsqueeze(1)?
        .broadcast_as(hidden.shape())?;

    let sum_embeddings = (&hidden * &weights)?.sum_keepdim(0)?;
    let sum_weights = weights.sum_keepdim(0)?.clamp(MASK_SUM_EPSILON, f32::MAX)?;
    let pooled = (sum_embeddings / sum_weights)?;
    Ok(pooled.squeeze(0)?.to_vec1()?)
}

/// Unweighted element-wise mean of equally sized vectors.
pub fn average(vectors: &[Vec<f32>]) -> Result<Vec<f32>, EmbedError> {
    let Some(first) = vectors.first() else {
        return Err(InputError::NoTokens.into());
    };
    let dim = first.len();
    if let Some(bad) = vectors.iter().find(|v| v.len() != dim) {
        return Err(EmbedError::Dimension {
            stage: "chunk embedding",
            expected: dim,
            actual: bad.len(),
        });
    }

    let stacked = Tensor::from_vec(vectors.concat(), (vectors.len(), dim), &Device::Cpu)?;
    Ok(stacked.mean(0)?.to_vec1()?)
}
