//! Optional transformation applied to the fused embedding before regression.

use std::path::Path;

use candle_core::{DType, Device, Tensor};
use candle_nn::{Linear, Module};

use crate::error::PredictError;

pub trait Refiner: Send + Sync {
    fn input_dim(&self) -> usize;

    fn output_dim(&self) -> usize;

    fn transform(&self, input: &[f32]) -> Result<Vec<f32>, PredictError>;
}

/// Identity; used when no refinement model is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Passthrough {
    dim: usize,
}

impl Passthrough {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl Refiner for Passthrough {
    fn input_dim(&self) -> usize {
        self.dim
    }

    fn output_dim(&self) -> usize {
        self.dim
    }

    fn transform(&self, input: &[f32]) -> Result<Vec<f32>, PredictError> {
        check_input("refiner", self.dim, input)?;
        Ok(input.to_vec())
    }
}

/// `y = W x + b` with `W` shaped `output_dim x input_dim`.
#[derive(Debug, Clone)]
pub struct LinearProjection {
    linear: Linear,
    input_dim: usize,
    output_dim: usize,
}

impl LinearProjection {
    /// `weight` is row-major, one row of `input_dim` values per output.
    pub fn from_parts(
        weight: Vec<f32>,
        bias: Option<Vec<f32>>,
        input_dim: usize,
        output_dim: usize,
    ) -> Result<Self, PredictError> {
        if input_dim == 0 || output_dim == 0 {
            return Err(PredictError::Config(format!(
                "linear projection must have non-zero dimensions, got {output_dim}x{input_dim}"
            )));
        }
        if weight.len() != input_dim * output_dim {
            return Err(PredictError::Config(format!(
                "weight has {} values, expected {output_dim}x{input_dim}",
                weight.len()
            )));
        }
        if let Some(bias) = bias.as_ref().filter(|b| b.len() != output_dim) {
            return Err(PredictError::Config(format!(
                "bias has {} values, expected {output_dim}",
                bias.len()
            )));
        }

        let weight = Tensor::from_vec(weight, (output_dim, input_dim), &Device::Cpu)?;
        let bias = bias
            .map(|b| Tensor::from_vec(b, output_dim, &Device::Cpu))
            .transpose()?;
        Ok(Self {
            linear: Linear::new(weight, bias),
            input_dim,
            output_dim,
        })
    }

    /// Reads `weight` (and optionally `bias`) from a safetensors file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PredictError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(PredictError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
            });
        }

        let tensors = candle_core::safetensors::load(path, &Device::Cpu)?;
        let weight = tensors
            .get("weight")
            .ok_or_else(|| PredictError::format(path, "missing `weight` tensor"))?;
        let (output_dim, input_dim) = weight
            .dims2()
            .map_err(|e| PredictError::format(path, format!("`weight` must be 2-D: {e}")))?;
        let weight = weight.to_dtype(DType::F32)?.flatten_all()?.to_vec1::<f32>()?;

        let bias = match tensors.get("bias") {
            Some(b) => Some(b.to_dtype(DType::F32)?.flatten_all()?.to_vec1::<f32>()?),
            None => None,
        };

        let projection = Self::from_parts(weight, bias, input_dim, output_dim)
            .map_err(|e| PredictError::format(path, e))?;
        tracing::info!(path = %path.display(), input_dim, output_dim, "refinement model loaded");
        Ok(projection)
    }
}

impl Refiner for LinearProjection {
    fn input_dim(&self) -> usize {
        self.input_dim
    }

    fn output_dim(&self) -> usize {
        self.output_dim
    }

    fn transform(&self, input: &[f32]) -> Result<Vec<f32>, PredictError> {
        check_input("refiner", self.input_dim, input)?;
        let project = || -> candle_core::Result<Vec<f32>> {
            let x = Tensor::new(input, &Device::Cpu)?.unsqueeze(0)?;
            self.linear.forward(&x)?.squeeze(0)?.to_vec1::<f32>()
        };
        project().map_err(PredictError::Refine)
    }
}

pub(crate) fn check_input(
    stage: &'static str,
    expected: usize,
    input: &[f32],
) -> Result<(), PredictError> {
    if input.len() != expected {
        return Err(PredictError::Dimension {
            stage,
            expected,
            actual: input.len(),
        });
    }
    Ok(())
}
