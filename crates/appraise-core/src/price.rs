use appraise_error::ModelError;
use serde::{Deserialize, Serialize};

/// Output of one prediction. Always finite and non-negative.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PredictedPrice(f64);

impl PredictedPrice {
    /// Rejects NaN and infinities; negative regressor output is clamped to zero.
    pub fn from_raw(raw: f64) -> Result<Self, ModelError> {
        if !raw.is_finite() {
            return Err(ModelError::NonFinite { value: raw });
        }
        Ok(Self(raw.max(0.0)))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl std::fmt::Display for PredictedPrice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}
