//! Fusion and price prediction.
//!
//! [`PricePredictor`] embeds the text and image of a listing concurrently, concatenates the two
//! vectors (text first), runs the optional [`Refiner`] and hands the result to a [`Regressor`].

pub mod config;
pub mod context;
pub mod error;
pub mod predictor;
pub mod refine;
pub mod regressor;

pub use config::{ModelConfig, RefinementConfig, RegressorConfig};
pub use context::ModelContext;
pub use error::PredictError;
pub use predictor::PricePredictor;
pub use refine::{LinearProjection, Passthrough, Refiner};
pub use regressor::{MissingType, OutputLink, Regressor, TreeEnsemble};
