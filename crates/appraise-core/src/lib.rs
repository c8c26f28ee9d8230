//! Value types passed between the embedding and prediction stages.

pub mod embeddings;
pub mod price;

pub use embeddings::{EmbeddingShape, EmbeddingVector, FusedEmbedding, ImageEmbedding, TextEmbedding};
pub use price::PredictedPrice;
