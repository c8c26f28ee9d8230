pub mod chunk;
pub mod config;
pub mod error;
pub mod vision;
pub mod local;
pub mod pooling;
pub mod text;

pub use chunk::{Chunker, SpecialTokens, TokenWindow};
pub use config::{ChunkingConfig, DevicePreference, ImageModelConfig, ModelSource, TextModelConfig};
pub use error::EmbedError;
pub use vision::{ImageEmbedder, ImageEncoder, ImagePreprocessing, PreparedImage};
pub use pooling::HiddenStates;
pub use text::{TextEmbedder, TextEncoder, TextTokenizer};
