//! Mocks, fixtures and tracing setup shared by the workspace's integration tests.

pub mod fixtures;
pub mod mocks;

use appraise_embed::{ChunkingConfig, ImageEmbedder, TextEmbedder};
use appraise_predict::{ModelContext, Regressor};
use tracing::Level;

use crate::mocks::{HashEncoder, MeanColorEncoder, WordTokenizer};

pub const MOCK_TEXT_DIM: usize = 8;
pub const MOCK_IMAGE_DIM: usize = MeanColorEncoder::DIM;
pub const MOCK_FUSED_DIM: usize = MOCK_TEXT_DIM + MOCK_IMAGE_DIM;

/// 16-token windows: 14 content tokens between `[CLS]` and `[SEP]`, starts 4 apart.
pub const MOCK_CHUNKING: ChunkingConfig = ChunkingConfig {
    max_length: 16,
    stride: 4,
};

pub fn mock_text_embedder(encoder: HashEncoder) -> TextEmbedder {
    TextEmbedder::new(Box::new(WordTokenizer), Box::new(encoder), MOCK_CHUNKING)
        .expect("mock chunking config is valid")
}

pub fn mock_image_embedder(encoder: MeanColorEncoder) -> ImageEmbedder {
    ImageEmbedder::new(Box::new(encoder))
}

/// Mock text and image models with no refinement in front of `regressor`.
pub fn mock_context(regressor: impl Regressor + 'static) -> ModelContext {
    ModelContext::new(
        mock_text_embedder(HashEncoder::new(MOCK_TEXT_DIM)),
        mock_image_embedder(MeanColorEncoder::default()),
        None,
        Box::new(regressor),
    )
    .expect("mock dimensions line up")
}

/// Installs a stderr subscriber at `level` unless `RUST_LOG` says otherwise. Returns false if a
/// global subscriber was already installed.
pub fn init_tracing_tests(level: Level) -> bool {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{level},candle_core=error,candle_transformers=error,tokenizers=error,hyper_util=error"
        ))
    });
    fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .with_target(true)
        .with_line_number(true)
        .without_time()
        .try_init()
        .is_ok()
}
