use appraise_core::TextEmbedding;
use appraise_error::InputError;
use tracing::instrument;

use crate::chunk::{Chunker, SpecialTokens, TokenWindow};
use crate::config::ChunkingConfig;
use crate::error::EmbedError;
use crate::pooling::{self, HiddenStates};

/// Turns text into a flat sequence of token ids, without special tokens.
pub trait TextTokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Result<Vec<u32>, EmbedError>;

    fn special_tokens(&self) -> SpecialTokens;
}

/// Pretrained encoder producing per-token hidden states for one window.
pub trait TextEncoder: Send + Sync {
    fn hidden_size(&self) -> usize;

    fn forward(&self, window: &TokenWindow) -> Result<HiddenStates, EmbedError>;
}

/// Embeds arbitrarily long text by chunking it into overlapping windows, mean-pooling each
/// window over its attention mask and averaging the pooled vectors.
pub struct TextEmbedder {
    tokenizer: Box<dyn TextTokenizer>,
    encoder: Box<dyn TextEncoder>,
    chunker: Chunker,
}

impl std::fmt::Debug for TextEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextEmbedder")
            .field("hidden_size", &self.encoder.hidden_size())
            .field("chunker", &self.chunker)
            .finish()
    }
}

impl TextEmbedder {
    pub fn new(
        tokenizer: Box<dyn TextTokenizer>,
        encoder: Box<dyn TextEncoder>,
        chunking: ChunkingConfig,
    ) -> Result<Self, EmbedError> {
        let chunker = Chunker::new(chunking, tokenizer.special_tokens())?;
        Ok(Self {
            tokenizer,
            encoder,
            chunker,
        })
    }

    pub fn dimensions(&self) -> usize {
        self.encoder.hidden_size()
    }

    pub fn chunker(&self) -> &Chunker {
        &self.chunker
    }

    /// Tokenize and split into encoder windows. Fails on empty text or text without tokens.
    pub fn chunk(&self, text: &str) -> Result<Vec<TokenWindow>, EmbedError> {
        if text.is_empty() {
            return Err(InputError::EmptyText.into());
        }
        let tokens = self.tokenizer.tokenize(text)?;
        let windows = self.chunker.windows(&tokens);
        if windows.is_empty() {
            return Err(InputError::NoTokens.into());
        }
        tracing::debug!(
            n_tokens = tokens.len(),
            n_chunks = windows.len(),
            "text chunked"
        );
        Ok(windows)
    }

    /// Pooled embedding of each window, in window order.
    pub fn embed_windows(&self, windows: &[TokenWindow]) -> Result<Vec<Vec<f32>>, EmbedError> {
        let hidden_size = self.encoder.hidden_size();
        windows
            .iter()
            .map(|window| {
                let hidden = self.encoder.forward(window)?;
                pooling::mean_pool(&hidden, &window.attention_mask, hidden_size)
            })
            .collect()
    }

    #[instrument(skip_all, fields(text_len = text.len()))]
    pub fn embed(&self, text: &str) -> Result<TextEmbedding, EmbedError> {
        let windows = self.chunk(text)?;
        let pooled = self.embed_windows(&windows)?;
        let embedding = pooling::average(&pooled)?;
        tracing::debug!(n_chunks = pooled.len(), dim = embedding.len(), "text embedding ready");
        Ok(TextEmbedding::new(embedding))
    }
}
