//! Splitting a flat token sequence into fixed-length, overlapping encoder windows.

use crate::config::ChunkingConfig;
use crate::error::EmbedError;

/// Framing and padding tokens of a tokenizer.
///
/// `cls` is prepended and `sep` appended to every window; `pad` fills the remainder up to the
/// window length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecialTokens {
    pub cls: Option<u32>,
    pub sep: Option<u32>,
    pub pad: u32,
}

impl SpecialTokens {
    /// No framing, padding with id 0.
    pub const NONE: Self = Self {
        cls: None,
        sep: None,
        pad: 0,
    };

    pub fn framing_len(&self) -> usize {
        usize::from(self.cls.is_some()) + usize::from(self.sep.is_some())
    }
}

/// One encoder input: token ids plus a mask marking real (non-padding) positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenWindow {
    pub input_ids: Vec<u32>,
    pub attention_mask: Vec<bool>,
}

impl TokenWindow {
    pub fn len(&self) -> usize {
        self.input_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input_ids.is_empty()
    }

    /// Number of positions that take part in pooling.
    pub fn valid_len(&self) -> usize {
        self.attention_mask.iter().filter(|m| **m).count()
    }

    pub fn mask_u32(&self) -> Vec<u32> {
        self.attention_mask.iter().map(|m| u32::from(*m)).collect()
    }
}

#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkingConfig,
    special: SpecialTokens,
    content_len: usize,
}

impl Chunker {
    pub fn new(config: ChunkingConfig, special: SpecialTokens) -> Result<Self, EmbedError> {
        let framing = special.framing_len();
        if config.max_length <= framing {
            return Err(EmbedError::Config(format!(
                "max_length {} leaves no room for content after {} special tokens",
                config.max_length, framing
            )));
        }
        let content_len = config.max_length - framing;
        if config.stride == 0 || config.stride > content_len {
            return Err(EmbedError::Config(format!(
                "stride must be in 1..={content_len}, got {}",
                config.stride
            )));
        }
        Ok(Self {
            config,
            special,
            content_len,
        })
    }

    /// Tokens of actual text per window.
    pub fn content_len(&self) -> usize {
        self.content_len
    }

    pub fn window_len(&self) -> usize {
        self.config.max_length
    }

    pub fn special_tokens(&self) -> SpecialTokens {
        self.special
    }

    /// Start offsets into the token sequence, one per window.
    ///
    /// Windows start every `stride` tokens until one reaches the end of the sequence. A sequence
    /// no longer than one window yields exactly `[0]`; an empty one yields nothing.
    pub fn window_starts(&self, n_tokens: usize) -> Vec<usize> {
        if n_tokens == 0 {
            return Vec::new();
        }
        let mut starts = vec![0];
        let mut start = 0;
        while start + self.content_len < n_tokens {
            start += self.config.stride;
            starts.push(start);
        }
        starts
    }

    pub fn windows(&self, tokens: &[u32]) -> Vec<TokenWindow> {
        self.window_starts(tokens.len())
            .into_iter()
            .map(|start| {
                let end = (start + self.content_len).min(tokens.len());
                self.frame(&tokens[start..end])
            })
            .collect()
    }

    fn frame(&self, content: &[u32]) -> TokenWindow {
        let len = self.config.max_length;
        let mut input_ids = Vec::with_capacity(len);
        input_ids.extend(self.special.cls);
        input_ids.extend_from_slice(content);
        input_ids.extend(self.special.sep);

        let mut attention_mask = vec![true; input_ids.len()];
        attention_mask.resize(len, false);
        input_ids.resize(len, self.special.pad);

        TokenWindow {
            input_ids,
            attention_mask,
        }
    }
}
