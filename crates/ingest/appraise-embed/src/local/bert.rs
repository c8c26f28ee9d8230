use std::path::Path;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config, HiddenAct, DTYPE};
use tokenizers::Tokenizer;

use crate::chunk::{SpecialTokens, TokenWindow};
use crate::config::TextModelConfig;
use crate::error::EmbedError;
use crate::local::ModelFiles;
use crate::pooling::HiddenStates;
use crate::text::{TextEncoder, TextTokenizer};

/// `tokenizer.json` tokenizer with its own padding and truncation disabled; windowing is done
/// by [`crate::chunk::Chunker`].
pub struct HfTokenizer {
    inner: Tokenizer,
    special: SpecialTokens,
}

impl HfTokenizer {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, EmbedError> {
        let mut inner = Tokenizer::from_file(path).map_err(EmbedError::tokenizer)?;
        inner.with_padding(None);
        inner
            .with_truncation(None)
            .map_err(EmbedError::tokenizer)?;

        let special = SpecialTokens {
            cls: first_known(&inner, &["[CLS]", "<s>"]),
            sep: first_known(&inner, &["[SEP]", "</s>"]),
            pad: first_known(&inner, &["[PAD]", "<pad>"]).unwrap_or(0),
        };
        tracing::debug!(?special, "tokenizer loaded");
        Ok(Self { inner, special })
    }
}

fn first_known(tokenizer: &Tokenizer, candidates: &[&str]) -> Option<u32> {
    candidates.iter().find_map(|t| tokenizer.token_to_id(t))
}

impl TextTokenizer for HfTokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<u32>, EmbedError> {
        let encoding = self
            .inner
            .encode(text, false)
            .map_err(EmbedError::tokenizer)?;
        Ok(encoding.get_ids().to_vec())
    }

    fn special_tokens(&self) -> SpecialTokens {
        self.special
    }
}

pub struct BertTextEncoder {
    model: BertModel,
    device: Device,
    hidden_size: usize,
}

impl BertTextEncoder {
    pub fn load(
        files: &ModelFiles,
        config: &TextModelConfig,
        device: &Device,
    ) -> Result<Self, EmbedError> {
        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(files.get("config.json")?)?)?;
        let hidden_size = raw
            .get("hidden_size")
            .and_then(|v| v.as_u64())
            .ok_or_else(|| EmbedError::load("bert config", "missing hidden_size"))?
            as usize;
        let mut bert_config: Config = serde_json::from_value(raw)?;
        if config.approximate_gelu {
            bert_config.hidden_act = HiddenAct::GeluApproximate;
        }

        let vb = if config.use_pth {
            VarBuilder::from_pth(files.get("pytorch_model.bin")?, DTYPE, device)?
        } else {
            let weights = files.get("model.safetensors")?;
            // SAFETY: the weights file is not modified while the process is running.
            unsafe { VarBuilder::from_mmaped_safetensors(&[weights], DTYPE, device)? }
        };

        let model = BertModel::load(vb, &bert_config)
            .map_err(|e| EmbedError::load("bert model", e))?;

        tracing::info!(model = %config.model_id, hidden_size, "text encoder loaded");
        Ok(Self {
            model,
            device: device.clone(),
            hidden_size,
        })
    }
}

impl TextEncoder for BertTextEncoder {
    fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    fn forward(&self, window: &TokenWindow) -> Result<HiddenStates, EmbedError> {
        let input_ids = Tensor::new(window.input_ids.as_slice(), &self.device)?.unsqueeze(0)?;
        let token_type_ids = input_ids.zeros_like()?;
        let attention_mask = Tensor::new(window.mask_u32().as_slice(), &self.device)?.unsqueeze(0)?;

        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;

        Ok(hidden.squeeze(0)?.to_dtype(DType::F32)?)
    }
}
