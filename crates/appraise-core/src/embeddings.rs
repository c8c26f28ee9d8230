use serde::{Deserialize, Serialize};

pub type EmbeddingVector = Vec<f32>;

macro_rules! embedding_wrapper {
    ($name:ident) => {
        impl $name {
            pub fn new(values: EmbeddingVector) -> Self {
                Self(values)
            }

            pub fn dim(&self) -> usize {
                self.0.len()
            }

            pub fn as_slice(&self) -> &[f32] {
                &self.0
            }

            pub fn into_inner(self) -> EmbeddingVector {
                self.0
            }
        }

        impl AsRef<[f32]> for $name {
            fn as_ref(&self) -> &[f32] {
                &self.0
            }
        }

        impl From<EmbeddingVector> for $name {
            fn from(values: EmbeddingVector) -> Self {
                Self(values)
            }
        }
    };
}

/// Mean of the pooled chunk embeddings of one text input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TextEmbedding(EmbeddingVector);

embedding_wrapper!(TextEmbedding);

/// Feature vector of one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageEmbedding(EmbeddingVector);

embedding_wrapper!(ImageEmbedding);

/// `[text, image]` concatenated in that order.
///
/// Keeps the split point so either half can be recovered, e.g. for logging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedEmbedding {
    values: EmbeddingVector,
    text_dim: usize,
}

impl FusedEmbedding {
    /// Consumes both embeddings; the text half always comes first.
    pub fn fuse(text: TextEmbedding, image: ImageEmbedding) -> Self {
        let text_dim = text.dim();
        let mut values = text.into_inner();
        values.extend(image.into_inner());
        Self { values, text_dim }
    }

    pub fn dim(&self) -> usize {
        self.values.len()
    }

    pub fn shape(&self) -> EmbeddingShape {
        EmbeddingShape::new(self.text_dim, self.values.len() - self.text_dim)
    }

    pub fn text_part(&self) -> &[f32] {
        &self.values[..self.text_dim]
    }

    pub fn image_part(&self) -> &[f32] {
        &self.values[self.text_dim..]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    pub fn into_inner(self) -> EmbeddingVector {
        self.values
    }
}

impl AsRef<[f32]> for FusedEmbedding {
    fn as_ref(&self) -> &[f32] {
        &self.values
    }
}

/// Dimensions of the two modality embeddings produced by a loaded model set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmbeddingShape {
    pub text_dim: usize,
    pub image_dim: usize,
}

impl EmbeddingShape {
    pub const fn new(text_dim: usize, image_dim: usize) -> Self {
        Self {
            text_dim,
            image_dim,
        }
    }

    pub const fn fused_dim(&self) -> usize {
        self.text_dim + self.image_dim
    }
}

impl std::fmt::Display for EmbeddingShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "text<{}> + image<{}> = <{}>",
            self.text_dim,
            self.image_dim,
            self.fused_dim()
        )
    }
}
