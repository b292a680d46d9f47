use async_trait::async_trait;
use fxhash::hash64;

use crate::{Embedder, SemanticError};

/// Deterministic offline embedder.
///
/// Each lowercase whitespace token is hashed into one of `dimension` buckets
/// with a hash-derived sign, so texts sharing vocabulary land near each other.
/// Texts without tokens fall back to a sinusoid seeded by the hash of the raw
/// text, which keeps every vector non-zero.
#[derive(Debug, Clone)]
pub struct StubEmbedder {
    dimension: usize,
    model_name: String,
}

impl StubEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            model_name: format!("stub-{dimension}"),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub(crate) fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dimension];
        if self.dimension == 0 {
            return v;
        }
        let mut tokens = 0usize;
        for token in text.split_whitespace() {
            let h = hash64(token.to_lowercase().as_bytes());
            let bucket = (h % self.dimension as u64) as usize;
            let sign = if h >> 63 == 0 { 1.0 } else { -1.0 };
            v[bucket] += sign;
            tokens += 1;
        }
        if tokens == 0 {
            let h = hash64(text.as_bytes());
            for (idx, value) in v.iter_mut().enumerate() {
                *value = ((h >> (idx % 32)) as f32 * 0.0001).sin();
            }
        }
        v
    }
}

#[async_trait]
impl Embedder for StubEmbedder {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, SemanticError> {
        Ok(texts.iter().map(|text| self.embed_one(text)).collect())
    }
}
