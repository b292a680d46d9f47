//! Neural Galaxy Representation
//!
//! This crate turns message texts into dense vectors. Give it an ordered list of
//! strings and you get back an ordered list of equally sized embeddings, one per
//! string, ready for dimensionality reduction and clustering.
//!
//! Two back-ends are bundled:
//!
//! - **API mode** - POST batches to an HTTP feature-extraction endpoint
//!   (Hugging Face router, OpenAI-compatible, or a custom `{"texts": [...]}`
//!   service).
//! - **Stub mode** - Deterministic hashed bag-of-words vectors. No network,
//!   handy for offline runs and tests.
//!
//! Anything else can plug in by implementing [`Embedder`].
//!
//! ## Guarantees
//!
//! [`embed_records`] preserves input order, checks every batch returns exactly
//! one vector per text, and checks every vector has the same non-zero length
//! with finite components. Any violation fails the whole call; there is no
//! partial output and no retry.
//!
//! ## Quick example
//!
//! ```
//! use semantic::{build_embedder, embed_records, SemanticConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let cfg = SemanticConfig::stub(32).with_batch_size(2);
//!     let embedder = build_embedder(&cfg).unwrap();
//!     let texts = vec!["one".to_string(), "two".to_string(), "three".to_string()];
//!
//!     let embeddings = embed_records(embedder.as_ref(), &texts, &cfg).await.unwrap();
//!     assert_eq!(embeddings.len(), 3);
//!     assert_eq!(embeddings.dim, 32);
//! }
//! ```

pub mod config;
pub mod error;
pub mod types;

mod api;
mod normalize;
mod stub;

use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, info, warn};

pub use crate::api::ApiEmbedder;
pub use crate::config::{SemanticConfig, DEFAULT_API_URL};
pub use crate::error::SemanticError;
pub use crate::normalize::unit_normalize;
pub use crate::stub::StubEmbedder;
pub use crate::types::Embeddings;

/// A text-to-vector service.
///
/// Implementations must return one vector per input text, in input order, and
/// must be deterministic for a fixed model version.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Name recorded next to the produced embeddings.
    fn model_name(&self) -> &str;

    /// Embeds one batch of texts.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, SemanticError>;
}

/// Constructs the back-end selected by `cfg.mode`.
pub fn build_embedder(cfg: &SemanticConfig) -> Result<Box<dyn Embedder>, SemanticError> {
    cfg.validate()?;
    match cfg.mode.as_str() {
        "api" => Ok(Box::new(ApiEmbedder::from_config(cfg)?)),
        "stub" => Ok(Box::new(StubEmbedder::new(cfg.stub_dimension))),
        other => Err(SemanticError::InvalidConfig(format!(
            "unknown semantic mode `{other}`"
        ))),
    }
}

/// Embeds `texts` in batches of `cfg.batch_size`, preserving order.
///
/// Vectors are L2-normalized when `cfg.normalize` is set. Zero vectors cannot
/// be normalized; they are kept as returned and counted in one warning.
pub async fn embed_records(
    embedder: &dyn Embedder,
    texts: &[String],
    cfg: &SemanticConfig,
) -> Result<Embeddings, SemanticError> {
    if cfg.batch_size == 0 {
        return Err(SemanticError::InvalidConfig(
            "batch_size must be at least 1".into(),
        ));
    }

    let start = Instant::now();
    let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(texts.len());
    let mut dim = 0usize;
    let mut zero_norm = 0usize;

    for (batch, chunk) in texts.chunks(cfg.batch_size).enumerate() {
        let batch_start = Instant::now();
        let returned = embedder.embed(chunk).await?;
        if returned.len() != chunk.len() {
            return Err(SemanticError::BatchSizeMismatch {
                batch,
                expected: chunk.len(),
                actual: returned.len(),
            });
        }

        for mut vector in returned {
            let index = vectors.len();
            if vector.is_empty() {
                return Err(SemanticError::EmptyVector { index });
            }
            if index == 0 {
                dim = vector.len();
            } else if vector.len() != dim {
                return Err(SemanticError::DimensionMismatch {
                    index,
                    expected: dim,
                    actual: vector.len(),
                });
            }
            if vector.iter().any(|x| !x.is_finite()) {
                return Err(SemanticError::NonFinite { index });
            }
            if cfg.normalize && unit_normalize(&mut vector).is_none() {
                zero_norm += 1;
            }
            vectors.push(vector);
        }

        debug!(
            batch,
            size = chunk.len(),
            elapsed_micros = batch_start.elapsed().as_micros(),
            "embedding_batch"
        );
    }

    if zero_norm > 0 {
        warn!(count = zero_norm, "zero_norm_vectors");
    }

    info!(
        model = embedder.model_name(),
        count = vectors.len(),
        dim,
        elapsed_micros = start.elapsed().as_micros(),
        "embeddings_ready"
    );

    Ok(Embeddings {
        vectors,
        dim,
        model_name: embedder.model_name().to_string(),
        normalized: cfg.normalize,
    })
}
