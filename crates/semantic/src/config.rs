use serde::{Deserialize, Serialize};

use crate::SemanticError;

/// Hugging Face router endpoint for the default sentence-transformers model.
pub const DEFAULT_API_URL: &str = "https://router.huggingface.co/hf-inference/models/sentence-transformers/all-MiniLM-L6-v2/pipeline/feature-extraction";

/// Runtime configuration describing which embedding back-end to use and how to
/// post-process vectors.
///
/// # Example
/// ```
/// use semantic::SemanticConfig;
///
/// let cfg = SemanticConfig {
///     mode: "stub".into(),
///     stub_dimension: 32,
///     batch_size: 16,
///     ..Default::default()
/// };
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SemanticConfig {
    /// Back-end selector: `"api"` (remote HTTP) or `"stub"` (deterministic hash vectors).
    pub mode: String,
    /// Label recorded alongside the embeddings and sent to OpenAI-style endpoints.
    pub model_name: String,
    /// Embedding endpoint when [`mode`](Self::mode) is `"api"`.
    pub api_url: Option<String>,
    /// Authorization header value (e.g., `"Bearer hf_xxx"`).
    pub api_auth_header: Option<String>,
    /// Remote provider hint: `"hf"`, `"openai"`, or `"custom"` (default).
    pub api_provider: Option<String>,
    /// Overall request timeout in seconds.
    pub api_timeout_secs: u64,
    /// Number of texts sent per embedding call.
    pub batch_size: usize,
    /// Normalize every vector to unit length.
    pub normalize: bool,
    /// Vector length produced by the stub back-end.
    pub stub_dimension: usize,
}

impl SemanticConfig {
    /// Stub back-end with the given dimensionality.
    pub fn stub(dimension: usize) -> Self {
        Self {
            mode: "stub".into(),
            stub_dimension: dimension,
            ..Default::default()
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_auth_header(mut self, header: impl Into<String>) -> Self {
        self.api_auth_header = Some(header.into());
        self
    }

    pub fn validate(&self) -> Result<(), SemanticError> {
        match self.mode.as_str() {
            "api" => {
                let url = self.api_url.as_deref().unwrap_or_default();
                if url.trim().is_empty() {
                    return Err(SemanticError::InvalidConfig(
                        "api_url is required for api mode".into(),
                    ));
                }
                if self.api_timeout_secs == 0 {
                    return Err(SemanticError::InvalidConfig(
                        "api_timeout_secs must be at least 1".into(),
                    ));
                }
            }
            "stub" => {
                if self.stub_dimension == 0 {
                    return Err(SemanticError::InvalidConfig(
                        "stub_dimension must be at least 1".into(),
                    ));
                }
            }
            other => {
                return Err(SemanticError::InvalidConfig(format!(
                    "unknown semantic mode `{other}` (expected `api` or `stub`)"
                )))
            }
        }
        if self.batch_size == 0 {
            return Err(SemanticError::InvalidConfig(
                "batch_size must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            mode: "api".into(),
            model_name: "all-MiniLM-L6-v2".into(),
            api_url: Some(DEFAULT_API_URL.into()),
            api_auth_header: None,
            api_provider: Some("hf".into()),
            api_timeout_secs: 30,
            batch_size: 64,
            normalize: true,
            stub_dimension: 384,
        }
    }
}
