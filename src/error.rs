use attribution::AttributionError;
use ingest::IngestError;
use projection::ProjectionError;
use semantic::SemanticError;
use thiserror::Error;

use crate::config::ConfigError;
use crate::export::ExportError;

/// Any failure that aborts a galaxy build.
///
/// Each variant wraps the error of the stage that raised it, so callers can
/// still match on the stage-specific detail.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("loader failure: {0}")]
    Ingest(#[from] IngestError),

    #[error("embedding failure: {0}")]
    Semantic(#[from] SemanticError),

    #[error("projection failure: {0}")]
    Projection(#[from] ProjectionError),

    #[error("attribution failure: {0}")]
    Attribution(#[from] AttributionError),

    #[error("export failure: {0}")]
    Export(#[from] ExportError),

    #[error("stage `{stage}` produced {actual} items for {expected} records")]
    LengthMismatch {
        stage: &'static str,
        expected: usize,
        actual: usize,
    },
}
