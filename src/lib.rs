//! Neural Galaxy: turns a collection of conversational messages into a
//! bounded, colored 3D point cloud.
//!
//! This crate stitches the stage crates together:
//!
//! | Stage          | Crate          |
//! |----------------|----------------|
//! | Loader         | [`ingest`]     |
//! | Representation | [`semantic`]   |
//! | Projection     | [`projection`] |
//! | Attribution    | [`attribution`]|
//! | Normalization  | [`projection`] |
//! | Exporter       | [`export`]     |
//!
//! ```no_run
//! use galaxy::{GalaxyConfig, build_galaxy};
//!
//! # async fn run() -> Result<(), galaxy::PipelineError> {
//! let cfg = GalaxyConfig::from_file("galaxy.yaml")?;
//! let outcome = build_galaxy(&cfg).await?;
//! println!("wrote {} points", outcome.export.points);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod pipeline;

pub use attribution::{
    Attribution, AttributionError, ClusterColoring, ClusterSummary, ClusteringParams, Color,
    ColorStrategy, Palette, RandomColoring, SizeBuckets,
};
pub use ingest::{IngestError, LoadReport, LoaderConfig, MessageRecord, SampleGenerator};
pub use projection::{
    LearnedProjection, Metric, NormalizationReport, ProjectionError, ReductionParams,
    ShellParams, ShellPlacement, SpatialPoint, SpatialStrategy,
};
pub use semantic::{Embedder, SemanticConfig, SemanticError};

pub use crate::config::{ConfigError, GalaxyConfig, Mode, SampleConfig};
pub use crate::error::PipelineError;
pub use crate::export::{
    ExportConfig, ExportError, ExportSummary, GalaxyPoint, assemble_points, truncate_text,
    write_galaxy,
};
pub use crate::pipeline::{
    BuildOutcome, GalaxyBuild, Pipeline, PipelineMetrics, Stage, build_galaxy, build_sample,
};
