//! Stage orchestration.
//!
//! ```text
//! load ─▶ embed? ─▶ project ─▶ attribute ─▶ normalize? ─▶ assemble ─▶ write
//! ```
//!
//! A [`Pipeline`] is assembled once from a validated [`GalaxyConfig`]. The
//! mode picks the strategy pair; everything downstream of the strategies only
//! sees one position and one color per record.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use attribution::{ClusterColoring, ClusterSummary, ColorStrategy, RandomColoring, SizeBuckets};
use ingest::{LoadReport, LoadedRecords, LoaderConfig, MessageRecord, SampleGenerator};
use projection::{
    LearnedProjection, NormalizationReport, ShellPlacement, SpatialStrategy, normalize_points,
};
use semantic::{Embedder, Embeddings, SemanticConfig, build_embedder, embed_records};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{GalaxyConfig, Mode};
use crate::error::PipelineError;
use crate::export::{
    ExportConfig, ExportSummary, GalaxyPoint, assemble_points, truncate_text, write_galaxy,
};

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Load,
    Representation,
    Projection,
    Attribution,
    Normalization,
    Export,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Load => "load",
            Stage::Representation => "representation",
            Stage::Projection => "projection",
            Stage::Attribution => "attribution",
            Stage::Normalization => "normalization",
            Stage::Export => "export",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observer for per-stage latency and outcome.
pub trait PipelineMetrics: Send + Sync {
    fn record_stage(&self, stage: Stage, latency: Duration, result: Result<(), PipelineError>);
}

struct MetricsSpan<'a> {
    recorder: &'a dyn PipelineMetrics,
    stage: Stage,
    start: Instant,
}

impl<'a> MetricsSpan<'a> {
    fn start(recorder: Option<&'a Arc<dyn PipelineMetrics>>, stage: Stage) -> Option<Self> {
        recorder.map(|recorder| Self {
            recorder: recorder.as_ref(),
            stage,
            start: Instant::now(),
        })
    }

    fn record<T>(self, result: &Result<T, PipelineError>) {
        let outcome = match result {
            Ok(_) => Ok(()),
            Err(err) => Err(err.clone()),
        };
        self.recorder
            .record_stage(self.stage, self.start.elapsed(), outcome);
    }
}

/// Output of [`Pipeline::run`].
#[derive(Debug, Clone, PartialEq)]
pub struct GalaxyBuild {
    pub mode: Mode,
    /// One point per input record, in input order.
    pub points: Vec<GalaxyPoint>,
    /// Present when the spatial strategy's output was normalized.
    pub normalization: Option<NormalizationReport>,
    /// Per-cluster populations; empty for random coloring.
    pub clusters: Vec<ClusterSummary>,
}

/// Everything a full load-to-disk run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildOutcome {
    pub load: LoadReport,
    pub build: GalaxyBuild,
    pub export: ExportSummary,
}

/// A configured strategy pair plus the shared downstream stages.
pub struct Pipeline {
    mode: Mode,
    loader: LoaderConfig,
    semantic: SemanticConfig,
    embedder: Option<Box<dyn Embedder>>,
    spatial: Box<dyn SpatialStrategy>,
    colors: Box<dyn ColorStrategy>,
    sizes: SizeBuckets,
    scale: f64,
    export: ExportConfig,
    metrics: Option<Arc<dyn PipelineMetrics>>,
}

impl Pipeline {
    /// Validates `cfg` and builds the strategy pair its mode selects.
    pub fn from_config(cfg: &GalaxyConfig) -> Result<Self, PipelineError> {
        cfg.validate()?;
        let palette = cfg.palette()?;

        let (embedder, spatial, colors): (
            Option<Box<dyn Embedder>>,
            Box<dyn SpatialStrategy>,
            Box<dyn ColorStrategy>,
        ) = match cfg.mode {
            Mode::Semantic => (
                Some(build_embedder(&cfg.semantic)?),
                Box::new(LearnedProjection::new(cfg.reduction_params())?),
                Box::new(ClusterColoring::new(&cfg.clustering_params(), palette)?),
            ),
            Mode::Procedural => (
                None,
                Box::new(ShellPlacement::new(cfg.shell_params())?),
                Box::new(RandomColoring::new(palette, cfg.clustering_params().seed)),
            ),
        };

        Ok(Self::assemble(cfg, embedder, spatial, colors))
    }

    /// Builds a pipeline around caller-supplied strategies. Sections of
    /// `cfg` that configure strategies are ignored.
    pub fn with_strategies(
        cfg: &GalaxyConfig,
        embedder: Option<Box<dyn Embedder>>,
        spatial: Box<dyn SpatialStrategy>,
        colors: Box<dyn ColorStrategy>,
    ) -> Result<Self, PipelineError> {
        cfg.validate()?;
        Ok(Self::assemble(cfg, embedder, spatial, colors))
    }

    fn assemble(
        cfg: &GalaxyConfig,
        embedder: Option<Box<dyn Embedder>>,
        spatial: Box<dyn SpatialStrategy>,
        colors: Box<dyn ColorStrategy>,
    ) -> Self {
        Self {
            mode: cfg.mode,
            loader: cfg.loader.clone(),
            semantic: cfg.semantic.clone(),
            embedder,
            spatial,
            colors,
            sizes: cfg.sizes.clone(),
            scale: cfg.normalization.scale,
            export: cfg.export.clone(),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn PipelineMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn load(&self, path: &Path) -> Result<LoadedRecords, PipelineError> {
        let span = MetricsSpan::start(self.metrics.as_ref(), Stage::Load);
        let result = ingest::load_records(path, &self.loader).map_err(PipelineError::from);
        if let Some(span) = span {
            span.record(&result);
        }
        result
    }

    /// Runs every in-memory stage over `records`.
    pub async fn run(&self, records: &[MessageRecord]) -> Result<GalaxyBuild, PipelineError> {
        let start = Instant::now();
        let count = records.len();

        if count == 0 {
            warn!(mode = %self.mode, "no records to place");
            return Ok(GalaxyBuild {
                mode: self.mode,
                points: Vec::new(),
                normalization: None,
                clusters: Vec::new(),
            });
        }

        let embeddings = self.represent(records).await?;
        let vectors = embeddings.as_ref().map(|e| e.as_slice());

        let span = MetricsSpan::start(self.metrics.as_ref(), Stage::Projection);
        let result = self
            .spatial
            .project(count, vectors)
            .map_err(PipelineError::from)
            .and_then(|points| check_len("projection", count, points.len()).map(|_| points));
        if let Some(span) = span {
            span.record(&result);
        }
        let mut positions = result?;

        let span = MetricsSpan::start(self.metrics.as_ref(), Stage::Attribution);
        let result = self
            .colors
            .attribute(count, vectors)
            .map_err(PipelineError::from)
            .and_then(|attribution| {
                check_len("attribution", count, attribution.colors.len()).map(|_| attribution)
            });
        if let Some(span) = span {
            span.record(&result);
        }
        let attribution = result?;
        let clusters = attribution.cluster_summary(self.colors.palette());

        let normalization = if self.spatial.requires_normalization() {
            let span = MetricsSpan::start(self.metrics.as_ref(), Stage::Normalization);
            let result = normalize_points(&mut positions, self.scale).map_err(PipelineError::from);
            if let Some(span) = span {
                span.record(&result);
            }
            Some(result?)
        } else {
            None
        };

        let texts: Vec<String> = records
            .iter()
            .map(|r| truncate_text(&r.text, self.export.max_text_length))
            .collect();
        let sizes: Vec<f64> = texts.iter().map(|t| self.sizes.size_for(t)).collect();
        let points = assemble_points(records, texts, &positions, attribution.colors, &sizes)?;

        info!(
            mode = %self.mode,
            spatial = self.spatial.name(),
            colors = self.colors.name(),
            points = points.len(),
            clusters = clusters.len(),
            elapsed_micros = start.elapsed().as_micros() as u64,
            "pipeline_complete"
        );

        Ok(GalaxyBuild {
            mode: self.mode,
            points,
            normalization,
            clusters,
        })
    }

    /// Writes a finished build atomically.
    pub fn write(&self, build: &GalaxyBuild, path: &Path) -> Result<ExportSummary, PipelineError> {
        let span = MetricsSpan::start(self.metrics.as_ref(), Stage::Export);
        let result = write_galaxy(path, &build.points).map_err(PipelineError::from);
        if let Some(span) = span {
            span.record(&result);
        }
        result
    }

    /// Load, run, and write.
    pub async fn build(&self, input: &Path, output: &Path) -> Result<BuildOutcome, PipelineError> {
        let loaded = self.load(input)?;
        let build = self.run(&loaded.records).await?;
        let export = self.write(&build, output)?;
        Ok(BuildOutcome {
            load: loaded.report,
            build,
            export,
        })
    }

    async fn represent(
        &self,
        records: &[MessageRecord],
    ) -> Result<Option<Embeddings>, PipelineError> {
        let Some(embedder) = self.embedder.as_deref() else {
            return Ok(None);
        };
        let span = MetricsSpan::start(self.metrics.as_ref(), Stage::Representation);
        // Full text, not the export cap.
        let texts: Vec<String> = records.iter().map(|r| r.text.clone()).collect();
        let result = embed_records(embedder, &texts, &self.semantic)
            .await
            .map_err(PipelineError::from)
            .and_then(|embeddings| {
                check_len("representation", records.len(), embeddings.len()).map(|_| embeddings)
            });
        if let Some(span) = span {
            span.record(&result);
        }
        result.map(Some)
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("mode", &self.mode)
            .field("embedder", &self.embedder.as_ref().map(|e| e.model_name()))
            .field("spatial", &self.spatial.name())
            .field("colors", &self.colors.name())
            .field("scale", &self.scale)
            .finish()
    }
}

fn check_len(stage: &'static str, expected: usize, actual: usize) -> Result<(), PipelineError> {
    if actual == expected {
        Ok(())
    } else {
        Err(PipelineError::LengthMismatch {
            stage,
            expected,
            actual,
        })
    }
}

/// Builds the galaxy described by `cfg`, reading `paths.input` and writing
/// `paths.output`.
pub async fn build_galaxy(cfg: &GalaxyConfig) -> Result<BuildOutcome, PipelineError> {
    let pipeline = Pipeline::from_config(cfg)?;
    pipeline.build(&cfg.paths.input, &cfg.paths.output).await
}

/// Generates `count` synthetic records and renders them procedurally to
/// `paths.output`. No input file or embedding service is involved.
///
/// Output is byte-for-byte reproducible once `sample.base_time` is set.
pub async fn build_sample(
    cfg: &GalaxyConfig,
    count: usize,
) -> Result<(GalaxyBuild, ExportSummary), PipelineError> {
    let cfg = cfg.clone().with_mode(Mode::Procedural);
    let pipeline = Pipeline::from_config(&cfg)?;
    let mut generator = SampleGenerator::new(cfg.seed);
    if let Some(base_time) = cfg.sample.base_time {
        generator = generator.with_base_time(base_time);
    }
    let records = generator.generate(count);
    let build = pipeline.run(&records).await?;
    let summary = pipeline.write(&build, &cfg.paths.output)?;
    Ok((build, summary))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use attribution::Palette;
    use projection::{ProjectionError, ShellParams, SpatialPoint};

    use super::*;

    fn record(id: &str, text: &str) -> MessageRecord {
        MessageRecord {
            id: id.into(),
            conversation_id: None,
            conversation_title: "Chat".into(),
            text: text.into(),
            created_at: None,
        }
    }

    fn words(n: usize) -> String {
        vec!["word"; n].join(" ")
    }

    #[derive(Default)]
    struct RecordingMetrics {
        events: Mutex<Vec<(Stage, bool)>>,
    }

    impl RecordingMetrics {
        fn snapshot(&self) -> Vec<(Stage, bool)> {
            self.events.lock().unwrap().clone()
        }
    }

    impl PipelineMetrics for RecordingMetrics {
        fn record_stage(&self, stage: Stage, _latency: Duration, result: Result<(), PipelineError>) {
            self.events.lock().unwrap().push((stage, result.is_ok()));
        }
    }

    struct CollapsedStrategy;

    impl SpatialStrategy for CollapsedStrategy {
        fn project(
            &self,
            count: usize,
            _embeddings: Option<&[Vec<f32>]>,
        ) -> Result<Vec<SpatialPoint>, ProjectionError> {
            Ok((0..count)
                .map(|i| SpatialPoint::new(i as f64, 5.0, -(i as f64)))
                .collect())
        }

        fn requires_normalization(&self) -> bool {
            true
        }

        fn name(&self) -> &'static str {
            "collapsed"
        }
    }

    struct ShortStrategy;

    impl SpatialStrategy for ShortStrategy {
        fn project(
            &self,
            _count: usize,
            _embeddings: Option<&[Vec<f32>]>,
        ) -> Result<Vec<SpatialPoint>, ProjectionError> {
            Ok(vec![SpatialPoint::default()])
        }

        fn requires_normalization(&self) -> bool {
            false
        }

        fn name(&self) -> &'static str {
            "short"
        }
    }

    #[tokio::test]
    async fn procedural_run_preserves_order_and_sizes() {
        let cfg = GalaxyConfig::default().with_mode(Mode::Procedural);
        let pipeline = Pipeline::from_config(&cfg).unwrap();
        let records = vec![
            record("a", &words(10)),
            record("b", &words(50)),
            record("c", &words(200)),
        ];

        let build = pipeline.run(&records).await.unwrap();
        let ids: Vec<_> = build.points.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        let sizes: Vec<_> = build.points.iter().map(|p| p.size).collect();
        assert_eq!(sizes, [8.0, 12.0, 16.0]);
        assert!(build.normalization.is_none());
        assert!(build.clusters.is_empty());
        for p in &build.points {
            let r = SpatialPoint::new(p.x, p.y, p.z).radius();
            assert!((90.0 - 1e-9..=150.0 + 1e-9).contains(&r), "radius {r}");
        }
    }

    #[tokio::test]
    async fn size_uses_truncated_text() {
        let mut cfg = GalaxyConfig::default().with_mode(Mode::Procedural);
        cfg.export.max_text_length = 20;
        let pipeline = Pipeline::from_config(&cfg).unwrap();
        let build = pipeline.run(&[record("a", &words(200))]).await.unwrap();
        assert_eq!(build.points[0].text.chars().count(), 20);
        assert_eq!(build.points[0].size, 8.0);
    }

    #[tokio::test]
    async fn empty_input_yields_empty_build() {
        let cfg = GalaxyConfig::default().with_mode(Mode::Procedural);
        let pipeline = Pipeline::from_config(&cfg).unwrap();
        let build = pipeline.run(&[]).await.unwrap();
        assert!(build.points.is_empty());
    }

    #[tokio::test]
    async fn custom_strategy_output_is_normalized() {
        let cfg = GalaxyConfig::default();
        let palette = Palette::default();
        let pipeline = Pipeline::with_strategies(
            &cfg,
            None,
            Box::new(CollapsedStrategy),
            Box::new(RandomColoring::new(palette, 1)),
        )
        .unwrap();
        let records: Vec<_> = (0..3).map(|i| record(&i.to_string(), "hi")).collect();

        let build = pipeline.run(&records).await.unwrap();
        let report = build.normalization.unwrap();
        assert_eq!(report.degenerate_axes, vec![projection::Axis::Y]);
        assert_eq!(build.points[0].x, -100.0);
        assert_eq!(build.points[2].x, 100.0);
        assert_eq!(build.points[1].y, 0.0);
        assert_eq!(build.points[0].z, 100.0);
    }

    #[tokio::test]
    async fn learned_strategy_without_embedder_fails() {
        let cfg = GalaxyConfig::default();
        let pipeline = Pipeline::with_strategies(
            &cfg,
            None,
            Box::new(LearnedProjection::new(cfg.reduction_params()).unwrap()),
            Box::new(RandomColoring::new(Palette::default(), 1)),
        )
        .unwrap();
        let err = pipeline.run(&[record("a", "hi")]).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Projection(ProjectionError::MissingEmbeddings { .. })
        ));
    }

    #[test]
    fn only_semantic_mode_gets_an_embedder() {
        let mut cfg = GalaxyConfig::default();
        cfg.semantic = SemanticConfig::stub(8);
        assert!(Pipeline::from_config(&cfg).unwrap().embedder.is_some());
        let procedural = cfg.with_mode(Mode::Procedural);
        assert!(Pipeline::from_config(&procedural).unwrap().embedder.is_none());
    }

    #[tokio::test]
    async fn short_strategy_output_is_rejected() {
        let cfg = GalaxyConfig::default();
        let metrics = Arc::new(RecordingMetrics::default());
        let pipeline = Pipeline::with_strategies(
            &cfg,
            None,
            Box::new(ShortStrategy),
            Box::new(RandomColoring::new(Palette::default(), 1)),
        )
        .unwrap()
        .with_metrics(metrics.clone());

        let err = pipeline
            .run(&[record("a", "x"), record("b", "y")])
            .await
            .unwrap_err();
        assert_eq!(
            err,
            PipelineError::LengthMismatch {
                stage: "projection",
                expected: 2,
                actual: 1
            }
        );
        assert_eq!(metrics.snapshot(), vec![(Stage::Projection, false)]);
    }

    #[tokio::test]
    async fn metrics_see_every_stage_in_order() {
        let mut cfg = GalaxyConfig::default();
        cfg.semantic = SemanticConfig::stub(16);
        cfg.clustering.num_clusters = 2;
        cfg.reduction.n_neighbors = 3;
        cfg.reduction.n_epochs = Some(20);

        let metrics = Arc::new(RecordingMetrics::default());
        let pipeline = Pipeline::from_config(&cfg)
            .unwrap()
            .with_metrics(metrics.clone());
        let records: Vec<_> = (0..6)
            .map(|i| record(&format!("m{i}"), &format!("message number {i} about topic {}", i % 2)))
            .collect();

        let build = pipeline.run(&records).await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        pipeline
            .write(&build, &dir.path().join("galaxy.json"))
            .unwrap();

        let stages: Vec<_> = metrics.snapshot().into_iter().map(|(s, _)| s).collect();
        assert_eq!(
            stages,
            vec![
                Stage::Representation,
                Stage::Projection,
                Stage::Attribution,
                Stage::Normalization,
                Stage::Export
            ]
        );
        assert!(metrics.snapshot().iter().all(|(_, ok)| *ok));
        assert_eq!(build.clusters.iter().map(|c| c.size).sum::<usize>(), 6);
    }

    #[test]
    fn shell_params_are_validated_at_construction() {
        let mut cfg = GalaxyConfig::default().with_mode(Mode::Procedural);
        cfg.shell = crate::config::ShellYamlConfig {
            base_radius: -5.0,
            ..Default::default()
        };
        assert!(matches!(
            Pipeline::from_config(&cfg),
            Err(PipelineError::Config(_))
        ));
        assert!(ShellPlacement::new(ShellParams::default()).is_ok());
    }

    #[tokio::test]
    async fn sample_build_writes_requested_count() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = GalaxyConfig::default().with_paths("unused.json", dir.path().join("sample.json"));
        let (build, summary) = build_sample(&cfg, 25).await.unwrap();
        assert_eq!(build.mode, Mode::Procedural);
        assert_eq!(build.points.len(), 25);
        assert_eq!(summary.points, 25);
        assert!(summary.path.exists());
    }
}
