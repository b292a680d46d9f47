//! Galaxy build configuration.
//!
//! One immutable [`GalaxyConfig`] drives a whole run. It is loaded once,
//! validated once, and handed by reference to every stage constructor.
//!
//! Two ways in:
//!
//! - [`GalaxyConfig::from_file`] / [`GalaxyConfig::from_yaml`] read a single
//!   YAML document.
//! - [`GalaxyConfig::load_layered`] stacks built-in defaults, an optional YAML
//!   file, and `GALAXY__*` environment variables (`__` separates nesting, e.g.
//!   `GALAXY__REDUCTION__N_NEIGHBORS=15`).
//!
//! Every random stage has its own optional `seed`; unset stage seeds fall back
//! to the top-level `seed`.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! version: "1.0"
//! mode: semantic            # semantic | procedural
//! seed: 42
//!
//! paths:
//!   input: data/extracted_messages.json
//!   output: frontend/public/galaxy_data.json
//!
//! loader:
//!   strict: true
//!
//! semantic:
//!   mode: api               # api | stub
//!   model_name: all-MiniLM-L6-v2
//!   api_provider: hf
//!   batch_size: 64
//!
//! reduction:
//!   n_neighbors: 10
//!   min_dist: 0.1
//!   metric: cosine
//!
//! clustering:
//!   num_clusters: 5
//!   n_init: 10
//!
//! shell:
//!   base_radius: 90.0
//!   shell_thickness: 60.0
//!
//! normalization:
//!   scale: 100.0
//!
//! sizes:
//!   medium_min_words: 30
//!   large_min_words: 150    # some builds used 80
//!
//! export:
//!   max_text_length: 500
//!
//! sample:
//!   base_time: 1700000000   # omit to anchor at the current time
//! ```

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use attribution::{ClusteringParams, DEFAULT_PALETTE, Palette, SizeBuckets};
use ingest::LoaderConfig;
use projection::{DEFAULT_SCALE, Metric, ReductionParams, ShellParams};
use semantic::SemanticConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::export::ExportConfig;

/// Environment variable prefix for layered loading.
pub const ENV_PREFIX: &str = "GALAXY";

/// Errors raised while loading or validating configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {reason}")]
    FileRead { path: String, reason: String },

    #[error("failed to parse YAML: {0}")]
    YamlParse(String),

    #[error("failed to assemble layered config: {0}")]
    Layered(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),

    #[error("invalid `{section}` config: {reason}")]
    Invalid {
        section: &'static str,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(section: &'static str, reason: impl fmt::Display) -> Self {
        ConfigError::Invalid {
            section,
            reason: reason.to_string(),
        }
    }
}

/// Which pair of strategies produces positions and colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Embeddings, learned 3D layout, cluster colors.
    #[default]
    Semantic,
    /// No embeddings, random shell placement, random colors.
    Procedural,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Semantic => "semantic",
            Mode::Procedural => "procedural",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "semantic" | "real" => Ok(Mode::Semantic),
            "procedural" | "fallback" | "sample" => Ok(Mode::Procedural),
            other => Err(ConfigError::invalid(
                "mode",
                format!("unknown mode `{other}` (expected semantic or procedural)"),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("data/extracted_messages.json"),
            output: PathBuf::from("frontend/public/galaxy_data.json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReductionYamlConfig {
    pub n_neighbors: usize,
    pub min_dist: f64,
    pub spread: f64,
    pub metric: Metric,
    pub seed: Option<u64>,
    pub n_epochs: Option<usize>,
}

impl Default for ReductionYamlConfig {
    fn default() -> Self {
        let params = ReductionParams::default();
        Self {
            n_neighbors: params.n_neighbors,
            min_dist: params.min_dist,
            spread: params.spread,
            metric: params.metric,
            seed: None,
            n_epochs: params.n_epochs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringYamlConfig {
    pub num_clusters: usize,
    pub n_init: usize,
    pub max_iter: usize,
    pub tol: f64,
    pub seed: Option<u64>,
}

impl Default for ClusteringYamlConfig {
    fn default() -> Self {
        let params = ClusteringParams::default();
        Self {
            num_clusters: params.num_clusters,
            n_init: params.n_init,
            max_iter: params.max_iter,
            tol: params.tol,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellYamlConfig {
    pub base_radius: f64,
    pub shell_thickness: f64,
    pub seed: Option<u64>,
}

impl Default for ShellYamlConfig {
    fn default() -> Self {
        let params = ShellParams::default();
        Self {
            base_radius: params.base_radius,
            shell_thickness: params.shell_thickness,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationConfig {
    /// Half-width of the output cube.
    pub scale: f64,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
        }
    }
}

/// Settings for `build_sample` runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SampleConfig {
    /// Anchor for generated timestamps, in seconds since the epoch. Unset
    /// means the wall clock at generation time.
    pub base_time: Option<i64>,
}

/// Top-level configuration for a galaxy build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalaxyConfig {
    pub version: String,
    pub mode: Mode,
    /// Default seed for every random stage.
    pub seed: u64,
    pub paths: PathsConfig,
    pub loader: LoaderConfig,
    pub semantic: SemanticConfig,
    pub reduction: ReductionYamlConfig,
    pub clustering: ClusteringYamlConfig,
    pub shell: ShellYamlConfig,
    pub normalization: NormalizationConfig,
    pub sizes: SizeBuckets,
    pub palette: Vec<String>,
    pub export: ExportConfig,
    pub sample: SampleConfig,
}

impl Default for GalaxyConfig {
    fn default() -> Self {
        Self {
            version: "1.0".into(),
            mode: Mode::Semantic,
            seed: 42,
            paths: PathsConfig::default(),
            loader: LoaderConfig::default(),
            semantic: SemanticConfig::default(),
            reduction: ReductionYamlConfig::default(),
            clustering: ClusteringYamlConfig::default(),
            shell: ShellYamlConfig::default(),
            normalization: NormalizationConfig::default(),
            sizes: SizeBuckets::default(),
            palette: DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect(),
            export: ExportConfig::default(),
            sample: SampleConfig::default(),
        }
    }
}

impl GalaxyConfig {
    /// Load a YAML configuration file from the given path.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|err| ConfigError::FileRead {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
        Self::from_yaml(&content)
    }

    /// Parse and validate a YAML document. Missing keys take their defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: GalaxyConfig =
            serde_yaml::from_str(yaml).map_err(|err| ConfigError::YamlParse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults, then `file` (or `./galaxy.yaml` when present), then the
    /// process environment.
    pub fn load_layered(file: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_layered_from(file, None)
    }

    /// Like [`load_layered`](Self::load_layered) but reads environment
    /// overrides from `env` instead of the process environment.
    pub fn load_layered_from(
        file: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        let file_source = match file {
            Some(path) => ::config::File::from(path)
                .format(::config::FileFormat::Yaml)
                .required(true),
            None => ::config::File::with_name("galaxy")
                .format(::config::FileFormat::Yaml)
                .required(false),
        };
        let env_source = ::config::Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .source(env);

        let config: GalaxyConfig = ::config::Config::builder()
            .add_source(file_source)
            .add_source(env_source)
            .build()
            .and_then(|built| built.try_deserialize())
            .map_err(|err| ConfigError::Layered(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every section. Called by all loaders; call it yourself after
    /// building a config in code.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.version.as_str() {
            "1.0" | "1" => {}
            v => return Err(ConfigError::UnsupportedVersion(v.to_string())),
        }

        self.semantic
            .validate()
            .map_err(|err| ConfigError::invalid("semantic", err))?;
        self.reduction_params()
            .validate()
            .map_err(|err| ConfigError::invalid("reduction", err))?;
        self.clustering_params()
            .validate()
            .map_err(|err| ConfigError::invalid("clustering", err))?;
        self.shell_params()
            .validate()
            .map_err(|err| ConfigError::invalid("shell", err))?;
        self.sizes
            .validate()
            .map_err(|err| ConfigError::invalid("sizes", err))?;
        self.palette()?;

        let scale = self.normalization.scale;
        if !scale.is_finite() || scale <= 0.0 {
            return Err(ConfigError::invalid(
                "normalization",
                format!("scale must be finite and > 0 (got {scale})"),
            ));
        }
        if self.export.max_text_length == 0 {
            return Err(ConfigError::invalid(
                "export",
                "max_text_length must be at least 1",
            ));
        }
        Ok(())
    }

    pub fn reduction_params(&self) -> ReductionParams {
        ReductionParams {
            n_neighbors: self.reduction.n_neighbors,
            min_dist: self.reduction.min_dist,
            spread: self.reduction.spread,
            metric: self.reduction.metric,
            seed: self.reduction.seed.unwrap_or(self.seed),
            n_epochs: self.reduction.n_epochs,
        }
    }

    /// Clustering parameters. The same seed drives random coloring.
    pub fn clustering_params(&self) -> ClusteringParams {
        ClusteringParams {
            num_clusters: self.clustering.num_clusters,
            n_init: self.clustering.n_init,
            max_iter: self.clustering.max_iter,
            tol: self.clustering.tol,
            seed: self.clustering.seed.unwrap_or(self.seed),
        }
    }

    pub fn shell_params(&self) -> ShellParams {
        ShellParams {
            base_radius: self.shell.base_radius,
            shell_thickness: self.shell.shell_thickness,
            seed: self.shell.seed.unwrap_or(self.seed),
        }
    }

    pub fn palette(&self) -> Result<Palette, ConfigError> {
        Palette::new(&self.palette).map_err(|err| ConfigError::invalid("palette", err))
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the top-level seed and clears every stage override.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self.reduction.seed = None;
        self.clustering.seed = None;
        self.shell.seed = None;
        self
    }

    pub fn with_paths(mut self, input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        self.paths.input = input.into();
        self.paths.output = output.into();
        self
    }
}
