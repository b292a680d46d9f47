//! `galaxy`: build a galaxy from extracted messages, or a synthetic one.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use galaxy::{GalaxyConfig, Mode, Pipeline, build_sample};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "galaxy", version, about = "Render conversational messages as a 3D galaxy")]
struct Cli {
    /// Log filter, RUST_LOG syntax
    #[arg(long, global = true, env = "GALAXY_LOG", default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load messages, place them, write the galaxy JSON
    Build(BuildArgs),
    /// Generate synthetic messages and render them procedurally
    Sample(SampleArgs),
}

#[derive(Args, Debug)]
struct BuildArgs {
    /// YAML config; defaults to ./galaxy.yaml when present
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    input: Option<PathBuf>,

    #[arg(long)]
    output: Option<PathBuf>,

    /// semantic | procedural
    #[arg(long)]
    mode: Option<Mode>,

    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args, Debug)]
struct SampleArgs {
    #[arg(long, default_value_t = 200)]
    count: usize,

    #[arg(long)]
    output: Option<PathBuf>,

    #[arg(long)]
    seed: Option<u64>,

    /// Anchor timestamps here (seconds since the epoch) instead of now
    #[arg(long)]
    base_time: Option<i64>,

    /// YAML config for shell, palette, and size settings
    #[arg(long)]
    config: Option<PathBuf>,
}

fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(file: Option<&PathBuf>) -> anyhow::Result<GalaxyConfig> {
    GalaxyConfig::load_layered(file.map(PathBuf::as_path)).context("loading configuration")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.json_logs);

    match cli.command {
        Command::Build(args) => {
            let mut cfg = load_config(args.config.as_ref())?;
            if let Some(mode) = args.mode {
                cfg = cfg.with_mode(mode);
            }
            if let Some(seed) = args.seed {
                cfg = cfg.with_seed(seed);
            }
            if let Some(input) = args.input {
                cfg.paths.input = input;
            }
            if let Some(output) = args.output {
                cfg.paths.output = output;
            }

            let pipeline = Pipeline::from_config(&cfg)?;
            let outcome = pipeline
                .build(&cfg.paths.input, &cfg.paths.output)
                .await
                .with_context(|| format!("building galaxy from {}", cfg.paths.input.display()))?;
            info!(
                mode = %cfg.mode,
                loaded = outcome.load.kept,
                dropped = outcome.load.dropped(),
                points = outcome.export.points,
                bytes = outcome.export.bytes,
                output = %outcome.export.path.display(),
                "build_finished"
            );
        }
        Command::Sample(args) => {
            let mut cfg = load_config(args.config.as_ref())?;
            if let Some(seed) = args.seed {
                cfg = cfg.with_seed(seed);
            }
            if let Some(output) = args.output {
                cfg.paths.output = output;
            }
            if let Some(base_time) = args.base_time {
                cfg.sample.base_time = Some(base_time);
            }

            let (build, summary) = build_sample(&cfg, args.count)
                .await
                .context("building sample galaxy")?;
            info!(
                points = build.points.len(),
                bytes = summary.bytes,
                output = %summary.path.display(),
                "sample_finished"
            );
        }
    }
    Ok(())
}
