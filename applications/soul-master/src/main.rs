/// Soul Master - compression and LUFS normalization for WAV files
use anyhow::Context;
use clap::Parser;
use soul_master::{
    config::{AnalysisConfig, ParameterOverrides, ResolvedParameters},
    pipeline::{process_file, ProcessOptions},
    report::{render_json, render_text},
    DEFAULT_LOG_FILTER, VERBOSE_LOG_FILTER,
};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "soul-master")]
#[command(about = "Dynamic range compression with LUFS normalization", long_about = None)]
#[command(after_help = "Parameter priority: CLI options > JSON compression section > adaptive values > defaults")]
struct Cli {
    /// Input WAV file
    #[arg(short, long)]
    input: PathBuf,

    /// Output WAV file (32-bit float)
    #[arg(short, long)]
    output: PathBuf,

    /// JSON analysis report (compression / voice_enhancement / noise_reduction sections)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Compression ratio (3.0 = 3:1) [default: 3.0]
    #[arg(long)]
    ratio: Option<f64>,

    /// Threshold in dB [default: -20]
    #[arg(long, allow_negative_numbers = true)]
    threshold: Option<f64>,

    /// Attack time in ms [default: 5]
    #[arg(long)]
    attack: Option<f64>,

    /// Release time in ms [default: 50]
    #[arg(long)]
    release: Option<f64>,

    /// Soft knee width in dB [default: 3.0]
    #[arg(long)]
    knee: Option<f64>,

    /// Target integrated loudness
    #[arg(long, default_value_t = soul_loudness::DEFAULT_TARGET_LUFS, allow_negative_numbers = true)]
    target_lufs: f64,

    /// Compress only, skip loudness normalization
    #[arg(long)]
    no_normalize: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn overrides(&self) -> ParameterOverrides {
        ParameterOverrides {
            ratio: self.ratio,
            threshold_db: self.threshold,
            attack_ms: self.attack,
            release_ms: self.release,
            knee_db: self.knee,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose {
        VERBOSE_LOG_FILTER
    } else {
        DEFAULT_LOG_FILTER
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    run(&cli)
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let analysis = match &cli.config {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading config");
            Some(
                AnalysisConfig::load(path)
                    .with_context(|| format!("failed to load config {}", path.display()))?,
            )
        }
        None => None,
    };

    let parameters = ResolvedParameters::resolve(&cli.overrides(), analysis.as_ref())?;
    let options = ProcessOptions {
        parameters,
        target_lufs: cli.target_lufs,
        normalize: !cli.no_normalize,
    };

    let report = process_file(&cli.input, &cli.output, &options)
        .with_context(|| format!("failed to process {}", cli.input.display()))?;

    if cli.json {
        println!("{}", render_json(&report)?);
    } else {
        print!("{}", render_text(&report));
    }

    Ok(())
}
