use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::{Parser, ValueEnum};
use log::{error, info};
use serde::Serialize;
use sift_cli::overlay::{load_companion, render_matches};
use sift_cli::{AgreementModel, CandidatePolicy, SiftError, SiftMatch, SiftResult};
use sift_core::{init_thread_pool, KeypointSet, MatchedPair};
use sift_match::{MatchOutcome, PipelineConfig};

/// Match SIFT keypoints between two images.
#[derive(Parser, Debug)]
#[command(name = "siftmatch", version, about = "Ratio-test SIFT matching with a geometric consistency filter")]
struct CliArgs {
    /// Keypoint dataset of image A: base name or `.key` file.
    #[arg(value_name = "A")]
    image_a: PathBuf,
    /// Keypoint dataset of image B: base name or `.key` file.
    #[arg(value_name = "B")]
    image_b: PathBuf,
    /// Pipeline configuration file (`.json` or `.toml`).
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Seed for hypothesis sampling.
    #[arg(long, value_name = "N")]
    seed: Option<u64>,
    /// Ratio-test threshold.
    #[arg(long, value_name = "R")]
    ratio: Option<f32>,
    /// Number of seed hypotheses.
    #[arg(long, value_name = "K")]
    samples: Option<usize>,
    /// Consistency test flavour.
    #[arg(long, value_enum)]
    agreement: Option<AgreementArg>,
    /// Leave queries unmatched when image B has fewer than two keypoints.
    #[arg(long)]
    skip_insufficient: bool,
    /// Worker threads.
    #[arg(long, value_name = "N")]
    threads: Option<usize>,
    /// Disable parallel matching and filtering.
    #[arg(long)]
    sequential: bool,
    /// Output format for results.
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
    /// Write a side-by-side match overlay to this image file.
    #[arg(long, value_name = "OUT.png")]
    overlay: Option<PathBuf>,
    /// Log verbosity level.
    #[arg(long, value_enum)]
    log_level: Option<LogLevel>,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
enum AgreementArg {
    PerImage,
    RelativeChange,
}

impl From<AgreementArg> for AgreementModel {
    fn from(arg: AgreementArg) -> Self {
        match arg {
            AgreementArg::PerImage => AgreementModel::PerImage,
            AgreementArg::RelativeChange => AgreementModel::RelativeChange,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Serialize)]
struct MatchReport<'a> {
    image_a: &'a str,
    image_b: &'a str,
    keypoints_a: usize,
    keypoints_b: usize,
    raw_matches: usize,
    seed_index: Option<usize>,
    matches: &'a [MatchedPair],
}

fn main() -> ExitCode {
    let cli = CliArgs::parse();
    init_logger(&resolve_log_level(&cli));

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::from(err.exit_code())
        }
    }
}

fn run(cli: &CliArgs) -> SiftResult<()> {
    let config = resolve_config(cli)?;
    info!("{}", config.summary());

    let n_threads = config.core.n_threads;
    let pipeline = SiftMatch::new(config)?;
    init_thread_pool(n_threads)?;

    let a = pipeline.load(&cli.image_a)?;
    let b = pipeline.load(&cli.image_b)?;

    let start = Instant::now();
    let outcome = pipeline.match_sets(&a, &b)?;
    info!(
        "{} raw matches, {} consistent, in {:.2?}",
        outcome.raw_matches.len(),
        outcome.pairs().len(),
        start.elapsed()
    );

    write_report(&a, &b, &outcome, cli.format)?;

    if let Some(out) = &cli.overlay {
        let image_a = load_companion(&a, dataset_dir(&cli.image_a))?;
        let image_b = load_companion(&b, dataset_dir(&cli.image_b))?;
        render_matches(&image_a, &image_b, outcome.pairs()).save(out)?;
        info!("saved overlay to {}", out.display());
    }
    Ok(())
}

fn resolve_config(cli: &CliArgs) -> SiftResult<PipelineConfig> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::load(path).map_err(|err| SiftError::Config {
            path: path.clone(),
            reason: err.to_string(),
        })?,
        None => PipelineConfig::new(),
    };

    for applied in apply_overrides(&mut config, cli) {
        info!("override: {}", applied);
    }
    Ok(config)
}

fn apply_overrides(config: &mut PipelineConfig, cli: &CliArgs) -> Vec<String> {
    let mut overrides = Vec::new();

    if let Some(seed) = cli.seed {
        config.seed = Some(seed);
        overrides.push(format!("seed = {}", seed));
    }
    if let Some(ratio) = cli.ratio {
        config.core.ratio_threshold = ratio;
        overrides.push(format!("ratio_threshold = {}", ratio));
    }
    if let Some(samples) = cli.samples {
        config.core.sample_size = samples;
        overrides.push(format!("sample_size = {}", samples));
    }
    if let Some(agreement) = cli.agreement {
        config.agreement = agreement.into();
        overrides.push(format!("agreement = {:?}", config.agreement));
    }
    if cli.skip_insufficient {
        config.candidate_policy = CandidatePolicy::Skip;
        overrides.push("candidate_policy = Skip".to_string());
    }
    if let Some(threads) = cli.threads {
        config.core.n_threads = threads;
        overrides.push(format!("n_threads = {}", threads));
    }
    if cli.sequential {
        config.parallel = false;
        overrides.push("parallel = false".to_string());
    }

    overrides
}

fn dataset_dir(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}

fn write_report(a: &KeypointSet, b: &KeypointSet, outcome: &MatchOutcome, format: OutputFormat) -> SiftResult<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Json => {
            let report = MatchReport {
                image_a: a.image_id(),
                image_b: b.image_id(),
                keypoints_a: a.len(),
                keypoints_b: b.len(),
                raw_matches: outcome.raw_matches.len(),
                seed_index: outcome.consistent.as_ref().map(|set| set.seed_index),
                matches: outcome.pairs(),
            };
            serde_json::to_writer_pretty(&mut out, &report)?;
            writeln!(out)?;
        }
        OutputFormat::Text => {
            writeln!(
                out,
                "{} ({} keypoints) -> {} ({} keypoints): {} raw, {} consistent",
                a.image_id(),
                a.len(),
                b.image_id(),
                b.len(),
                outcome.raw_matches.len(),
                outcome.pairs().len()
            )?;
            writeln!(out, "{:>10} {:>10} {:>10} {:>10}", "rowA", "colA", "rowB", "colB")?;
            for pair in outcome.pairs() {
                let ((row_a, col_a), (row_b, col_b)) = pair.endpoints();
                writeln!(out, "{:>10.2} {:>10.2} {:>10.2} {:>10.2}", row_a, col_a, row_b, col_b)?;
            }
        }
    }
    Ok(())
}

fn resolve_log_level(cli: &CliArgs) -> String {
    if let Some(level) = cli.log_level {
        return level.as_str().to_string();
    }

    if let Ok(level) = std::env::var("RUST_LOG") {
        if !level.trim().is_empty() {
            return level;
        }
    }

    "info".to_string()
}

fn init_logger(level: &str) {
    let mut builder = env_logger::Builder::new();
    builder.target(env_logger::Target::Stderr);
    builder.filter_level(log::LevelFilter::Info);
    builder.parse_filters(level);
    builder.format(|buf, record| {
        let module = record.module_path().unwrap_or(record.target());
        writeln!(
            buf,
            "{} [{}] {}: {}",
            buf.timestamp_millis(),
            record.level(),
            module,
            record.args()
        )
    });

    if let Err(err) = builder.try_init() {
        eprintln!("Failed to initialize logger: {}", err);
    }
}
