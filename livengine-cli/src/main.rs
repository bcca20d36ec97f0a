//! Livengine CLI — run and inspect commands.
//!
//! Commands:
//! - `run` — backtest one strategy over an OHLCV file (or synthetic bars) and
//!   write the blotter, proof ledger, capsules, metrics, summary and manifest
//! - `inspect` — load and validate an OHLCV file without running anything

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use livengine_core::domain::validate_bars;
use livengine_runner::{load_ohlcv, run_from_files, DataSource, RunOptions};

#[derive(Parser)]
#[command(
    name = "livengine",
    about = "Livengine — entropy-gated single-strategy backtester"
)]
struct Cli {
    /// Debug-level logs unless RUST_LOG says otherwise.
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a backtest and write all artifacts.
    Run {
        /// OHLCV file (.csv, .parquet).
        #[arg(long, required_unless_present = "synthetic", conflicts_with = "synthetic")]
        data: Option<PathBuf>,

        /// Parameter file (.yaml, .yml, .json, .toml). Defaults apply without one.
        #[arg(long)]
        params: Option<PathBuf>,

        /// Output directory.
        #[arg(long, default_value = "runs/latest")]
        out: PathBuf,

        /// Resample rule, e.g. 15min, 1h, 1D. Overrides the parameter file.
        #[arg(long)]
        resample: Option<String>,

        /// Generate this many synthetic bars instead of reading a file.
        #[arg(long)]
        synthetic: Option<usize>,

        /// Seed for synthetic bars.
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Load and validate an OHLCV file.
    Inspect {
        /// OHLCV file (.csv, .parquet).
        #[arg(long)]
        data: PathBuf,

        /// Resample rule applied before validation.
        #[arg(long)]
        resample: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run {
            data,
            params,
            out,
            resample,
            synthetic,
            seed,
        } => run_cmd(data, params, out, resample, synthetic, seed),
        Commands::Inspect { data, resample } => inspect_cmd(data, resample),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run_cmd(
    data: Option<PathBuf>,
    params: Option<PathBuf>,
    out: PathBuf,
    resample: Option<String>,
    synthetic: Option<usize>,
    seed: u64,
) -> Result<()> {
    let source = match (data, synthetic) {
        (Some(path), None) => DataSource::File(path),
        (None, Some(bars)) => DataSource::Synthetic { bars, seed },
        _ => bail!("exactly one of --data or --synthetic is required"),
    };

    let run = run_from_files(&source, params.as_deref(), &out, &RunOptions { resample })
        .context("backtest failed")?;

    let metrics =
        serde_json::to_string_pretty(&run.result.metrics).context("Failed to serialize metrics")?;
    println!("{metrics}");
    eprintln!(
        "Verdict: {} ({} collapse hits). Artifacts saved to: {}",
        run.result.verdict.as_str(),
        run.result.collapse_hits,
        run.paths.output_dir.display()
    );
    Ok(())
}

fn inspect_cmd(data: PathBuf, resample: Option<String>) -> Result<()> {
    let loaded = load_ohlcv(&data, resample.as_deref())
        .with_context(|| format!("Failed to load {}", data.display()))?;
    validate_bars(&loaded.bars).with_context(|| format!("Invalid bars in {}", data.display()))?;

    println!("file:      {}", loaded.source_path.display());
    println!("rows:      {}", loaded.rows_read);
    println!("bars:      {}", loaded.bars.len());
    if let (Some(first), Some(last)) = (loaded.bars.first(), loaded.bars.last()) {
        println!("first:     {}", first.timestamp.to_rfc3339());
        println!("last:      {}", last.timestamp.to_rfc3339());
    }
    println!("entropy:   {}", if loaded.has_entropy() { "supplied" } else { "derived" });
    println!("blake3:    {}", loaded.data_hash);
    Ok(())
}
