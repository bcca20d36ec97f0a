//! Backtest runner — wires together data, strategy, ledger, metrics and artifacts.
//!
//! Two entry points:
//! - `run_backtest()`: pre-loaded bars + params, no files. Used by tests and benches.
//! - `run_from_files()`: loads the parameter file and data, runs, writes every
//!   artifact into one directory. Used by the CLI.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use livengine_core::domain::{validate_bars, Bar, CapsuleRecord, Trade};
use livengine_core::engine::{run_strategy, CapsuleSink, EngineError, NullSink};
use livengine_core::{build_strategy, DataError, StrategyParams};

use crate::config::{load_run_config, ConfigError, RunConfig};
use crate::data_loader::{load_ohlcv, LoadError};
use crate::metrics::{summarize_equity, Metrics};
use crate::reporting::{ArtifactManager, ArtifactPaths, RunVerdict};
use crate::resample::{resample, ResampleRule};
use crate::synthetic::{generate_synthetic_bars, hash_bars};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Load(#[from] LoadError),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
    #[error("metrics error: {0}")]
    Metrics(#[from] DataError),
    #[error(transparent)]
    Artifacts(#[from] anyhow::Error),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single backtest run.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub strategy: String,
    pub params: StrategyParams,
    pub metrics: Metrics,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<f64>,
    pub capsules: Vec<CapsuleRecord>,
    pub collapse_hits: usize,
    pub collapse_episodes: usize,
    pub final_position: f64,
    pub verdict: RunVerdict,
}

/// Where the bars came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    File(PathBuf),
    Synthetic { bars: usize, seed: u64 },
}

/// Provenance recorded in the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataProvenance {
    pub source: String,
    pub data_hash: String,
    pub synthetic: bool,
    pub resample: Option<String>,
    pub rows_read: usize,
}

/// Per-invocation overrides on top of the parameter file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Takes precedence over a `resample` key in the parameter file.
    pub resample: Option<String>,
}

/// What `run_from_files` produced.
#[derive(Debug, Clone)]
pub struct RunArtifacts {
    pub result: BacktestResult,
    pub provenance: DataProvenance,
    pub paths: ArtifactPaths,
    pub capsules_written: usize,
}

/// Run one strategy over pre-loaded bars. Capsules go to `sink` as they are
/// produced and are also kept on the result.
pub fn run_backtest(
    bars: &[Bar],
    params: &StrategyParams,
    sink: &mut dyn CapsuleSink,
) -> Result<BacktestResult, RunError> {
    let mut strategy = build_strategy(params);
    let output = run_strategy(strategy.as_mut(), bars, params.starting_cash, sink)?;
    let metrics = summarize_equity(&output.equity_curve, output.bars_processed)?;

    Ok(BacktestResult {
        strategy: strategy.name().to_string(),
        params: params.clone(),
        metrics,
        trades: output.trades,
        equity_curve: output.equity_curve,
        capsules: output.capsules,
        collapse_hits: output.collapse_hits,
        collapse_episodes: output.collapse_episodes,
        final_position: output.final_position,
        verdict: RunVerdict::from_collapse_hits(output.collapse_hits),
    })
}

/// Load bars from a file or generate synthetic ones, applying `resample_rule`.
pub fn load_source(
    source: &DataSource,
    resample_rule: Option<&str>,
) -> Result<(Vec<Bar>, DataProvenance), RunError> {
    match source {
        DataSource::File(path) => {
            let loaded = load_ohlcv(path, resample_rule)?;
            let provenance = DataProvenance {
                source: loaded.source_path.display().to_string(),
                data_hash: loaded.data_hash,
                synthetic: false,
                resample: loaded.resample,
                rows_read: loaded.rows_read,
            };
            Ok((loaded.bars, provenance))
        }
        DataSource::Synthetic { bars, seed } => {
            warn!(bars, seed, "using SYNTHETIC bars; results are not market data");
            let mut generated = generate_synthetic_bars(*bars, *seed);
            let rows_read = generated.len();
            if let Some(rule) = resample_rule {
                let rule = ResampleRule::parse(rule).map_err(LoadError::from)?;
                generated = resample(&generated, rule);
            }
            let provenance = DataProvenance {
                source: format!("synthetic:{bars}:seed={seed}"),
                data_hash: hash_bars(&generated),
                synthetic: true,
                resample: resample_rule.map(str::to_string),
                rows_read,
            };
            Ok((generated, provenance))
        }
    }
}

/// Load params and data, run, and write all artifacts into `output_dir`.
///
/// Without a parameter file every key takes its default.
pub fn run_from_files(
    source: &DataSource,
    params_path: Option<&Path>,
    output_dir: &Path,
    options: &RunOptions,
) -> Result<RunArtifacts, RunError> {
    let config = match params_path {
        Some(path) => load_run_config(path)?,
        None => RunConfig::default(),
    };
    let resample_rule = options.resample.as_deref().or(config.resample.as_deref());
    let (bars, provenance) = load_source(source, resample_rule)?;
    // bad bars must fail before the output directory exists
    validate_bars(&bars).map_err(EngineError::from)?;

    let manager = ArtifactManager::new(output_dir)?;
    let mut bridge = manager.open_proof_bridge(&config.logging)?;

    let result = match bridge.as_mut() {
        Some(bridge) => run_backtest(&bars, &config.params, bridge)?,
        None => run_backtest(&bars, &config.params, &mut NullSink)?,
    };

    let capsules_written = match bridge {
        Some(bridge) => bridge.finish()?.capsules_written,
        None => 0,
    };

    let paths = manager.save_run(&result, &provenance, &config.logging, capsules_written)?;

    info!(
        strategy = %result.strategy,
        trades = result.trades.len(),
        final_equity = result.metrics.final_equity,
        verdict = result.verdict.as_str(),
        out = %output_dir.display(),
        "run complete"
    );

    Ok(RunArtifacts {
        result,
        provenance,
        paths,
        capsules_written,
    })
}
