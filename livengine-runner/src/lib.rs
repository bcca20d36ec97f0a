//! Livengine Runner — run orchestration around `livengine-core`.
//!
//! This crate builds on `livengine-core` to provide:
//! - Parameter files (YAML/JSON/TOML) resolved into `StrategyParams`
//! - OHLCV loading from CSV/Parquet, resampling, synthetic bars
//! - Equity-curve metrics (Sharpe, drawdown, CAGR estimate)
//! - Proof ledger / capsule stream, trade blotter, manifest and narrative summary

pub mod config;
pub mod data_loader;
pub mod metrics;
pub mod reporting;
pub mod resample;
pub mod runner;
pub mod synthetic;

pub use config::{load_run_config, params_hash, ConfigError, LoggingConfig, RunConfig};
pub use data_loader::{load_ohlcv, LoadError, LoadedBars};
pub use metrics::{summarize_equity, Metrics};
pub use reporting::{make_day_summary, ArtifactManager, ArtifactPaths, ProofBridge, RunVerdict};
pub use resample::{ResampleError, ResampleRule};
pub use runner::{
    load_source, run_backtest, run_from_files, BacktestResult, DataProvenance, DataSource,
    RunArtifacts, RunError, RunOptions, SCHEMA_VERSION,
};
pub use synthetic::generate_synthetic_bars;
