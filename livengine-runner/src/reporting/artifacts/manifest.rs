//! Run manifest export (JSON).

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

use livengine_core::StrategyParams;

use crate::metrics::Metrics;
use crate::reporting::narrative::RunVerdict;
use crate::runner::{BacktestResult, DataProvenance, SCHEMA_VERSION};

#[derive(Debug, Clone, Serialize)]
pub struct RunManifest {
    pub schema_version: u32,
    pub created_at: DateTime<Utc>,
    pub data_source: String,
    pub data_hash: String,
    pub synthetic: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resample: Option<String>,
    pub strategy: String,
    pub params_hash: String,
    pub params: StrategyParams,
    pub bars_processed: usize,
    pub trade_count: usize,
    pub capsule_count: usize,
    pub collapse_hits: usize,
    pub collapse_episodes: usize,
    pub verdict: RunVerdict,
    pub metrics: Metrics,
}

impl RunManifest {
    pub fn new(
        result: &BacktestResult,
        provenance: &DataProvenance,
        params_hash: String,
        capsule_count: usize,
    ) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            created_at: Utc::now(),
            data_source: provenance.source.clone(),
            data_hash: provenance.data_hash.clone(),
            synthetic: provenance.synthetic,
            resample: provenance.resample.clone(),
            strategy: result.strategy.clone(),
            params_hash,
            params: result.params.clone(),
            bars_processed: result.metrics.bars_processed,
            trade_count: result.trades.len(),
            capsule_count,
            collapse_hits: result.collapse_hits,
            collapse_episodes: result.collapse_episodes,
            verdict: result.verdict,
            metrics: result.metrics.clone(),
        }
    }
}

pub fn write_manifest(path: &Path, manifest: &RunManifest) -> Result<()> {
    let json = serde_json::to_string_pretty(manifest)
        .context("Failed to serialize run manifest")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write manifest to {}", path.display()))?;
    Ok(())
}
