//! Artifact manager for persisting run outputs.

mod equity;
mod manifest;
mod trades;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::config::{params_hash, LoggingConfig};
use crate::reporting::narrative::make_day_summary;
use crate::reporting::proof_bridge::ProofBridge;
use crate::runner::{BacktestResult, DataProvenance};

pub use equity::write_equity_csv;
pub use manifest::{write_manifest, RunManifest};
pub use trades::write_blotter_csv;

/// Artifact paths returned after export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub output_dir: PathBuf,
    pub manifest: PathBuf,
    pub metrics_json: PathBuf,
    pub blotter_csv: PathBuf,
    pub equity_csv: PathBuf,
    pub summary_txt: PathBuf,
    /// Present only when the proof bridge was enabled.
    pub proof_ledger: Option<PathBuf>,
    pub proof_capsules: Option<PathBuf>,
}

/// Writes everything for one run into a single directory.
#[derive(Debug, Clone)]
pub struct ArtifactManager {
    output_dir: PathBuf,
}

impl ArtifactManager {
    pub fn new(output_dir: impl AsRef<Path>) -> Result<Self> {
        let output_dir = output_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&output_dir)
            .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;
        Ok(Self { output_dir })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Open the per-capsule writers, or `None` when the bridge is disabled.
    pub fn open_proof_bridge(&self, logging: &LoggingConfig) -> Result<Option<ProofBridge>> {
        if !logging.enable_proof_bridge {
            return Ok(None);
        }
        let bridge = ProofBridge::create(
            &self.output_dir.join(&logging.proof_ledger_file),
            &self.output_dir.join(&logging.proof_capsule_file),
        )?;
        Ok(Some(bridge))
    }

    /// Write blotter, equity, metrics, summary and manifest.
    ///
    /// `capsules_written` is what the proof bridge recorded (0 when disabled).
    pub fn save_run(
        &self,
        result: &BacktestResult,
        provenance: &DataProvenance,
        logging: &LoggingConfig,
        capsules_written: usize,
    ) -> Result<ArtifactPaths> {
        let blotter_csv = self.output_dir.join(&logging.blotter_file);
        write_blotter_csv(&blotter_csv, &result.trades)?;

        let equity_csv = self.output_dir.join("equity.csv");
        write_equity_csv(&equity_csv, &result.equity_curve)?;

        let metrics_json = self.output_dir.join("metrics.json");
        let json = serde_json::to_string_pretty(&result.metrics)
            .context("Failed to serialize metrics")?;
        std::fs::write(&metrics_json, json)
            .with_context(|| format!("Failed to write metrics to {}", metrics_json.display()))?;

        let summary_txt = self.output_dir.join("summary.txt");
        let summary = make_day_summary(
            &result.metrics,
            capsules_written,
            result.verdict,
            result.collapse_hits,
        );
        std::fs::write(&summary_txt, summary)
            .with_context(|| format!("Failed to write summary to {}", summary_txt.display()))?;

        let manifest_path = self.output_dir.join("manifest.json");
        let hash = params_hash(&result.params).context("Failed to hash parameters")?;
        let manifest = RunManifest::new(result, provenance, hash, capsules_written);
        write_manifest(&manifest_path, &manifest)?;

        let (proof_ledger, proof_capsules) = if logging.enable_proof_bridge {
            (
                Some(self.output_dir.join(&logging.proof_ledger_file)),
                Some(self.output_dir.join(&logging.proof_capsule_file)),
            )
        } else {
            (None, None)
        };

        Ok(ArtifactPaths {
            output_dir: self.output_dir.clone(),
            manifest: manifest_path,
            metrics_json,
            blotter_csv,
            equity_csv,
            summary_txt,
            proof_ledger,
            proof_capsules,
        })
    }
}
