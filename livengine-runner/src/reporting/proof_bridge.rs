//! ProofBridge — per-capsule CSV ledger and JSONL capsule stream.
//!
//! Both files are opened when the bridge is created and written and flushed
//! once per capsule, synchronously. `finish()` flushes and reports the count; if the
//! run fails first, dropping the bridge closes the files.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use livengine_core::domain::CapsuleRecord;
use livengine_core::engine::{CapsuleSink, SinkError};

pub const LEDGER_HEADER: [&str; 4] = ["ts", "glyph", "entropy", "verdict"];

#[derive(Debug)]
pub struct ProofBridge {
    ledger_path: PathBuf,
    capsule_path: PathBuf,
    ledger: csv::Writer<BufWriter<File>>,
    capsules: BufWriter<File>,
    written: usize,
}

/// What a finished bridge wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProofStats {
    pub capsules_written: usize,
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

impl ProofBridge {
    pub fn create(ledger_path: &Path, capsule_path: &Path) -> Result<Self> {
        let mut ledger = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(create(ledger_path)?);
        ledger
            .write_record(LEDGER_HEADER)
            .with_context(|| format!("Failed to write header to {}", ledger_path.display()))?;

        Ok(Self {
            ledger_path: ledger_path.to_path_buf(),
            capsule_path: capsule_path.to_path_buf(),
            ledger,
            capsules: create(capsule_path)?,
            written: 0,
        })
    }

    pub fn write_capsule(&mut self, record: &CapsuleRecord) -> Result<()> {
        let capsule = &record.capsule;
        self.ledger
            .write_record([
                record.ts.to_rfc3339(),
                capsule.glyph.as_str().to_string(),
                capsule.entropy.to_string(),
                capsule.verdict.as_str().to_string(),
            ])
            .with_context(|| format!("Failed to append to {}", self.ledger_path.display()))?;

        serde_json::to_writer(&mut self.capsules, record).context("Failed to serialize capsule")?;
        self.capsules
            .write_all(b"\n")
            .with_context(|| format!("Failed to append to {}", self.capsule_path.display()))?;

        // surface write failures on the bar that caused them
        self.ledger
            .flush()
            .with_context(|| format!("Failed to flush {}", self.ledger_path.display()))?;
        self.capsules
            .flush()
            .with_context(|| format!("Failed to flush {}", self.capsule_path.display()))?;

        self.written += 1;
        Ok(())
    }

    pub fn capsules_written(&self) -> usize {
        self.written
    }

    pub fn ledger_path(&self) -> &Path {
        &self.ledger_path
    }

    pub fn capsule_path(&self) -> &Path {
        &self.capsule_path
    }

    /// Flush both files and close them.
    pub fn finish(mut self) -> Result<ProofStats> {
        self.ledger
            .flush()
            .with_context(|| format!("Failed to flush {}", self.ledger_path.display()))?;
        self.capsules
            .flush()
            .with_context(|| format!("Failed to flush {}", self.capsule_path.display()))?;
        Ok(ProofStats {
            capsules_written: self.written,
        })
    }
}

impl CapsuleSink for ProofBridge {
    fn record(&mut self, record: &CapsuleRecord) -> Result<(), SinkError> {
        self.write_capsule(record).map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use livengine_core::domain::{Capsule, EntropySource, Glyph, Regime, Verdict};

    fn record(hour: u32, entropy: f64) -> CapsuleRecord {
        CapsuleRecord {
            ts: Utc.with_ymd_and_hms(2024, 1, 2, hour, 0, 0).unwrap(),
            capsule: Capsule {
                glyph: Glyph::for_entropy(entropy, 0.02),
                entropy,
                entropy_source: EntropySource::Derived,
                atr: 1.5,
                fast_ma: 101.0,
                slow_ma: 100.0,
                verdict: Verdict::Long,
                regime: Regime::P,
                collapse_guard: false,
                recovery_count: 0,
            },
        }
    }

    #[test]
    fn writes_ledger_rows_and_jsonl_lines() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = dir.path().join("proof_ledger.csv");
        let jsonl = dir.path().join("nested").join("capsules.jsonl");

        let mut bridge = ProofBridge::create(&ledger, &jsonl).unwrap();
        bridge.write_capsule(&record(0, 0.01)).unwrap();
        bridge.write_capsule(&record(1, 0.05)).unwrap();
        let stats = bridge.finish().unwrap();
        assert_eq!(stats.capsules_written, 2);

        let csv_text = fs::read_to_string(&ledger).unwrap();
        let lines: Vec<&str> = csv_text.lines().collect();
        assert_eq!(lines[0], "ts,glyph,entropy,verdict");
        assert_eq!(lines[1], "2024-01-02T00:00:00+00:00,⧖,0.01,LONG");
        assert_eq!(lines.len(), 3);

        let json_text = fs::read_to_string(&jsonl).unwrap();
        let first: serde_json::Value =
            serde_json::from_str(json_text.lines().next().unwrap()).unwrap();
        assert_eq!(first["ts"], "2024-01-02T00:00:00Z");
        assert_eq!(first["regime"], "P");
        assert_eq!(json_text.lines().count(), 2);
    }

    #[test]
    fn rows_are_on_disk_before_finish() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = dir.path().join("l.csv");
        let jsonl = dir.path().join("c.jsonl");

        let mut bridge = ProofBridge::create(&ledger, &jsonl).unwrap();
        bridge.write_capsule(&record(3, 0.01)).unwrap();
        assert_eq!(fs::read_to_string(&ledger).unwrap().lines().count(), 2);
        assert_eq!(fs::read_to_string(&jsonl).unwrap().lines().count(), 1);
        drop(bridge);
    }

    #[test]
    fn full_disk_fails_on_the_capsule_that_hit_it() {
        // /dev/full accepts opens and rejects every write with ENOSPC
        let full = Path::new("/dev/full");
        if !full.exists() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let mut bridge = ProofBridge::create(full, &dir.path().join("c.jsonl")).unwrap();

        let err = bridge.write_capsule(&record(0, 0.01)).unwrap_err();
        assert!(format!("{err:#}").contains("/dev/full"));
        assert_eq!(bridge.capsules_written(), 0);
    }

    #[test]
    fn header_written_even_without_capsules() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = dir.path().join("l.csv");
        let jsonl = dir.path().join("c.jsonl");
        ProofBridge::create(&ledger, &jsonl).unwrap().finish().unwrap();
        assert_eq!(fs::read_to_string(&ledger).unwrap().trim(), "ts,glyph,entropy,verdict");
        assert_eq!(fs::read_to_string(&jsonl).unwrap(), "");
    }
}
