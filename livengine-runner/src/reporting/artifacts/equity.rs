//! Equity curve export (CSV).

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Row 0 is the seed value; row `i` is equity after bar `i`.
pub fn write_equity_csv(path: &Path, equity: &[f64]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create equity CSV {}", path.display()))?;
    let mut out = BufWriter::new(file);
    writeln!(out, "step,equity")?;
    for (step, value) in equity.iter().enumerate() {
        writeln!(out, "{step},{value:.4}")?;
    }
    out.flush()?;
    Ok(())
}
