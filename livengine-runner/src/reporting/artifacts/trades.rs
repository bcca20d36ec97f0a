//! Trade blotter export (CSV).

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use livengine_core::domain::Trade;

pub fn write_blotter_csv(path: &Path, trades: &[Trade]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create trade blotter {}", path.display()))?;
    let mut out = BufWriter::new(file);

    writeln!(out, "ts,action,px,size")?;
    for trade in trades {
        writeln!(
            out,
            "{},{},{},{}",
            trade.ts.to_rfc3339(),
            trade.action.as_str(),
            trade.price,
            trade.size
        )?;
    }

    out.flush()
        .with_context(|| format!("Failed to flush trade blotter {}", path.display()))?;
    Ok(())
}
