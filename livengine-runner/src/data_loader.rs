//! OHLCV ingestion from CSV or Parquet.
//!
//! The loader's job is to hand the engine a clean, time-sorted `Vec<Bar>`:
//! 1. Pick the reader from the file extension (`.csv`, `.parquet`, `.pq`)
//! 2. Lower-case and alias the headers (`time`/`date` → `timestamp`, `o` → `open`, ...)
//! 3. Parse rows; optional `entropy` and `symbol` columns ride along
//! 4. Stable-sort by timestamp, then optionally resample
//!
//! The raw file is hashed with BLAKE3 so the run manifest can pin exactly
//! which bytes were tested.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use polars::prelude::*;
use thiserror::Error;
use tracing::{debug, info};

use livengine_core::domain::Bar;

use crate::resample::{resample, ResampleError, ResampleRule};

/// Columns every input must provide (after aliasing).
pub const REQUIRED_COLUMNS: [&str; 6] = ["timestamp", "open", "high", "low", "close", "volume"];

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("data file not found: {0}")]
    NotFound(PathBuf),

    #[error("unsupported data file type '{0}' (expected .csv, .parquet or .pq)")]
    UnsupportedFormat(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Parquet error in {path}: {reason}")]
    Parquet { path: PathBuf, reason: String },

    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("row {row}: unparseable timestamp '{value}'")]
    Timestamp { row: usize, value: String },

    #[error("row {row}: column '{column}' is not numeric: '{value}'")]
    Numeric {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error(transparent)]
    Resample(#[from] ResampleError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Csv,
    Parquet,
}

impl DataFormat {
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("csv") => Ok(DataFormat::Csv),
            Some("parquet") | Some("pq") => Ok(DataFormat::Parquet),
            _ => Err(LoadError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

/// Bars plus the provenance the manifest needs.
#[derive(Debug, Clone)]
pub struct LoadedBars {
    pub bars: Vec<Bar>,
    pub source_path: PathBuf,
    /// BLAKE3 of the raw file bytes (hex).
    pub data_hash: String,
    /// Rows in the file, before any resampling.
    pub rows_read: usize,
    pub resample: Option<String>,
}

impl LoadedBars {
    pub fn has_entropy(&self) -> bool {
        self.bars.iter().any(|b| b.entropy.is_some())
    }
}

/// Load, sort and optionally resample an OHLCV file.
pub fn load_ohlcv(path: &Path, resample_rule: Option<&str>) -> Result<LoadedBars, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }
    let format = DataFormat::from_path(path)?;
    let rule = resample_rule.map(ResampleRule::parse).transpose()?;

    let mut bars = match format {
        DataFormat::Csv => read_csv(path)?,
        DataFormat::Parquet => read_parquet(path)?,
    };
    let rows_read = bars.len();

    // stable: rows sharing a timestamp keep file order
    bars.sort_by_key(|b| b.timestamp);

    if let Some(rule) = rule {
        bars = resample(&bars, rule);
        debug!(rows_read, bars = bars.len(), seconds = rule.seconds(), "resampled");
    }

    let data_hash = hash_file(path)?;
    info!(path = %path.display(), bars = bars.len(), "loaded bars");

    Ok(LoadedBars {
        bars,
        source_path: path.to_path_buf(),
        data_hash,
        rows_read,
        resample: resample_rule.map(str::to_string),
    })
}

/// Stream a file through BLAKE3 and return the hex digest.
pub fn hash_file(path: &Path) -> Result<String, LoadError> {
    let io_err = |source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut file = File::open(path).map_err(io_err)?;
    let mut hasher = blake3::Hasher::new();
    std::io::copy(&mut file, &mut hasher).map_err(io_err)?;
    Ok(hasher.finalize().to_hex().to_string())
}

// ── Column naming ───────────────────────────────────────────────────

/// Lower-case a header and map short/legacy names onto the canonical ones.
pub fn canonical_column(name: &str) -> String {
    let lower = name.trim().to_ascii_lowercase();
    match lower.as_str() {
        "time" | "date" | "datetime" | "ts" => "timestamp".into(),
        "o" => "open".into(),
        "h" => "high".into(),
        "l" => "low".into(),
        "c" => "close".into(),
        "v" => "volume".into(),
        _ => lower,
    }
}

/// Canonical name → original header. The first header claiming a name wins.
fn column_map<'a>(headers: impl IntoIterator<Item = &'a str>) -> HashMap<String, &'a str> {
    let mut map = HashMap::new();
    for header in headers {
        map.entry(canonical_column(header)).or_insert(header);
    }
    map
}

fn check_required(map: &HashMap<String, &str>) -> Result<(), LoadError> {
    let mut missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| !map.contains_key(**c))
        .map(|c| c.to_string())
        .collect();
    if missing.is_empty() {
        return Ok(());
    }
    missing.sort();
    Err(LoadError::MissingColumns(missing))
}

// ── Timestamps ──────────────────────────────────────────────────────

/// Parse RFC 3339, `YYYY-MM-DD HH:MM:SS[.f]`, `YYYY-MM-DDTHH:MM:SS[.f]` or
/// `YYYY-MM-DD`. Naive values are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

// ── CSV ─────────────────────────────────────────────────────────────

fn read_csv(path: &Path) -> Result<Vec<Bar>, LoadError> {
    let csv_err = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_err)?;

    let headers = reader.headers().map_err(csv_err)?.clone();
    let map = column_map(headers.iter());
    check_required(&map)?;

    let index_of = |canonical: &str| {
        map.get(canonical)
            .and_then(|orig| headers.iter().position(|h| h == *orig))
    };
    let idx: Vec<usize> = REQUIRED_COLUMNS
        .iter()
        .filter_map(|c| index_of(c))
        .collect();
    let entropy_idx = index_of("entropy");
    let symbol_idx = index_of("symbol");

    let mut bars = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(csv_err)?;
        let field = |i: usize| record.get(i).unwrap_or("");

        let ts_raw = field(idx[0]);
        let timestamp = parse_timestamp(ts_raw).ok_or_else(|| LoadError::Timestamp {
            row,
            value: ts_raw.to_string(),
        })?;

        let mut values = [0.0; 5];
        for (slot, (&column, &i)) in values
            .iter_mut()
            .zip(REQUIRED_COLUMNS[1..].iter().zip(&idx[1..]))
        {
            let raw = field(i);
            *slot = raw.parse::<f64>().map_err(|_| LoadError::Numeric {
                row,
                column,
                value: raw.to_string(),
            })?;
        }
        let [open, high, low, close, volume] = values;

        let mut bar = Bar::new(timestamp, open, high, low, close, volume);
        if let Some(i) = entropy_idx {
            let raw = field(i);
            if !raw.is_empty() {
                bar.entropy = Some(raw.parse::<f64>().map_err(|_| LoadError::Numeric {
                    row,
                    column: "entropy",
                    value: raw.to_string(),
                })?);
            }
        }
        if let Some(i) = symbol_idx {
            bar.symbol = Some(field(i).to_string()).filter(|s| !s.is_empty());
        }
        bars.push(bar);
    }
    Ok(bars)
}

// ── Parquet ─────────────────────────────────────────────────────────

fn read_parquet(path: &Path) -> Result<Vec<Bar>, LoadError> {
    let pq_err = |e: PolarsError| LoadError::Parquet {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let df = ParquetReader::new(file).finish().map_err(pq_err)?;

    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|n| n.to_string())
        .collect();
    let map = column_map(names.iter().map(String::as_str));
    check_required(&map)?;

    let column = |canonical: &str| find_column(&df, &map, canonical, path);
    let required = |canonical: &str| {
        column(canonical)?.ok_or_else(|| LoadError::MissingColumns(vec![canonical.to_string()]))
    };

    let timestamps = parquet_timestamps(required("timestamp")?, path)?;
    let mut numeric = Vec::with_capacity(5);
    for name in &REQUIRED_COLUMNS[1..] {
        numeric.push(parquet_f64(required(name)?, path)?);
    }
    let entropy = column("entropy")?
        .map(|c| parquet_f64(c, path))
        .transpose()?;
    let symbol = match column("symbol")? {
        Some(c) => {
            let as_str = c.cast(&DataType::String).map_err(pq_err)?;
            let ca = as_str.str().map_err(pq_err)?;
            Some(ca.into_iter().map(|v| v.map(str::to_string)).collect::<Vec<_>>())
        }
        None => None,
    };

    let bars = timestamps
        .into_iter()
        .enumerate()
        .map(|(i, timestamp)| {
            let mut bar = Bar::new(
                timestamp,
                numeric[0][i],
                numeric[1][i],
                numeric[2][i],
                numeric[3][i],
                numeric[4][i],
            );
            bar.entropy = entropy.as_ref().map(|e| e[i]).filter(|e| !e.is_nan());
            bar.symbol = symbol.as_ref().and_then(|s| s[i].clone());
            bar
        })
        .collect();
    Ok(bars)
}

fn find_column<'a>(
    df: &'a DataFrame,
    map: &HashMap<String, &str>,
    canonical: &str,
    path: &Path,
) -> Result<Option<&'a Column>, LoadError> {
    match map.get(canonical) {
        Some(orig) => df
            .column(orig)
            .map(Some)
            .map_err(|e| LoadError::Parquet {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }),
        None => Ok(None),
    }
}

/// Float values of a column; nulls become NaN.
fn parquet_f64(col: &Column, path: &Path) -> Result<Vec<f64>, LoadError> {
    let pq_err = |e: PolarsError| LoadError::Parquet {
        path: path.to_path_buf(),
        reason: format!("column '{}': {e}", col.name()),
    };
    let cast = col.cast(&DataType::Float64).map_err(pq_err)?;
    let ca = cast.f64().map_err(pq_err)?;
    Ok(ca.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
}

fn parquet_timestamps(col: &Column, path: &Path) -> Result<Vec<DateTime<Utc>>, LoadError> {
    let pq_err = |e: PolarsError| LoadError::Parquet {
        path: path.to_path_buf(),
        reason: format!("timestamp column: {e}"),
    };
    let bad = |row: usize, value: String| LoadError::Timestamp { row, value };

    match col.dtype() {
        DataType::Datetime(unit, _) => {
            let unit = *unit;
            let ints = col.cast(&DataType::Int64).map_err(pq_err)?;
            let ca = ints.i64().map_err(pq_err)?;
            ca.into_iter()
                .enumerate()
                .map(|(row, v)| {
                    v.and_then(|v| match unit {
                        TimeUnit::Nanoseconds => Some(DateTime::from_timestamp_nanos(v)),
                        TimeUnit::Microseconds => DateTime::from_timestamp_micros(v),
                        TimeUnit::Milliseconds => DateTime::from_timestamp_millis(v),
                    })
                    .ok_or_else(|| bad(row, format!("{v:?}")))
                })
                .collect()
        }
        DataType::Date => {
            let ints = col.cast(&DataType::Int32).map_err(pq_err)?;
            let ca = ints.i32().map_err(pq_err)?;
            ca.into_iter()
                .enumerate()
                .map(|(row, v)| {
                    v.and_then(|days| DateTime::from_timestamp(days as i64 * 86_400, 0))
                        .ok_or_else(|| bad(row, format!("{v:?}")))
                })
                .collect()
        }
        DataType::String => {
            let ca = col.str().map_err(pq_err)?;
            ca.into_iter()
                .enumerate()
                .map(|(row, v)| {
                    v.and_then(parse_timestamp)
                        .ok_or_else(|| bad(row, v.unwrap_or("").to_string()))
                })
                .collect()
        }
        other => Err(LoadError::Parquet {
            path: path.to_path_buf(),
            reason: format!("unsupported timestamp column type {other}"),
        }),
    }
}
