//! Bar — the fundamental market data unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DataError;

/// One OHLCV sample.
///
/// `entropy` is an optional market-supplied volatility value. When it is
/// present and finite the strategy classifies on it directly; otherwise the
/// rolling estimate derived from closes is used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entropy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

impl Bar {
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
            entropy: None,
            symbol: None,
        }
    }

    pub fn with_entropy(mut self, entropy: f64) -> Self {
        self.entropy = Some(entropy);
        self
    }

    /// The supplied entropy, if it is usable for classification.
    pub fn market_entropy(&self) -> Option<f64> {
        self.entropy.filter(|e| e.is_finite())
    }

    /// First OHLCV field that is NaN or infinite, if any.
    pub fn non_finite_field(&self) -> Option<&'static str> {
        [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
            ("volume", self.volume),
        ]
        .into_iter()
        .find(|(_, v)| !v.is_finite())
        .map(|(name, _)| name)
    }
}

/// Reject a bar sequence the engine cannot process.
///
/// Runs before any bar reaches a strategy: an empty sequence, a non-finite
/// OHLCV field, or a timestamp earlier than its predecessor aborts the run.
/// Equal consecutive timestamps are accepted.
pub fn validate_bars(bars: &[Bar]) -> Result<(), DataError> {
    if bars.is_empty() {
        return Err(DataError::EmptyBars);
    }

    for (index, bar) in bars.iter().enumerate() {
        if let Some(field) = bar.non_finite_field() {
            return Err(DataError::NonFinite {
                index,
                timestamp: bar.timestamp.to_rfc3339(),
                field,
            });
        }
        if index > 0 {
            let previous = &bars[index - 1];
            if bar.timestamp < previous.timestamp {
                return Err(DataError::TimestampOrder {
                    index,
                    timestamp: bar.timestamp.to_rfc3339(),
                    previous: previous.timestamp.to_rfc3339(),
                });
            }
        }
    }

    Ok(())
}
