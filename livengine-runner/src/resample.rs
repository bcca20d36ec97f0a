//! Time-bucket resampling of OHLCV bars.
//!
//! Rules look like `15min`, `1h`, `4H`, `1d`. Buckets are aligned to the Unix
//! epoch (floor of epoch seconds), so `1d` buckets start at 00:00 UTC.

use chrono::DateTime;
use thiserror::Error;

use livengine_core::domain::Bar;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResampleError {
    #[error("invalid resample rule '{0}' (expected <n><unit>, unit one of s, min, T, m, h, H, d, D)")]
    InvalidRule(String),
}

/// A parsed rule: fixed bucket width in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResampleRule {
    seconds: i64,
}

impl ResampleRule {
    pub fn parse(rule: &str) -> Result<Self, ResampleError> {
        let invalid = || ResampleError::InvalidRule(rule.to_string());
        let rule_trimmed = rule.trim();
        let split = rule_trimmed
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(invalid)?;
        let (count, unit) = rule_trimmed.split_at(split);

        let count: i64 = if count.is_empty() {
            1
        } else {
            count.parse().map_err(|_| invalid())?
        };
        if count < 1 {
            return Err(invalid());
        }

        let unit_seconds = match unit {
            "s" | "S" => 1,
            "min" | "T" | "m" => 60,
            "h" | "H" => 3_600,
            "d" | "D" => 86_400,
            _ => return Err(invalid()),
        };

        count
            .checked_mul(unit_seconds)
            .map(|seconds| Self { seconds })
            .ok_or_else(invalid)
    }

    pub fn seconds(&self) -> i64 {
        self.seconds
    }

    fn bucket_start(&self, epoch_seconds: i64) -> i64 {
        epoch_seconds.div_euclid(self.seconds) * self.seconds
    }
}

/// Aggregate time-sorted bars into buckets.
///
/// open = first, high = max, low = min, close = last, volume = sum. Empty
/// buckets produce nothing. Entropy and symbol do not survive aggregation.
pub fn resample(bars: &[Bar], rule: ResampleRule) -> Vec<Bar> {
    let mut out: Vec<Bar> = Vec::new();
    let mut current: Option<i64> = None;

    for bar in bars {
        let bucket = rule.bucket_start(bar.timestamp.timestamp());
        if current == Some(bucket) {
            if let Some(agg) = out.last_mut() {
                agg.high = agg.high.max(bar.high);
                agg.low = agg.low.min(bar.low);
                agg.close = bar.close;
                agg.volume += bar.volume;
                continue;
            }
        }
        let Some(ts) = DateTime::from_timestamp(bucket, 0) else {
            continue;
        };
        current = Some(bucket);
        out.push(Bar::new(ts, bar.open, bar.high, bar.low, bar.close, bar.volume));
    }
    out
}
