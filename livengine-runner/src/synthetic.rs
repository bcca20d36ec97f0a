//! Synthetic bars for testing/development.
//!
//! A seeded random walk from 100.0 with hourly spacing. These are clearly
//! fake: runs on them are tagged synthetic in the manifest.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use livengine_core::domain::Bar;

/// First synthetic timestamp.
pub fn synthetic_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::UNIX_EPOCH)
}

/// `n` hourly bars; the same `seed` always gives the same bars.
pub fn generate_synthetic_bars(n: usize, seed: u64) -> Vec<Bar> {
    let mut rng = StdRng::seed_from_u64(seed);
    let start = synthetic_start();
    let mut price = 100.0_f64;

    (0..n)
        .map(|i| {
            let step: f64 = rng.gen_range(-0.01..0.01);
            let open = price;
            let close = price * (1.0 + step);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.003));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.003));
            let volume = rng.gen_range(1_000.0..10_000.0_f64).round();
            price = close;
            Bar::new(start + Duration::hours(i as i64), open, high, low, close, volume)
        })
        .collect()
}

/// BLAKE3 over timestamps and OHLCV values, for runs with no source file.
pub fn hash_bars(bars: &[Bar]) -> String {
    let mut hasher = blake3::Hasher::new();
    for bar in bars {
        hasher.update(&bar.timestamp.timestamp().to_le_bytes());
        for value in [bar.open, bar.high, bar.low, bar.close, bar.volume] {
            hasher.update(&value.to_le_bytes());
        }
    }
    hasher.finalize().to_hex().to_string()
}
