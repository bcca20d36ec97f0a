//! Performance metrics — pure functions over the equity curve.
//!
//! Every metric is a pure function: equity curve in, scalar out.
//! No dependencies on the runner, data pipeline, or strategy.

use serde::Serialize;

use livengine_core::DataError;

/// Annualisation factor for per-bar returns.
pub const PERIODS_PER_YEAR: f64 = 252.0;

/// Headline numbers for one run.
///
/// `sharpe` may be ±infinity when returns never vary; JSON writes it as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metrics {
    pub final_equity: f64,
    pub sharpe: f64,
    pub max_drawdown: f64,
    pub cagr_est: f64,
    #[serde(rename = "return")]
    pub total_return: f64,
    pub bars_processed: usize,
}

/// Compute all metrics from a seeded equity curve over `bar_count` bars.
pub fn summarize_equity(equity_curve: &[f64], bar_count: usize) -> Result<Metrics, DataError> {
    let (Some(&starting), Some(&ending)) = (equity_curve.first(), equity_curve.last()) else {
        return Err(DataError::EmptyEquity);
    };
    if bar_count == 0 {
        return Err(DataError::EmptyBars);
    }

    Ok(Metrics {
        final_equity: ending,
        sharpe: sharpe_ratio(&simple_returns(equity_curve)),
        max_drawdown: max_drawdown(equity_curve),
        cagr_est: cagr_estimate(starting, ending, bar_count),
        total_return: total_return(starting, ending),
        bars_processed: bar_count,
    })
}

// ─── Individual metric functions ────────────────────────────────────

/// Per-step simple returns; steps from a zero equity value are skipped.
pub fn simple_returns(equity_curve: &[f64]) -> Vec<f64> {
    equity_curve
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect()
}

/// Annualised Sharpe ratio with a sample (n−1) standard deviation.
///
/// Fewer than two returns → 0. Zero deviation with a non-zero mean → signed
/// infinity; zero mean → 0.
pub fn sharpe_ratio(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let std = if variance > 0.0 { variance.sqrt() } else { 0.0 };

    if std > 0.0 {
        mean / std * PERIODS_PER_YEAR.sqrt()
    } else if mean != 0.0 {
        f64::INFINITY.copysign(mean)
    } else {
        0.0
    }
}

/// Largest fractional decline from the running peak, as a positive number.
///
/// Peaks at or below zero contribute nothing.
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    let Some(&first) = equity_curve.first() else {
        return 0.0;
    };
    let mut peak = first;
    let mut max_dd = 0.0_f64;

    for &eq in equity_curve {
        if eq > peak {
            peak = eq;
        }
        if peak > 0.0 {
            max_dd = max_dd.max((peak - eq) / peak);
        }
    }
    max_dd
}

/// Compounded growth over more than one year of bars, simple return otherwise.
pub fn cagr_estimate(starting: f64, ending: f64, bar_count: usize) -> f64 {
    if starting <= 0.0 {
        return 0.0;
    }
    if bar_count as f64 > PERIODS_PER_YEAR {
        (ending / starting).powf(PERIODS_PER_YEAR / bar_count as f64) - 1.0
    } else {
        ending / starting - 1.0
    }
}

/// `ending / starting − 1`, or 0 when starting is 0.
pub fn total_return(starting: f64, ending: f64) -> f64 {
    if starting == 0.0 {
        return 0.0;
    }
    ending / starting - 1.0
}
