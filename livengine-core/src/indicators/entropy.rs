//! Entropy estimate: volatility of simple returns over recent closes.

use super::RingBuffer;

/// Population standard deviation of period-over-period simple returns
/// across the newest `window` closes.
///
/// Pairs whose earlier close is zero are skipped. Fewer than two usable
/// returns yield 0.0.
pub fn return_volatility(closes: &RingBuffer<f64>, window: usize) -> f64 {
    let recent: Vec<f64> = closes.tail(window).collect();
    let returns: Vec<f64> = recent
        .windows(2)
        .filter(|pair| pair[0] != 0.0)
        .map(|pair| (pair[1] - pair[0]) / pair[0])
        .collect();

    if returns.len() < 2 {
        return 0.0;
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}
