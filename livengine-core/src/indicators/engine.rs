//! IndicatorEngine — rolling buffers and the indicators read from them.

use super::atr::{average_true_range, true_range};
use super::entropy::return_volatility;
use super::sma::mean_of_last;
use super::RingBuffer;
use crate::domain::Bar;
use crate::params::StrategyParams;

/// Indicator values for one warm bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorSnapshot {
    pub fast_ma: f64,
    pub slow_ma: f64,
    pub atr: f64,
    /// Derived entropy estimate (never the bar-supplied value).
    pub entropy: f64,
}

/// Owns the bounded price and true-range history for one strategy.
///
/// Close/high/low buffers hold `max(lookback_slow, entropy_window, atr_period) + 1`
/// values; the true-range buffer holds `atr_period`.
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    lookback_fast: usize,
    lookback_slow: usize,
    atr_period: usize,
    entropy_window: usize,
    closes: RingBuffer<f64>,
    highs: RingBuffer<f64>,
    lows: RingBuffer<f64>,
    true_ranges: RingBuffer<f64>,
    prev_close: Option<f64>,
}

impl IndicatorEngine {
    pub fn new(params: &StrategyParams) -> Self {
        let capacity = params.price_buffer_capacity();
        Self {
            lookback_fast: params.lookback_fast,
            lookback_slow: params.lookback_slow,
            atr_period: params.atr_period,
            entropy_window: params.entropy_window,
            closes: RingBuffer::new(capacity),
            highs: RingBuffer::new(capacity),
            lows: RingBuffer::new(capacity),
            true_ranges: RingBuffer::new(params.atr_period),
            prev_close: None,
        }
    }

    /// Push one bar into every buffer.
    pub fn update(&mut self, bar: &Bar) {
        self.closes.push(bar.close);
        self.highs.push(bar.high);
        self.lows.push(bar.low);
        self.true_ranges
            .push(true_range(bar.high, bar.low, self.prev_close));
        self.prev_close = Some(bar.close);
    }

    /// Enough closes for the slow average and enough true ranges for the ATR.
    pub fn is_warm(&self) -> bool {
        self.closes.len() >= self.lookback_slow && self.true_ranges.len() >= self.atr_period
    }

    /// Current indicator values, or `None` while still warming up.
    pub fn snapshot(&self) -> Option<IndicatorSnapshot> {
        if !self.is_warm() {
            return None;
        }
        Some(IndicatorSnapshot {
            fast_ma: mean_of_last(&self.closes, self.lookback_fast)?,
            slow_ma: mean_of_last(&self.closes, self.lookback_slow)?,
            atr: average_true_range(&self.true_ranges),
            entropy: return_volatility(&self.closes, self.entropy_window),
        })
    }

    pub fn reset(&mut self) {
        self.closes.clear();
        self.highs.clear();
        self.lows.clear();
        self.true_ranges.clear();
        self.prev_close = None;
    }

    pub fn closes(&self) -> &RingBuffer<f64> {
        &self.closes
    }

    pub fn highs(&self) -> &RingBuffer<f64> {
        &self.highs
    }

    pub fn lows(&self) -> &RingBuffer<f64> {
        &self.lows
    }

    pub fn true_ranges(&self) -> &RingBuffer<f64> {
        &self.true_ranges
    }

    pub fn prev_close(&self) -> Option<f64> {
        self.prev_close
    }
}
