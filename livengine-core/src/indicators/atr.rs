//! True range and Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|)
//! ATR here is the plain mean of the buffered true ranges (no Wilder smoothing).

use super::RingBuffer;

/// True range of one bar. Without a previous close it is just `high - low`.
pub fn true_range(high: f64, low: f64, prev_close: Option<f64>) -> f64 {
    let range = high - low;
    match prev_close {
        Some(pc) => range.max((high - pc).abs()).max((low - pc).abs()),
        None => range,
    }
}

/// Mean of every true range currently buffered; 0.0 when the buffer is empty.
pub fn average_true_range(true_ranges: &RingBuffer<f64>) -> f64 {
    if true_ranges.is_empty() {
        return 0.0;
    }
    true_ranges.iter().sum::<f64>() / true_ranges.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn true_range_basic() {
        // First bar: no previous close
        assert_approx(true_range(105.0, 95.0, None), 10.0, DEFAULT_EPSILON);
        // max(8, |108-102|, |100-102|) = 8
        assert_approx(true_range(108.0, 100.0, Some(102.0)), 8.0, DEFAULT_EPSILON);
        // max(9, |107-106|, |98-106|) = 9
        assert_approx(true_range(107.0, 98.0, Some(106.0)), 9.0, DEFAULT_EPSILON);
    }

    #[test]
    fn true_range_gap_up() {
        // Gap up: prev close 100, bar 108-115 → |115-100| = 15
        assert_approx(true_range(115.0, 108.0, Some(100.0)), 15.0, DEFAULT_EPSILON);
    }

    #[test]
    fn true_range_gap_down() {
        // Gap down: prev close 120, bar 105-110 → |105-120| = 15
        assert_approx(true_range(110.0, 105.0, Some(120.0)), 15.0, DEFAULT_EPSILON);
    }

    #[test]
    fn atr_is_mean_of_buffer() {
        let mut trs = RingBuffer::new(3);
        assert_eq!(average_true_range(&trs), 0.0);
        for tr in [10.0, 8.0, 9.0, 6.0] {
            trs.push(tr);
        }
        // 10 evicted → mean(8, 9, 6)
        assert_approx(average_true_range(&trs), 23.0 / 3.0, DEFAULT_EPSILON);
    }
}
