//! Simple Moving Average (SMA) over a rolling close buffer.

use super::RingBuffer;

/// Arithmetic mean of the newest `period` values.
///
/// When fewer than `period` values are held the mean covers all of them.
/// Returns `None` only for an empty buffer.
pub fn mean_of_last(values: &RingBuffer<f64>, period: usize) -> Option<f64> {
    let take = period.min(values.len());
    if take == 0 {
        return None;
    }
    let sum: f64 = values.tail(take).sum();
    Some(sum / take as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    fn ring(values: &[f64]) -> RingBuffer<f64> {
        let mut ring = RingBuffer::new(values.len().max(1));
        for &v in values {
            ring.push(v);
        }
        ring
    }

    #[test]
    fn sma_of_newest_values() {
        let closes = ring(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        assert_approx(mean_of_last(&closes, 5).unwrap(), 12.0, DEFAULT_EPSILON);
        assert_approx(mean_of_last(&closes, 2).unwrap(), 13.5, DEFAULT_EPSILON);
        assert_approx(mean_of_last(&closes, 1).unwrap(), 14.0, DEFAULT_EPSILON);
    }

    #[test]
    fn period_longer_than_buffer_uses_everything() {
        let closes = ring(&[100.0, 200.0]);
        assert_approx(mean_of_last(&closes, 10).unwrap(), 150.0, DEFAULT_EPSILON);
    }

    #[test]
    fn empty_buffer_has_no_mean() {
        let closes: RingBuffer<f64> = RingBuffer::new(3);
        assert!(mean_of_last(&closes, 3).is_none());
    }
}
