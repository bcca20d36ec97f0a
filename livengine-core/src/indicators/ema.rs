//! Exponential Moving Average (EMA), updated one price at a time.
//!
//! Recursive: EMA[t] = alpha * price[t] + (1 - alpha) * EMA[t-1]
//! Seed: the first price seen. alpha = 2 / (period + 1).

#[derive(Debug, Clone, PartialEq)]
pub struct Ema {
    period: usize,
    value: Option<f64>,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            value: None,
        }
    }

    pub fn alpha(&self) -> f64 {
        2.0 / (self.period as f64 + 1.0)
    }

    /// Fold in a price and return the updated average.
    ///
    /// A period of 1 or less tracks the price exactly.
    pub fn update(&mut self, price: f64) -> f64 {
        let next = match self.value {
            _ if self.period <= 1 => price,
            None => price,
            Some(prev) => self.alpha() * price + (1.0 - self.alpha()) * prev,
        };
        self.value = Some(next);
        next
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn reset(&mut self) {
        self.value = None;
    }
}
