//! EmaCross — EMA crossover gated by market entropy.
//!
//! A lighter sibling of [`ImmCore`](super::ImmCore): no warmup, no derived
//! entropy and no collapse guard. Entropy is the bar's own value, or 0 when
//! the bar carries none.

use tracing::debug;

use super::{BarDecision, Strategy};
use crate::domain::{Bar, Capsule, EntropySource, Glyph, Order, Verdict};
use crate::indicators::{average_true_range, true_range, Ema, RingBuffer};
use crate::params::StrategyParams;
use crate::regime::RegimeThresholds;

#[derive(Debug, Clone)]
pub struct EmaCross {
    thresholds: RegimeThresholds,
    unit_size: f64,
    fast: Ema,
    slow: Ema,
    true_ranges: RingBuffer<f64>,
    prev_close: Option<f64>,
    position: f64,
}

impl EmaCross {
    pub fn new(params: &StrategyParams) -> Self {
        Self {
            thresholds: RegimeThresholds::from_params(params),
            unit_size: params.unit_size,
            fast: Ema::new(params.lookback_fast),
            slow: Ema::new(params.lookback_slow),
            true_ranges: RingBuffer::new(params.atr_period),
            prev_close: None,
            position: 0.0,
        }
    }
}

impl Strategy for EmaCross {
    fn name(&self) -> &str {
        "ema_cross"
    }

    fn initialize(&mut self) {
        self.fast.reset();
        self.slow.reset();
        self.true_ranges.clear();
        self.prev_close = None;
        self.position = 0.0;
    }

    fn process_bar(&mut self, bar: &Bar) -> BarDecision {
        let fast = self.fast.update(bar.close);
        let slow = self.slow.update(bar.close);
        self.true_ranges
            .push(true_range(bar.high, bar.low, self.prev_close));
        self.prev_close = Some(bar.close);

        let (entropy, entropy_source) = match bar.market_entropy() {
            Some(e) => (e, EntropySource::Market),
            None => (0.0, EntropySource::Derived),
        };

        let order = if self.position == 0.0
            && entropy < self.thresholds.entropy_threshold
            && fast > slow
        {
            self.position = self.unit_size;
            debug!(ts = %bar.timestamp, price = bar.close, "entry");
            Some(Order::long(self.unit_size, bar.close))
        } else if self.position != 0.0 && entropy >= self.thresholds.np_threshold {
            let size = self.position;
            self.position = 0.0;
            debug!(ts = %bar.timestamp, price = bar.close, "exit");
            Some(Order::flat(size, bar.close))
        } else {
            None
        };

        let capsule = Capsule {
            glyph: Glyph::for_entropy(entropy, self.thresholds.entropy_threshold),
            entropy,
            entropy_source,
            atr: average_true_range(&self.true_ranges),
            fast_ma: fast,
            slow_ma: slow,
            verdict: if self.position != 0.0 {
                Verdict::Long
            } else {
                Verdict::Flat
            },
            regime: self.thresholds.classify(entropy),
            collapse_guard: false,
            recovery_count: 0,
        };

        BarDecision {
            order,
            capsule: Some(capsule),
        }
    }

    fn finalize(&mut self) {
        self.position = 0.0;
    }

    fn position(&self) -> f64 {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OrderSide, Regime};
    use crate::indicators::make_bars;
    use crate::params::StrategyKind;

    fn params() -> StrategyParams {
        StrategyParams::builder()
            .strategy(StrategyKind::EmaCross)
            .lookbacks(2, 4)
            .atr_period(3)
            .thresholds(0.1, 0.2, 0.3)
            .unit_size(2.0)
            .build()
            .unwrap()
    }

    #[test]
    fn emits_capsule_from_first_bar() {
        let mut strat = EmaCross::new(&params());
        let bars = make_bars(&[100.0]);
        let decision = strat.process_bar(&bars[0]);
        let capsule = decision.capsule.expect("capsule on every bar");
        assert_eq!(capsule.fast_ma, 100.0);
        assert_eq!(capsule.slow_ma, 100.0);
        assert_eq!(capsule.entropy, 0.0);
        assert_eq!(capsule.entropy_source, EntropySource::Derived);
        assert!(!capsule.collapse_guard);
        // seeded EMAs are equal, so no crossover yet
        assert!(decision.order.is_none());
    }

    #[test]
    fn enters_on_rising_prices_with_calm_entropy() {
        let mut strat = EmaCross::new(&params());
        let bars = make_bars(&[100.0, 101.0]);
        strat.process_bar(&bars[0]);
        let decision = strat.process_bar(&bars[1]);
        let order = decision.order.expect("fast EMA leads after a rise");
        assert_eq!(order.side, OrderSide::Long);
        assert_eq!(order.size, 2.0);
        assert_eq!(order.price, 101.0);
        assert_eq!(decision.capsule.unwrap().verdict, Verdict::Long);
    }

    #[test]
    fn exits_when_entropy_reaches_np_threshold() {
        let mut strat = EmaCross::new(&params());
        let mut bars = make_bars(&[100.0, 101.0, 102.0]);
        bars[2].entropy = Some(0.2);
        strat.process_bar(&bars[0]);
        strat.process_bar(&bars[1]);

        let decision = strat.process_bar(&bars[2]);
        let order = decision.order.expect("exit at NP threshold");
        assert_eq!(order.side, OrderSide::Flat);
        assert_eq!(order.size, 2.0);
        let capsule = decision.capsule.unwrap();
        assert_eq!(capsule.regime, Regime::Drift);
        assert_eq!(capsule.entropy_source, EntropySource::Market);
        assert_eq!(capsule.verdict, Verdict::Flat);
        assert_eq!(strat.position(), 0.0);
    }

    #[test]
    fn market_entropy_blocks_entry() {
        let mut strat = EmaCross::new(&params());
        let mut bars = make_bars(&[100.0, 101.0]);
        bars[1].entropy = Some(0.15);
        strat.process_bar(&bars[0]);
        assert!(strat.process_bar(&bars[1]).order.is_none());
    }

    #[test]
    fn initialize_reseeds_averages() {
        let mut strat = EmaCross::new(&params());
        for bar in make_bars(&[100.0, 110.0]) {
            strat.process_bar(&bar);
        }
        strat.initialize();
        assert_eq!(strat.position(), 0.0);
        let capsule = strat.process_bar(&make_bars(&[50.0])[0]).capsule.unwrap();
        assert_eq!(capsule.fast_ma, 50.0);
        assert_eq!(capsule.slow_ma, 50.0);
    }
}
