//! ImmCore — SMA crossover gated by entropy, with the collapse guard.
//!
//! Per warm bar:
//! 1. fast/slow SMA, ATR, entropy (market value if supplied, else derived)
//! 2. update the collapse guard, classify the regime, build the capsule
//! 3. flat → enter when `fast > slow·(1+buf)`, entropy < threshold, guard clear
//! 4. holding → exit when `fast < slow·(1−buf)`, entropy > exit, or guard set

use tracing::debug;

use super::{BarDecision, Strategy};
use crate::domain::{Bar, Capsule, EntropySource, Glyph, Order, Verdict};
use crate::indicators::{IndicatorEngine, IndicatorSnapshot};
use crate::params::StrategyParams;
use crate::regime::{CollapseGuard, GuardTransition, RegimeThresholds};

#[derive(Debug, Clone)]
pub struct ImmCore {
    thresholds: RegimeThresholds,
    ma_buffer: f64,
    unit_size: f64,
    indicators: IndicatorEngine,
    guard: CollapseGuard,
    position: f64,
}

impl ImmCore {
    pub fn new(params: &StrategyParams) -> Self {
        Self {
            thresholds: RegimeThresholds::from_params(params),
            ma_buffer: params.ma_buffer,
            unit_size: params.unit_size,
            indicators: IndicatorEngine::new(params),
            guard: CollapseGuard::new(params.recovery_window),
            position: 0.0,
        }
    }

    pub fn indicators(&self) -> &IndicatorEngine {
        &self.indicators
    }

    pub fn guard(&self) -> &CollapseGuard {
        &self.guard
    }

    fn entry_signal(&self, snap: &IndicatorSnapshot, entropy: f64) -> bool {
        self.position == 0.0
            && snap.fast_ma > snap.slow_ma * (1.0 + self.ma_buffer)
            && entropy < self.thresholds.entropy_threshold
            && !self.guard.in_collapse()
    }

    fn exit_signal(&self, snap: &IndicatorSnapshot, entropy: f64) -> bool {
        self.position != 0.0
            && (snap.fast_ma < snap.slow_ma * (1.0 - self.ma_buffer)
                || entropy > self.thresholds.entropy_exit
                || self.guard.in_collapse())
    }
}

impl Strategy for ImmCore {
    fn name(&self) -> &str {
        "imm_core"
    }

    fn initialize(&mut self) {
        self.indicators.reset();
        self.guard.reset();
        self.position = 0.0;
    }

    fn process_bar(&mut self, bar: &Bar) -> BarDecision {
        self.indicators.update(bar);

        let Some(snap) = self.indicators.snapshot() else {
            return BarDecision::none();
        };

        let (entropy, entropy_source) = match bar.market_entropy() {
            Some(e) => (e, EntropySource::Market),
            None => (snap.entropy, EntropySource::Derived),
        };

        match self.guard.update(entropy, &self.thresholds) {
            GuardTransition::Entered => {
                debug!(ts = %bar.timestamp, entropy, "collapse guard engaged")
            }
            GuardTransition::Recovered => debug!(ts = %bar.timestamp, "collapse guard cleared"),
            GuardTransition::Retriggered | GuardTransition::Unchanged => {}
        }

        let mut capsule = Capsule {
            glyph: Glyph::for_entropy(entropy, self.thresholds.entropy_threshold),
            entropy,
            entropy_source,
            atr: snap.atr,
            fast_ma: snap.fast_ma,
            slow_ma: snap.slow_ma,
            verdict: if self.position != 0.0 {
                Verdict::Long
            } else {
                Verdict::Flat
            },
            regime: self.thresholds.classify(entropy),
            collapse_guard: self.guard.in_collapse(),
            recovery_count: self.guard.recovery_count(),
        };

        let order = if self.entry_signal(&snap, entropy) {
            self.position = self.unit_size;
            capsule.verdict = Verdict::Long;
            debug!(ts = %bar.timestamp, price = bar.close, "entry");
            Some(Order::long(self.unit_size, bar.close))
        } else if self.exit_signal(&snap, entropy) {
            let size = self.position;
            self.position = 0.0;
            capsule.verdict = Verdict::Flat;
            debug!(ts = %bar.timestamp, price = bar.close, "exit");
            Some(Order::flat(size, bar.close))
        } else {
            None
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
