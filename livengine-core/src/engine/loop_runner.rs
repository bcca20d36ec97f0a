//! The bar loop: strategy → ledger → sink, one bar at a time.
//!
//! Per bar:
//! 1. the strategy sees the bar and answers with an optional order and capsule
//! 2. the ledger applies the order (if any) and marks equity at the close
//! 3. the capsule (if any) goes to the sink, synchronously
//!
//! The whole bar sequence is validated before the first bar reaches the
//! strategy. A failing sink aborts the run.

use std::error::Error as StdError;

use thiserror::Error;
use tracing::{debug, info};

use super::ledger::ExecutionLedger;
use crate::domain::{validate_bars, Bar, CapsuleRecord, Regime, Trade};
use crate::error::{DataError, LedgerError};
use crate::strategy::Strategy;

pub type SinkError = Box<dyn StdError + Send + Sync>;

/// Receives each capsule as soon as it is produced.
pub trait CapsuleSink {
    fn record(&mut self, record: &CapsuleRecord) -> Result<(), SinkError>;
}

/// Discards every capsule.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl CapsuleSink for NullSink {
    fn record(&mut self, _record: &CapsuleRecord) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Keeps every capsule in memory.
impl CapsuleSink for Vec<CapsuleRecord> {
    fn record(&mut self, record: &CapsuleRecord) -> Result<(), SinkError> {
        self.push(record.clone());
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error("ledger rejected order at {timestamp}: {source}")]
    Ledger {
        timestamp: String,
        #[source]
        source: LedgerError,
    },

    #[error("capsule sink failed at {timestamp}: {source}")]
    Sink {
        timestamp: String,
        #[source]
        source: SinkError,
    },
}

/// Everything a finished run hands to reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutput {
    pub trades: Vec<Trade>,
    /// Seed value plus one point per bar.
    pub equity_curve: Vec<f64>,
    pub capsules: Vec<CapsuleRecord>,
    pub bars_processed: usize,
    /// Bars whose regime classified as COLLAPSE.
    pub collapse_hits: usize,
    /// Times the collapse guard went from clear to set.
    pub collapse_episodes: usize,
    /// Strategy position after the last bar, before `finalize`.
    pub final_position: f64,
}

/// Run `strategy` over `bars` from a fresh ledger holding `starting_cash`.
pub fn run_strategy(
    strategy: &mut dyn Strategy,
    bars: &[Bar],
    starting_cash: f64,
    sink: &mut dyn CapsuleSink,
) -> Result<RunOutput, EngineError> {
    validate_bars(bars)?;

    info!(
        strategy = strategy.name(),
        bars = bars.len(),
        starting_cash,
        "starting run"
    );

    strategy.initialize();
    let mut ledger = ExecutionLedger::new(starting_cash);
    let mut capsules = Vec::new();
    let mut collapse_hits = 0;
    let mut collapse_episodes = 0;
    let mut guard_was_set = false;

    for bar in bars {
        let decision = strategy.process_bar(bar);

        if let Some(order) = decision.order {
            let trade = ledger
                .apply(bar.timestamp, &order)
                .map_err(|source| EngineError::Ledger {
                    timestamp: bar.timestamp.to_rfc3339(),
                    source,
                })?;
            debug!(
                ts = %trade.ts,
                action = trade.action.as_str(),
                px = trade.price,
                size = trade.size,
                "trade"
            );
        }
        ledger.mark(bar.close);

        if let Some(capsule) = decision.capsule {
            if capsule.regime == Regime::Collapse {
                collapse_hits += 1;
            }
            if capsule.collapse_guard && !guard_was_set {
                collapse_episodes += 1;
            }
            guard_was_set = capsule.collapse_guard;

            let record = CapsuleRecord {
                ts: bar.timestamp,
                capsule,
            };
            sink.record(&record).map_err(|source| EngineError::Sink {
                timestamp: bar.timestamp.to_rfc3339(),
                source,
            })?;
            capsules.push(record);
        }
    }

    let final_position = strategy.position();
    strategy.finalize();

    let (trades, equity_curve) = ledger.into_parts();
    info!(
        trades = trades.len(),
        capsules = capsules.len(),
        collapse_hits,
        final_equity = equity_curve.last().copied().unwrap_or(starting_cash),
        "run finished"
    );

    Ok(RunOutput {
        trades,
        equity_curve,
        capsules,
        bars_processed: bars.len(),
        collapse_hits,
        collapse_episodes,
        final_position,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TradeAction;
    use crate::indicators::make_bars;
    use crate::params::StrategyParams;
    use crate::strategy::ImmCore;

    fn params() -> StrategyParams {
        StrategyParams::builder()
            .lookbacks(2, 3)
            .atr_period(2)
            .entropy_window(2)
            .thresholds(0.5, 0.75, 1.0)
            .starting_cash(1_000.0)
            .build()
            .unwrap()
    }

    struct FailingSink;

    impl CapsuleSink for FailingSink {
        fn record(&mut self, _record: &CapsuleRecord) -> Result<(), SinkError> {
            Err("disk full".into())
        }
    }

    #[test]
    fn equity_curve_has_seed_plus_one_per_bar() {
        let p = params();
        let mut strat = ImmCore::new(&p);
        let bars = make_bars(&[100.0, 101.0, 102.0, 104.0]);
        let out = run_strategy(&mut strat, &bars, p.starting_cash, &mut NullSink).unwrap();

        assert_eq!(out.bars_processed, 4);
        assert_eq!(out.equity_curve.len(), 5);
        assert_eq!(out.equity_curve, vec![1_000.0, 1_000.0, 1_000.0, 1_000.0, 1_002.0]);
        assert_eq!(out.trades.len(), 1);
        assert_eq!(out.trades[0].action, TradeAction::Buy);
        assert_eq!(out.final_position, 1.0);
        // two warm bars
        assert_eq!(out.capsules.len(), 2);
    }

    #[test]
    fn sink_sees_every_capsule_in_order() {
        let p = params();
        let mut strat = ImmCore::new(&p);
        let bars = make_bars(&[100.0, 101.0, 102.0, 104.0, 103.0]);
        let mut sink: Vec<CapsuleRecord> = Vec::new();
        let out = run_strategy(&mut strat, &bars, p.starting_cash, &mut sink).unwrap();
        assert_eq!(sink, out.capsules);
        assert_eq!(sink[0].ts, bars[2].timestamp);
    }

    #[test]
    fn empty_bars_are_a_data_error() {
        let mut strat = ImmCore::new(&params());
        let err = run_strategy(&mut strat, &[], 1_000.0, &mut NullSink).unwrap_err();
        assert!(matches!(err, EngineError::Data(DataError::EmptyBars)));
    }

    #[test]
    fn out_of_order_bars_abort_before_processing() {
        let mut strat = ImmCore::new(&params());
        let mut bars = make_bars(&[100.0, 101.0, 102.0]);
        bars.swap(0, 2);
        let err = run_strategy(&mut strat, &bars, 1_000.0, &mut NullSink).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Data(DataError::TimestampOrder { index: 1, .. })
        ));
        assert!(strat.indicators().closes().is_empty());
    }

    #[test]
    fn sink_failure_aborts_run() {
        let mut strat = ImmCore::new(&params());
        let bars = make_bars(&[100.0, 101.0, 102.0]);
        let err = run_strategy(&mut strat, &bars, 1_000.0, &mut FailingSink).unwrap_err();
        match err {
            EngineError::Sink { source, .. } => assert_eq!(source.to_string(), "disk full"),
            other => panic!("expected sink error, got {other:?}"),
        }
    }

    #[test]
    fn collapse_counters_track_hits_and_episodes() {
        let p = StrategyParams::builder()
            .lookbacks(1, 1)
            .atr_period(1)
            .entropy_window(2)
            .thresholds(0.1, 0.2, 0.3)
            .recovery_window(1)
            .build()
            .unwrap();
        let mut strat = ImmCore::new(&p);
        let mut bars = make_bars(&[100.0, 100.0, 100.0, 100.0, 100.0]);
        let entropies = [0.5, 0.6, 0.0, 0.4, 0.0];
        for (bar, e) in bars.iter_mut().zip(entropies) {
            bar.entropy = Some(e);
        }
        let out = run_strategy(&mut strat, &bars, 1_000.0, &mut NullSink).unwrap();
        assert_eq!(out.collapse_hits, 3);
        assert_eq!(out.collapse_episodes, 2);
    }
}
