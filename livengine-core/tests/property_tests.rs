//! Property tests for engine invariants.
//!
//! Uses proptest to verify:
//! 1. Equity length — one seed point plus one per bar
//! 2. Single unit — position is always 0 or the unit size
//! 3. Determinism — same bars and params give the same run
//! 4. Guard liveness — the guard holds until a full calm window
//! 5. Round trip — BUY then SELL moves cash by size · (exit − entry)

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

use livengine_core::domain::{Bar, Order, TradeAction};
use livengine_core::regime::{CollapseGuard, RegimeThresholds};
use livengine_core::strategy::ImmCore;
use livengine_core::Strategy as _;
use livengine_core::{run_strategy, ExecutionLedger, NullSink, StrategyParams};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_closes() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-0.04..0.04_f64, 1..120).prop_map(|steps| {
        let mut price = 100.0;
        steps
            .into_iter()
            .map(|r| {
                price *= 1.0 + r;
                (price * 100.0).round() / 100.0
            })
            .collect()
    })
}

fn arb_entropies(len: usize) -> impl Strategy<Value = Vec<Option<f64>>> {
    prop::collection::vec(prop::option::of(0.0..0.5_f64), len)
}

fn arb_params() -> impl Strategy<Value = StrategyParams> {
    (1usize..6, 0usize..6, 1usize..6, 2usize..8, 0u32..4, 0.0..0.01_f64).prop_map(
        |(fast, extra, atr, window, recovery, buffer)| {
            StrategyParams::builder()
                .lookbacks(fast, fast + extra)
                .atr_period(atr)
                .entropy_window(window)
                .thresholds(0.01, 0.02, 0.04)
                .recovery_window(recovery)
                .ma_buffer(buffer)
                .unit_size(3.0)
                .build()
                .unwrap()
        },
    )
}

fn bars_with(closes: &[f64], entropies: &[Option<f64>]) -> Vec<Bar> {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            let mut bar = Bar::new(
                base + Duration::minutes(i as i64),
                open,
                open.max(close) * 1.001,
                open.min(close) * 0.999,
                close,
                1.0,
            );
            bar.entropy = entropies.get(i).copied().flatten();
            bar
        })
        .collect()
}

fn bars_and_entropies() -> impl Strategy<Value = Vec<Bar>> {
    arb_closes().prop_flat_map(|closes| {
        let len = closes.len();
        arb_entropies(len).prop_map(move |e| bars_with(&closes, &e))
    })
}

proptest! {
    #[test]
    fn equity_curve_is_one_longer_than_bars(bars in bars_and_entropies(), params in arb_params()) {
        let mut strat = ImmCore::new(&params);
        let out = run_strategy(&mut strat, &bars, params.starting_cash, &mut NullSink).unwrap();
        prop_assert_eq!(out.equity_curve.len(), out.bars_processed + 1);
        prop_assert_eq!(out.equity_curve[0], params.starting_cash);
    }

    #[test]
    fn position_is_zero_or_one_unit(bars in bars_and_entropies(), params in arb_params()) {
        let mut strat = ImmCore::new(&params);
        for bar in &bars {
            strat.process_bar(bar);
            let pos = strat.position();
            prop_assert!(pos == 0.0 || pos == params.unit_size, "position {}", pos);
        }
    }

    #[test]
    fn trades_alternate_buy_sell(bars in bars_and_entropies(), params in arb_params()) {
        let mut strat = ImmCore::new(&params);
        let out = run_strategy(&mut strat, &bars, params.starting_cash, &mut NullSink).unwrap();
        for (i, trade) in out.trades.iter().enumerate() {
            let expected = if i % 2 == 0 { TradeAction::Buy } else { TradeAction::Sell };
            prop_assert_eq!(trade.action, expected);
            prop_assert_eq!(trade.size, params.unit_size);
        }
    }

    #[test]
    fn identical_inputs_give_identical_runs(bars in bars_and_entropies(), params in arb_params()) {
        let mut a = ImmCore::new(&params);
        let mut b = ImmCore::new(&params);
        let first = run_strategy(&mut a, &bars, params.starting_cash, &mut NullSink).unwrap();
        let second = run_strategy(&mut b, &bars, params.starting_cash, &mut NullSink).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn reinitialized_strategy_repeats_itself(bars in bars_and_entropies(), params in arb_params()) {
        let mut strat = ImmCore::new(&params);
        let first = run_strategy(&mut strat, &bars, params.starting_cash, &mut NullSink).unwrap();
        let second = run_strategy(&mut strat, &bars, params.starting_cash, &mut NullSink).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn guard_holds_until_full_calm_window(
        readings in prop::collection::vec(0.0..0.5_f64, 1..80),
        window in 1u32..6,
    ) {
        let t = RegimeThresholds { entropy_threshold: 0.1, np_threshold: 0.2, entropy_exit: 0.3 };
        let mut guard = CollapseGuard::new(window);
        let mut calm_run: u32 = 0;
        let mut collapsed = false;

        for e in readings {
            guard.update(e, &t);
            if e >= t.entropy_exit {
                collapsed = true;
                calm_run = 0;
            } else if collapsed {
                if e < t.np_threshold {
                    calm_run += 1;
                    if calm_run >= window {
                        collapsed = false;
                        calm_run = 0;
                    }
                } else {
                    calm_run = 0;
                }
            }
            prop_assert_eq!(guard.in_collapse(), collapsed);
            prop_assert!(guard.recovery_count() < window);
        }
    }

    #[test]
    fn round_trip_moves_cash_by_price_difference(
        size in 0.01..100.0_f64,
        entry in 1.0..500.0_f64,
        exit in 1.0..500.0_f64,
    ) {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut ledger = ExecutionLedger::new(100_000.0);
        ledger.apply(ts, &Order::long(size, entry)).unwrap();
        ledger.apply(ts, &Order::flat(size, exit)).unwrap();
        let expected = 100_000.0 + size * (exit - entry);
        prop_assert!((ledger.cash() - expected).abs() < 1e-6);
        prop_assert_eq!(ledger.position(), 0.0);
    }
}
