//! End-to-end scenarios: bars in, trades/capsules/equity out.

use chrono::{Duration, TimeZone, Utc};

use livengine_core::domain::{Bar, EntropySource, OrderSide, Regime, TradeAction, Verdict};
use livengine_core::strategy::{EmaCross, ImmCore};
use livengine_core::{
    build_strategy, run_strategy, DataError, EngineError, NullSink, Strategy, StrategyKind,
    StrategyParams,
};

fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
    let base = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar::new(
                base + Duration::hours(i as i64),
                open,
                open.max(close) + 0.5,
                open.min(close) - 0.5,
                close,
                500.0,
            )
        })
        .collect()
}

fn small_params() -> StrategyParams {
    StrategyParams::builder()
        .lookbacks(2, 3)
        .atr_period(2)
        .entropy_window(2)
        .thresholds(0.5, 0.75, 1.0)
        .unit_size(1.0)
        .ma_buffer(0.0)
        .build()
        .unwrap()
}

#[test]
fn rising_closes_buy_at_third_bar() {
    let params = small_params();
    let mut strat = ImmCore::new(&params);
    let bars = bars_from_closes(&[100.0, 101.0, 102.0]);

    assert!(strat.process_bar(&bars[0]).order.is_none());
    assert!(strat.process_bar(&bars[1]).order.is_none());
    let decision = strat.process_bar(&bars[2]);

    let order = decision.order.expect("buy on third bar");
    assert_eq!(order.side, OrderSide::Long);
    assert_eq!(order.price, 102.0);
    assert_eq!(order.size, 1.0);
    assert_eq!(decision.capsule.unwrap().entropy_source, EntropySource::Derived);
}

#[test]
fn market_entropy_overrides_derived_and_forces_exit() {
    let params = StrategyParams::builder()
        .lookbacks(2, 3)
        .atr_period(2)
        .entropy_window(2)
        .thresholds(0.1, 0.2, 0.3)
        .build()
        .unwrap();
    let mut bars = bars_from_closes(&[100.0, 101.0, 102.0, 103.0, 104.0]);
    bars[3] = bars[3].clone().with_entropy(1.0);

    let mut strat = ImmCore::new(&params);
    let out = run_strategy(&mut strat, &bars, params.starting_cash, &mut NullSink).unwrap();

    let collapse = out
        .capsules
        .iter()
        .find(|r| r.ts == bars[3].timestamp)
        .expect("capsule for the high-entropy bar");
    assert_eq!(collapse.capsule.regime, Regime::Collapse);
    assert_eq!(collapse.capsule.entropy_source, EntropySource::Market);
    assert_eq!(collapse.capsule.verdict, Verdict::Flat);

    assert_eq!(out.trades[0].action, TradeAction::Buy);
    assert_eq!(out.trades[1].action, TradeAction::Sell);
    assert_eq!(out.trades[1].price, 103.0);
    assert_eq!(out.collapse_hits, 1);
}

#[test]
fn round_trip_profit_lands_in_final_equity() {
    let params = small_params();
    // up into an entry at 102, then a drop that crosses fast below slow
    let bars = bars_from_closes(&[100.0, 101.0, 102.0, 106.0, 96.0]);
    let mut strat = ImmCore::new(&params);
    let out = run_strategy(&mut strat, &bars, 10_000.0, &mut NullSink).unwrap();

    assert_eq!(out.trades.len(), 2);
    let pnl = out.trades[1].price - out.trades[0].price;
    assert_eq!(out.equity_curve.last().copied(), Some(10_000.0 + pnl));
    assert_eq!(out.final_position, 0.0);
}

#[test]
fn both_variants_run_through_the_factory() {
    let bars = bars_from_closes(&[100.0, 100.5, 101.2, 101.0, 102.4, 103.1, 102.0]);
    for kind in [StrategyKind::ImmCore, StrategyKind::EmaCross] {
        let params = StrategyParams::builder()
            .strategy(kind)
            .lookbacks(2, 3)
            .atr_period(2)
            .entropy_window(3)
            .thresholds(0.1, 0.2, 0.3)
            .build()
            .unwrap();
        let mut strat: Box<dyn Strategy> = build_strategy(&params);
        let out = run_strategy(strat.as_mut(), &bars, 1_000.0, &mut NullSink).unwrap();
        assert_eq!(out.equity_curve.len(), bars.len() + 1, "{}", kind.as_str());
    }
}

#[test]
fn ema_variant_capsules_every_bar() {
    let params = StrategyParams::builder()
        .strategy(StrategyKind::EmaCross)
        .lookbacks(3, 8)
        .thresholds(0.1, 0.2, 0.3)
        .build()
        .unwrap();
    let bars = bars_from_closes(&[100.0, 101.0, 99.0, 102.0]);
    let mut strat = EmaCross::new(&params);
    let out = run_strategy(&mut strat, &bars, 1_000.0, &mut NullSink).unwrap();
    assert_eq!(out.capsules.len(), bars.len());
    assert!(out.capsules.iter().all(|r| !r.capsule.collapse_guard));
}

#[test]
fn non_finite_close_aborts_before_any_bar() {
    let params = small_params();
    let mut bars = bars_from_closes(&[100.0, 101.0, 102.0]);
    bars[1].close = f64::NAN;
    let mut strat = ImmCore::new(&params);
    let err = run_strategy(&mut strat, &bars, 1_000.0, &mut NullSink).unwrap_err();
    match err {
        EngineError::Data(DataError::NonFinite { index, field, .. }) => {
            assert_eq!(index, 1);
            assert_eq!(field, "close");
        }
        other => panic!("expected non-finite data error, got {other:?}"),
    }
}

#[test]
fn equal_timestamps_are_accepted() {
    let params = small_params();
    let mut bars = bars_from_closes(&[100.0, 101.0, 102.0]);
    bars[1].timestamp = bars[0].timestamp;
    let mut strat = ImmCore::new(&params);
    assert!(run_strategy(&mut strat, &bars, 1_000.0, &mut NullSink).is_ok());
}
