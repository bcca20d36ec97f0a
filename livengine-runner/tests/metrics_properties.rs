use proptest::prelude::*;

use livengine_runner::metrics::{max_drawdown, sharpe_ratio, simple_returns, summarize_equity};

fn equity_curve() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0f64..1_000_000.0, 1..200)
}

proptest! {
    #[test]
    fn drawdown_is_a_fraction(curve in equity_curve()) {
        let dd = max_drawdown(&curve);
        prop_assert!((0.0..=1.0).contains(&dd), "drawdown {dd}");
    }

    #[test]
    fn monotone_curve_has_no_drawdown(start in 1.0f64..1_000.0, steps in prop::collection::vec(0.0f64..10.0, 0..50)) {
        let mut curve = vec![start];
        for step in steps {
            let last = *curve.last().unwrap();
            curve.push(last + step);
        }
        prop_assert_eq!(max_drawdown(&curve), 0.0);
    }

    #[test]
    fn summary_reports_last_point(curve in equity_curve(), bars in 1usize..500) {
        let metrics = summarize_equity(&curve, bars).unwrap();
        prop_assert_eq!(metrics.final_equity, *curve.last().unwrap());
        prop_assert_eq!(metrics.bars_processed, bars);
        prop_assert!(!metrics.sharpe.is_nan());
    }

    #[test]
    fn one_return_per_step(curve in equity_curve()) {
        prop_assert_eq!(simple_returns(&curve).len(), curve.len() - 1);
        if curve.len() < 3 {
            prop_assert_eq!(sharpe_ratio(&simple_returns(&curve)), 0.0);
        }
    }
}
