use std::sync::Arc;

use chartdesk_backtest::{max_drawdown, BacktestConfig, BacktestEngine, BacktestSettings};
use chartdesk_data::{annotate_series, synthetic};
use chartdesk_strategies::StrategyRegistry;
use proptest::prelude::*;

fn settings() -> impl Strategy<Value = BacktestSettings> {
    (
        1_000.0f64..100_000.0,
        0.1f64..50.0,
        prop::option::of(0.5f64..50.0),
        prop::option::of(0.5f64..100.0),
        0.0f64..1.0,
        0.0f64..1.0,
        any::<bool>(),
    )
        .prop_map(|(capital, size, sl, tp, commission, slippage, mtm)| BacktestSettings {
            initial_capital: capital,
            position_size: size,
            stop_loss_pct: sl,
            take_profit_pct: tp,
            commission_pct: commission,
            slippage_pct: slippage,
            mark_to_market: mtm,
        })
}

fn strategy_id() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["sma_crossover", "rsi", "macd", "bollinger"])
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn results_are_bounded_and_deterministic(
        seed in any::<u64>(),
        len in 0usize..250,
        id in strategy_id(),
        settings in settings(),
    ) {
        let candles = synthetic::random_walk(len, 100.0, 0.02, 60_000, seed);
        let (series, _) = annotate_series(&candles);

        let strategy = StrategyRegistry::new().create_default(id).unwrap();
        let engine = BacktestEngine::new(BacktestConfig::new(Arc::clone(&strategy), settings)).unwrap();

        let first = engine.run(&series);
        let second = engine.run(&series);
        prop_assert_eq!(&first, &second);

        prop_assert!(first.max_drawdown >= 0.0 && first.max_drawdown <= 100.0);
        prop_assert!(first.win_rate >= 0.0 && first.win_rate <= 100.0);
        prop_assert_eq!(first.total_trades, first.trades.len());
        prop_assert!(first.winning_trades + first.losing_trades <= first.total_trades);
        prop_assert!(first.trades.iter().all(|t| !t.is_open()));

        if series.len() >= 2 {
            prop_assert_eq!(first.equity.len(), series.len() - 1);
            prop_assert_eq!(first.equity_dates.len(), series.len() - 1);
        } else {
            prop_assert_eq!(first.total_trades, 0);
        }
    }

    #[test]
    fn drawdown_is_a_percentage(equity in prop::collection::vec(-1_000.0f64..1_000.0, 0..100)) {
        let dd = max_drawdown(&equity);
        prop_assert!((0.0..=100.0).contains(&dd));
    }
}
