use chartdesk_core::types::Tick;
use chartdesk_data::{AggregatorSettings, TickAggregator, TickOutcome};
use proptest::prelude::*;

/// Non-decreasing timestamps with positive prices.
fn tick_stream() -> impl Strategy<Value = Vec<Tick>> {
    prop::collection::vec((0i64..90_000, 1.0f64..500.0), 1..300).prop_map(|steps| {
        let mut timestamp = 0;
        steps
            .into_iter()
            .map(|(delta, price)| {
                timestamp += delta;
                Tick::new(price, timestamp)
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn every_ordered_tick_is_counted(ticks in tick_stream()) {
        let settings = AggregatorSettings { history_limit: 1_000, ..Default::default() };
        let mut agg = TickAggregator::new(settings).unwrap();

        for tick in &ticks {
            let outcome = agg.push_tick(*tick);
            prop_assert!(!matches!(outcome, TickOutcome::Rejected(_)));
        }

        let closed: u64 = agg.history().map(|c| c.candle.volume).sum();
        let open = agg.current().map(|c| c.volume).unwrap_or(0);
        prop_assert_eq!(closed + open, ticks.len() as u64);
    }

    #[test]
    fn candles_are_consistent_and_ordered(ticks in tick_stream()) {
        let mut agg = TickAggregator::new(AggregatorSettings::default()).unwrap();
        for tick in &ticks {
            agg.push_tick(*tick);
        }

        let candles: Vec<_> = agg.history().map(|c| c.candle).chain(agg.current().copied()).collect();
        for candle in &candles {
            prop_assert!(candle.is_consistent());
            prop_assert_eq!(candle.bucket_start % 60_000, 0);
        }
        for pair in candles.windows(2) {
            prop_assert!(pair[0].bucket_start < pair[1].bucket_start);
        }
    }

    #[test]
    fn snapshot_respects_display_limit(ticks in tick_stream()) {
        let mut agg = TickAggregator::new(AggregatorSettings::default()).unwrap();
        for tick in &ticks {
            agg.push_tick(*tick);
        }

        let snapshot = agg.snapshot();
        prop_assert!(snapshot.len() <= 50);
        prop_assert_eq!(snapshot.last().map(|c| c.candle), agg.current().copied());
    }
}
