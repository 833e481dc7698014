use chartdesk_core::traits::{Indicator, MultiOutputIndicator};
use chartdesk_indicators::{bollinger, ema, rsi, sma, BollingerBands, Ema, Rsi, Sma};
use proptest::prelude::*;

fn prices(len: std::ops::Range<usize>) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0f64..1000.0, len)
}

proptest! {
    #[test]
    fn ema_incremental_matches_batch(data in prices(30..120), period in 2usize..30) {
        let batch = Ema::new(period).calculate(&data);

        let mut previous = None;
        let mut incremental = Vec::new();
        for end in 1..=data.len() {
            if let Some(value) = ema(&data[..end], period, previous) {
                previous = Some(value);
                incremental.push(value);
            }
        }

        prop_assert_eq!(incremental.len(), batch.len());
        for (a, b) in incremental.iter().zip(batch.iter()) {
            prop_assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn point_functions_match_batch_tail(data in prices(60..150)) {
        prop_assert_eq!(sma(&data, 20), Sma::new(20).calculate(&data).last().copied());
        prop_assert_eq!(rsi(&data, 14), Rsi::new(14).calculate(&data).last().copied());
        prop_assert_eq!(
            bollinger(&data, 20, 2.0),
            BollingerBands::new(20, 2.0).calculate(&data).last().copied()
        );
    }

    #[test]
    fn rsi_stays_in_range(data in prices(16..200)) {
        for value in Rsi::new(14).calculate(&data) {
            prop_assert!((0.0..=100.0).contains(&value));
        }
    }

    #[test]
    fn bands_are_ordered(data in prices(20..100)) {
        for bands in BollingerBands::default().calculate(&data) {
            prop_assert!(bands.lower <= bands.middle + 1e-9);
            prop_assert!(bands.middle <= bands.upper + 1e-9);
        }
    }

    #[test]
    fn constant_series_is_flat(price in 1.0f64..1000.0, len in 51usize..80) {
        let data = vec![price; len];
        prop_assert!((sma(&data, 50).unwrap() - price).abs() < 1e-9);
        prop_assert!((Ema::new(26).calculate(&data).last().unwrap() - price).abs() < 1e-9);
        prop_assert_eq!(rsi(&data, 14), Some(100.0));

        let bands = bollinger(&data, 20, 2.0).unwrap();
        prop_assert!((bands.upper - bands.lower).abs() < 1e-9);
    }
}
