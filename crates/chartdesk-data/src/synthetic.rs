//! Deterministic synthetic market data.

use chartdesk_core::types::{Candle, Tick};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Candles that rise by `step` per bar for the first half, then fall by
/// `step` per bar.
pub fn trend_reversal(len: usize, start: f64, step: f64, interval_ms: i64) -> Vec<Candle> {
    let half = len / 2;
    let peak = start + step * half.saturating_sub(1) as f64;

    (0..len)
        .map(|i| {
            let price = if i < half {
                start + step * i as f64
            } else {
                peak - step * (i - half + 1) as f64
            };
            Candle::new(i as i64 * interval_ms, price, price, price, price, 1)
        })
        .collect()
}

/// Seeded random walk of candles.
///
/// Each bar opens at the previous close and moves by a uniform return in
/// `[-volatility, volatility]`. Prices never drop below one cent.
pub fn random_walk(len: usize, start: f64, volatility: f64, interval_ms: i64, seed: u64) -> Vec<Candle> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut close = start;
    let mut candles = Vec::with_capacity(len);

    for i in 0..len {
        let open = close;
        let change = if volatility > 0.0 {
            rng.gen_range(-volatility..=volatility)
        } else {
            0.0
        };
        close = (open * (1.0 + change)).max(0.01);

        let wick = open.max(close) * volatility * rng.gen_range(0.0..=0.5);
        let high = open.max(close) + wick;
        let low = (open.min(close) - wick).max(0.01);

        let volume = rng.gen_range(1..=50);
        candles.push(Candle::new(i as i64 * interval_ms, open, high, low, close, volume));
    }

    candles
}

/// Seeded random-walk ticks spaced `spacing_ms` apart, starting at `start_ms`.
pub fn random_ticks(count: usize, start_price: f64, start_ms: i64, spacing_ms: i64, seed: u64) -> Vec<Tick> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut price = start_price;

    (0..count)
        .map(|i| {
            price = (price + rng.gen_range(-0.5..=0.5)).max(0.01);
            Tick::new(price, start_ms + i as i64 * spacing_ms)
        })
        .collect()
}
