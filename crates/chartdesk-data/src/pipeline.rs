//! Incremental indicator annotation of closed candles.

use std::collections::VecDeque;

use chartdesk_core::error::ConfigError;
use chartdesk_core::traits::{Indicator, MultiOutputIndicator};
use chartdesk_core::types::{AnnotatedCandle, Candle, CandleSeries};
use chartdesk_indicators::periods;
use chartdesk_indicators::{
    bollinger, macd, rsi, sma, BollingerBands, Ema, Macd, MacdParams, Rsi, Sma,
};
use serde::{Deserialize, Serialize};

/// Indicator state carried from one closed candle to the next.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorCarryState {
    pub ema12: Option<f64>,
    pub ema26: Option<f64>,
    /// Most recent MACD values, at most `MACD_SIGNAL` of them
    pub macd_history: VecDeque<f64>,
}

/// Closes the windowed indicators ever look at: the longest lookback plus
/// the extra price RSI needs for its first delta.
const LOOKBACK: usize = periods::LONGEST + 1;

/// Annotates closed candles one at a time.
///
/// Holds the last [`LOOKBACK`] closed candles for the windowed indicators
/// (SMA, RSI, Bollinger) and the carry state for the recursive ones (EMA,
/// MACD), so each close costs the same however long the history is.
/// Annotations already handed out never change.
#[derive(Debug, Clone)]
pub struct IndicatorPipeline {
    candles: CandleSeries,
    annotated: VecDeque<AnnotatedCandle>,
    carry: IndicatorCarryState,
    history_limit: usize,
}

impl IndicatorPipeline {
    /// Create a pipeline retaining `history_limit` closed candles.
    ///
    /// The limit must cover the longest indicator lookback, otherwise the
    /// slow SMA could never be computed.
    pub fn new(history_limit: usize) -> Result<Self, ConfigError> {
        if history_limit < periods::LONGEST {
            return Err(ConfigError::TooSmall {
                field: "history_limit",
                minimum: periods::LONGEST as u64,
                value: history_limit as u64,
            });
        }

        Ok(Self {
            candles: CandleSeries::with_capacity(LOOKBACK),
            annotated: VecDeque::new(),
            carry: IndicatorCarryState::default(),
            history_limit,
        })
    }

    /// Annotate a newly closed candle and append it to the history.
    pub fn push_closed(&mut self, candle: Candle) -> AnnotatedCandle {
        self.candles.push(candle);
        let closes = self.candles.closes();
        let annotated = annotate(&closes, &mut self.carry, candle);

        if self.annotated.len() == self.history_limit {
            self.annotated.pop_front();
        }
        self.annotated.push_back(annotated);
        annotated
    }

    /// Provisional annotation of the in-progress candle.
    ///
    /// Runs against a copy of the carry state, so the pipeline is left
    /// untouched.
    pub fn annotate_open(&self, candle: Candle) -> AnnotatedCandle {
        let mut closes = self.candles.closes();
        closes.push(candle.close);
        let mut carry = self.carry.clone();
        annotate(&closes, &mut carry, candle)
    }

    /// Closed candles annotated so far, oldest first.
    pub fn history(&self) -> &VecDeque<AnnotatedCandle> {
        &self.annotated
    }

    pub fn last(&self) -> Option<&AnnotatedCandle> {
        self.annotated.back()
    }

    pub fn carry(&self) -> &IndicatorCarryState {
        &self.carry
    }

    pub fn len(&self) -> usize {
        self.annotated.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotated.is_empty()
    }

    pub fn history_limit(&self) -> usize {
        self.history_limit
    }
}

fn annotate(closes: &[f64], carry: &mut IndicatorCarryState, candle: Candle) -> AnnotatedCandle {
    let step = macd(
        closes,
        MacdParams::default(),
        carry.ema12,
        carry.ema26,
        &mut carry.macd_history,
    );
    carry.ema12 = step.fast_ema;
    carry.ema26 = step.slow_ema;

    let bands = bollinger(closes, periods::BOLLINGER, periods::BOLLINGER_MULTIPLIER);

    AnnotatedCandle {
        candle,
        sma20: sma(closes, periods::SMA_FAST),
        sma50: sma(closes, periods::SMA_SLOW),
        ema12: step.fast_ema,
        ema26: step.slow_ema,
        rsi: rsi(closes, periods::RSI),
        macd: step.output.map(|m| m.macd),
        macd_signal: step.output.map(|m| m.signal),
        macd_histogram: step.output.map(|m| m.histogram),
        bollinger_upper: bands.map(|b| b.upper),
        bollinger_middle: bands.map(|b| b.middle),
        bollinger_lower: bands.map(|b| b.lower),
    }
}

/// Write each batch output into the candle it belongs to.
///
/// Batch outputs are aligned to the end of the input, so output `j` belongs
/// to candle `len - outputs.len() + j`.
fn assign<T: Copy>(
    series: &mut [AnnotatedCandle],
    outputs: &[T],
    mut set: impl FnMut(&mut AnnotatedCandle, T),
) {
    let offset = series.len() - outputs.len();
    for (candle, value) in series[offset..].iter_mut().zip(outputs) {
        set(candle, *value);
    }
}

/// Annotate a whole candle series from scratch with the batch indicators.
///
/// Returns the annotated series and the carry state an incremental
/// pipeline would hold after the last candle.
pub fn annotate_series(candles: &[Candle]) -> (Vec<AnnotatedCandle>, IndicatorCarryState) {
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let mut series: Vec<AnnotatedCandle> = candles.iter().copied().map(AnnotatedCandle::bare).collect();

    let sma20 = Sma::new(periods::SMA_FAST).calculate(&closes);
    let sma50 = Sma::new(periods::SMA_SLOW).calculate(&closes);
    let ema12 = Ema::new(periods::EMA_FAST).calculate(&closes);
    let ema26 = Ema::new(periods::EMA_SLOW).calculate(&closes);
    let rsi = Rsi::new(periods::RSI).calculate(&closes);
    let macd = Macd::new().calculate(&closes);
    let bands = BollingerBands::default().calculate(&closes);

    assign(&mut series, &sma20, |c, v| c.sma20 = Some(v));
    assign(&mut series, &sma50, |c, v| c.sma50 = Some(v));
    assign(&mut series, &ema12, |c, v| c.ema12 = Some(v));
    assign(&mut series, &ema26, |c, v| c.ema26 = Some(v));
    assign(&mut series, &rsi, |c, v| c.rsi = Some(v));
    assign(&mut series, &macd, |c, m| {
        c.macd = Some(m.macd);
        c.macd_signal = Some(m.signal);
        c.macd_histogram = Some(m.histogram);
    });
    assign(&mut series, &bands, |c, b| {
        c.bollinger_upper = Some(b.upper);
        c.bollinger_middle = Some(b.middle);
        c.bollinger_lower = Some(b.lower);
    });

    let skip = macd.len().saturating_sub(periods::MACD_SIGNAL);
    let carry = IndicatorCarryState {
        ema12: ema12.last().copied(),
        ema26: ema26.last().copied(),
        macd_history: macd[skip..].iter().map(|m| m.macd).collect(),
    };

    (series, carry)
}
