//! Strategy trait definitions.

use crate::types::{AnnotatedCandle, Decision};
use std::collections::BTreeMap;

/// Named numeric strategy parameters, e.g. `fastPeriod = 20`.
pub type StrategyParameters = BTreeMap<String, f64>;

/// Core strategy trait.
///
/// A strategy is an immutable definition plus one pure decision function.
/// The backtest engine calls [`Strategy::signal`] once per bar and never
/// special-cases a concrete strategy.
pub trait Strategy: Send + Sync {
    /// Stable identifier used by the registry.
    fn id(&self) -> &str;

    /// Human readable name.
    fn name(&self) -> &str;

    /// Get a description of the strategy.
    fn description(&self) -> &str {
        ""
    }

    /// The parameters this instance was built with.
    fn parameters(&self) -> &StrategyParameters;

    /// Decide what to do on bar `index`.
    ///
    /// Implementations must only read `series[..=index]`. When an indicator
    /// the strategy depends on is still warming up, the answer is
    /// [`Decision::Hold`].
    fn signal(
        &self,
        series: &[AnnotatedCandle],
        index: usize,
        parameters: &StrategyParameters,
    ) -> Decision;

    /// The `count` closes ending at `index`, or `None` when fewer exist.
    ///
    /// Never reaches past `index`.
    fn recent_closes(&self, series: &[AnnotatedCandle], index: usize, count: usize) -> Option<Vec<f64>> {
        if count == 0 || index >= series.len() || index + 1 < count {
            return None;
        }
        Some(series[index + 1 - count..=index].iter().map(|c| c.close()).collect())
    }
}
