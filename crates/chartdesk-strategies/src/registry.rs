//! Strategy registry for building strategies by id.

use crate::{BollingerBounce, MacdMomentum, RsiReversal, SmaCrossover};
use chartdesk_core::{
    error::StrategyError,
    traits::{Strategy, StrategyParameters},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Builds a strategy from merged-in parameter overrides.
pub type StrategyFactory = fn(&StrategyParameters) -> Result<Arc<dyn Strategy>, StrategyError>;

/// Information about a registered strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyInfo {
    /// Registry id
    pub id: String,
    /// Strategy name
    pub name: String,
    /// Strategy description
    pub description: String,
    /// Default parameters
    pub parameters: StrategyParameters,
}

impl StrategyInfo {
    /// Describe a strategy instance.
    pub fn of(strategy: &dyn Strategy) -> Self {
        Self {
            id: strategy.id().to_string(),
            name: strategy.name().to_string(),
            description: strategy.description().to_string(),
            parameters: strategy.parameters().clone(),
        }
    }
}

struct Entry {
    info: StrategyInfo,
    factory: StrategyFactory,
}

/// Registry for available strategies.
pub struct StrategyRegistry {
    strategies: BTreeMap<String, Entry>,
}

impl StrategyRegistry {
    /// Create an empty registry.
    pub fn empty() -> Self {
        Self {
            strategies: BTreeMap::new(),
        }
    }

    /// Create a new strategy registry with all built-in strategies.
    pub fn new() -> Self {
        let mut registry = Self::empty();

        registry.register(StrategyInfo::of(&SmaCrossover::default()), |p| {
            SmaCrossover::with_parameters(p).map(|s| Arc::new(s) as Arc<dyn Strategy>)
        });
        registry.register(StrategyInfo::of(&RsiReversal::default()), |p| {
            RsiReversal::with_parameters(p).map(|s| Arc::new(s) as Arc<dyn Strategy>)
        });
        registry.register(StrategyInfo::of(&MacdMomentum::default()), |p| {
            MacdMomentum::with_parameters(p).map(|s| Arc::new(s) as Arc<dyn Strategy>)
        });
        registry.register(StrategyInfo::of(&BollingerBounce::default()), |p| {
            BollingerBounce::with_parameters(p).map(|s| Arc::new(s) as Arc<dyn Strategy>)
        });

        registry
    }

    /// Add a strategy. Replaces any strategy registered under the same id.
    pub fn register(&mut self, info: StrategyInfo, factory: StrategyFactory) {
        self.strategies.insert(info.id.clone(), Entry { info, factory });
    }

    /// List all available strategies, ordered by id.
    pub fn list(&self) -> Vec<&StrategyInfo> {
        self.strategies.values().map(|e| &e.info).collect()
    }

    /// Get strategy info by id.
    pub fn get(&self, id: &str) -> Option<&StrategyInfo> {
        self.strategies.get(id).map(|e| &e.info)
    }

    /// Check if a strategy exists.
    pub fn exists(&self, id: &str) -> bool {
        self.strategies.contains_key(id)
    }

    /// Get all strategy ids.
    pub fn ids(&self) -> Vec<&str> {
        self.strategies.keys().map(String::as_str).collect()
    }

    /// Create a strategy with `overrides` applied to its defaults.
    pub fn create(
        &self,
        id: &str,
        overrides: &StrategyParameters,
    ) -> Result<Arc<dyn Strategy>, StrategyError> {
        let entry = self
            .strategies
            .get(id)
            .ok_or_else(|| StrategyError::NotFound(id.to_string()))?;
        (entry.factory)(overrides)
    }

    /// Create a strategy with default parameters.
    pub fn create_default(&self, id: &str) -> Result<Arc<dyn Strategy>, StrategyError> {
        self.create(id, &StrategyParameters::new())
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}
