//! Grid trading configuration

use serde::{Deserialize, Serialize};

use super::errors::{EngineError, EngineResult};
use super::levels;
use super::types::{GridLevel, SpacingMode};

/// Grid configuration, immutable while the engine is running
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Trading pair identifier (e.g. "BTCUSDT")
    pub trading_pair: String,

    /// Upper price boundary of the grid
    pub upper_price: f64,

    /// Lower price boundary of the grid
    pub lower_price: f64,

    /// Number of grid intervals (produces grid_count + 1 price levels)
    pub grid_count: usize,

    /// Order quantity placed at each level, in base asset
    pub amount_per_grid: f64,

    #[serde(default)]
    pub spacing_mode: SpacingMode,
}

impl GridConfig {
    pub fn new(
        trading_pair: impl Into<String>,
        lower_price: f64,
        upper_price: f64,
        grid_count: usize,
        amount_per_grid: f64,
    ) -> Self {
        Self {
            trading_pair: trading_pair.into(),
            upper_price,
            lower_price,
            grid_count,
            amount_per_grid,
            spacing_mode: SpacingMode::default(),
        }
    }

    /// Builder: set the spacing mode
    pub fn with_spacing_mode(mut self, mode: SpacingMode) -> Self {
        self.spacing_mode = mode;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> EngineResult<()> {
        if self.trading_pair.is_empty() {
            return Err(EngineError::Configuration(
                "trading_pair cannot be empty".into(),
            ));
        }

        if !(self.lower_price > 0.0) {
            return Err(EngineError::Configuration(
                "lower_price must be positive".into(),
            ));
        }

        if self.upper_price <= self.lower_price {
            return Err(EngineError::Configuration(
                "upper_price must be greater than lower_price".into(),
            ));
        }

        if !(2..=100).contains(&self.grid_count) {
            return Err(EngineError::Configuration(
                "grid_count must be between 2 and 100".into(),
            ));
        }

        if !(self.amount_per_grid > 0.0) {
            return Err(EngineError::Configuration(
                "amount_per_grid must be positive".into(),
            ));
        }

        Ok(())
    }

    /// Build the ordered grid levels for this configuration
    pub fn build_levels(&self) -> Vec<GridLevel> {
        levels::generate(
            self.lower_price,
            self.upper_price,
            self.grid_count,
            self.spacing_mode,
        )
    }

    /// Midpoint of the configured range, used as the starting price in
    /// detached/simulated mode
    pub fn midpoint(&self) -> f64 {
        (self.upper_price + self.lower_price) / 2.0
    }
}
