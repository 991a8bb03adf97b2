//! Instrument rounding rules applied before orders reach the venue

use serde::{Deserialize, Serialize};

/// Truncate a value to a fixed number of decimal places, always rounding
/// toward zero so an order never exceeds what the caller asked for
pub fn truncate_float(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).trunc() / factor
}

/// Per-instrument precision and minimum-notional rules.
///
/// Venues reject orders whose price or quantity carries more decimals than
/// the instrument allows, so everything is truncated on the way out.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct InstrumentPrecision {
    pub price_decimals: u32,
    pub quantity_decimals: u32,
    /// Minimum order notional (price * quantity) in quote currency
    pub min_notional: f64,
}

impl Default for InstrumentPrecision {
    fn default() -> Self {
        Self {
            price_decimals: 2,
            quantity_decimals: 6,
            min_notional: 10.0,
        }
    }
}

impl InstrumentPrecision {
    pub fn round_price(&self, price: f64) -> f64 {
        truncate_float(price, self.price_decimals)
    }

    pub fn round_quantity(&self, quantity: f64) -> f64 {
        truncate_float(quantity, self.quantity_decimals)
    }

    /// True when the rounded order is large enough for the venue
    pub fn meets_min_notional(&self, price: f64, quantity: f64) -> bool {
        price * quantity >= self.min_notional
    }
}
