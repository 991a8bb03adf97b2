//! Core data types for grid trading

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Order side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Returns the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            OrderSide::Buy => OrderSide::Sell,
            OrderSide::Sell => OrderSide::Buy,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderSide::Buy => "BUY",
            OrderSide::Sell => "SELL",
        }
    }
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order lifecycle status as reported by the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    New,
    PartiallyFilled,
    Filled,
    Canceled,
    Rejected,
    Expired,
}

impl OrderStatus {
    /// Terminal statuses admit no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled
                | OrderStatus::Canceled
                | OrderStatus::Rejected
                | OrderStatus::Expired
        )
    }

    /// Still resting on the book (or partially executed)
    pub fn is_open(&self) -> bool {
        !self.is_terminal()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::New => "NEW",
            OrderStatus::PartiallyFilled => "PARTIALLY_FILLED",
            OrderStatus::Filled => "FILLED",
            OrderStatus::Canceled => "CANCELED",
            OrderStatus::Rejected => "REJECTED",
            OrderStatus::Expired => "EXPIRED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Grid spacing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpacingMode {
    /// Uniform price spacing between adjacent levels
    #[default]
    Arithmetic,
    /// Constant ratio between adjacent levels
    Geometric,
}

/// Whether the engine trades through a live gateway or a detached matcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineMode {
    Live,
    Simulated,
}

impl EngineMode {
    pub fn is_simulated(&self) -> bool {
        matches!(self, EngineMode::Simulated)
    }
}

/// A resting or recently transitioned exchange order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Gateway-assigned order id
    pub id: u64,
    /// Client-assigned correlation id
    pub client_order_id: String,
    pub trading_pair: String,
    pub side: OrderSide,
    pub price: f64,
    pub quantity: f64,
    pub filled_quantity: f64,
    pub status: OrderStatus,
    /// Index of the grid level that originated this order
    pub grid_level: Option<usize>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Price * quantity, compared against exchange/risk minimums
    pub fn notional(&self) -> f64 {
        self.price * self.quantity
    }
}

/// Immutable record of an execution; append-only, never mutated
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub trade_id: u64,
    pub order_id: u64,
    pub trading_pair: String,
    pub side: OrderSide,
    pub price: f64,
    pub quantity: f64,
    pub commission: f64,
    pub executed_at: DateTime<Utc>,
}

impl Trade {
    /// Build a trade record from a fully filled order
    pub fn from_filled_order(trade_id: u64, order: &Order) -> Self {
        Self {
            trade_id,
            order_id: order.id,
            trading_pair: order.trading_pair.clone(),
            side: order.side,
            price: order.price,
            quantity: order.filled_quantity,
            commission: 0.0,
            executed_at: Utc::now(),
        }
    }
}

/// One price point of the grid with its resting orders
///
/// At most one open buy and one open sell per level. A side is active iff its
/// id field is `Some`; there is no separate flag to drift out of sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridLevel {
    /// Index of this level (0 = lowest price)
    pub index: usize,
    pub price: f64,
    pub buy_order_id: Option<u64>,
    pub sell_order_id: Option<u64>,
}

impl GridLevel {
    pub fn new(index: usize, price: f64) -> Self {
        Self {
            index,
            price,
            buy_order_id: None,
            sell_order_id: None,
        }
    }

    pub fn has_buy_order(&self) -> bool {
        self.buy_order_id.is_some()
    }

    pub fn has_sell_order(&self) -> bool {
        self.sell_order_id.is_some()
    }

    /// Order id resting on the given side, if any
    pub fn order_id(&self, side: OrderSide) -> Option<u64> {
        match side {
            OrderSide::Buy => self.buy_order_id,
            OrderSide::Sell => self.sell_order_id,
        }
    }

    pub fn set_order(&mut self, side: OrderSide, id: u64) {
        match side {
            OrderSide::Buy => self.buy_order_id = Some(id),
            OrderSide::Sell => self.sell_order_id = Some(id),
        }
    }

    pub fn clear_order(&mut self, side: OrderSide) {
        match side {
            OrderSide::Buy => self.buy_order_id = None,
            OrderSide::Sell => self.sell_order_id = None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_opposite() {
        assert_eq!(OrderSide::Buy.opposite(), OrderSide::Sell);
        assert_eq!(OrderSide::Sell.opposite(), OrderSide::Buy);
    }

    #[test]
    fn test_status_terminal() {
        assert!(!OrderStatus::New.is_terminal());
        assert!(!OrderStatus::PartiallyFilled.is_terminal());
        assert!(OrderStatus::Filled.is_terminal());
        assert!(OrderStatus::Canceled.is_terminal());
        assert!(OrderStatus::Rejected.is_terminal());
        assert!(OrderStatus::Expired.is_terminal());
    }

    #[test]
    fn test_status_display_matches_wire_names() {
        assert_eq!(OrderStatus::New.to_string(), "NEW");
        assert_eq!(OrderStatus::PartiallyFilled.to_string(), "PARTIALLY_FILLED");
        assert_eq!(OrderStatus::Canceled.to_string(), "CANCELED");
        assert_eq!(format!("{}", OrderStatus::Filled), "FILLED");
    }

    #[test]
    fn test_level_order_tracking() {
        let mut level = GridLevel::new(3, 42_000.0);
        assert!(!level.has_buy_order());
        assert!(!level.has_sell_order());

        level.set_order(OrderSide::Buy, 17);
        assert!(level.has_buy_order());
        assert_eq!(level.order_id(OrderSide::Buy), Some(17));
        assert_eq!(level.order_id(OrderSide::Sell), None);

        level.clear_order(OrderSide::Buy);
        assert!(!level.has_buy_order());
    }
}
