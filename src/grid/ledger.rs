//! Order and trade bookkeeping

use std::collections::HashMap;

use super::types::{Order, Trade};

/// In-memory registry of open orders and executed trades.
///
/// Pure lifecycle bookkeeping, no trading logic. Snapshot reads return owned
/// copies so callers never observe mutation mid-iteration.
#[derive(Debug, Default)]
pub struct OrderLedger {
    open: HashMap<u64, Order>,
    trades: Vec<Trade>,
}

impl OrderLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a newly placed order
    pub fn insert(&mut self, order: Order) {
        self.open.insert(order.id, order);
    }

    /// Replace the stored copy after a status transition; ignored for
    /// untracked ids
    pub fn update(&mut self, order: Order) {
        if let Some(entry) = self.open.get_mut(&order.id) {
            *entry = order;
        }
    }

    /// Remove an order from the open set, returning it if tracked
    pub fn remove(&mut self, order_id: u64) -> Option<Order> {
        self.open.remove(&order_id)
    }

    pub fn contains(&self, order_id: u64) -> bool {
        self.open.contains_key(&order_id)
    }

    /// Append an execution record; trades are never mutated or deleted
    pub fn record_trade(&mut self, trade: Trade) {
        self.trades.push(trade);
    }

    /// Next sequential trade id
    pub fn next_trade_id(&self) -> u64 {
        self.trades.len() as u64
    }

    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    pub fn trade_count(&self) -> usize {
        self.trades.len()
    }

    /// Snapshot of open orders, sorted by id for deterministic iteration
    pub fn open_orders(&self) -> Vec<Order> {
        let mut orders: Vec<Order> = self.open.values().cloned().collect();
        orders.sort_by_key(|o| o.id);
        orders
    }

    /// Snapshot of the trade history
    pub fn trades(&self) -> Vec<Trade> {
        self.trades.clone()
    }

    /// Drop all open orders (trade history is retained)
    pub fn clear_open(&mut self) {
        self.open.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::types::{OrderSide, OrderStatus};
    use chrono::Utc;

    fn make_order(id: u64, side: OrderSide, price: f64) -> Order {
        Order {
            id,
            client_order_id: format!("grid-0-{side}"),
            trading_pair: "BTCUSDT".into(),
            side,
            price,
            quantity: 0.001,
            filled_quantity: 0.0,
            status: OrderStatus::New,
            grid_level: Some(0),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_insert_remove() {
        let mut ledger = OrderLedger::new();
        ledger.insert(make_order(1, OrderSide::Buy, 40_000.0));
        ledger.insert(make_order(2, OrderSide::Sell, 41_000.0));
        assert_eq!(ledger.open_count(), 2);
        assert!(ledger.contains(1));

        let removed = ledger.remove(1);
        assert!(removed.is_some());
        assert_eq!(ledger.open_count(), 1);
        assert!(ledger.remove(1).is_none());
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut ledger = OrderLedger::new();
        ledger.insert(make_order(5, OrderSide::Buy, 40_000.0));

        let snapshot = ledger.open_orders();
        ledger.clear_open();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(ledger.open_count(), 0);
    }

    #[test]
    fn test_open_orders_sorted_by_id() {
        let mut ledger = OrderLedger::new();
        ledger.insert(make_order(9, OrderSide::Buy, 40_000.0));
        ledger.insert(make_order(3, OrderSide::Buy, 40_500.0));
        ledger.insert(make_order(7, OrderSide::Sell, 44_000.0));

        let ids: Vec<u64> = ledger.open_orders().iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![3, 7, 9]);
    }

    #[test]
    fn test_trades_append_only() {
        let mut ledger = OrderLedger::new();
        let mut order = make_order(1, OrderSide::Sell, 41_000.0);
        order.filled_quantity = order.quantity;
        order.status = OrderStatus::Filled;

        let trade = Trade::from_filled_order(ledger.next_trade_id(), &order);
        ledger.record_trade(trade);
        assert_eq!(ledger.trade_count(), 1);
        assert_eq!(ledger.next_trade_id(), 1);

        // clearing open orders leaves history alone
        ledger.clear_open();
        assert_eq!(ledger.trade_count(), 1);
    }

    #[test]
    fn test_update_ignores_unknown_id() {
        let mut ledger = OrderLedger::new();
        ledger.update(make_order(42, OrderSide::Buy, 40_000.0));
        assert_eq!(ledger.open_count(), 0);
    }
}
