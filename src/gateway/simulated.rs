//! In-process venue that fills limit orders against injected prices

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::grid::errors::{GatewayError, GatewayResult};
use crate::grid::types::{Order, OrderSide, OrderStatus};

use super::precision::InstrumentPrecision;
use super::{PriceAndOrderGateway, PriceTick};

struct SimState {
    connected: bool,
    last_price: Option<f64>,
    // BTreeMap keeps fill delivery in ascending order-id, so replays of the
    // same price path always produce the same update sequence
    open: BTreeMap<u64, Order>,
    price_subs: Vec<(String, UnboundedSender<PriceTick>)>,
    order_subs: Vec<UnboundedSender<Order>>,
}

impl SimState {
    fn emit_price(&mut self, price: f64) {
        self.price_subs.retain(|(pair, tx)| {
            tx.send(PriceTick::new(pair.clone(), price)).is_ok()
        });
    }

    fn emit_order(&mut self, order: &Order) {
        self.order_subs.retain(|tx| tx.send(order.clone()).is_ok());
    }
}

/// Simulated exchange: orders rest in a local book and fill completely the
/// first time an injected price crosses their limit.
///
/// Buy orders fill when price <= limit, sell orders when price >= limit.
/// Partial fills are not modeled.
pub struct SimulatedGateway {
    precision: InstrumentPrecision,
    next_order_id: AtomicU64,
    state: Mutex<SimState>,
}

impl SimulatedGateway {
    pub fn new(precision: InstrumentPrecision) -> Self {
        Self {
            precision,
            next_order_id: AtomicU64::new(1),
            state: Mutex::new(SimState {
                connected: false,
                last_price: None,
                open: BTreeMap::new(),
                price_subs: Vec::new(),
                order_subs: Vec::new(),
            }),
        }
    }

    pub async fn last_price(&self) -> Option<f64> {
        self.state.lock().await.last_price
    }

    pub async fn open_order_count(&self) -> usize {
        self.state.lock().await.open.len()
    }

    fn crosses(order: &Order, price: f64) -> bool {
        match order.side {
            OrderSide::Buy => price <= order.price,
            OrderSide::Sell => price >= order.price,
        }
    }
}

impl Default for SimulatedGateway {
    fn default() -> Self {
        Self::new(InstrumentPrecision::default())
    }
}

#[async_trait]
impl PriceAndOrderGateway for SimulatedGateway {
    async fn connect(&self) -> GatewayResult<()> {
        let mut state = self.state.lock().await;
        state.connected = true;
        info!("simulated gateway connected");
        Ok(())
    }

    async fn disconnect(&self) -> GatewayResult<()> {
        let mut state = self.state.lock().await;
        state.connected = false;
        info!("simulated gateway disconnected");
        Ok(())
    }

    async fn current_price(&self) -> GatewayResult<f64> {
        let state = self.state.lock().await;
        if !state.connected {
            return Err(GatewayError::NotConnected(
                "current_price before connect".into(),
            ));
        }
        state
            .last_price
            .ok_or_else(|| GatewayError::NotConnected("no price observed yet".into()))
    }

    async fn subscribe_prices(
        &self,
        trading_pair: &str,
    ) -> GatewayResult<UnboundedReceiver<PriceTick>> {
        let (tx, rx) = unbounded_channel();
        let mut state = self.state.lock().await;
        state.price_subs.push((trading_pair.to_string(), tx));
        Ok(rx)
    }

    async fn subscribe_order_updates(&self) -> GatewayResult<UnboundedReceiver<Order>> {
        let (tx, rx) = unbounded_channel();
        let mut state = self.state.lock().await;
        state.order_subs.push(tx);
        Ok(rx)
    }

    async fn place_limit_order(
        &self,
        trading_pair: &str,
        side: OrderSide,
        price: f64,
        quantity: f64,
        grid_level: Option<usize>,
    ) -> GatewayResult<Order> {
        let mut state = self.state.lock().await;
        if !state.connected {
            return Err(GatewayError::NotConnected(
                "place_limit_order before connect".into(),
            ));
        }

        let price = self.precision.round_price(price);
        let quantity = self.precision.round_quantity(quantity);
        if price <= 0.0 || quantity <= 0.0 {
            return Err(GatewayError::Rejected(format!(
                "non-positive price or quantity after rounding: {price} x {quantity}"
            )));
        }
        if !self.precision.meets_min_notional(price, quantity) {
            return Err(GatewayError::Rejected(format!(
                "notional {:.8} below minimum {:.8}",
                price * quantity,
                self.precision.min_notional
            )));
        }

        let id = self.next_order_id.fetch_add(1, Ordering::SeqCst);
        let order = Order {
            id,
            client_order_id: format!("sim-{}", Uuid::new_v4()),
            trading_pair: trading_pair.to_string(),
            side,
            price,
            quantity,
            filled_quantity: 0.0,
            status: OrderStatus::New,
            grid_level,
            created_at: Utc::now(),
        };
        debug!("accepted order {id}: {side} {quantity} @ {price}");
        state.open.insert(id, order.clone());
        Ok(order)
    }

    async fn cancel_order(&self, order_id: u64) -> GatewayResult<()> {
        let mut state = self.state.lock().await;
        // unknown ids are fine, the order may have filled in flight
        if let Some(mut order) = state.open.remove(&order_id) {
            order.status = OrderStatus::Canceled;
            debug!("canceled order {order_id}");
            state.emit_order(&order);
        }
        Ok(())
    }

    async fn cancel_all_orders(&self, trading_pair: &str) -> GatewayResult<usize> {
        let mut state = self.state.lock().await;
        let ids: Vec<u64> = state
            .open
            .iter()
            .filter(|(_, o)| o.trading_pair == trading_pair)
            .map(|(id, _)| *id)
            .collect();
        for id in &ids {
            if let Some(mut order) = state.open.remove(id) {
                order.status = OrderStatus::Canceled;
                state.emit_order(&order);
            }
        }
        info!("canceled {} open orders for {trading_pair}", ids.len());
        Ok(ids.len())
    }

    async fn push_price(&self, price: f64) -> GatewayResult<()> {
        let mut state = self.state.lock().await;
        state.last_price = Some(price);
        // price tick goes out before any fill it causes
        state.emit_price(price);

        let filled: Vec<u64> = state
            .open
            .iter()
            .filter(|(_, o)| Self::crosses(o, price))
            .map(|(id, _)| *id)
            .collect();
        for id in filled {
            if let Some(mut order) = state.open.remove(&id) {
                order.filled_quantity = order.quantity;
                order.status = OrderStatus::Filled;
                debug!("filled order {id} at limit {:.8}", order.price);
                state.emit_order(&order);
            }
        }
        Ok(())
    }
}
