//! Exchange connectivity seam
//!
//! The engine talks to a venue only through [`PriceAndOrderGateway`]. A
//! gateway owns the connection, hands out event receivers at subscription
//! time, and accepts order commands. The simulated implementation in
//! [`simulated`] fills orders locally from injected prices; a live
//! implementation would bridge the same trait onto an exchange feed.

pub mod precision;
pub mod simulated;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::grid::errors::GatewayResult;
use crate::grid::types::{Order, OrderSide};

pub use precision::{truncate_float, InstrumentPrecision};
pub use simulated::SimulatedGateway;

/// A single observed price for a trading pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceTick {
    pub trading_pair: String,
    pub price: f64,
    pub observed_at: DateTime<Utc>,
}

impl PriceTick {
    pub fn new(trading_pair: impl Into<String>, price: f64) -> Self {
        Self {
            trading_pair: trading_pair.into(),
            price,
            observed_at: Utc::now(),
        }
    }
}

/// Market data and order execution behind one seam.
///
/// Subscriptions return owned receivers; the gateway keeps the send halves
/// and the caller drives its own receive loop. Commands are request/response
/// but fills always arrive through the order update stream, never as command
/// results, so live and simulated venues look identical to the engine.
#[async_trait]
pub trait PriceAndOrderGateway: Send + Sync {
    async fn connect(&self) -> GatewayResult<()>;

    async fn disconnect(&self) -> GatewayResult<()>;

    /// Most recent observed price for the instrument. Fails when not
    /// connected or before any price has been seen.
    async fn current_price(&self) -> GatewayResult<f64>;

    /// Stream of observed prices for the pair
    async fn subscribe_prices(
        &self,
        trading_pair: &str,
    ) -> GatewayResult<UnboundedReceiver<PriceTick>>;

    /// Stream of order lifecycle transitions
    async fn subscribe_order_updates(&self) -> GatewayResult<UnboundedReceiver<Order>>;

    /// Place a limit order. The returned order reflects the accepted state
    /// (venue-assigned id, rounded price and quantity); later transitions
    /// arrive on the order update stream.
    async fn place_limit_order(
        &self,
        trading_pair: &str,
        side: OrderSide,
        price: f64,
        quantity: f64,
        grid_level: Option<usize>,
    ) -> GatewayResult<Order>;

    /// Cancel one order. Cancelling an id the venue no longer knows is not
    /// an error; the order may have filled in flight.
    async fn cancel_order(&self, order_id: u64) -> GatewayResult<()>;

    /// Cancel every open order for the pair, returning how many were open
    async fn cancel_all_orders(&self, trading_pair: &str) -> GatewayResult<usize>;

    /// Inject an observed price. Only simulated venues accept this; live
    /// gateways answer [`GatewayError::Unsupported`] because their prices
    /// come from the exchange feed.
    ///
    /// [`GatewayError::Unsupported`]: crate::grid::errors::GatewayError::Unsupported
    async fn push_price(&self, price: f64) -> GatewayResult<()>;
}
