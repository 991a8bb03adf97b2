//! Grid Trading Core
//!
//! A grid strategy partitions a price range into discrete levels, keeps at
//! most one resting order per side on each level, and rotates counter-orders
//! as fills occur. This module is the decision core: level generation, the
//! engine state machine, order bookkeeping, and status publication.
//!
//! # Architecture
//!
//! - [`config`] - Grid configuration and validation
//! - [`types`] - Core data types (GridLevel, Order, Trade, OrderSide)
//! - [`errors`] - Engine and gateway error types
//! - [`levels`] - Level price generation (arithmetic or geometric spacing)
//! - [`ledger`] - Open-order set and append-only trade history
//! - [`engine`] - The grid state machine and fill rotation
//! - [`status`] - Status snapshots and the publish/subscribe seam
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use gridcore::gateway::SimulatedGateway;
//! use gridcore::grid::{EngineMode, GridConfig, GridEngine};
//! use std::sync::Arc;
//!
//! let gateway = Arc::new(SimulatedGateway::default());
//! let config = GridConfig::new("BTCUSDT", 40_000.0, 45_000.0, 10, 0.001);
//! let mut engine = GridEngine::new(gateway, config, EngineMode::Simulated)?;
//!
//! engine.start().await?;
//! engine.simulate_price(41_500.0).await?;
//! println!("profit so far: {}", engine.total_profit());
//! engine.stop().await?;
//! ```
//!
//! Live deployments hand the engine a gateway bridged onto a real exchange
//! feed; the state machine is identical in both cases.

pub mod config;
pub mod engine;
pub mod errors;
pub mod ledger;
pub mod levels;
pub mod status;
pub mod types;

pub use config::GridConfig;
pub use engine::{EngineEvent, GridEngine};
pub use errors::{EngineError, EngineResult, GatewayError, GatewayResult};
pub use ledger::OrderLedger;
pub use status::{BotStatus, LogSink, RiskTrackingSink, SinkError, StatusPublisher, StatusSink};
pub use types::{
    EngineMode, GridLevel, Order, OrderSide, OrderStatus, SpacingMode, Trade,
};
