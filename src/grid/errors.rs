//! Engine and gateway error types

use thiserror::Error;

/// Errors surfaced by the grid engine
#[derive(Error, Debug, Clone)]
pub enum EngineError {
    /// Invalid configuration, rejected at construction
    #[error("Invalid grid configuration: {0}")]
    Configuration(String),

    /// Gateway unavailable during startup; engine reverts to idle
    #[error("Gateway connectivity failure: {0}")]
    Connectivity(String),

    /// A single order was rejected by the gateway
    #[error("Order placement failed at level {level} price {price}: {reason}")]
    Placement {
        level: usize,
        price: f64,
        reason: String,
    },

    /// Operation not valid in the engine's current state
    #[error("Invalid state for operation: {0}")]
    State(String),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),
}

/// Errors surfaced by a price/order gateway
#[derive(Error, Debug, Clone)]
pub enum GatewayError {
    #[error("Gateway not connected: {0}")]
    NotConnected(String),

    /// Order rejected before reaching the book (min notional, precision, balance)
    #[error("Order rejected: {0}")]
    Rejected(String),

    /// Operation this provider does not support (e.g. price injection on a live feed)
    #[error("Operation not supported by this gateway: {0}")]
    Unsupported(String),
}

/// Result type for engine operations
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Result type for gateway operations
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;
