//! Engine status snapshots and the publish/subscribe seam

use std::sync::{Arc, Mutex};

use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::risk::RiskManager;

use super::config::GridConfig;
use super::types::EngineMode;

/// Point-in-time projection of engine state.
///
/// Derived view recomputed on demand, never stored as source of truth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotStatus {
    pub is_running: bool,
    pub mode: EngineMode,
    pub trading_pair: String,
    pub current_price: Option<f64>,
    pub grid_config: GridConfig,
    pub open_orders: usize,
    pub total_trades: usize,
    pub total_profit: f64,
    pub daily_profit: f64,
    pub uptime_seconds: i64,
    pub last_error: Option<String>,
}

/// Error returned by a failing status consumer
#[derive(Error, Debug)]
#[error("status sink failed: {0}")]
pub struct SinkError(pub String);

/// Receives status snapshots (dashboard, persistence, alerting).
///
/// Consumers live outside the core; a failing sink is logged and skipped,
/// never allowed to block or crash the publish cycle.
pub trait StatusSink: Send {
    fn on_status(&mut self, status: &BotStatus) -> Result<(), SinkError>;
}

/// Fans status snapshots out to registered sinks with per-sink error
/// isolation
#[derive(Default)]
pub struct StatusPublisher {
    sinks: Vec<Box<dyn StatusSink>>,
}

impl StatusPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, sink: Box<dyn StatusSink>) {
        self.sinks.push(sink);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sinks.len()
    }

    /// Deliver a snapshot to every sink; failures are logged and skipped
    pub fn publish(&mut self, status: &BotStatus) {
        for (i, sink) in self.sinks.iter_mut().enumerate() {
            if let Err(e) = sink.on_status(status) {
                error!("status sink {i} failed: {e}");
            }
        }
    }
}

/// Sink that writes a one-line status summary to the log
#[derive(Debug, Default)]
pub struct LogSink;

impl StatusSink for LogSink {
    fn on_status(&mut self, status: &BotStatus) -> Result<(), SinkError> {
        debug!(
            "status: running={} price={:?} open={} trades={} profit={:.8}",
            status.is_running,
            status.current_price,
            status.open_orders,
            status.total_trades,
            status.total_profit
        );
        Ok(())
    }
}

/// Sink that feeds realized-profit deltas and the derived balance into a
/// shared risk manager.
///
/// This is the composition-root wiring between the engine's profit counters
/// and the risk metrics; the engine itself stays unaware of the risk
/// manager's bookkeeping.
pub struct RiskTrackingSink {
    risk: Arc<Mutex<RiskManager>>,
    initial_balance: f64,
    last_total_profit: f64,
}

impl RiskTrackingSink {
    pub fn new(risk: Arc<Mutex<RiskManager>>, initial_balance: f64) -> Self {
        Self {
            risk,
            initial_balance,
            last_total_profit: 0.0,
        }
    }
}

impl StatusSink for RiskTrackingSink {
    fn on_status(&mut self, status: &BotStatus) -> Result<(), SinkError> {
        let delta = status.total_profit - self.last_total_profit;
        if delta == 0.0 {
            return Ok(());
        }
        self.last_total_profit = status.total_profit;

        let mut risk = self
            .risk
            .lock()
            .map_err(|_| SinkError("risk manager lock poisoned".into()))?;
        risk.record_trade_pnl(delta);
        risk.update_balance(self.initial_balance + status.total_profit);
        info!(
            "risk tracking: pnl_delta={:.8} balance={:.2}",
            delta,
            self.initial_balance + status.total_profit
        );
        Ok(())
    }
}
