//! Main execution loop: drives the engine off gateway events and layers
//! periodic risk checks on top

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use log::{error, info, warn};
use tokio::time::interval;

use crate::gateway::PriceAndOrderGateway;
use crate::grid::{EngineError, EngineResult, GridEngine};
use crate::risk::RiskManager;

/// Runner configuration
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub risk_check_interval_secs: u64,
    pub max_consecutive_errors: u32,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            risk_check_interval_secs: 30,
            max_consecutive_errors: 5,
        }
    }
}

/// Why the runner shut the engine down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    StopLoss,
    TakeProfit,
    StreamsClosed,
}

/// Owns a [`GridEngine`] and a shared risk manager; processes events until
/// the streams close or a risk trigger fires.
pub struct GridRunner<G: PriceAndOrderGateway> {
    engine: GridEngine<G>,
    risk: Arc<Mutex<RiskManager>>,
    runner_config: RunnerConfig,
}

impl<G: PriceAndOrderGateway> GridRunner<G> {
    pub fn new(
        engine: GridEngine<G>,
        risk: Arc<Mutex<RiskManager>>,
        runner_config: RunnerConfig,
    ) -> Self {
        Self {
            engine,
            risk,
            runner_config,
        }
    }

    pub fn engine(&self) -> &GridEngine<G> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut GridEngine<G> {
        &mut self.engine
    }

    /// Start the engine and run until shutdown
    pub async fn run(&mut self) -> EngineResult<ShutdownReason> {
        info!("starting grid runner");
        self.engine.start().await?;

        let mut risk_timer = interval(Duration::from_secs(
            self.runner_config.risk_check_interval_secs,
        ));
        // the first tick completes immediately, skip it
        risk_timer.tick().await;
        let mut consecutive_errors = 0u32;

        let reason = loop {
            tokio::select! {
                maybe_event = self.engine.next_event() => {
                    match maybe_event {
                        Some(event) => match self.engine.process(event).await {
                            Ok(()) => consecutive_errors = 0,
                            Err(e) => {
                                error!("error processing event: {e}");
                                consecutive_errors += 1;
                            }
                        },
                        None => {
                            info!("gateway streams closed");
                            break ShutdownReason::StreamsClosed;
                        }
                    }
                }
                _ = risk_timer.tick() => {
                    self.maybe_rollover();
                    if let Some(reason) = self.evaluate_risk()? {
                        break reason;
                    }
                }
            }
            if consecutive_errors >= self.runner_config.max_consecutive_errors {
                error!("too many consecutive errors, shutting down");
                self.engine.stop().await?;
                return Err(EngineError::State("too many consecutive errors".into()));
            }
        };

        self.engine.stop().await?;
        info!("grid runner stopped: {reason:?}");
        Ok(reason)
    }

    /// Check stop-loss and take-profit against the latest price. The risk
    /// lock is dropped before any engine I/O.
    pub fn evaluate_risk(&mut self) -> EngineResult<Option<ShutdownReason>> {
        let Some(price) = self.engine.current_price() else {
            return Ok(None);
        };
        let mut risk = self
            .risk
            .lock()
            .map_err(|_| EngineError::State("risk manager lock poisoned".into()))?;
        if risk.check_stop_loss(price, self.engine.config()) {
            warn!("stop loss hit at {price:.8}");
            return Ok(Some(ShutdownReason::StopLoss));
        }
        if risk.check_take_profit(price, self.engine.config()) {
            info!("take profit hit at {price:.8}");
            return Ok(Some(ShutdownReason::TakeProfit));
        }
        Ok(None)
    }

    /// Reset daily counters when the UTC date has rolled over
    pub fn maybe_rollover(&mut self) {
        let now = Utc::now();
        let rolled = match self.risk.lock() {
            Ok(mut risk) => {
                if risk.should_reset_daily(now) {
                    risk.reset_daily_metrics(now);
                    true
                } else {
                    false
                }
            }
            Err(_) => {
                warn!("risk manager lock poisoned, skipping rollover");
                false
            }
        };
        if rolled {
            self.engine.reset_daily_profit();
            info!("daily counters rolled over");
        }
    }
}
