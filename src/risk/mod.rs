//! Risk limits, metrics, and the pre-trade order gate

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::grid::{GridConfig, OrderSide};

/// Static risk limit configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskLimits {
    /// Max order notional as a fraction of current balance
    pub max_position_size: f64,
    pub max_open_orders: usize,
    /// Daily loss limit in quote currency, expressed positive
    pub daily_loss_limit: f64,
    /// Percent below the grid's lower bound that triggers stop-loss
    pub stop_loss_percent: f64,
    /// Percent above the grid's upper bound that triggers take-profit
    pub take_profit_percent: f64,
    pub max_consecutive_losses: u32,
    pub max_drawdown_percent: f64,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            max_position_size: 0.1,
            max_open_orders: 50,
            daily_loss_limit: 100.0,
            stop_loss_percent: 5.0,
            take_profit_percent: 10.0,
            max_consecutive_losses: 5,
            max_drawdown_percent: 10.0,
        }
    }
}

/// Rolling risk metrics updated by trade and balance events
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RiskMetrics {
    /// Notional currently at risk across open positions. Carried for
    /// status surfaces; nothing in the core maintains it yet.
    pub total_exposure: f64,
    pub max_exposure: f64,
    pub daily_pnl: f64,
    pub daily_loss_limit: f64,
    /// Current drawdown from peak balance, percent
    pub drawdown: f64,
    pub max_drawdown: f64,
    pub consecutive_losses: u32,
    pub stop_loss_triggered: bool,
    pub take_profit_triggered: bool,
}

/// Overall risk posture, worst matching tier wins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskStatus {
    Stopped,
    HighRisk,
    Warning,
    Moderate,
    Normal,
}

/// Summary report for status surfaces
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskReport {
    pub daily_pnl: f64,
    pub daily_loss_limit: f64,
    pub daily_pnl_percent: f64,
    pub current_drawdown: f64,
    pub max_drawdown: f64,
    pub consecutive_losses: u32,
    pub stop_loss_triggered: bool,
    pub take_profit_triggered: bool,
    pub risk_status: RiskStatus,
}

/// Tracks balance, drawdown, and daily P&L against configured limits.
///
/// Purely synchronous; callers share it behind a mutex and keep critical
/// sections short.
pub struct RiskManager {
    limits: RiskLimits,
    metrics: RiskMetrics,
    daily_trades: Vec<f64>,
    peak_balance: f64,
    current_balance: f64,
    last_reset: DateTime<Utc>,
}

impl RiskManager {
    pub fn new(limits: RiskLimits) -> Self {
        let metrics = RiskMetrics {
            daily_loss_limit: limits.daily_loss_limit,
            ..Default::default()
        };
        Self {
            limits,
            metrics,
            daily_trades: Vec::new(),
            peak_balance: 0.0,
            current_balance: 0.0,
            last_reset: Utc::now(),
        }
    }

    pub fn metrics(&self) -> &RiskMetrics {
        &self.metrics
    }

    pub fn limits(&self) -> &RiskLimits {
        &self.limits
    }

    pub fn current_balance(&self) -> f64 {
        self.current_balance
    }

    /// Update current balance and track drawdown from the peak
    pub fn update_balance(&mut self, balance: f64) {
        self.current_balance = balance;

        if balance > self.peak_balance {
            self.peak_balance = balance;
        }

        if self.peak_balance > 0.0 {
            self.metrics.drawdown = (self.peak_balance - balance) / self.peak_balance * 100.0;
            if self.metrics.drawdown > self.metrics.max_drawdown {
                self.metrics.max_drawdown = self.metrics.drawdown;
            }
        }
    }

    /// Record a realized trade P&L; losses extend the consecutive-loss
    /// streak, any non-loss resets it
    pub fn record_trade_pnl(&mut self, pnl: f64) {
        self.daily_trades.push(pnl);
        self.metrics.daily_pnl = self.daily_trades.iter().sum();

        if pnl < 0.0 {
            self.metrics.consecutive_losses += 1;
        } else {
            self.metrics.consecutive_losses = 0;
        }
    }

    /// Pre-trade gate. Checks run in a fixed priority order so the reported
    /// reason is deterministic when several limits are breached at once.
    pub fn can_place_order(
        &self,
        _side: OrderSide,
        quantity: f64,
        price: f64,
        current_open_orders: usize,
    ) -> Result<(), String> {
        if self.metrics.daily_pnl <= -self.limits.daily_loss_limit {
            return Err("Daily loss limit reached".into());
        }

        if current_open_orders >= self.limits.max_open_orders {
            return Err(format!(
                "Max open orders ({}) reached",
                self.limits.max_open_orders
            ));
        }

        let order_value = quantity * price;
        if order_value > self.limits.max_position_size * self.current_balance {
            return Err("Order exceeds max position size".into());
        }

        if self.metrics.consecutive_losses >= self.limits.max_consecutive_losses {
            return Err(format!(
                "Max consecutive losses ({}) reached",
                self.limits.max_consecutive_losses
            ));
        }

        if self.metrics.drawdown >= self.limits.max_drawdown_percent {
            return Err(format!(
                "Max drawdown ({}%) reached",
                self.limits.max_drawdown_percent
            ));
        }

        Ok(())
    }

    /// True when price has fallen past the stop-loss band below the grid.
    /// Latches the triggered flag until the next daily reset.
    pub fn check_stop_loss(&mut self, current_price: f64, config: &GridConfig) -> bool {
        let stop_loss_price = config.lower_price * (1.0 - self.limits.stop_loss_percent / 100.0);

        if current_price <= stop_loss_price {
            self.metrics.stop_loss_triggered = true;
            warn!(
                "stop loss triggered: price={:.8} threshold={:.8}",
                current_price, stop_loss_price
            );
            return true;
        }
        false
    }

    /// True when price has risen past the take-profit band above the grid
    pub fn check_take_profit(&mut self, current_price: f64, config: &GridConfig) -> bool {
        let take_profit_price = config.upper_price * (1.0 + self.limits.take_profit_percent / 100.0);

        if current_price >= take_profit_price {
            self.metrics.take_profit_triggered = true;
            info!(
                "take profit triggered: price={:.8} threshold={:.8}",
                current_price, take_profit_price
            );
            return true;
        }
        false
    }

    /// Reset daily metrics at the start of a new trading day
    pub fn reset_daily_metrics(&mut self, now: DateTime<Utc>) {
        self.daily_trades.clear();
        self.metrics.daily_pnl = 0.0;
        self.metrics.stop_loss_triggered = false;
        self.metrics.take_profit_triggered = false;
        self.last_reset = now;
        info!("daily risk metrics reset");
    }

    /// A reset is due whenever the UTC calendar date differs from the last
    /// reset's date, so a long-skewed clock still resets exactly once
    pub fn should_reset_daily(&self, now: DateTime<Utc>) -> bool {
        now.date_naive() != self.last_reset.date_naive()
    }

    pub fn risk_report(&self) -> RiskReport {
        RiskReport {
            daily_pnl: self.metrics.daily_pnl,
            daily_loss_limit: self.limits.daily_loss_limit,
            daily_pnl_percent: if self.limits.daily_loss_limit > 0.0 {
                self.metrics.daily_pnl / self.limits.daily_loss_limit * 100.0
            } else {
                0.0
            },
            current_drawdown: self.metrics.drawdown,
            max_drawdown: self.metrics.max_drawdown,
            consecutive_losses: self.metrics.consecutive_losses,
            stop_loss_triggered: self.metrics.stop_loss_triggered,
            take_profit_triggered: self.metrics.take_profit_triggered,
            risk_status: self.risk_status(),
        }
    }

    /// Worst matching tier wins
    pub fn risk_status(&self) -> RiskStatus {
        if self.metrics.stop_loss_triggered {
            return RiskStatus::Stopped;
        }
        if self.metrics.drawdown >= self.limits.max_drawdown_percent * 0.8 {
            return RiskStatus::HighRisk;
        }
        if self.metrics.daily_pnl <= -self.limits.daily_loss_limit * 0.8 {
            return RiskStatus::HighRisk;
        }
        if self.metrics.consecutive_losses >= self.limits.max_consecutive_losses.saturating_sub(1) {
            return RiskStatus::Warning;
        }
        if self.metrics.drawdown >= self.limits.max_drawdown_percent * 0.5 {
            return RiskStatus::Moderate;
        }
        RiskStatus::Normal
    }
}

/// Pre-trade admission check the engine consults before every placement
pub trait OrderGate: Send + Sync {
    fn check(
        &self,
        side: OrderSide,
        quantity: f64,
        price: f64,
        current_open_orders: usize,
    ) -> Result<(), String>;
}

/// Gate that admits everything; used when risk controls are disabled
#[derive(Debug, Default)]
pub struct NoopGate;

impl OrderGate for NoopGate {
    fn check(&self, _: OrderSide, _: f64, _: f64, _: usize) -> Result<(), String> {
        Ok(())
    }
}

/// Gate backed by a shared [`RiskManager`]
pub struct RiskGate {
    risk: std::sync::Arc<std::sync::Mutex<RiskManager>>,
}

impl RiskGate {
    pub fn new(risk: std::sync::Arc<std::sync::Mutex<RiskManager>>) -> Self {
        Self { risk }
    }
}

impl OrderGate for RiskGate {
    fn check(
        &self,
        side: OrderSide,
        quantity: f64,
        price: f64,
        current_open_orders: usize,
    ) -> Result<(), String> {
        let risk = self
            .risk
            .lock()
            .map_err(|_| "risk manager lock poisoned".to_string())?;
        risk.can_place_order(side, quantity, price, current_open_orders)
    }
}
