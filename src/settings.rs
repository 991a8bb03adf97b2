//! Application settings loaded from file and environment

use config::{Config, File};
pub use config::ConfigError;
use serde::Deserialize;

use crate::grid::{GridConfig, SpacingMode};
use crate::risk::RiskLimits;

/// Main configuration struct
#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    /// Trading configuration (pair, range, grid shape)
    #[serde(default)]
    pub trading: TradingConfig,
    /// Risk limit configuration
    #[serde(default)]
    pub risk: RiskConfig,
    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Deserialize)]
pub struct TradingConfig {
    #[serde(default = "default_trading_pair")]
    pub trading_pair: String,
    #[serde(default = "default_grid_upper")]
    pub grid_upper: f64,
    #[serde(default = "default_grid_lower")]
    pub grid_lower: f64,
    #[serde(default = "default_grid_count")]
    pub grid_count: usize,
    /// Base-asset quantity per grid order
    #[serde(default = "default_grid_amount")]
    pub grid_amount: f64,
    #[serde(default)]
    pub spacing_mode: SpacingMode,
    /// Run against the in-process venue instead of a live exchange
    #[serde(default = "default_simulation_mode")]
    pub simulation_mode: bool,
    /// Starting quote balance used for risk sizing
    #[serde(default = "default_initial_balance")]
    pub initial_balance: f64,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            trading_pair: default_trading_pair(),
            grid_upper: default_grid_upper(),
            grid_lower: default_grid_lower(),
            grid_count: default_grid_count(),
            grid_amount: default_grid_amount(),
            spacing_mode: SpacingMode::default(),
            simulation_mode: default_simulation_mode(),
            initial_balance: default_initial_balance(),
        }
    }
}

fn default_trading_pair() -> String {
    "BTCUSDT".to_string()
}

fn default_grid_upper() -> f64 {
    45_000.0
}

fn default_grid_lower() -> f64 {
    40_000.0
}

fn default_grid_count() -> usize {
    10
}

fn default_grid_amount() -> f64 {
    0.001
}

fn default_simulation_mode() -> bool {
    true
}

fn default_initial_balance() -> f64 {
    10_000.0
}

#[derive(Debug, Deserialize)]
pub struct RiskConfig {
    #[serde(default = "default_max_position_size")]
    pub max_position_size: f64,
    #[serde(default = "default_max_open_orders")]
    pub max_open_orders: usize,
    #[serde(default = "default_daily_loss_limit")]
    pub daily_loss_limit: f64,
    #[serde(default = "default_stop_loss_percent")]
    pub stop_loss_percent: f64,
    #[serde(default = "default_take_profit_percent")]
    pub take_profit_percent: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_position_size: default_max_position_size(),
            max_open_orders: default_max_open_orders(),
            daily_loss_limit: default_daily_loss_limit(),
            stop_loss_percent: default_stop_loss_percent(),
            take_profit_percent: default_take_profit_percent(),
        }
    }
}

fn default_max_position_size() -> f64 {
    0.1
}

fn default_max_open_orders() -> usize {
    50
}

fn default_daily_loss_limit() -> f64 {
    100.0
}

fn default_stop_loss_percent() -> f64 {
    5.0
}

fn default_take_profit_percent() -> f64 {
    10.0
}

#[derive(Debug, Deserialize)]
pub struct LogConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Settings {
    /// Load settings from a configuration file, with environment variables
    /// on top (e.g. `GRID_TRADING__GRID_COUNT=20`)
    pub fn new(config_path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name(config_path))
            .add_source(config::Environment::with_prefix("GRID").separator("__"))
            .build()?;
        s.try_deserialize()
    }

    /// Load settings from environment variables only
    pub fn from_env() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(config::Environment::with_prefix("GRID").separator("__"))
            .build()?;
        s.try_deserialize()
    }

    pub fn grid_config(&self) -> GridConfig {
        GridConfig::new(
            self.trading.trading_pair.clone(),
            self.trading.grid_lower,
            self.trading.grid_upper,
            self.trading.grid_count,
            self.trading.grid_amount,
        )
        .with_spacing_mode(self.trading.spacing_mode)
    }

    pub fn risk_limits(&self) -> RiskLimits {
        RiskLimits {
            max_position_size: self.risk.max_position_size,
            max_open_orders: self.risk.max_open_orders,
            daily_loss_limit: self.risk.daily_loss_limit,
            stop_loss_percent: self.risk.stop_loss_percent,
            take_profit_percent: self.risk.take_profit_percent,
            ..RiskLimits::default()
        }
    }
}
