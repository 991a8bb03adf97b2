//! gridcore - a grid trading decision core
//!
//! The crate splits into a small set of seams:
//!
//! - [`grid`] - the engine state machine, level math, and bookkeeping
//! - [`gateway`] - exchange connectivity behind one trait, with an
//!   in-process simulated venue for detached runs
//! - [`risk`] - pre-trade gating and stop-loss/take-profit monitoring
//! - [`runner`] - the event loop that ties engine and risk together
//! - [`settings`] - file and environment configuration

pub mod gateway;
pub mod grid;
pub mod risk;
pub mod runner;
pub mod settings;

pub use gateway::{PriceAndOrderGateway, SimulatedGateway};
pub use grid::{BotStatus, EngineMode, GridConfig, GridEngine};
pub use risk::{RiskLimits, RiskManager};
pub use runner::{GridRunner, RunnerConfig};
pub use settings::Settings;
