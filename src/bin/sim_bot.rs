//! Simulated Grid Bot
//!
//! Runs the grid engine against the in-process venue with a deterministic
//! zig-zag price path, printing status and a risk report along the way.
//!
//! Run with: cargo run --bin sim_bot

use std::sync::{Arc, Mutex};

use log::{info, LevelFilter};

use gridcore::gateway::SimulatedGateway;
use gridcore::grid::{EngineMode, GridEngine, LogSink, RiskTrackingSink};
use gridcore::risk::{RiskGate, RiskManager};
use gridcore::settings::Settings;

/// Deterministic zig-zag between the grid bounds: enough excursions in both
/// directions to exercise fills and rotations on every level
fn zig_zag_path(lower: f64, upper: f64, steps_per_leg: usize, legs: usize) -> Vec<f64> {
    let mut path = Vec::new();
    let step = (upper - lower) / steps_per_leg as f64;
    let mut down = true;
    for _ in 0..legs {
        for i in 0..=steps_per_leg {
            let offset = step * i as f64;
            let price = if down { upper - offset } else { lower + offset };
            path.push(price);
        }
        down = !down;
    }
    path
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env().unwrap_or_else(|e| {
        eprintln!("falling back to default settings: {e}");
        Settings::default()
    });

    env_logger::Builder::new()
        .filter_level(settings.log.level.parse().unwrap_or(LevelFilter::Info))
        .init();

    let config = settings.grid_config();
    config.validate()?;
    info!(
        "simulated grid bot: {} [{:.2}, {:.2}] x {} levels",
        config.trading_pair, config.lower_price, config.upper_price, config.grid_count
    );

    let gateway = Arc::new(SimulatedGateway::default());
    let risk = Arc::new(Mutex::new(RiskManager::new(settings.risk_limits())));
    if let Ok(mut r) = risk.lock() {
        r.update_balance(settings.trading.initial_balance);
    }

    let mut engine = GridEngine::new(gateway, config.clone(), EngineMode::Simulated)?
        .with_gate(Arc::new(RiskGate::new(risk.clone())));
    engine.subscribe(Box::new(LogSink));
    engine.subscribe(Box::new(RiskTrackingSink::new(
        risk.clone(),
        settings.trading.initial_balance,
    )));

    engine.start().await?;
    info!("seeded {} open orders", engine.open_orders().len());

    // walk the range down and back up a few times
    let path = zig_zag_path(config.lower_price, config.upper_price, 20, 6);
    for (i, price) in path.iter().enumerate() {
        engine.simulate_price(*price).await?;
        if i % 25 == 0 {
            let status = engine.status();
            info!(
                "tick {i}: price {:.2}, open {}, trades {}, profit {:.6}",
                price, status.open_orders, status.total_trades, status.total_profit
            );
        }
    }

    engine.stop().await?;

    let status = engine.status();
    println!("--- final summary ---");
    println!("trades executed: {}", status.total_trades);
    println!("total profit:    {:.6}", status.total_profit);
    println!("daily profit:    {:.6}", status.daily_profit);
    if let Ok(r) = risk.lock() {
        let report = r.risk_report();
        println!("risk report:");
        if let Ok(json) = serde_json::to_string_pretty(&report) {
            println!("{json}");
        }
    }
    Ok(())
}
