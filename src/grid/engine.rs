//! Grid state machine: level lifecycle, fill rotation, profit accounting
//!
//! The engine is a single logical stream of control. Events arrive on the
//! receivers obtained from the gateway at start and each one is processed to
//! completion before the next, which is what keeps the one-order-per-side
//! invariant on every level. Gateway I/O happens inside that critical
//! section; status publication happens at the end of it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{error, info, warn};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::gateway::{PriceAndOrderGateway, PriceTick};
use crate::risk::{NoopGate, OrderGate};

use super::config::GridConfig;
use super::errors::{EngineError, EngineResult};
use super::ledger::OrderLedger;
use super::status::{BotStatus, StatusPublisher, StatusSink};
use super::types::{EngineMode, GridLevel, Order, OrderSide, OrderStatus, Trade};

/// Event delivered by the gateway streams
#[derive(Debug)]
pub enum EngineEvent {
    Price(PriceTick),
    OrderUpdate(Order),
}

/// Grid trading engine over one instrument.
///
/// Idle until [`start`], Running until [`stop`], then Idle again. Levels and
/// trade history survive a stop for inspection.
///
/// [`start`]: GridEngine::start
/// [`stop`]: GridEngine::stop
pub struct GridEngine<G: PriceAndOrderGateway> {
    gateway: Arc<G>,
    config: GridConfig,
    mode: EngineMode,
    gate: Arc<dyn OrderGate>,
    publisher: StatusPublisher,
    levels: Vec<GridLevel>,
    ledger: OrderLedger,
    running: bool,
    current_price: Option<f64>,
    total_profit: f64,
    daily_profit: f64,
    started_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
    price_rx: Option<UnboundedReceiver<PriceTick>>,
    order_rx: Option<UnboundedReceiver<Order>>,
}

impl<G: PriceAndOrderGateway> GridEngine<G> {
    /// Construct an idle engine. The configuration is validated here and an
    /// invalid one is fatal to the instance.
    pub fn new(gateway: Arc<G>, config: GridConfig, mode: EngineMode) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self {
            gateway,
            config,
            mode,
            gate: Arc::new(NoopGate),
            publisher: StatusPublisher::new(),
            levels: Vec::new(),
            ledger: OrderLedger::new(),
            running: false,
            current_price: None,
            total_profit: 0.0,
            daily_profit: 0.0,
            started_at: None,
            last_error: None,
            price_rx: None,
            order_rx: None,
        })
    }

    /// Install a pre-trade gate consulted before every placement
    pub fn with_gate(mut self, gate: Arc<dyn OrderGate>) -> Self {
        self.gate = gate;
        self
    }

    /// Register a status consumer
    pub fn subscribe(&mut self, sink: Box<dyn StatusSink>) {
        self.publisher.subscribe(sink);
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn mode(&self) -> EngineMode {
        self.mode
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn levels(&self) -> &[GridLevel] {
        &self.levels
    }

    pub fn open_orders(&self) -> Vec<Order> {
        self.ledger.open_orders()
    }

    pub fn trades(&self) -> Vec<Trade> {
        self.ledger.trades()
    }

    pub fn current_price(&self) -> Option<f64> {
        self.current_price
    }

    pub fn total_profit(&self) -> f64 {
        self.total_profit
    }

    pub fn daily_profit(&self) -> f64 {
        self.daily_profit
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Zero the daily profit counter at a day boundary
    pub fn reset_daily_profit(&mut self) {
        self.daily_profit = 0.0;
    }

    /// Replace the grid configuration. Rejected while running; the active
    /// configuration is left untouched on any error.
    pub fn update_config(&mut self, config: GridConfig) -> EngineResult<()> {
        if self.running {
            return Err(EngineError::State(
                "cannot update config while running".into(),
            ));
        }
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Start the grid: build levels, seed initial orders around the current
    /// price, subscribe to gateway events.
    ///
    /// Starting while already running is a warning-level no-op. A failure
    /// before orders go out reverts to Idle and records `last_error`.
    pub async fn start(&mut self) -> EngineResult<()> {
        if self.running {
            warn!("start requested while already running");
            return Ok(());
        }

        if let Err(e) = self.gateway.connect().await {
            return self.fail_start(format!("gateway connect failed: {e}"));
        }

        self.levels = self.config.build_levels();

        // a detached engine has no market feed, the range midpoint stands in
        let price = if self.mode.is_simulated() {
            self.config.midpoint()
        } else {
            match self.gateway.current_price().await {
                Ok(p) => p,
                Err(e) => return self.fail_start(format!("price fetch failed: {e}")),
            }
        };
        self.current_price = Some(price);

        self.price_rx = Some(
            match self.gateway.subscribe_prices(&self.config.trading_pair).await {
                Ok(rx) => rx,
                Err(e) => {
                    return self.fail_start(format!("price subscription failed: {e}"))
                }
            },
        );
        self.order_rx = Some(match self.gateway.subscribe_order_updates().await {
            Ok(rx) => rx,
            Err(e) => return self.fail_start(format!("order subscription failed: {e}")),
        });

        // strict comparisons: a level sitting exactly on the current price
        // stays empty so both sides are never armed at the boundary
        for index in 0..self.levels.len() {
            let level_price = self.levels[index].price;
            if level_price < price {
                self.place_grid_order(index, OrderSide::Buy).await;
            } else if level_price > price {
                self.place_grid_order(index, OrderSide::Sell).await;
            }
        }

        self.running = true;
        self.started_at = Some(Utc::now());
        info!(
            "grid started: {} levels, {} open orders, price {:.8}",
            self.levels.len(),
            self.ledger.open_count(),
            price
        );
        self.publish_status();
        Ok(())
    }

    /// Abort a start before the grid is usable: revert to Idle and record
    /// the failure as `last_error`
    fn fail_start<T>(&mut self, msg: String) -> EngineResult<T> {
        error!("{msg}");
        self.last_error = Some(msg.clone());
        self.levels.clear();
        self.current_price = None;
        self.price_rx = None;
        self.order_rx = None;
        Err(EngineError::Connectivity(msg))
    }

    /// Stop the grid: best-effort cancel of everything open, then Idle.
    /// Levels and trade history are retained read-only.
    pub async fn stop(&mut self) -> EngineResult<()> {
        if !self.running {
            return Ok(());
        }

        match self.gateway.cancel_all_orders(&self.config.trading_pair).await {
            Ok(count) => info!("stop: canceled {count} orders at gateway"),
            Err(e) => warn!("stop: cancel-all failed, clearing local state anyway: {e}"),
        }

        self.ledger.clear_open();
        for level in &mut self.levels {
            level.clear_order(OrderSide::Buy);
            level.clear_order(OrderSide::Sell);
        }
        self.price_rx = None;
        self.order_rx = None;
        self.running = false;
        self.started_at = None;
        info!("grid stopped");
        self.publish_status();
        Ok(())
    }

    /// Wait for the next gateway event. Returns None once both streams are
    /// closed or the engine is idle.
    pub async fn next_event(&mut self) -> Option<EngineEvent> {
        let price_rx = self.price_rx.as_mut()?;
        let order_rx = self.order_rx.as_mut()?;
        tokio::select! {
            Some(tick) = price_rx.recv() => Some(EngineEvent::Price(tick)),
            Some(order) = order_rx.recv() => Some(EngineEvent::OrderUpdate(order)),
            else => None,
        }
    }

    /// Process one event to completion
    pub async fn process(&mut self, event: EngineEvent) -> EngineResult<()> {
        match event {
            EngineEvent::Price(tick) => self.handle_price_update(tick.price).await,
            EngineEvent::OrderUpdate(order) => self.handle_order_update(order).await,
        }
    }

    /// Inject a price in detached mode and process everything it causes.
    /// Rejected synchronously outside simulation or while idle.
    pub async fn simulate_price(&mut self, price: f64) -> EngineResult<()> {
        if !self.mode.is_simulated() {
            return Err(EngineError::State(
                "simulate_price requires simulation mode".into(),
            ));
        }
        if !self.running {
            return Err(EngineError::State(
                "simulate_price requires a running engine".into(),
            ));
        }
        self.gateway.push_price(price).await?;
        self.drain_pending().await
    }

    /// Drain and process every already-delivered event. Price ticks are
    /// handled before order updates, matching the gateway's emission order
    /// within a tick.
    pub async fn drain_pending(&mut self) -> EngineResult<()> {
        loop {
            let mut ticks = Vec::new();
            if let Some(rx) = self.price_rx.as_mut() {
                while let Ok(tick) = rx.try_recv() {
                    ticks.push(tick);
                }
            }
            let mut orders = Vec::new();
            if let Some(rx) = self.order_rx.as_mut() {
                while let Ok(order) = rx.try_recv() {
                    orders.push(order);
                }
            }
            if ticks.is_empty() && orders.is_empty() {
                return Ok(());
            }
            for tick in ticks {
                self.handle_price_update(tick.price).await?;
            }
            for order in orders {
                self.handle_order_update(order).await?;
            }
        }
    }

    /// Cache the latest price and publish
    pub async fn handle_price_update(&mut self, price: f64) -> EngineResult<()> {
        self.current_price = Some(price);
        self.publish_status();
        Ok(())
    }

    /// Apply one order lifecycle transition.
    ///
    /// Unknown ids are ignored: a cancel racing a fill means the gateway can
    /// report an order the ledger already dropped, and that is not an error.
    pub async fn handle_order_update(&mut self, order: Order) -> EngineResult<()> {
        match order.status {
            OrderStatus::Filled => self.handle_fill(order).await,
            OrderStatus::Canceled | OrderStatus::Rejected | OrderStatus::Expired => {
                if let Some(closed) = self.ledger.remove(order.id) {
                    if let Some(index) = closed.grid_level {
                        if let Some(level) = self.levels.get_mut(index) {
                            if level.order_id(closed.side) == Some(closed.id) {
                                level.clear_order(closed.side);
                            }
                        }
                    }
                    info!("order {} closed without fill: {}", order.id, order.status);
                    self.publish_status();
                }
                Ok(())
            }
            OrderStatus::New | OrderStatus::PartiallyFilled => {
                self.ledger.update(order);
                Ok(())
            }
        }
    }

    /// Fill rotation: retire the filled order, record the trade, arm the
    /// counter-order one level away.
    async fn handle_fill(&mut self, order: Order) -> EngineResult<()> {
        // a duplicate fill notification finds nothing in the open set
        let Some(filled) = self.ledger.remove(order.id) else {
            return Ok(());
        };
        let mut filled = filled;
        filled.status = OrderStatus::Filled;
        filled.filled_quantity = order.filled_quantity;

        let trade = Trade::from_filled_order(self.ledger.next_trade_id(), &filled);
        self.ledger.record_trade(trade);

        let Some(index) = filled.grid_level else {
            warn!("filled order {} has no grid level, skipping rotation", filled.id);
            self.publish_status();
            return Ok(());
        };
        if let Some(level) = self.levels.get_mut(index) {
            if level.order_id(filled.side) == Some(filled.id) {
                level.clear_order(filled.side);
            }
        }

        match filled.side {
            OrderSide::Buy => {
                info!(
                    "buy filled at level {index} ({:.8}), arming sell above",
                    filled.price
                );
                if index + 1 < self.levels.len() {
                    self.place_grid_order(index + 1, OrderSide::Sell).await;
                }
            }
            OrderSide::Sell => {
                let profit = self.level_spacing() * filled.filled_quantity;
                self.total_profit += profit;
                self.daily_profit += profit;
                info!(
                    "sell filled at level {index} ({:.8}), profit {:.8}, arming buy below",
                    filled.price, profit
                );
                if index > 0 {
                    self.place_grid_order(index - 1, OrderSide::Buy).await;
                }
            }
        }

        self.publish_status();
        Ok(())
    }

    /// Place one grid order. A gate veto or gateway rejection leaves the
    /// level without that side's order and never aborts the caller.
    async fn place_grid_order(&mut self, index: usize, side: OrderSide) {
        let Some(level) = self.levels.get(index) else {
            return;
        };
        // idempotent against duplicate rotation triggers
        if level.order_id(side).is_some() {
            return;
        }
        let price = level.price;
        let quantity = self.config.amount_per_grid;

        if let Err(reason) = self
            .gate
            .check(side, quantity, price, self.ledger.open_count())
        {
            warn!("risk gate vetoed {side} at level {index} ({price:.8}): {reason}");
            return;
        }

        match self
            .gateway
            .place_limit_order(&self.config.trading_pair, side, price, quantity, Some(index))
            .await
        {
            Ok(order) => {
                if let Some(level) = self.levels.get_mut(index) {
                    level.set_order(side, order.id);
                }
                self.ledger.insert(order);
            }
            Err(e) => {
                let err = EngineError::Placement {
                    level: index,
                    price,
                    reason: e.to_string(),
                };
                warn!("{err}, leaving {side} side empty");
            }
        }
    }

    /// Spacing between adjacent levels, used for realized profit.
    ///
    /// Uses the first interval; under geometric spacing this understates
    /// profit at higher levels, which is the accepted simplification.
    fn level_spacing(&self) -> f64 {
        if self.levels.len() >= 2 {
            self.levels[1].price - self.levels[0].price
        } else {
            0.0
        }
    }

    /// Current status snapshot
    pub fn status(&self) -> BotStatus {
        BotStatus {
            is_running: self.running,
            mode: self.mode,
            trading_pair: self.config.trading_pair.clone(),
            current_price: self.current_price,
            grid_config: self.config.clone(),
            open_orders: self.ledger.open_count(),
            total_trades: self.ledger.trade_count(),
            total_profit: self.total_profit,
            daily_profit: self.daily_profit,
            uptime_seconds: self
                .started_at
                .map(|t| (Utc::now() - t).num_seconds())
                .unwrap_or(0),
            last_error: self.last_error.clone(),
        }
    }

    fn publish_status(&mut self) {
        let status = self.status();
        self.publisher.publish(&status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::SimulatedGateway;
    use crate::grid::errors::{GatewayError, GatewayResult};
    use crate::grid::types::SpacingMode;
    use crate::risk::OrderGate;
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn config() -> GridConfig {
        GridConfig::new("BTCUSDT", 40_000.0, 45_000.0, 10, 0.001)
    }

    async fn started_engine() -> GridEngine<SimulatedGateway> {
        let gateway = Arc::new(SimulatedGateway::default());
        let mut engine = GridEngine::new(gateway, config(), EngineMode::Simulated).unwrap();
        engine.start().await.unwrap();
        engine
    }

    fn open_count_by_side(engine: &GridEngine<SimulatedGateway>, side: OrderSide) -> usize {
        engine
            .open_orders()
            .iter()
            .filter(|o| o.side == side)
            .count()
    }

    #[test]
    fn test_invalid_config_rejected_at_construction() {
        let gateway = Arc::new(SimulatedGateway::default());
        let bad = GridConfig::new("BTCUSDT", 45_000.0, 40_000.0, 10, 0.001);
        assert!(GridEngine::new(gateway, bad, EngineMode::Simulated).is_err());
    }

    #[tokio::test]
    async fn test_start_seeds_orders_around_midpoint() {
        let engine = started_engine().await;
        assert!(engine.is_running());
        assert_eq!(engine.levels().len(), 11);

        // midpoint 42500 sits exactly on level 5, which stays empty
        assert_eq!(open_count_by_side(&engine, OrderSide::Buy), 5);
        assert_eq!(open_count_by_side(&engine, OrderSide::Sell), 5);
        assert!(!engine.levels()[5].has_buy_order());
        assert!(!engine.levels()[5].has_sell_order());
        assert_eq!(engine.current_price(), Some(42_500.0));
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let mut engine = started_engine().await;
        let before = engine.open_orders();
        engine.start().await.unwrap();
        assert_eq!(engine.open_orders().len(), before.len());
    }

    #[tokio::test]
    async fn test_stop_cancels_everything_and_returns_to_idle() {
        let mut engine = started_engine().await;
        let gateway = engine.gateway.clone();
        engine.stop().await.unwrap();

        assert!(!engine.is_running());
        assert!(engine.open_orders().is_empty());
        assert_eq!(gateway.open_order_count().await, 0);
        // levels survive the stop, stripped of order ids
        assert_eq!(engine.levels().len(), 11);
        assert!(engine.levels().iter().all(|l| !l.has_buy_order() && !l.has_sell_order()));
    }

    #[tokio::test]
    async fn test_stop_while_idle_is_a_noop() {
        let gateway = Arc::new(SimulatedGateway::default());
        let mut engine = GridEngine::new(gateway, config(), EngineMode::Simulated).unwrap();
        engine.stop().await.unwrap();
        assert!(!engine.is_running());
    }

    #[tokio::test]
    async fn test_buy_fill_arms_sell_one_level_above() {
        let mut engine = started_engine().await;

        // drops through level 4 (42000), filling only that buy
        engine.simulate_price(41_999.0).await.unwrap();

        assert!(!engine.levels()[4].has_buy_order());
        assert!(engine.levels()[5].has_sell_order());
        assert_eq!(engine.trades().len(), 1);
        assert_eq!(engine.total_profit(), 0.0);
        // one buy retired, one sell armed
        assert_eq!(open_count_by_side(&engine, OrderSide::Buy), 4);
        assert_eq!(open_count_by_side(&engine, OrderSide::Sell), 6);
    }

    #[tokio::test]
    async fn test_sell_fill_realizes_profit_and_arms_buy_below() {
        let mut engine = started_engine().await;
        engine.simulate_price(41_999.0).await.unwrap();

        // back up through the sell armed at level 5 (42500)
        engine.simulate_price(42_500.0).await.unwrap();

        assert!(!engine.levels()[5].has_sell_order());
        assert!(engine.levels()[4].has_buy_order());
        // spacing 500 * quantity 0.001
        assert!((engine.total_profit() - 0.5).abs() < 1e-9);
        assert!((engine.daily_profit() - 0.5).abs() < 1e-9);
        assert_eq!(engine.trades().len(), 2);
    }

    #[tokio::test]
    async fn test_sweep_fills_cascade_deterministically() {
        let mut engine = started_engine().await;

        // sweep below the whole grid: every resting buy fills, each arming a
        // sell above; the sells from rotation do not fill at this price
        engine.simulate_price(39_000.0).await.unwrap();

        assert_eq!(open_count_by_side(&engine, OrderSide::Buy), 0);
        assert_eq!(open_count_by_side(&engine, OrderSide::Sell), 10);
        assert_eq!(engine.trades().len(), 5);
    }

    #[tokio::test]
    async fn test_duplicate_fill_notification_is_ignored() {
        let mut engine = started_engine().await;
        engine.simulate_price(41_999.0).await.unwrap();

        let replay = engine.trades()[0].clone();
        let filled = Order {
            id: replay.order_id,
            client_order_id: String::new(),
            trading_pair: replay.trading_pair.clone(),
            side: replay.side,
            price: replay.price,
            quantity: replay.quantity,
            filled_quantity: replay.quantity,
            status: OrderStatus::Filled,
            grid_level: Some(4),
            created_at: Utc::now(),
        };

        let trades_before = engine.trades().len();
        engine.handle_order_update(filled).await.unwrap();
        assert_eq!(engine.trades().len(), trades_before);
        assert_eq!(open_count_by_side(&engine, OrderSide::Sell), 6);
    }

    #[tokio::test]
    async fn test_simulate_price_rejected_in_live_mode() {
        let gateway = Arc::new(SimulatedGateway::default());
        let mut engine = GridEngine::new(gateway.clone(), config(), EngineMode::Live).unwrap();
        let err = engine.simulate_price(42_000.0).await.unwrap_err();
        assert!(matches!(err, EngineError::State(_)));
    }

    #[tokio::test]
    async fn test_simulate_price_rejected_while_idle() {
        let gateway = Arc::new(SimulatedGateway::default());
        let mut engine = GridEngine::new(gateway, config(), EngineMode::Simulated).unwrap();
        assert!(matches!(
            engine.simulate_price(42_000.0).await,
            Err(EngineError::State(_))
        ));
    }

    #[tokio::test]
    async fn test_geometric_rotation_uses_first_interval_spacing() {
        let gateway = Arc::new(SimulatedGateway::default());
        let cfg = GridConfig::new("BTCUSDT", 10_000.0, 40_000.0, 2, 0.001)
            .with_spacing_mode(SpacingMode::Geometric);
        let mut engine = GridEngine::new(gateway, cfg, EngineMode::Simulated).unwrap();
        engine.start().await.unwrap();

        // levels 10000 / 20000 / 40000; start price 25000 seeds buys on the
        // two lower levels and a sell at the top
        engine.simulate_price(19_999.0).await.unwrap();
        // the buy fill at level 1 finds level 2's sell already armed
        assert!(engine.levels()[2].has_sell_order());

        engine.simulate_price(40_000.0).await.unwrap();

        // realized profit always uses the lowest interval (10000), not the
        // 20000-wide interval the sell actually spanned; accepted
        // understatement for geometric grids
        assert!((engine.total_profit() - 10.0).abs() < 1e-9);
        assert!(engine.levels()[1].has_buy_order());
    }

    struct BrokenStreams;

    #[async_trait]
    impl PriceAndOrderGateway for BrokenStreams {
        async fn connect(&self) -> GatewayResult<()> {
            Ok(())
        }
        async fn disconnect(&self) -> GatewayResult<()> {
            Ok(())
        }
        async fn current_price(&self) -> GatewayResult<f64> {
            Ok(42_500.0)
        }
        async fn subscribe_prices(
            &self,
            _pair: &str,
        ) -> GatewayResult<UnboundedReceiver<PriceTick>> {
            Err(GatewayError::NotConnected("stream down".into()))
        }
        async fn subscribe_order_updates(&self) -> GatewayResult<UnboundedReceiver<Order>> {
            Err(GatewayError::NotConnected("stream down".into()))
        }
        async fn place_limit_order(
            &self,
            _pair: &str,
            _side: OrderSide,
            _price: f64,
            _quantity: f64,
            _grid_level: Option<usize>,
        ) -> GatewayResult<Order> {
            Err(GatewayError::NotConnected("stream down".into()))
        }
        async fn cancel_order(&self, _order_id: u64) -> GatewayResult<()> {
            Ok(())
        }
        async fn cancel_all_orders(&self, _pair: &str) -> GatewayResult<usize> {
            Ok(0)
        }
        async fn push_price(&self, _price: f64) -> GatewayResult<()> {
            Err(GatewayError::Unsupported("no injected prices".into()))
        }
    }

    #[tokio::test]
    async fn test_subscription_failure_reverts_start_to_idle() {
        let gateway = Arc::new(BrokenStreams);
        let mut engine = GridEngine::new(gateway, config(), EngineMode::Simulated).unwrap();

        let err = engine.start().await.unwrap_err();
        assert!(matches!(err, EngineError::Connectivity(_)));
        assert!(!engine.is_running());
        assert!(engine.last_error().unwrap().contains("subscription"));
        assert!(engine.levels().is_empty());
        assert!(engine.open_orders().is_empty());
    }

    #[tokio::test]
    async fn test_live_start_without_price_reverts_to_idle() {
        let gateway = Arc::new(SimulatedGateway::default());
        let mut engine = GridEngine::new(gateway, config(), EngineMode::Live).unwrap();

        let err = engine.start().await.unwrap_err();
        assert!(matches!(err, EngineError::Connectivity(_)));
        assert!(!engine.is_running());
        assert!(engine.last_error().is_some());
        assert!(engine.open_orders().is_empty());
    }

    #[tokio::test]
    async fn test_update_config_rejected_while_running() {
        let mut engine = started_engine().await;
        let original_upper = engine.config().upper_price;

        let err = engine
            .update_config(GridConfig::new("BTCUSDT", 30_000.0, 35_000.0, 10, 0.001))
            .unwrap_err();
        assert!(matches!(err, EngineError::State(_)));
        assert_eq!(engine.config().upper_price, original_upper);

        engine.stop().await.unwrap();
        engine
            .update_config(GridConfig::new("BTCUSDT", 30_000.0, 35_000.0, 10, 0.001))
            .unwrap();
        assert_eq!(engine.config().upper_price, 35_000.0);
    }

    struct VetoEverything;

    impl OrderGate for VetoEverything {
        fn check(&self, _: OrderSide, _: f64, _: f64, _: usize) -> Result<(), String> {
            Err("vetoed".into())
        }
    }

    #[tokio::test]
    async fn test_gate_veto_leaves_levels_empty_but_engine_running() {
        let gateway = Arc::new(SimulatedGateway::default());
        let mut engine = GridEngine::new(gateway, config(), EngineMode::Simulated)
            .unwrap()
            .with_gate(Arc::new(VetoEverything));

        engine.start().await.unwrap();
        assert!(engine.is_running());
        assert!(engine.open_orders().is_empty());
        assert!(engine.levels().iter().all(|l| !l.has_buy_order() && !l.has_sell_order()));
    }

    struct CountingSink(Arc<Mutex<usize>>);

    impl StatusSink for CountingSink {
        fn on_status(&mut self, _: &BotStatus) -> Result<(), super::super::status::SinkError> {
            *self.0.lock().unwrap() += 1;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_status_published_on_start_fill_and_stop() {
        let count = Arc::new(Mutex::new(0));
        let gateway = Arc::new(SimulatedGateway::default());
        let mut engine = GridEngine::new(gateway, config(), EngineMode::Simulated).unwrap();
        engine.subscribe(Box::new(CountingSink(count.clone())));

        engine.start().await.unwrap();
        let after_start = *count.lock().unwrap();
        assert_eq!(after_start, 1);

        // one price publish plus one per fill
        engine.simulate_price(41_999.0).await.unwrap();
        let after_fill = *count.lock().unwrap();
        assert_eq!(after_fill, 3);

        engine.stop().await.unwrap();
        assert_eq!(*count.lock().unwrap(), after_fill + 1);
    }

    #[tokio::test]
    async fn test_status_snapshot_reflects_engine_state() {
        let mut engine = started_engine().await;
        engine.simulate_price(41_999.0).await.unwrap();
        engine.simulate_price(42_500.0).await.unwrap();

        let status = engine.status();
        assert!(status.is_running);
        assert_eq!(status.trading_pair, "BTCUSDT");
        assert_eq!(status.current_price, Some(42_500.0));
        assert_eq!(status.total_trades, 2);
        assert!((status.total_profit - 0.5).abs() < 1e-9);
        assert!(status.last_error.is_none());
    }

    #[tokio::test]
    async fn test_daily_profit_reset_leaves_total_untouched() {
        let mut engine = started_engine().await;
        engine.simulate_price(41_999.0).await.unwrap();
        engine.simulate_price(42_500.0).await.unwrap();

        engine.reset_daily_profit();
        assert_eq!(engine.daily_profit(), 0.0);
        assert!((engine.total_profit() - 0.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_canceled_update_clears_level_side() {
        let mut engine = started_engine().await;
        let order = engine
            .open_orders()
            .into_iter()
            .find(|o| o.grid_level == Some(4))
            .unwrap();

        engine.gateway.cancel_order(order.id).await.unwrap();
        engine.drain_pending().await.unwrap();

        assert!(!engine.levels()[4].has_buy_order());
        assert!(!engine.ledger.contains(order.id));
    }
}
