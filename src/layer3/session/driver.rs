// Dashboard Session & Refresh Driver
// The session is the long-lived handle a host application owns; the driver ticks it on an interval

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::core::config::{ConfigError, ConfigManager, EngineConfig, MonitoringConfig};
use crate::layer1::rest_client::now_secs;
use crate::layer2::venues::{build_clients, VenueClient, VenueError};
use crate::layer3::engine::aggregation_engine::AggregationEngine;
use crate::layer3::engine::snapshot::AggregatedView;

use super::history::SignalHistory;

/// Engine, active instrument and chart history for one dashboard.
///
/// The engine is created lazily on the first `ensure_instrument` or `tick`.
pub struct DashboardSession {
    clients: Vec<Arc<dyn VenueClient>>,
    build_failures: Vec<(String, VenueError)>,
    engine_config: EngineConfig,
    engine: Option<AggregationEngine>,
    history: SignalHistory,
}

impl DashboardSession {
    /// Validate the config, then build the venue roster from it
    pub fn new(config: &ConfigManager) -> Result<Self, ConfigError> {
        config.validate()?;
        let (clients, build_failures) = build_clients(&config.venues());
        let mut session = Self::with_clients(clients, config.engine(), &config.monitoring());
        session.build_failures = build_failures;
        Ok(session)
    }

    /// Use an explicit set of connectors
    pub fn with_clients(
        clients: Vec<Arc<dyn VenueClient>>,
        engine_config: EngineConfig,
        monitoring: &MonitoringConfig,
    ) -> Self {
        Self {
            clients,
            build_failures: Vec::new(),
            engine_config,
            engine: None,
            history: SignalHistory::from_config(monitoring),
        }
    }

    /// Make `symbol` the active instrument.
    ///
    /// Initializes the engine on first use. A different symbol resets every
    /// tracker and clears the history; the same symbol is a no-op.
    pub async fn ensure_instrument(&mut self, symbol: &str) {
        match self.engine.as_mut() {
            Some(engine) if engine.instrument() == symbol => {}
            Some(engine) => {
                engine.change_instrument(symbol).await;
                self.history.clear();
            }
            None => {
                let failures = std::mem::take(&mut self.build_failures);
                let engine = AggregationEngine::init(self.clients.clone(), symbol, self.engine_config.clone())
                    .await
                    .with_exclusions(failures);
                self.engine = Some(engine);
                self.history.clear();
            }
        }
    }

    /// Run one cycle and record it into the history
    pub async fn tick(&mut self) -> AggregatedView {
        if self.engine.is_none() {
            let symbol = self.engine_config.symbol.clone();
            self.ensure_instrument(&symbol).await;
        }

        let view = match self.engine.as_mut() {
            Some(engine) => engine.cycle().await,
            None => AggregatedView::new(Vec::new(), Default::default(), None),
        };
        self.history.record(&view, now_secs());
        view
    }

    pub fn engine(&self) -> Option<&AggregationEngine> {
        self.engine.as_ref()
    }

    pub fn instrument(&self) -> Option<&str> {
        self.engine.as_ref().map(|e| e.instrument())
    }

    pub fn history(&self) -> &SignalHistory {
        &self.history
    }
}

/// Ticks a session on a fixed interval until told to stop.
///
/// A cycle that overruns the interval delays the next tick instead of
/// queueing a burst of catch-up ticks.
pub struct RefreshDriver {
    interval: Duration,
}

impl RefreshDriver {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(Duration::from_secs(config.tick_interval_secs.max(1)))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Drive `session` until `shutdown` becomes true or its sender is dropped.
    /// Returns the number of completed ticks.
    pub async fn run<F>(
        &self,
        session: &mut DashboardSession,
        mut render: F,
        mut shutdown: watch::Receiver<bool>,
    ) -> u64
    where
        F: FnMut(&AggregatedView, &SignalHistory),
    {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ticks = 0u64;

        info!(interval_ms = self.interval.as_millis() as u64, "Refresh driver started");
        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = interval.tick() => {
                    let view = session.tick().await;
                    render(&view, session.history());
                    ticks += 1;
                    debug!(ticks, venues = view.venues.len(), "Tick rendered");
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!(ticks, "Refresh driver stopped");
        ticks
    }
}
