// Aggregation Engine - drives one fetch-and-compute cycle across every venue
// Owns the venue roster and their trackers; each cycle's output carries no state forward

use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::core::config::{EngineConfig, VenueConfig};
use crate::core::types::VenueId;
use crate::layer1::rest_client::now_secs;
use crate::layer2::venues::{build_clients, VenueClient, VenueError};
use crate::layer3::orderbook::book_merger::BookMerger;
use crate::layer3::trade::cvd_tracker::TrackerPhase;

use super::adapter::{FetchLimits, VenueSlot};
use super::snapshot::{AggregatedView, CandleSeries, VenueSnapshot};

/// A venue dropped at init, kept out for the engine's lifetime
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExcludedVenue {
    pub venue: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    pub instrument: String,
    pub active_venues: Vec<VenueId>,
    pub excluded_venues: usize,
    pub cycles_run: u64,
    pub last_cycle_successes: usize,
    pub last_cycle_failures: usize,
}

/// AggregationEngine runs the per-tick pipeline:
/// resolve -> fetch book and trades per venue (concurrently) -> merge -> candles.
///
/// `cycle` takes `&mut self`, so two cycles never overlap and each venue's
/// tracker has a single writer.
pub struct AggregationEngine {
    instrument: String,
    config: EngineConfig,
    merger: BookMerger,
    venues: Vec<VenueSlot>,
    excluded: Vec<ExcludedVenue>,
    candle_priority: Vec<VenueId>,

    // Statistics
    cycles_run: u64,
    last_cycle_successes: usize,
    last_cycle_failures: usize,
}

impl AggregationEngine {
    /// Load every venue's catalog and seed trade-feed venues.
    ///
    /// Venues whose catalog fails to load are excluded (logged once). A failed
    /// seed is logged and the venue stays.
    pub async fn init(clients: Vec<Arc<dyn VenueClient>>, instrument: &str, config: EngineConfig) -> Self {
        let catalogs = join_all(clients.iter().map(|client| client.load_markets())).await;

        let mut venues = Vec::with_capacity(clients.len());
        let mut excluded = Vec::new();
        for (client, catalog) in clients.into_iter().zip(catalogs) {
            match catalog {
                Ok(catalog) => {
                    debug!(venue = %client.venue(), markets = catalog.len(), "Market catalog loaded");
                    venues.push(VenueSlot::new(client, catalog));
                }
                Err(e) => {
                    warn!(venue = %client.venue(), error = %e, "Venue excluded: market catalog unavailable");
                    excluded.push(ExcludedVenue { venue: client.venue().to_string(), reason: e.to_string() });
                }
            }
        }

        let candle_priority = config
            .candle_priority
            .iter()
            .filter_map(|name| match name.parse::<VenueId>() {
                Ok(venue) => Some(venue),
                Err(e) => {
                    warn!(error = %e, "Ignoring unknown venue in candle priority");
                    None
                }
            })
            .collect();

        let mut engine = Self {
            instrument: instrument.to_string(),
            merger: BookMerger::from_config(&config),
            config,
            venues,
            excluded,
            candle_priority,
            cycles_run: 0,
            last_cycle_successes: 0,
            last_cycle_failures: 0,
        };

        engine.seed_all(now_secs()).await;
        info!(
            symbol = %engine.instrument,
            venues = engine.venues.len(),
            excluded = engine.excluded.len(),
            "Aggregation engine initialized"
        );
        engine
    }

    /// Build the roster from config, then `init` with `config.symbol`.
    /// Roster entries that fail to build are reported through `excluded()`.
    pub async fn from_config(venue_config: &VenueConfig, config: EngineConfig) -> Self {
        let (clients, failures) = build_clients(venue_config);
        let symbol = config.symbol.clone();
        Self::init(clients, &symbol, config).await.with_exclusions(failures)
    }

    /// Record venues that never made it to `init`
    pub fn with_exclusions(mut self, failures: Vec<(String, VenueError)>) -> Self {
        self.excluded.extend(
            failures
                .into_iter()
                .map(|(venue, e)| ExcludedVenue { venue, reason: e.to_string() }),
        );
        self
    }

    async fn seed_all(&mut self, now: f64) {
        let symbol = self.instrument.as_str();
        let limit = self.config.seed_trade_limit;

        let results = join_all(self.venues.iter_mut().map(|slot| async move {
            let venue = slot.venue();
            (venue, slot.seed(symbol, limit, now).await)
        }))
        .await;

        for (venue, result) in results {
            match result {
                Ok(added) => debug!(venue = %venue, symbol = %symbol, added, "Tracker seeded"),
                Err(e) => warn!(venue = %venue, symbol = %symbol, error = %e, "Trade seed failed"),
            }
        }
    }

    /// Run one cycle against the wall clock
    pub async fn cycle(&mut self) -> AggregatedView {
        self.cycle_at(now_secs()).await
    }

    /// Run one cycle with `now` as the CVD reference time (seconds since epoch)
    pub async fn cycle_at(&mut self, now: f64) -> AggregatedView {
        let started = Instant::now();
        let symbol = self.instrument.as_str();
        let limits = FetchLimits { depth: self.config.depth, trade_limit: self.config.trade_limit };

        let results = join_all(self.venues.iter_mut().map(|slot| async move {
            let venue = slot.venue();
            (venue, slot.fetch(symbol, limits, now).await)
        }))
        .await;

        let mut snapshots: Vec<VenueSnapshot> = Vec::with_capacity(results.len());
        let mut failures = 0;
        for (venue, result) in results {
            match result {
                Ok(snapshot) => snapshots.push(snapshot),
                Err(e) => {
                    failures += 1;
                    warn!(venue = %venue, symbol = %symbol, error = %e, "Venue fetch failed, omitted this cycle");
                }
            }
        }

        let merged = self.merger.merge(&snapshots);
        let candles = if self.config.include_candles {
            self.fetch_candles().await
        } else {
            None
        };

        self.cycles_run += 1;
        self.last_cycle_successes = snapshots.len();
        self.last_cycle_failures = failures;
        debug!(
            symbol = %self.instrument,
            ok = snapshots.len(),
            failed = failures,
            spread = ?merged.spread,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Cycle complete"
        );

        AggregatedView::new(snapshots, merged, candles)
    }

    /// First non-empty candle series in priority order, among venues in the engine
    async fn fetch_candles(&self) -> Option<CandleSeries> {
        let timeframe = self.config.candle_timeframe.as_str();
        let limit = self.config.candle_limit;

        for venue in &self.candle_priority {
            let Some(slot) = self.venues.iter().find(|s| s.venue() == *venue) else {
                continue;
            };
            let market = match slot.market(&self.instrument) {
                Ok(market) => market,
                Err(e) => {
                    debug!(venue = %venue, error = %e, "Candles skipped");
                    continue;
                }
            };

            match slot.client().fetch_candles(market, timeframe, limit).await {
                Ok(series) if !series.is_empty() => {
                    return Some(CandleSeries { venue: *venue, series });
                }
                Ok(_) => debug!(venue = %venue, "Empty candle series, trying next venue"),
                Err(e) => warn!(venue = %venue, error = %e, "Candle fetch failed, trying next venue"),
            }
        }

        debug!(symbol = %self.instrument, "No candle series available");
        None
    }

    /// Switch to a new instrument: every tracker is reset and re-seeded
    pub async fn change_instrument(&mut self, symbol: &str) {
        info!(from = %self.instrument, to = %symbol, "Changing instrument");
        self.instrument = symbol.to_string();
        for slot in &mut self.venues {
            slot.reset();
        }
        self.seed_all(now_secs()).await;
    }

    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Active venues in roster order
    pub fn venues(&self) -> Vec<VenueId> {
        self.venues.iter().map(|s| s.venue()).collect()
    }

    pub fn excluded(&self) -> &[ExcludedVenue] {
        &self.excluded
    }

    pub fn tracker_phase(&self, venue: VenueId) -> Option<TrackerPhase> {
        self.slot(venue).map(|s| s.phase())
    }

    pub fn slot(&self, venue: VenueId) -> Option<&VenueSlot> {
        self.venues.iter().find(|s| s.venue() == venue)
    }

    pub fn get_stats(&self) -> EngineStats {
        EngineStats {
            instrument: self.instrument.clone(),
            active_venues: self.venues(),
            excluded_venues: self.excluded.len(),
            cycles_run: self.cycles_run,
            last_cycle_successes: self.last_cycle_successes,
            last_cycle_failures: self.last_cycle_failures,
        }
    }
}
