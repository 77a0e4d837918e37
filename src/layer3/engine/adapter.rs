// Venue Adapter - one venue's fetch-and-compute step
// Pairs a connector with its market catalog and CVD tracker

use std::sync::Arc;
use tracing::debug;

use crate::core::types::{TradeEvent, VenueId};
use crate::layer2::symbols::{Market, MarketCatalog};
use crate::layer2::venues::{VenueClient, VenueError};
use crate::layer3::trade::cvd_tracker::{CvdTracker, TrackerPhase};

use super::snapshot::VenueSnapshot;

/// Per-cycle fetch sizes
#[derive(Debug, Clone, Copy)]
pub struct FetchLimits {
    /// Book levels per side, also the imbalance depth
    pub depth: usize,
    pub trade_limit: usize,
}

/// A venue that loaded its catalog at init and stays in the engine.
///
/// The tracker is only written after every fetch of a cycle has succeeded,
/// so a failed cycle leaves it exactly as it was.
pub struct VenueSlot {
    client: Arc<dyn VenueClient>,
    catalog: MarketCatalog,
    tracker: CvdTracker,
}

impl VenueSlot {
    pub fn new(client: Arc<dyn VenueClient>, catalog: MarketCatalog) -> Self {
        Self { client, catalog, tracker: CvdTracker::new() }
    }

    pub fn venue(&self) -> VenueId {
        self.client.venue()
    }

    pub fn client(&self) -> &Arc<dyn VenueClient> {
        &self.client
    }

    pub fn catalog(&self) -> &MarketCatalog {
        &self.catalog
    }

    pub fn tracker(&self) -> &CvdTracker {
        &self.tracker
    }

    pub fn phase(&self) -> TrackerPhase {
        self.tracker.phase()
    }

    /// Resolve `symbol` through the catalog to the venue's market
    pub fn market(&self, symbol: &str) -> Result<&Market, VenueError> {
        self.catalog
            .resolve_market(symbol)
            .ok_or_else(|| VenueError::MarketNotListed(format!("{} on {}", symbol, self.venue())))
    }

    /// Fetch `limit` recent trades into an empty tracker. Returns how many were new.
    pub async fn seed(&mut self, symbol: &str, limit: usize, now: f64) -> Result<usize, VenueError> {
        if !self.client.has_trade_feed() {
            return Ok(0);
        }
        let market = self.market(symbol)?;
        let trades = self.client.fetch_trades(market, limit).await?;
        Ok(self.tracker.seed(&trades, now))
    }

    /// Drop all accumulated trade state (instrument change)
    pub fn reset(&mut self) {
        self.tracker.reset();
    }

    /// One cycle for this venue
    pub async fn fetch(&mut self, symbol: &str, limits: FetchLimits, now: f64) -> Result<VenueSnapshot, VenueError> {
        let market = self.market(symbol)?;
        let book = self.client.fetch_order_book(market, limits.depth).await?;

        let trades: Option<Vec<TradeEvent>> = if self.client.has_trade_feed() {
            Some(self.client.fetch_trades(market, limits.trade_limit).await?)
        } else {
            None
        };

        let last_price = trades
            .as_ref()
            .and_then(|t| t.last())
            .map(|t| t.price)
            .or_else(|| book.best_bid());

        let venue = self.venue();
        let cvd = match trades {
            Some(trades) => {
                let added = self.tracker.ingest(&trades, now);
                debug!(venue = %venue, fetched = trades.len(), added, "Trades ingested");
                Some(self.tracker.cvd_all(now))
            }
            None => None,
        };

        let mut snapshot = VenueSnapshot {
            id: venue,
            last_price,
            imbalance: book.imbalance(limits.depth),
            bids: book.bids,
            asks: book.asks,
            cvd_5m: None,
            cvd_1h: None,
            cvd_12h: None,
            cvd_24h: None,
        };
        snapshot.set_cvd(cvd);
        Ok(snapshot)
    }
}
