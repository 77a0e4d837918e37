// CVD Tracker - Cumulative volume delta over rolling windows for one venue
// Deduplicates overlapping trade fetches and keeps a 24h ledger of signed sizes

use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

use crate::core::types::TradeEvent;
use crate::layer3::common::time_windows::{CvdWindow, TimeWindow};

/// Seen-id record is shrunk once it grows past this many entries
const SEEN_HIGH_WATER: usize = 2_000;
/// ...down to this many, evicting the oldest insertions
const SEEN_LOW_WATER: usize = 1_000;
/// Memory guard for the ledger; far above any realistic 24h of polled trades
const LEDGER_CAPACITY: usize = 2_000_000;

/// Where a tracker is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackerPhase {
    /// Nothing ingested since creation or the last reset
    Empty,
    /// Seeded with the startup trade backfill
    Warming,
    /// At least one refresh cycle has fed it
    Steady,
}

/// CVD for every window at one instant
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CvdValues {
    pub cvd_5m: f64,
    pub cvd_1h: f64,
    pub cvd_12h: f64,
    pub cvd_24h: f64,
}

impl CvdValues {
    pub fn get(&self, window: CvdWindow) -> f64 {
        match window {
            CvdWindow::FiveMinutes => self.cvd_5m,
            CvdWindow::OneHour => self.cvd_1h,
            CvdWindow::TwelveHours => self.cvd_12h,
            CvdWindow::TwentyFourHours => self.cvd_24h,
        }
    }
}

/// CvdTracker owns one venue's ledger.
///
/// After every `add_trades` call each ledger entry is at most 24h older than
/// the `now` passed in, and a trade id is counted at most once while it is
/// still remembered.
pub struct CvdTracker {
    ledger: TimeWindow<f64>,
    seen_order: TimeWindow<String>,
    seen: HashSet<String>,
    phase: TrackerPhase,

    // Statistics tracking
    trades_processed: u64,
    duplicates_skipped: u64,
}

impl Default for CvdTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl CvdTracker {
    pub fn new() -> Self {
        let horizon = CvdWindow::MAX.seconds();
        Self {
            ledger: TimeWindow::new(horizon, LEDGER_CAPACITY),
            seen_order: TimeWindow::new(horizon, usize::MAX),
            seen: HashSet::new(),
            phase: TrackerPhase::Empty,
            trades_processed: 0,
            duplicates_skipped: 0,
        }
    }

    /// Ingest a batch of trades, skipping ids already seen, then prune.
    /// Returns how many trades were new.
    pub fn add_trades(&mut self, trades: &[TradeEvent], now: f64) -> usize {
        let mut added = 0;

        for trade in trades {
            self.trades_processed += 1;
            let key = trade.dedup_key();
            if self.seen.contains(&key) {
                self.duplicates_skipped += 1;
                continue;
            }

            self.ledger.add(trade.timestamp, trade.delta());
            self.seen.insert(key.clone());
            if let Some((_, evicted)) = self.seen_order.add(trade.timestamp, key) {
                self.seen.remove(&evicted);
            }
            added += 1;
        }

        self.prune(now);
        added
    }

    /// Startup backfill. Moves an empty tracker to `Warming`.
    pub fn seed(&mut self, trades: &[TradeEvent], now: f64) -> usize {
        let added = self.add_trades(trades, now);
        if self.phase == TrackerPhase::Empty {
            self.phase = TrackerPhase::Warming;
        }
        added
    }

    /// Per-cycle ingest. Moves the tracker to `Steady`.
    pub fn ingest(&mut self, trades: &[TradeEvent], now: f64) -> usize {
        let added = self.add_trades(trades, now);
        self.phase = TrackerPhase::Steady;
        added
    }

    fn prune(&mut self, now: f64) {
        let dropped = self.ledger.prune(now);

        let seen = &mut self.seen;
        let mut expired = self.seen_order.prune_with(now, |key| {
            seen.remove(&key);
        });

        if self.seen_order.len() > SEEN_HIGH_WATER {
            let before = self.seen_order.len();
            self.seen_order.shrink_to(SEEN_LOW_WATER, |key| {
                seen.remove(&key);
            });
            expired += before - self.seen_order.len();
        }

        if dropped > 0 || expired > 0 {
            debug!(dropped, expired, remaining = self.ledger.len(), "CVD ledger pruned");
        }
    }

    /// Sum of signed sizes with `timestamp >= now - window` (inclusive)
    pub fn cvd(&self, window: CvdWindow, now: f64) -> f64 {
        let cutoff = now - window.seconds();
        self.ledger.iter_since(cutoff).map(|(_, delta)| delta).sum()
    }

    pub fn cvd_all(&self, now: f64) -> CvdValues {
        CvdValues {
            cvd_5m: self.cvd(CvdWindow::FiveMinutes, now),
            cvd_1h: self.cvd(CvdWindow::OneHour, now),
            cvd_12h: self.cvd(CvdWindow::TwelveHours, now),
            cvd_24h: self.cvd(CvdWindow::TwentyFourHours, now),
        }
    }

    /// Discard all state (instrument change)
    pub fn reset(&mut self) {
        self.ledger.clear();
        self.seen_order.clear();
        self.seen.clear();
        self.phase = TrackerPhase::Empty;
    }

    pub fn phase(&self) -> TrackerPhase {
        self.phase
    }

    pub fn ledger_len(&self) -> usize {
        self.ledger.len()
    }

    pub fn seen_len(&self) -> usize {
        self.seen.len()
    }

    pub fn trades_processed(&self) -> u64 {
        self.trades_processed
    }

    pub fn duplicates_skipped(&self) -> u64 {
        self.duplicates_skipped
    }

    pub fn get_stats(&self) -> CvdTrackerStats {
        CvdTrackerStats {
            phase: self.phase,
            ledger_entries: self.ledger.len(),
            remembered_ids: self.seen.len(),
            trades_processed: self.trades_processed,
            duplicates_skipped: self.duplicates_skipped,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CvdTrackerStats {
    pub phase: TrackerPhase,
    pub ledger_entries: usize,
    pub remembered_ids: usize,
    pub trades_processed: u64,
    pub duplicates_skipped: u64,
}
