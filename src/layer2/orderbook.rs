// Order Book Snapshot - one venue's book at one instant
// Normalizes level ordering and truncation so downstream code can rely on it

use ordered_float::OrderedFloat;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::core::types::DepthLevel;

type Price = OrderedFloat<f64>;

/// Venue-scoped order book snapshot.
///
/// Bids are sorted by price descending, asks ascending. Duplicate prices keep
/// the last level seen, and empty or non-positive levels are dropped.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct OrderBookSnapshot {
    pub bids: Vec<DepthLevel>,
    pub asks: Vec<DepthLevel>,
    /// Venue timestamp in ms, when provided
    pub timestamp: Option<i64>,
}

impl OrderBookSnapshot {
    /// Build a snapshot from raw levels in any order, keeping `depth` per side
    pub fn from_levels(bids: Vec<DepthLevel>, asks: Vec<DepthLevel>, depth: usize) -> Self {
        let bid_map = Self::collect_side(bids);
        let ask_map = Self::collect_side(asks);

        Self {
            bids: bid_map
                .iter()
                .rev()
                .take(depth)
                .map(|(p, &v)| DepthLevel::new(p.0, v))
                .collect(),
            asks: ask_map
                .iter()
                .take(depth)
                .map(|(p, &v)| DepthLevel::new(p.0, v))
                .collect(),
            timestamp: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp_ms: i64) -> Self {
        self.timestamp = Some(timestamp_ms);
        self
    }

    fn collect_side(levels: Vec<DepthLevel>) -> BTreeMap<Price, f64> {
        levels
            .into_iter()
            .filter(|l| l.price > 0.0 && l.volume > 0.0)
            .map(|l| (OrderedFloat(l.price), l.volume))
            .collect()
    }

    pub fn best_bid(&self) -> Option<f64> {
        self.bids.first().map(|l| l.price)
    }

    pub fn best_ask(&self) -> Option<f64> {
        self.asks.first().map(|l| l.price)
    }

    /// Summed bid volume minus summed ask volume over the top `depth` levels.
    /// Positive means more resting bid size than ask size.
    pub fn imbalance(&self, depth: usize) -> f64 {
        let bid_vol: f64 = self.bids.iter().take(depth).map(|l| l.volume).sum();
        let ask_vol: f64 = self.asks.iter().take(depth).map(|l| l.volume).sum();
        bid_vol - ask_vol
    }
}
