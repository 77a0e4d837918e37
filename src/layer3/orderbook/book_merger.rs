// Book Merger - Consolidates several venue books into one depth view
// Volumes at the same price are summed across venues

use ordered_float::OrderedFloat;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::core::config::EngineConfig;
use crate::core::types::DepthLevel;
use crate::layer2::orderbook::OrderBookSnapshot;

type Price = OrderedFloat<f64>;

/// Cross-venue merged depth
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergedBook {
    /// Highest prices first
    pub bids: Vec<DepthLevel>,
    /// Lowest prices first
    pub asks: Vec<DepthLevel>,
    /// Lowest surviving ask minus highest surviving bid
    pub spread: Option<f64>,
}

/// Anything with sorted bid and ask levels (best first)
pub trait DepthSource {
    fn bid_levels(&self) -> &[DepthLevel];
    fn ask_levels(&self) -> &[DepthLevel];
}

impl DepthSource for OrderBookSnapshot {
    fn bid_levels(&self) -> &[DepthLevel] {
        &self.bids
    }

    fn ask_levels(&self) -> &[DepthLevel] {
        &self.asks
    }
}

fn top(levels: &[DepthLevel], n: usize) -> &[DepthLevel] {
    &levels[..n.min(levels.len())]
}

/// Merges the top `levels_per_venue` of each book and keeps `output_levels`
/// per side.
#[derive(Debug, Clone, Copy)]
pub struct BookMerger {
    levels_per_venue: usize,
    output_levels: usize,
}

impl Default for BookMerger {
    fn default() -> Self {
        Self::new(15, 10)
    }
}

impl BookMerger {
    pub fn new(levels_per_venue: usize, output_levels: usize) -> Self {
        Self { levels_per_venue, output_levels }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.merge_levels_per_venue, config.aggregated_levels)
    }

    pub fn merge<'a, B, I>(&self, books: I) -> MergedBook
    where
        B: DepthSource + 'a,
        I: IntoIterator<Item = &'a B>,
    {
        let mut bid_map: BTreeMap<Price, f64> = BTreeMap::new();
        let mut ask_map: BTreeMap<Price, f64> = BTreeMap::new();

        for book in books {
            for level in top(book.bid_levels(), self.levels_per_venue) {
                *bid_map.entry(OrderedFloat(level.price)).or_insert(0.0) += level.volume;
            }
            for level in top(book.ask_levels(), self.levels_per_venue) {
                *ask_map.entry(OrderedFloat(level.price)).or_insert(0.0) += level.volume;
            }
        }

        let bids: Vec<DepthLevel> = bid_map
            .iter()
            .rev()
            .take(self.output_levels)
            .map(|(p, &v)| DepthLevel::new(p.0, v))
            .collect();
        let asks: Vec<DepthLevel> = ask_map
            .iter()
            .take(self.output_levels)
            .map(|(p, &v)| DepthLevel::new(p.0, v))
            .collect();

        let spread = match (bids.first(), asks.first()) {
            (Some(bid), Some(ask)) => Some(ask.price - bid.price),
            _ => None,
        };

        MergedBook { bids, asks, spread }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lv(price: f64, volume: f64) -> DepthLevel {
        DepthLevel::new(price, volume)
    }

    fn book(bids: Vec<DepthLevel>, asks: Vec<DepthLevel>) -> OrderBookSnapshot {
        OrderBookSnapshot::from_levels(bids, asks, 30)
    }

    #[test]
    fn test_sums_equal_prices() {
        let a = book(vec![lv(100.0, 1.0), lv(99.0, 2.0)], vec![]);
        let b = book(vec![lv(100.0, 3.0)], vec![]);

        let merged = BookMerger::default().merge([&a, &b]);
        assert_eq!(merged.bids, vec![lv(100.0, 4.0), lv(99.0, 2.0)]);
        assert!(merged.asks.is_empty());
        assert_eq!(merged.spread, None);
    }

    #[test]
    fn test_keeps_best_levels_per_side() {
        let bids: Vec<DepthLevel> = (0..20).map(|i| lv(100.0 - i as f64, 1.0)).collect();
        let asks: Vec<DepthLevel> = (0..20).map(|i| lv(101.0 + i as f64, 1.0)).collect();
        let a = book(bids, asks);

        let merged = BookMerger::default().merge([&a]);
        assert_eq!(merged.bids.len(), 10);
        assert_eq!(merged.asks.len(), 10);
        assert_eq!(merged.bids[0].price, 100.0);
        assert_eq!(merged.bids[9].price, 91.0);
        assert_eq!(merged.asks[0].price, 101.0);
        assert_eq!(merged.asks[9].price, 110.0);
        assert_eq!(merged.spread, Some(1.0));
    }

    #[test]
    fn test_only_top_levels_of_each_venue_contribute() {
        // Level 16 of venue A is deep; it must not reach the merged book
        let mut bids: Vec<DepthLevel> = (0..15).map(|i| lv(200.0 - i as f64, 1.0)).collect();
        bids.push(lv(150.0, 99.0));
        let a = book(bids, vec![]);
        let b = book(vec![lv(150.0, 1.0)], vec![]);

        let merged = BookMerger::new(15, 30).merge([&a, &b]);
        let at_150 = merged.bids.iter().find(|l| l.price == 150.0).unwrap();
        assert_eq!(at_150.volume, 1.0);
    }

    #[test]
    fn test_spread_across_venues() {
        let a = book(vec![lv(100.0, 1.0)], vec![lv(102.0, 1.0)]);
        let b = book(vec![lv(100.5, 1.0)], vec![lv(101.5, 1.0)]);

        let merged = BookMerger::default().merge([&a, &b]);
        assert_eq!(merged.spread, Some(1.0));
    }

    #[test]
    fn test_empty_input() {
        let merged = BookMerger::default().merge(std::iter::empty::<&OrderBookSnapshot>());
        assert_eq!(merged, MergedBook::default());
    }
}
