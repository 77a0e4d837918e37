// Symbol Resolver - maps a canonical BASE/QUOTE symbol onto a venue's catalog
// Venues list the same instrument under different quote assets (USDT vs USD vs USDC)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One listed market on a venue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Market {
    /// Unified symbol, `BASE/QUOTE` or `BASE/QUOTE:SETTLE` for derivatives
    pub symbol: String,
    /// Identifier the venue's REST API expects (`BTCUSDT`, `BTC-USD`, `BTC`)
    pub id: String,
    pub base: String,
    pub quote: String,
}

impl Market {
    pub fn new(base: &str, quote: &str, id: &str) -> Self {
        Self {
            symbol: format!("{}/{}", base, quote),
            id: id.to_string(),
            base: base.to_string(),
            quote: quote.to_string(),
        }
    }

    /// A perpetual contract settled in `settle`
    pub fn perpetual(base: &str, quote: &str, settle: &str, id: &str) -> Self {
        Self {
            symbol: format!("{}/{}:{}", base, quote, settle),
            id: id.to_string(),
            base: base.to_string(),
            quote: quote.to_string(),
        }
    }
}

/// A venue's market list, in the order the venue returned it, indexed by symbol
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarketCatalog {
    markets: Vec<Market>,
    by_symbol: HashMap<String, usize>,
}

impl MarketCatalog {
    /// The first listing of a repeated symbol wins
    pub fn new(markets: Vec<Market>) -> Self {
        let mut by_symbol = HashMap::with_capacity(markets.len());
        for (i, market) in markets.iter().enumerate() {
            by_symbol.entry(market.symbol.clone()).or_insert(i);
        }
        Self { markets, by_symbol }
    }

    pub fn len(&self) -> usize {
        self.markets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markets.is_empty()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.by_symbol.contains_key(symbol)
    }

    pub fn market(&self, symbol: &str) -> Option<&Market> {
        self.by_symbol.get(symbol).and_then(|&i| self.markets.get(i))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Market> {
        self.markets.iter()
    }

    /// Resolve a canonical symbol against this catalog.
    ///
    /// An exact listing wins. Otherwise the first market (catalog order) whose
    /// symbol starts with `BASE/` is used. When nothing matches, the canonical
    /// symbol is returned unchanged and the later market lookup fails.
    pub fn resolve(&self, canonical: &str) -> String {
        if self.contains(canonical) {
            return canonical.to_string();
        }

        let base = canonical.split('/').next().unwrap_or(canonical);
        let prefix = format!("{}/", base);
        self.markets
            .iter()
            .find(|m| m.symbol.starts_with(&prefix))
            .map(|m| m.symbol.clone())
            .unwrap_or_else(|| canonical.to_string())
    }

    /// Resolve and look up in one step
    pub fn resolve_market(&self, canonical: &str) -> Option<&Market> {
        self.market(&self.resolve(canonical))
    }
}

impl FromIterator<Market> for MarketCatalog {
    fn from_iter<I: IntoIterator<Item = Market>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
