// Venue Connectors - one REST connector per supported venue
// Each connector speaks its venue's dialect and hands back normalized types

pub mod binance;
pub mod bybit;
pub mod coinbase;
pub mod hyperliquid;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

use crate::core::config::VenueConfig;
use crate::core::types::{Candle, TradeEvent, VenueId};
use crate::layer1::rest_client::{RestClient, RestClientError};
use crate::layer2::orderbook::OrderBookSnapshot;
use crate::layer2::parser::ParseError;
use crate::layer2::symbols::{Market, MarketCatalog};

pub use binance::BinanceClient;
pub use bybit::BybitClient;
pub use coinbase::CoinbaseClient;
pub use hyperliquid::HyperliquidClient;

#[derive(Debug, Error)]
pub enum VenueError {
    #[error("REST error: {0}")]
    Rest(#[from] RestClientError),
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("Market not listed: {0}")]
    MarketNotListed(String),
    #[error("Unknown venue: {0}")]
    UnknownVenue(String),
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

/// Public market data operations every venue connector provides.
///
/// Implementations normalize at this boundary: books come back sorted and
/// truncated, trades come back oldest first with taker sides, candles oldest
/// first.
#[async_trait]
pub trait VenueClient: Send + Sync {
    fn venue(&self) -> VenueId;

    /// Whether the venue exposes public trade prints
    fn has_trade_feed(&self) -> bool {
        true
    }

    async fn load_markets(&self) -> Result<MarketCatalog, VenueError>;

    async fn fetch_order_book(&self, market: &Market, depth: usize) -> Result<OrderBookSnapshot, VenueError>;

    async fn fetch_trades(&self, market: &Market, limit: usize) -> Result<Vec<TradeEvent>, VenueError>;

    async fn fetch_candles(&self, market: &Market, timeframe: &str, limit: usize) -> Result<Vec<Candle>, VenueError>;
}

/// Build a connector for one venue
pub fn build_client(venue: VenueId, config: &VenueConfig) -> Result<Arc<dyn VenueClient>, VenueError> {
    let rest = RestClient::from_config(config, venue)?;
    let client: Arc<dyn VenueClient> = match venue {
        VenueId::Binance => Arc::new(BinanceClient::new(rest)),
        VenueId::Bybit => Arc::new(BybitClient::new(rest)),
        VenueId::Coinbase => Arc::new(CoinbaseClient::new(rest)),
        VenueId::Hyperliquid => Arc::new(HyperliquidClient::new(rest)),
    };
    Ok(client)
}

/// Build connectors for the configured roster, in roster order.
///
/// Unknown or unbuildable venues are returned separately (and logged) so the
/// engine can report them as excluded.
pub fn build_clients(config: &VenueConfig) -> (Vec<Arc<dyn VenueClient>>, Vec<(String, VenueError)>) {
    let mut clients: Vec<Arc<dyn VenueClient>> = Vec::new();
    let mut failures = Vec::new();

    for name in &config.roster {
        let built = name
            .parse::<VenueId>()
            .map_err(|_| VenueError::UnknownVenue(name.clone()))
            .and_then(|venue| {
                if clients.iter().any(|c| c.venue() == venue) {
                    return Err(VenueError::Unsupported(format!("duplicate venue '{}'", venue)));
                }
                build_client(venue, config)
            });

        match built {
            Ok(client) => clients.push(client),
            Err(e) => {
                warn!(venue = %name, error = %e, "Venue excluded from roster");
                failures.push((name.clone(), e));
            }
        }
    }

    (clients, failures)
}

/// Sort trades oldest first so the last element is the most recent print
pub(crate) fn sort_trades(mut trades: Vec<TradeEvent>) -> Vec<TradeEvent> {
    trades.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
    trades
}

/// Sort candles oldest first and keep the newest `limit`
pub(crate) fn finish_candles(mut candles: Vec<Candle>, limit: usize) -> Vec<Candle> {
    candles.sort_by_key(|c| c.t);
    if candles.len() > limit {
        candles.drain(..candles.len() - limit);
    }
    candles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Side;

    #[test]
    fn test_build_clients_respects_roster_order() {
        let config = VenueConfig {
            roster: vec!["bybit".into(), "kraken".into(), "binance".into(), "bybit".into()],
            ..VenueConfig::default()
        };

        let (clients, failures) = build_clients(&config);
        let venues: Vec<VenueId> = clients.iter().map(|c| c.venue()).collect();
        assert_eq!(venues, vec![VenueId::Bybit, VenueId::Binance]);

        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].0, "kraken");
        assert!(matches!(failures[0].1, VenueError::UnknownVenue(_)));
        assert!(matches!(failures[1].1, VenueError::Unsupported(_)));
    }

    #[test]
    fn test_hyperliquid_has_no_trade_feed() {
        let client = build_client(VenueId::Hyperliquid, &VenueConfig::default()).unwrap();
        assert!(!client.has_trade_feed());
        let client = build_client(VenueId::Coinbase, &VenueConfig::default()).unwrap();
        assert!(client.has_trade_feed());
    }

    #[test]
    fn test_sort_trades() {
        let trades = vec![
            TradeEvent::new(Some("b".into()), 2.0, Side::Buy, 1.0, 10.0),
            TradeEvent::new(Some("a".into()), 1.0, Side::Sell, 1.0, 11.0),
        ];
        let sorted = sort_trades(trades);
        assert_eq!(sorted[0].id.as_deref(), Some("a"));
        assert_eq!(sorted[1].id.as_deref(), Some("b"));
    }

    #[test]
    fn test_finish_candles_keeps_newest() {
        let candles = vec![
            Candle::new(3, 1.0, 1.0, 1.0, 1.0, 1.0),
            Candle::new(1, 1.0, 1.0, 1.0, 1.0, 1.0),
            Candle::new(2, 1.0, 1.0, 1.0, 1.0, 1.0),
        ];
        let kept = finish_candles(candles, 2);
        assert_eq!(kept.iter().map(|c| c.t).collect::<Vec<_>>(), vec![2, 3]);
    }
}
