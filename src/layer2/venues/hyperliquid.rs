// Hyperliquid connector
// Every query is a POST to /info with a `type` discriminator. Perpetuals only, no public trade prints

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::core::types::{Candle, DepthLevel, TradeEvent, VenueId};
use crate::layer1::rest_client::{now_millis, RestClient};
use crate::layer2::orderbook::OrderBookSnapshot;
use crate::layer2::parser::{
    array_field, as_array, field, str_field, timeframe_seconds, value_f64, value_i64, ParseError,
};
use crate::layer2::symbols::{Market, MarketCatalog};

use super::{finish_candles, VenueClient, VenueError};

const INFO_ENDPOINT: &str = "/info";
const SETTLE: &str = "USDC";

pub struct HyperliquidClient {
    rest: RestClient,
}

impl HyperliquidClient {
    pub fn new(rest: RestClient) -> Self {
        Self { rest }
    }
}

#[async_trait]
impl VenueClient for HyperliquidClient {
    fn venue(&self) -> VenueId {
        VenueId::Hyperliquid
    }

    fn has_trade_feed(&self) -> bool {
        false
    }

    async fn load_markets(&self) -> Result<MarketCatalog, VenueError> {
        let data = self.rest.post(INFO_ENDPOINT, &json!({"type": "meta"})).await?;
        Ok(parse_meta(&data)?)
    }

    async fn fetch_order_book(&self, market: &Market, depth: usize) -> Result<OrderBookSnapshot, VenueError> {
        let body = json!({"type": "l2Book", "coin": market.id});
        let data = self.rest.post(INFO_ENDPOINT, &body).await?;
        Ok(parse_l2_book(&data, depth)?)
    }

    async fn fetch_trades(&self, _market: &Market, _limit: usize) -> Result<Vec<TradeEvent>, VenueError> {
        Err(VenueError::Unsupported("hyperliquid has no public trade feed".to_string()))
    }

    async fn fetch_candles(&self, market: &Market, timeframe: &str, limit: usize) -> Result<Vec<Candle>, VenueError> {
        let tf_secs = timeframe_seconds(timeframe)
            .ok_or_else(|| VenueError::Unsupported(format!("hyperliquid timeframe '{}'", timeframe)))?;

        let end_time = now_millis();
        let start_time = end_time - (limit as i64) * (tf_secs as i64) * 1000;
        let body = json!({
            "type": "candleSnapshot",
            "req": {
                "coin": market.id,
                "interval": timeframe,
                "startTime": start_time,
                "endTime": end_time,
            }
        });
        let data = self.rest.post(INFO_ENDPOINT, &body).await?;
        Ok(finish_candles(parse_candles(&data)?, limit))
    }
}

// ============================================================================
// Parsers
// ============================================================================

fn parse_meta(data: &Value) -> Result<MarketCatalog, ParseError> {
    let universe = array_field(data, "universe")?;
    let mut markets = Vec::with_capacity(universe.len());

    for asset in universe {
        if asset.get("isDelisted").and_then(Value::as_bool).unwrap_or(false) {
            continue;
        }
        let name = str_field(asset, "name")?;
        markets.push(Market::perpetual(name, SETTLE, SETTLE, name));
    }

    Ok(MarketCatalog::new(markets))
}

/// Levels arrive as `[[bids...], [asks...]]` of `{px, sz, n}` objects
fn parse_l2_book(data: &Value, depth: usize) -> Result<OrderBookSnapshot, ParseError> {
    let sides = array_field(data, "levels")?;
    if sides.len() < 2 {
        return Err(ParseError::InvalidJson("l2Book needs two sides".to_string()));
    }

    let bids = parse_side(&sides[0])?;
    let asks = parse_side(&sides[1])?;
    let book = OrderBookSnapshot::from_levels(bids, asks, depth);

    Ok(match data.get("time").map(|t| value_i64(t, "time")) {
        Some(Ok(ts)) => book.with_timestamp(ts),
        _ => book,
    })
}

fn parse_side(side: &Value) -> Result<Vec<DepthLevel>, ParseError> {
    as_array(side, "l2Book side")?
        .iter()
        .map(|level| {
            Ok(DepthLevel::new(
                value_f64(field(level, "px")?, "px")?,
                value_f64(field(level, "sz")?, "sz")?,
            ))
        })
        .collect()
}

fn parse_candles(data: &Value) -> Result<Vec<Candle>, ParseError> {
    as_array(data, "candleSnapshot")?
        .iter()
        .map(|row| {
            Ok(Candle::new(
                value_i64(field(row, "t")?, "t")?,
                value_f64(field(row, "o")?, "o")?,
                value_f64(field(row, "h")?, "h")?,
                value_f64(field(row, "l")?, "l")?,
                value_f64(field(row, "c")?, "c")?,
                value_f64(field(row, "v")?, "v")?,
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_meta_builds_perpetuals() {
        let data = json!({
            "universe": [
                {"name": "BTC", "szDecimals": 5, "maxLeverage": 50},
                {"name": "ETH", "szDecimals": 4, "maxLeverage": 50},
                {"name": "OLD", "szDecimals": 0, "maxLeverage": 3, "isDelisted": true}
            ]
        });
        let catalog = parse_meta(&data).unwrap();
        assert_eq!(catalog.len(), 2);
        assert!(catalog.contains("BTC/USDC:USDC"));
        assert_eq!(catalog.resolve("ETH/USDT"), "ETH/USDC:USDC");
        assert_eq!(catalog.resolve_market("ETH/USDT").unwrap().id, "ETH");
    }

    #[test]
    fn test_parse_l2_book() {
        let data = json!({
            "coin": "BTC",
            "time": 1716863719031i64,
            "levels": [
                [{"px": "65000.0", "sz": "1.5", "n": 3}, {"px": "64999.0", "sz": "0.5", "n": 1}],
                [{"px": "65001.0", "sz": "2.0", "n": 2}]
            ]
        });
        let book = parse_l2_book(&data, 30).unwrap();
        assert_eq!(book.best_bid(), Some(65000.0));
        assert_eq!(book.best_ask(), Some(65001.0));
        assert_eq!(book.timestamp, Some(1_716_863_719_031));
        assert!((book.imbalance(30) - 0.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_l2_book_rejects_one_side() {
        let data = json!({"levels": [[{"px": "1", "sz": "1", "n": 1}]]});
        assert!(parse_l2_book(&data, 30).is_err());
    }

    #[test]
    fn test_parse_candles() {
        let data = json!([
            {"t": 1716863700000i64, "T": 1716863759999i64, "s": "BTC", "i": "1m",
             "o": "65000", "c": "65010", "h": "65020", "l": "64990", "v": "3.5", "n": 40}
        ]);
        let candles = parse_candles(&data).unwrap();
        assert_eq!(candles, vec![Candle::new(1_716_863_700_000, 65000.0, 65020.0, 64990.0, 65010.0, 3.5)]);
    }
}
