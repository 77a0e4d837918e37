// Coinbase Exchange connector
// Products are keyed `BASE-QUOTE`; trade sides are reported from the maker's point of view

use async_trait::async_trait;
use serde_json::Value;

use crate::core::types::{Candle, Side, TradeEvent, VenueId};
use crate::layer1::rest_client::RestClient;
use crate::layer2::orderbook::OrderBookSnapshot;
use crate::layer2::parser::{
    array_field, as_array, field, parse_iso8601_secs, parse_levels, str_field, timeframe_seconds,
    value_f64, value_i64, ParseError,
};
use crate::layer2::symbols::{Market, MarketCatalog};

use super::{finish_candles, sort_trades, VenueClient, VenueError};

/// Candle granularities the candles endpoint accepts, in seconds
const GRANULARITIES: [u64; 6] = [60, 300, 900, 3_600, 21_600, 86_400];
const MAX_TRADE_LIMIT: usize = 1000;

pub struct CoinbaseClient {
    rest: RestClient,
}

impl CoinbaseClient {
    pub fn new(rest: RestClient) -> Self {
        Self { rest }
    }
}

#[async_trait]
impl VenueClient for CoinbaseClient {
    fn venue(&self) -> VenueId {
        VenueId::Coinbase
    }

    async fn load_markets(&self) -> Result<MarketCatalog, VenueError> {
        let data = self.rest.get("/products", &[]).await?;
        Ok(parse_markets(&data)?)
    }

    async fn fetch_order_book(&self, market: &Market, depth: usize) -> Result<OrderBookSnapshot, VenueError> {
        let endpoint = format!("/products/{}/book", market.id);
        let data = self.rest.get(&endpoint, &[("level", "2".to_string())]).await?;
        Ok(parse_order_book(&data, depth)?)
    }

    async fn fetch_trades(&self, market: &Market, limit: usize) -> Result<Vec<TradeEvent>, VenueError> {
        let endpoint = format!("/products/{}/trades", market.id);
        let params = [("limit", limit.clamp(1, MAX_TRADE_LIMIT).to_string())];
        let data = self.rest.get(&endpoint, &params).await?;
        Ok(parse_trades(&data)?)
    }

    async fn fetch_candles(&self, market: &Market, timeframe: &str, limit: usize) -> Result<Vec<Candle>, VenueError> {
        let granularity = timeframe_seconds(timeframe)
            .filter(|secs| GRANULARITIES.contains(secs))
            .ok_or_else(|| VenueError::Unsupported(format!("coinbase timeframe '{}'", timeframe)))?;

        let endpoint = format!("/products/{}/candles", market.id);
        let data = self
            .rest
            .get(&endpoint, &[("granularity", granularity.to_string())])
            .await?;
        Ok(finish_candles(parse_candles(&data)?, limit))
    }
}

// ============================================================================
// Parsers
// ============================================================================

fn parse_markets(data: &Value) -> Result<MarketCatalog, ParseError> {
    let products = as_array(data, "products")?;
    let mut markets = Vec::with_capacity(products.len());

    for entry in products {
        let online = entry.get("status").and_then(Value::as_str).map_or(true, |s| s == "online");
        let disabled = entry.get("trading_disabled").and_then(Value::as_bool).unwrap_or(false);
        if !online || disabled {
            continue;
        }
        markets.push(Market::new(
            str_field(entry, "base_currency")?,
            str_field(entry, "quote_currency")?,
            str_field(entry, "id")?,
        ));
    }

    Ok(MarketCatalog::new(markets))
}

fn parse_order_book(data: &Value, depth: usize) -> Result<OrderBookSnapshot, ParseError> {
    // Levels are [price, size, num_orders]
    let bids = parse_levels(array_field(data, "bids")?)?;
    let asks = parse_levels(array_field(data, "asks")?)?;
    let book = OrderBookSnapshot::from_levels(bids, asks, depth);

    Ok(match data.get("time").and_then(Value::as_str).map(parse_iso8601_secs) {
        Some(Ok(secs)) => book.with_timestamp((secs * 1000.0) as i64),
        _ => book,
    })
}

fn parse_trades(data: &Value) -> Result<Vec<TradeEvent>, ParseError> {
    let rows = as_array(data, "trades")?;
    let mut trades = Vec::with_capacity(rows.len());

    for row in rows {
        let maker_side: Side = str_field(row, "side")?
            .parse()
            .map_err(ParseError::InvalidJson)?;
        trades.push(TradeEvent {
            id: Some(value_i64(field(row, "trade_id")?, "trade_id")?.to_string()),
            timestamp: parse_iso8601_secs(str_field(row, "time")?)?,
            side: match maker_side {
                Side::Buy => Side::Sell,
                Side::Sell => Side::Buy,
            },
            amount: value_f64(field(row, "size")?, "size")?,
            price: value_f64(field(row, "price")?, "price")?,
        });
    }

    Ok(sort_trades(trades))
}

fn parse_candles(data: &Value) -> Result<Vec<Candle>, ParseError> {
    // Rows are [time_s, low, high, open, close, volume]
    as_array(data, "candles")?
        .iter()
        .map(|row| {
            let k = row
                .as_array()
                .filter(|k| k.len() >= 6)
                .ok_or_else(|| ParseError::InvalidJson(format!("Invalid candle: {}", row)))?;
            Ok(Candle::new(
                value_i64(&k[0], "time")? * 1000,
                value_f64(&k[3], "open")?,
                value_f64(&k[2], "high")?,
                value_f64(&k[1], "low")?,
                value_f64(&k[4], "close")?,
                value_f64(&k[5], "volume")?,
            ))
        })
        .collect()
}
